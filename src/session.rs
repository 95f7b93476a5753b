use bevy::prelude::*;
use tracing::info;

use crate::camera::{CameraPose, CameraRig};
use crate::game_logic::{
    ConfigError, DriftConfig, DriftInput, SegmentId, StepOutcome, TrackStreamer, VehicleDynamics,
    VehicleState, clamp_dt,
};
use crate::networking::{SnapshotEmitter, VehicleSnapshot};

/// Everything a renderer needs to draw the local vehicle this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePose {
    pub position: Vec3,
    pub heading: f32,
    pub render_yaw: f32,
    pub drift_angle: f32,
    pub roll: f32,
    pub pitch: f32,
    pub speed: f32,
    pub distance: f32,
}

impl From<&VehicleState> for VehiclePose {
    fn from(state: &VehicleState) -> Self {
        Self {
            position: state.position,
            heading: state.heading,
            render_yaw: state.render_yaw(),
            drift_angle: state.drift_angle,
            roll: state.roll,
            pitch: state.pitch,
            speed: state.speed,
            distance: state.distance,
        }
    }
}

/// Output of one frame of the driving loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Segments the renderer should build meshes for.
    pub created: Vec<SegmentId>,
    /// Segments whose meshes can be released.
    pub disposed: Vec<SegmentId>,
    pub outcome: StepOutcome,
    pub crashed: bool,
    pub pose: VehiclePose,
    pub camera: CameraPose,
    pub snapshot: Option<VehicleSnapshot>,
}

/// One local run: the track, the car on it and everything that follows the car.
#[derive(Resource, Debug)]
pub struct DriftSession {
    config: DriftConfig,
    track: TrackStreamer,
    dynamics: VehicleDynamics,
    vehicle: VehicleState,
    camera: CameraRig,
    emitter: SnapshotEmitter,
    clock: f32,
}

impl DriftSession {
    pub fn new(seed: u64, config: DriftConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let track = TrackStreamer::new(seed, config.track.clone());
        let dynamics = VehicleDynamics::new(config.vehicle.clone());
        let vehicle = dynamics.spawn(&track).unwrap_or_default();
        let mut camera = CameraRig::default();
        camera.snap_to(&vehicle);
        let emitter = SnapshotEmitter::new(0, config.snapshot_interval());

        info!(seed, look_ahead = config.track.look_ahead, "drift session started");
        Ok(Self {
            config,
            track,
            dynamics,
            vehicle,
            camera,
            emitter,
            clock: 0.0,
        })
    }

    /// Tag outgoing snapshots with the id the room assigned to this player.
    pub fn set_player_id(&mut self, player_id: u32) {
        self.emitter.player_id = player_id;
    }

    pub fn tick(&mut self, dt: f32, input: DriftInput) -> TickReport {
        let dt = clamp_dt(dt);
        self.clock += dt;

        self.track.advance(self.vehicle.distance);
        let outcome = self.dynamics.step(&mut self.vehicle, &input, dt, &self.track);
        let disposed = self.track.flush_disposals(self.clock);
        let created = self.track.take_created();

        self.camera.follow(&self.vehicle, dt);
        let snapshot = self.emitter.poll(self.clock, &self.vehicle);

        TickReport {
            created,
            disposed,
            outcome,
            crashed: self.vehicle.crashed,
            pose: VehiclePose::from(&self.vehicle),
            camera: self.camera.pose(),
            snapshot,
        }
    }

    /// Start over from distance zero on the same track. Returns the segment
    /// ids the renderer should drop; the fresh ones arrive with the next tick.
    pub fn reset(&mut self) -> Vec<SegmentId> {
        let discarded = self.track.reset();
        self.vehicle = self.dynamics.spawn(&self.track).unwrap_or_default();
        self.camera.snap_to(&self.vehicle);
        self.emitter.reset();
        self.clock = 0.0;
        info!(seed = self.track.seed(), "drift session reset");
        discarded
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn track(&self) -> &TrackStreamer {
        &self.track
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn seed(&self) -> u64 {
        self.track.seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(seed: u64) -> DriftSession {
        DriftSession::new(seed, DriftConfig::default()).expect("default config is valid")
    }

    /// Weaving input with an uneven frame rate.
    fn scripted_input(frame: usize) -> (f32, DriftInput) {
        let dt = if frame % 7 == 0 { 1.0 / 30.0 } else { 1.0 / 60.0 };
        let steer = ((frame as f32) * 0.05).sin() * 0.8;
        (dt, DriftInput::new(steer, 1.0))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = DriftConfig::default();
        config.track.narrowing_per_interval = 0.0;
        assert!(DriftSession::new(1, config).is_err());
    }

    #[test]
    fn test_first_tick_reports_primed_segments() {
        let mut session = session(12);
        let report = session.tick(1.0 / 60.0, DriftInput::default());
        assert!(!report.created.is_empty());
        assert_eq!(report.created[0], SegmentId(0));
        assert!(report.disposed.is_empty());
        assert_eq!(report.outcome, StepOutcome::Moved);
        assert!(report.snapshot.is_some());

        let report = session.tick(1.0 / 60.0, DriftInput::default());
        assert!(report.snapshot.is_none());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = session(31);
        let mut b = session(31);
        for frame in 0..1200 {
            let (dt, input) = scripted_input(frame);
            assert_eq!(a.tick(dt, input), b.tick(dt, input));
        }
        assert_eq!(a.vehicle(), b.vehicle());
    }

    #[test]
    fn test_straight_line_driver_eventually_crashes() {
        let mut session = session(4);
        let mut crashed_at = None;
        for frame in 0..6000 {
            let report = session.tick(1.0 / 60.0, DriftInput::default());
            if report.crashed {
                crashed_at = Some(frame);
                assert_eq!(report.pose.speed, 0.0);
                break;
            }
        }
        assert!(crashed_at.is_some());

        let frozen = session.vehicle().clone();
        let report = session.tick(1.0 / 60.0, DriftInput::new(1.0, 1.0));
        assert_eq!(report.outcome, StepOutcome::AlreadyCrashed);
        assert!(report.crashed);
        assert_eq!(report.pose, VehiclePose::from(&frozen));

        let discarded = session.reset();
        assert!(!discarded.is_empty());
        assert!(!session.vehicle().crashed);
        assert_eq!(session.vehicle().distance, 0.0);
        assert_eq!(session.clock(), 0.0);
        let report = session.tick(1.0 / 60.0, DriftInput::default());
        assert_eq!(report.created[0], SegmentId(0));
    }

    #[test]
    fn test_camera_never_feeds_back_into_physics() {
        let mut with_camera = session(8);
        let mut reference = session(8);
        for frame in 0..300 {
            let (dt, input) = scripted_input(frame);
            with_camera.tick(dt, input);
            reference.tick(dt, input);
            // Yank one camera around; the vehicles must stay identical.
            with_camera.camera.snap_to(&VehicleState::default());
        }
        assert_eq!(with_camera.vehicle(), reference.vehicle());
    }

    #[test]
    fn test_disposals_are_reported_while_driving() {
        // The opening two segments are straights, so a straight-line driver
        // clears the first one before the first curve can crash it.
        let mut session = session(17);
        let mut disposed = Vec::new();
        let mut created = Vec::new();
        for _ in 0..6000 {
            let report = session.tick(1.0 / 60.0, DriftInput::default());
            created.extend(report.created);
            disposed.extend(report.disposed);
            if report.crashed {
                break;
            }
        }
        assert_eq!(disposed.first(), Some(&SegmentId(0)));
        for id in &disposed {
            assert!(created.contains(id));
        }
    }
}
