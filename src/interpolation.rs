use bevy::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::game_logic::{SNAPSHOT_INTERVAL, lerp_angle};
use crate::networking::{SyncMessage, VehicleSnapshot};

const MIN_DELAY: f32 = 0.05;
const MAX_DELAY: f32 = 0.4;
const INTERVAL_GAIN: f32 = 0.125;
const DEVIATION_GAIN: f32 = 0.25;
const JITTER_MARGIN: f32 = 2.0;
const UNDERRUN_ALPHA: f32 = 0.99;
const UNDERRUN_STEP: f32 = 0.01;
const SETTLE_RATE: f32 = 0.05;

/// How far behind the newest snapshot remote vehicles are drawn.
///
/// Tracks a smoothed snapshot interval and its mean deviation. The target
/// delay is one and a half intervals plus a margin for jitter, so at the
/// default 10 Hz feed a quiet link settles at 0.15 s.
#[derive(Resource, Debug, Clone)]
pub struct InterpolationDelay {
    pub delay: f32,
    mean_interval: f32,
    deviation: f32,
}

impl Default for InterpolationDelay {
    fn default() -> Self {
        Self {
            delay: SNAPSHOT_INTERVAL * 1.5,
            mean_interval: SNAPSHOT_INTERVAL,
            deviation: 0.0,
        }
    }
}

impl InterpolationDelay {
    pub fn record_packet_interval(&mut self, interval: f32) {
        if !interval.is_finite() || interval <= 0.0 {
            return;
        }
        let error = interval - self.mean_interval;
        self.mean_interval += INTERVAL_GAIN * error;
        self.deviation += DEVIATION_GAIN * (error.abs() - self.deviation);
    }

    pub fn mean_interval(&self) -> f32 {
        self.mean_interval
    }

    pub fn target(&self) -> f32 {
        (self.mean_interval * 1.5 + JITTER_MARGIN * self.deviation).clamp(MIN_DELAY, MAX_DELAY)
    }

    /// Called once per frame with the average interpolation alpha.
    ///
    /// An alpha pinned at the newest snapshot means the buffer ran dry and the
    /// delay backs off right away. Otherwise it eases toward the target.
    pub fn adjust(&mut self, alpha: f32) {
        if alpha >= UNDERRUN_ALPHA {
            self.delay += UNDERRUN_STEP;
        } else {
            self.delay += (self.target() - self.delay) * SETTLE_RATE;
        }
        self.delay = self.delay.clamp(MIN_DELAY, MAX_DELAY);
    }
}

/// Display pose of a remote vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePose {
    pub position: Vec3,
    pub yaw: f32,
    pub distance: f32,
    pub crashed: bool,
    /// Where between the two buffered snapshots this pose was taken.
    pub alpha: f32,
}

// Buffers the two most recent snapshots of one remote vehicle
#[derive(Component, Debug, Clone)]
pub struct RemoteVehicle {
    pub player_id: u32,
    previous: Option<VehicleSnapshot>,
    current: Option<VehicleSnapshot>,
}

impl RemoteVehicle {
    pub fn new(player_id: u32) -> Self {
        Self {
            player_id,
            previous: None,
            current: None,
        }
    }

    /// Buffer a snapshot. Out-of-order and duplicate snapshots are dropped.
    /// Returns the gap to the previous snapshot when one was accepted.
    pub fn push(&mut self, snapshot: VehicleSnapshot) -> Option<f32> {
        match &self.current {
            Some(current) if snapshot.sequence <= current.sequence => {
                debug!(
                    player = self.player_id,
                    sequence = snapshot.sequence,
                    "dropping stale snapshot"
                );
                None
            }
            Some(current) => {
                let gap = snapshot.timestamp - current.timestamp;
                self.previous = self.current.replace(snapshot);
                Some(gap)
            }
            None => {
                self.current = Some(snapshot);
                Some(0.0)
            }
        }
    }

    /// True once two snapshots are buffered.
    pub fn is_interpolating(&self) -> bool {
        self.previous.is_some()
    }

    pub fn pose_at(&self, render_time: f32) -> Option<RemotePose> {
        let current = self.current.as_ref()?;
        let Some(previous) = self.previous.as_ref() else {
            return Some(RemotePose {
                position: current.position(),
                yaw: current.yaw,
                distance: current.distance,
                crashed: current.crashed,
                alpha: 1.0,
            });
        };

        let span = current.timestamp - previous.timestamp;
        let alpha = if span > 0.0 {
            ((render_time - previous.timestamp) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Some(RemotePose {
            position: previous.position().lerp(current.position(), alpha),
            yaw: lerp_angle(previous.yaw, current.yaw, alpha),
            distance: previous.distance + (current.distance - previous.distance) * alpha,
            crashed: if alpha >= 1.0 {
                current.crashed
            } else {
                previous.crashed
            },
            alpha,
        })
    }
}

/// Every other vehicle in the room, keyed by player id.
#[derive(Resource, Debug, Clone)]
pub struct RemoteRoom {
    pub local_player: u32,
    pub delay: InterpolationDelay,
    vehicles: HashMap<u32, RemoteVehicle>,
}

impl RemoteRoom {
    pub fn new(local_player: u32) -> Self {
        Self {
            local_player,
            delay: InterpolationDelay::default(),
            vehicles: HashMap::new(),
        }
    }

    pub fn apply(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::Snapshot(snapshot) => self.accept(snapshot),
            SyncMessage::RoomSnapshots(snapshots) => {
                for snapshot in snapshots {
                    self.accept(snapshot);
                }
            }
        }
    }

    fn accept(&mut self, snapshot: VehicleSnapshot) {
        // The local car is simulated, never interpolated.
        if snapshot.player_id == self.local_player {
            return;
        }
        let vehicle = self
            .vehicles
            .entry(snapshot.player_id)
            .or_insert_with(|| RemoteVehicle::new(snapshot.player_id));
        if let Some(gap) = vehicle.push(snapshot) {
            self.delay.record_packet_interval(gap);
        }
    }

    pub fn remove(&mut self, player_id: u32) -> Option<RemoteVehicle> {
        self.vehicles.remove(&player_id)
    }

    pub fn vehicle(&self, player_id: u32) -> Option<&RemoteVehicle> {
        self.vehicles.get(&player_id)
    }

    /// Poses of all remote vehicles at `now` minus the adaptive delay.
    pub fn poses(&mut self, now: f32) -> Vec<(u32, RemotePose)> {
        let render_time = now - self.delay.delay;
        let mut poses = Vec::with_capacity(self.vehicles.len());
        let mut alpha_sum = 0.0;
        let mut interpolating = 0;
        for (id, vehicle) in &self.vehicles {
            let Some(pose) = vehicle.pose_at(render_time) else {
                continue;
            };
            if vehicle.is_interpolating() {
                alpha_sum += pose.alpha;
                interpolating += 1;
            }
            poses.push((*id, pose));
        }
        // One shared delay, one adjustment per frame.
        if interpolating > 0 {
            self.delay.adjust(alpha_sum / interpolating as f32);
        }
        poses.sort_by_key(|(id, _)| *id);
        poses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(player_id: u32, sequence: u64, timestamp: f32, x: f32, yaw: f32) -> VehicleSnapshot {
        VehicleSnapshot {
            player_id,
            sequence,
            timestamp,
            x,
            y: 0.0,
            z: 0.0,
            yaw,
            distance: x,
            crashed: false,
        }
    }

    #[test]
    fn test_pose_is_between_buffered_states() {
        let mut remote = RemoteVehicle::new(2);
        remote.push(snapshot(2, 0, 1.0, 0.0, 0.0));
        remote.push(snapshot(2, 1, 1.1, 10.0, 0.2));

        let pose = remote.pose_at(1.05).expect("two snapshots buffered");
        assert!((pose.position.x - 5.0).abs() < 1e-4);
        assert!((pose.yaw - 0.1).abs() < 1e-5);
        assert!((pose.distance - 5.0).abs() < 1e-4);

        let late = remote.pose_at(5.0).expect("two snapshots buffered");
        assert!((late.position.x - 10.0).abs() < 1e-5);
        let early = remote.pose_at(0.0).expect("two snapshots buffered");
        assert_eq!(early.position.x, 0.0);
    }

    #[test]
    fn test_stale_snapshots_are_dropped() {
        let mut remote = RemoteVehicle::new(2);
        assert!(remote.push(snapshot(2, 5, 1.0, 0.0, 0.0)).is_some());
        assert!(remote.push(snapshot(2, 4, 0.9, 99.0, 0.0)).is_none());
        assert!(remote.push(snapshot(2, 5, 1.0, 99.0, 0.0)).is_none());
        let pose = remote.pose_at(1.0).expect("one snapshot buffered");
        assert_eq!(pose.position.x, 0.0);
    }

    #[test]
    fn test_room_skips_local_player() {
        let mut room = RemoteRoom::new(1);
        room.apply(SyncMessage::RoomSnapshots(vec![
            snapshot(1, 0, 0.0, 0.0, 0.0),
            snapshot(3, 0, 0.0, 4.0, 0.0),
        ]));
        assert!(room.vehicle(1).is_none());
        assert!(room.vehicle(3).is_some());
        let poses = room.poses(1.0);
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].0, 3);
    }

    #[test]
    fn test_quiet_link_settles_at_one_and_a_half_intervals() {
        let mut delay = InterpolationDelay::default();
        for _ in 0..500 {
            delay.record_packet_interval(SNAPSHOT_INTERVAL);
            delay.adjust(0.5);
        }
        assert!((delay.delay - 0.15).abs() < 1e-3);
        assert!((delay.mean_interval() - SNAPSHOT_INTERVAL).abs() < 1e-5);
    }

    #[test]
    fn test_jitter_raises_the_delay() {
        let mut steady = InterpolationDelay::default();
        let mut jittery = InterpolationDelay::default();
        for i in 0..2000 {
            steady.record_packet_interval(0.1);
            jittery.record_packet_interval(if i % 2 == 0 { 0.05 } else { 0.15 });
            steady.adjust(0.5);
            jittery.adjust(0.5);
        }
        assert!((jittery.mean_interval() - 0.1).abs() < 0.01);
        assert!(jittery.delay > steady.delay + 0.05);
    }

    #[test]
    fn test_underrun_backs_off_at_once() {
        let mut delay = InterpolationDelay::default();
        let before = delay.delay;
        delay.adjust(1.0);
        assert!((delay.delay - (before + UNDERRUN_STEP)).abs() < 1e-6);
    }

    #[test]
    fn test_room_adjusts_delay_once_per_frame() {
        let mut solo = RemoteRoom::new(0);
        let mut crowd = RemoteRoom::new(0);
        solo.apply(SyncMessage::Snapshot(snapshot(1, 0, 1.0, 0.0, 0.0)));
        solo.apply(SyncMessage::Snapshot(snapshot(1, 1, 1.1, 5.0, 0.0)));
        for player in 1..=4 {
            crowd.apply(SyncMessage::Snapshot(snapshot(player, 0, 1.0, 0.0, 0.0)));
            crowd.apply(SyncMessage::Snapshot(snapshot(player, 1, 1.1, 5.0, 0.0)));
        }

        // Far past the newest snapshot, so every frame is an underrun.
        for frame in 0..3 {
            let now = 5.0 + frame as f32;
            assert_eq!(solo.poses(now).len(), 1);
            assert_eq!(crowd.poses(now).len(), 4);
        }
        assert_eq!(solo.delay.delay, crowd.delay.delay);
        assert!((solo.delay.delay - (0.15 + 3.0 * UNDERRUN_STEP)).abs() < 1e-5);
    }

    #[test]
    fn test_lone_snapshots_leave_delay_alone() {
        let mut room = RemoteRoom::new(0);
        room.apply(SyncMessage::Snapshot(snapshot(2, 0, 1.0, 0.0, 0.0)));
        let before = room.delay.delay;
        let poses = room.poses(9.0);
        assert_eq!(poses.len(), 1);
        assert!(room.vehicle(2).is_some_and(|v| !v.is_interpolating()));
        assert_eq!(room.delay.delay, before);
    }

    #[test]
    fn test_delay_stays_in_bounds() {
        let mut delay = InterpolationDelay::default();
        for _ in 0..1000 {
            delay.record_packet_interval(0.5);
            delay.adjust(1.0);
        }
        assert!(delay.delay <= MAX_DELAY);
        for _ in 0..5000 {
            delay.record_packet_interval(0.01);
            delay.adjust(0.0);
        }
        assert!(delay.delay >= MIN_DELAY);
        assert!(delay.delay < 0.1);
    }
}
