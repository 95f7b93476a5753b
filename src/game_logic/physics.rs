use bevy::prelude::*;
use tracing::{debug, info, warn};

use crate::game_logic::components::{DriftInput, DriftPhase, VehicleState};
use crate::game_logic::config::VehicleConfig;
use crate::game_logic::constants::{
    IDLE_THROTTLE_FRACTION, MAX_TICK_SECONDS, MIN_TICK_SECONDS, SAFE_FALLBACK_HEIGHT,
};
use crate::game_logic::difficulty::SpeedProgression;
use crate::game_logic::math::{approach, exp_blend, normalize_angle};
use crate::game_logic::surface::{BoundsCheck, TrackSurface};

/// What happened during one vehicle tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Moved,
    Crashed(BoundsCheck),
    AlreadyCrashed,
    NoTrack,
}

/// Clamp a frame delta into the range the integrator is stable for.
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(MIN_TICK_SECONDS, MAX_TICK_SECONDS)
    } else {
        MIN_TICK_SECONDS
    }
}

/// Integrates one vehicle over whatever surface it is driving on.
#[derive(Resource, Debug, Clone, Default)]
pub struct VehicleDynamics {
    config: VehicleConfig,
    progression: SpeedProgression,
}

impl VehicleDynamics {
    pub fn new(config: VehicleConfig) -> Self {
        let progression = SpeedProgression::from_config(&config);
        Self {
            config,
            progression,
        }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn progression(&self) -> &SpeedProgression {
        &self.progression
    }

    /// Place a fresh vehicle at the start of the surface, already at speed.
    pub fn spawn<S: TrackSurface + ?Sized>(&self, surface: &S) -> Option<VehicleState> {
        let sample = surface.sample_at(0.0)?;
        Some(VehicleState {
            position: sample.position + Vec3::Y * self.config.ground_clearance,
            heading: sample.heading,
            speed: self.progression.target_speed(0.0),
            distance: sample.distance,
            ..Default::default()
        })
    }

    /// Advance `state` by one tick.
    pub fn step<S: TrackSurface + ?Sized>(
        &self,
        state: &mut VehicleState,
        input: &DriftInput,
        dt: f32,
        surface: &S,
    ) -> StepOutcome {
        if state.crashed {
            return StepOutcome::AlreadyCrashed;
        }
        if surface.sample_at(state.distance).is_none() {
            return StepOutcome::NoTrack;
        }
        let dt = clamp_dt(dt);
        let config = &self.config;

        // Drift state
        let intensity = input.intensity();
        let drifting = intensity > config.drift_deadzone;
        let phase = if drifting {
            DriftPhase::Drifting
        } else {
            DriftPhase::NotDrifting
        };
        if phase != state.phase {
            debug!(?phase, distance = state.distance, "drift phase changed");
            state.phase = phase;
        }

        let throttle_scale = IDLE_THROTTLE_FRACTION + (1.0 - IDLE_THROTTLE_FRACTION) * input.throttle();
        let mut target_speed = self.progression.target_speed(state.distance) * throttle_scale;

        if drifting {
            state.turn_strength =
                (state.turn_strength + config.turn_growth_rate * dt).min(config.turn_strength_cap);
            let shaped = state.turn_strength.powf(config.turn_exponent) * intensity * input.direction();
            state.target_angular_velocity = config.max_angular_velocity * shaped;
            state.target_drift_angle = config.max_drift_angle * shaped;
            target_speed *= config.drift_speed_factor;
        } else {
            state.turn_strength = (state.turn_strength - config.turn_decay_rate * dt).max(0.0);
            state.target_angular_velocity = 0.0;
            state.target_drift_angle = 0.0;
        }

        let time_constant = if drifting {
            config.enter_time_constant
        } else {
            config.exit_time_constant
        };
        state.angular_velocity = approach(
            state.angular_velocity,
            state.target_angular_velocity,
            dt,
            time_constant,
            config.blend_damping,
        );
        state.drift_angle = approach(
            state.drift_angle,
            state.target_drift_angle,
            dt,
            time_constant,
            config.blend_damping,
        );
        state.speed = approach(
            state.speed,
            target_speed,
            dt,
            config.speed_time_constant,
            config.blend_damping,
        )
        .max(0.0);

        // Integrate
        let milestone_before = self.progression.milestone_index(state.distance);
        state.heading = normalize_angle(state.heading + state.angular_velocity * dt);
        let travel = state.speed * dt;
        state.position += state.forward_vector() * travel;
        state.distance += travel;

        let milestone_after = self.progression.milestone_index(state.distance);
        if milestone_after > milestone_before {
            info!(
                milestone = milestone_after,
                target_speed = self.progression.target_speed(state.distance),
                "speed milestone reached"
            );
        }

        // Align to the surface
        if let Some(sample) = surface.sample_at(state.distance) {
            let target_height = sample.position.y + config.ground_clearance;
            let correction = (config.vertical_correction_rate * dt).min(1.0);
            state.position.y += (target_height - state.position.y) * correction;

            let roll_target = sample.right.y.clamp(-1.0, 1.0).asin();
            let run = Vec2::new(sample.forward.x, sample.forward.z).length();
            let pitch_target = sample
                .forward
                .y
                .atan2(run)
                .clamp(-config.max_pitch, config.max_pitch);
            let blend = exp_blend(dt, 1.0 / config.orientation_rate.max(f32::EPSILON));
            state.roll += (roll_target - state.roll) * blend;
            state.pitch += (pitch_target - state.pitch) * blend;
        }

        if !state.position.y.is_finite() {
            warn!(distance = state.distance, "non-finite vehicle height, using fallback");
            state.position.y = SAFE_FALLBACK_HEIGHT;
        }

        if let Some(check) = surface.check_bounds(state.position, config.half_width) {
            if !check.in_bounds {
                state.crashed = true;
                state.speed = 0.0;
                state.angular_velocity = 0.0;
                state.target_angular_velocity = 0.0;
                info!(
                    distance = state.distance,
                    lateral = check.lateral_offset,
                    segment = check.segment.0,
                    "vehicle left the track"
                );
                return StepOutcome::Crashed(check);
            }
        }

        StepOutcome::Moved
    }
}
