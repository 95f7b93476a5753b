use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game_logic::math::{heading_forward, normalize_angle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriftPhase {
    #[default]
    NotDrifting,
    Drifting,
}

/// Kinematic and drift state of one locally simulated vehicle.
///
/// `heading` is the direction of travel. `drift_angle` only rotates the
/// rendered body on top of it.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    pub position: Vec3,
    pub heading: f32,
    pub angular_velocity: f32,
    pub target_angular_velocity: f32,
    pub drift_angle: f32,
    pub target_drift_angle: f32,
    pub speed: f32,
    /// Arc-length traveled along the track.
    pub distance: f32,
    pub crashed: bool,
    pub turn_strength: f32,
    pub phase: DriftPhase,
    pub roll: f32,
    pub pitch: f32,
}

impl VehicleState {
    pub fn render_yaw(&self) -> f32 {
        normalize_angle(self.heading + self.drift_angle)
    }

    pub fn forward_vector(&self) -> Vec3 {
        heading_forward(self.heading)
    }

    pub fn is_drifting(&self) -> bool {
        self.phase == DriftPhase::Drifting
    }
}

/// Player input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftInput {
    /// -1 is a full left drift, 1 a full right drift.
    pub steer: f32,
    pub throttle: f32,
}

impl Default for DriftInput {
    fn default() -> Self {
        Self {
            steer: 0.0,
            throttle: 1.0,
        }
    }
}

impl DriftInput {
    pub fn new(steer: f32, throttle: f32) -> Self {
        Self { steer, throttle }
    }

    pub fn intensity(&self) -> f32 {
        if self.steer.is_finite() {
            self.steer.abs().min(1.0)
        } else {
            0.0
        }
    }

    pub fn direction(&self) -> f32 {
        if self.steer > 0.0 {
            1.0
        } else if self.steer < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    pub fn throttle(&self) -> f32 {
        if self.throttle.is_finite() {
            self.throttle.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_is_sanitized() {
        let input = DriftInput::new(-3.0, 2.0);
        assert_eq!(input.intensity(), 1.0);
        assert_eq!(input.direction(), -1.0);
        assert_eq!(input.throttle(), 1.0);

        let garbage = DriftInput::new(f32::NAN, f32::NAN);
        assert_eq!(garbage.intensity(), 0.0);
        assert_eq!(garbage.direction(), 0.0);
        assert_eq!(garbage.throttle(), 0.0);
    }

    #[test]
    fn test_render_yaw_adds_drift() {
        let state = VehicleState {
            heading: 3.0,
            drift_angle: 0.5,
            ..Default::default()
        };
        assert!(state.render_yaw() < 0.0);
        assert!((state.render_yaw() - (3.5 - std::f32::consts::TAU)).abs() < 1e-5);
    }
}
