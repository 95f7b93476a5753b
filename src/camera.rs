use bevy::prelude::*;

use crate::game_logic::{
    CAMERA_POSITION_TIME_CONSTANT, CAMERA_TILT_TIME_CONSTANT, CAMERA_YAW_TIME_CONSTANT,
    VehicleState, exp_blend, heading_forward, lerp_angle,
};

// Chase offsets, world units
pub const CHASE_DISTANCE: f32 = 9.0;
pub const CHASE_HEIGHT: f32 = 4.0;

/// Camera transform derived from the rig, ready for a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub focus: Vec3,
    pub yaw: f32,
    pub roll: f32,
    pub pitch: f32,
}

/// Smoothed follow camera. Reads the vehicle, never writes to it.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct CameraRig {
    pub focus: Vec3,
    pub yaw: f32,
    pub roll: f32,
    pub pitch: f32,
    attached: bool,
}

impl CameraRig {
    pub fn snap_to(&mut self, state: &VehicleState) {
        self.focus = state.position;
        self.yaw = state.render_yaw();
        self.roll = state.roll;
        self.pitch = state.pitch;
        self.attached = true;
    }

    // Follows the rendered yaw so drifts swing the view.
    pub fn follow(&mut self, state: &VehicleState, dt: f32) {
        if !self.attached {
            self.snap_to(state);
            return;
        }

        let position_blend = exp_blend(dt, CAMERA_POSITION_TIME_CONSTANT);
        let yaw_blend = exp_blend(dt, CAMERA_YAW_TIME_CONSTANT);
        let tilt_blend = exp_blend(dt, CAMERA_TILT_TIME_CONSTANT);

        self.focus = self.focus.lerp(state.position, position_blend);
        self.yaw = lerp_angle(self.yaw, state.render_yaw(), yaw_blend);
        self.roll += (state.roll - self.roll) * tilt_blend;
        self.pitch += (state.pitch - self.pitch) * tilt_blend;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.focus - heading_forward(self.yaw) * CHASE_DISTANCE + Vec3::Y * CHASE_HEIGHT,
            focus: self.focus,
            yaw: self.yaw,
            roll: self.roll,
            pitch: self.pitch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_follow_snaps() {
        let mut rig = CameraRig::default();
        let state = VehicleState {
            position: Vec3::new(10.0, 1.0, -3.0),
            heading: 0.4,
            ..Default::default()
        };
        rig.follow(&state, 1.0 / 60.0);
        assert_eq!(rig.focus, state.position);
        assert_eq!(rig.yaw, 0.4);
    }

    #[test]
    fn test_follow_lags_then_converges() {
        let mut rig = CameraRig::default();
        let mut state = VehicleState::default();
        rig.snap_to(&state);

        state.position = Vec3::new(20.0, 0.0, 0.0);
        state.heading = 1.0;
        let before = state.clone();
        rig.follow(&state, 1.0 / 60.0);
        assert!(rig.focus.x > 0.0 && rig.focus.x < 20.0);
        assert!(rig.yaw > 0.0 && rig.yaw < 1.0);
        assert_eq!(state, before);

        for _ in 0..600 {
            rig.follow(&state, 1.0 / 60.0);
        }
        assert!(rig.focus.distance(state.position) < 1e-3);
        assert!((rig.yaw - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_eye_sits_behind_and_above() {
        let mut rig = CameraRig::default();
        rig.snap_to(&VehicleState::default());
        let pose = rig.pose();
        assert!((pose.eye - Vec3::new(-CHASE_DISTANCE, CHASE_HEIGHT, 0.0)).length() < 1e-5);
    }
}
