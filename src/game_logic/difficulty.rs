// src/game_logic/difficulty.rs
use bevy::prelude::*;

use crate::game_logic::config::VehicleConfig;

/// Distance-gated speed target. The further the run, the faster the car.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SpeedProgression {
    pub base_speed: f32,
    pub step: f32,
    pub milestone: f32,
    pub max_multiplier: f32,
}

impl Default for SpeedProgression {
    fn default() -> Self {
        Self::from_config(&VehicleConfig::default())
    }
}

impl SpeedProgression {
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self {
            base_speed: config.base_speed,
            step: config.speed_step,
            milestone: config.speed_milestone,
            max_multiplier: config.max_speed_multiplier,
        }
    }

    /// Number of milestones passed at `distance`.
    pub fn milestone_index(&self, distance: f32) -> u32 {
        (distance.max(0.0) / self.milestone).floor() as u32
    }

    pub fn multiplier(&self, distance: f32) -> f32 {
        (1.0 + self.step * self.milestone_index(distance) as f32).min(self.max_multiplier)
    }

    pub fn target_speed(&self, distance: f32) -> f32 {
        self.base_speed * self.multiplier(distance)
    }
}
