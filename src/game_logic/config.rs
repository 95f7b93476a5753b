use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game_logic::blueprint::SegmentKind;
use crate::game_logic::constants::*;
use crate::game_logic::error::ConfigError;

/// Tunables for track generation, streaming and boundary checks.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub base_half_width: f32,
    pub look_ahead: f32,
    pub behind_margin: f32,
    pub boundary_thickness: f32,
    /// Width multiplier applied once per `narrowing_interval` of distance.
    pub narrowing_per_interval: f32,
    pub narrowing_interval: f32,
    pub narrowing_ramp: f32,
    pub min_width_fraction: f32,
    pub long_straight_narrowing: f32,
    pub disposal_interval: f32,
    pub max_disposals_per_flush: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            base_half_width: BASE_HALF_WIDTH,
            look_ahead: LOOK_AHEAD_DISTANCE,
            behind_margin: BEHIND_MARGIN,
            boundary_thickness: BOUNDARY_THICKNESS,
            narrowing_per_interval: NARROWING_PER_INTERVAL,
            narrowing_interval: NARROWING_INTERVAL,
            narrowing_ramp: NARROWING_RAMP,
            min_width_fraction: MIN_WIDTH_FRACTION,
            long_straight_narrowing: LONG_STRAIGHT_NARROWING,
            disposal_interval: DISPOSAL_INTERVAL,
            max_disposals_per_flush: MAX_DISPOSALS_PER_FLUSH,
        }
    }
}

impl TrackConfig {
    /// Smallest half-width the generator can ever produce.
    pub fn narrowest_half_width(&self) -> f32 {
        let local =
            (1.0 - self.long_straight_narrowing).min(SegmentKind::narrowest_width_multiplier());
        self.base_half_width * self.min_width_fraction * local
    }

    fn validate(&self) -> Result<(), ConfigError> {
        min_violation("track.base_half_width", 0.5, self.base_half_width)?;
        min_violation("track.look_ahead", 1.0, self.look_ahead)?;
        min_violation("track.behind_margin", 0.0, self.behind_margin)?;
        min_violation("track.boundary_thickness", 0.0, self.boundary_thickness)?;
        range_violation("track.narrowing_per_interval", 0.01, 1.0, self.narrowing_per_interval)?;
        min_violation("track.narrowing_interval", 1.0, self.narrowing_interval)?;
        range_violation(
            "track.narrowing_ramp",
            0.0,
            self.narrowing_interval,
            self.narrowing_ramp,
        )?;
        range_violation("track.min_width_fraction", 0.05, 1.0, self.min_width_fraction)?;
        range_violation(
            "track.long_straight_narrowing",
            0.0,
            0.9,
            self.long_straight_narrowing,
        )?;
        min_violation("track.disposal_interval", 0.0, self.disposal_interval)?;
        min_violation(
            "track.max_disposals_per_flush",
            1.0,
            self.max_disposals_per_flush as f32,
        )?;
        Ok(())
    }
}

/// Tunables for the vehicle integrator.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub base_speed: f32,
    /// Fractional speed gain per `speed_milestone` of distance.
    pub speed_step: f32,
    pub speed_milestone: f32,
    pub max_speed_multiplier: f32,
    pub half_width: f32,
    pub drift_deadzone: f32,
    pub max_angular_velocity: f32,
    pub max_drift_angle: f32,
    pub turn_growth_rate: f32,
    pub turn_decay_rate: f32,
    pub turn_strength_cap: f32,
    pub turn_exponent: f32,
    pub drift_speed_factor: f32,
    pub enter_time_constant: f32,
    pub exit_time_constant: f32,
    pub blend_damping: f32,
    pub speed_time_constant: f32,
    pub ground_clearance: f32,
    pub vertical_correction_rate: f32,
    pub orientation_rate: f32,
    pub max_pitch: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            base_speed: BASE_SPEED,
            speed_step: SPEED_STEP,
            speed_milestone: SPEED_MILESTONE,
            max_speed_multiplier: MAX_SPEED_MULTIPLIER,
            half_width: VEHICLE_HALF_WIDTH,
            drift_deadzone: DRIFT_DEADZONE,
            max_angular_velocity: MAX_ANGULAR_VELOCITY,
            max_drift_angle: MAX_DRIFT_ANGLE,
            turn_growth_rate: TURN_GROWTH_RATE,
            turn_decay_rate: TURN_DECAY_RATE,
            turn_strength_cap: TURN_STRENGTH_CAP,
            turn_exponent: TURN_EXPONENT,
            drift_speed_factor: DRIFT_SPEED_FACTOR,
            enter_time_constant: DRIFT_ENTER_TIME_CONSTANT,
            exit_time_constant: DRIFT_EXIT_TIME_CONSTANT,
            blend_damping: BLEND_DAMPING,
            speed_time_constant: SPEED_TIME_CONSTANT,
            ground_clearance: GROUND_CLEARANCE,
            vertical_correction_rate: VERTICAL_CORRECTION_RATE,
            orientation_rate: ORIENTATION_RATE,
            max_pitch: MAX_PITCH,
        }
    }
}

impl VehicleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        min_violation("vehicle.base_speed", 0.0, self.base_speed)?;
        min_violation("vehicle.speed_step", 0.0, self.speed_step)?;
        min_violation("vehicle.speed_milestone", 1.0, self.speed_milestone)?;
        min_violation("vehicle.max_speed_multiplier", 1.0, self.max_speed_multiplier)?;
        min_violation("vehicle.half_width", 0.0, self.half_width)?;
        range_violation("vehicle.drift_deadzone", 0.0, 0.95, self.drift_deadzone)?;
        min_violation("vehicle.max_angular_velocity", 0.0, self.max_angular_velocity)?;
        range_violation(
            "vehicle.max_drift_angle",
            0.0,
            std::f32::consts::FRAC_PI_2,
            self.max_drift_angle,
        )?;
        min_violation("vehicle.turn_growth_rate", 0.0, self.turn_growth_rate)?;
        min_violation("vehicle.turn_decay_rate", 0.0, self.turn_decay_rate)?;
        min_violation("vehicle.turn_strength_cap", 0.0, self.turn_strength_cap)?;
        min_violation("vehicle.turn_exponent", 1.0, self.turn_exponent)?;
        range_violation("vehicle.drift_speed_factor", 0.0, 1.0, self.drift_speed_factor)?;
        min_violation("vehicle.enter_time_constant", 0.001, self.enter_time_constant)?;
        min_violation("vehicle.exit_time_constant", 0.001, self.exit_time_constant)?;
        range_violation("vehicle.blend_damping", 0.01, 1.0, self.blend_damping)?;
        min_violation("vehicle.speed_time_constant", 0.001, self.speed_time_constant)?;
        min_violation("vehicle.ground_clearance", 0.0, self.ground_clearance)?;
        min_violation(
            "vehicle.vertical_correction_rate",
            0.0,
            self.vertical_correction_rate,
        )?;
        min_violation("vehicle.orientation_rate", 0.0, self.orientation_rate)?;
        range_violation(
            "vehicle.max_pitch",
            0.0,
            std::f32::consts::FRAC_PI_2,
            self.max_pitch,
        )?;
        Ok(())
    }
}

/// Everything a drift session needs, loadable from JSON.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub track: TrackConfig,
    pub vehicle: VehicleConfig,
    pub snapshot_interval: Option<f32>,
}

impl DriftConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DriftConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn snapshot_interval(&self) -> f32 {
        self.snapshot_interval.unwrap_or(SNAPSHOT_INTERVAL)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.track.validate()?;
        self.vehicle.validate()?;
        if let Some(interval) = self.snapshot_interval {
            min_violation("snapshot_interval", 0.001, interval)?;
        }

        let required = self.vehicle.half_width + self.track.boundary_thickness;
        let narrowest = self.track.narrowest_half_width();
        if narrowest <= required {
            return Err(ConfigError::TrackTooNarrow {
                narrowest,
                required,
            });
        }
        Ok(())
    }
}

fn min_violation(field: &'static str, min: f32, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ConfigError::MinViolation { field, min, value })
    }
}

fn range_violation(field: &'static str, min: f32, max: f32, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}
