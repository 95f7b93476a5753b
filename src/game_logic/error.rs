use thiserror::Error;

/// Errors raised when a drift configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be at least {min:.3} (got {value:.3})")]
    MinViolation {
        field: &'static str,
        min: f32,
        value: f32,
    },

    #[error("{field} must be between {min:.3} and {max:.3} (got {value:.3})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },

    /// The narrowest the track can ever get leaves no room for the vehicle.
    #[error("narrowest track half-width {narrowest:.3} cannot fit a vehicle needing {required:.3}")]
    TrackTooNarrow { narrowest: f32, required: f32 },
}

/// Errors raised while decoding network snapshots.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed snapshot payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
