// Timing
pub const MIN_TICK_SECONDS: f32 = 0.001;
pub const MAX_TICK_SECONDS: f32 = 0.1; // anything slower is treated as a 100ms hitch

// Track layout
pub const BASE_HALF_WIDTH: f32 = 9.0;
pub const LOOK_AHEAD_DISTANCE: f32 = 420.0;
pub const BEHIND_MARGIN: f32 = 60.0;
pub const BOUNDARY_THICKNESS: f32 = 0.5;
pub const PRIME_SEGMENT_LIMIT: usize = 64;

// Progressive narrowing
pub const NARROWING_PER_INTERVAL: f32 = 0.8;
pub const NARROWING_INTERVAL: f32 = 1000.0;
pub const NARROWING_RAMP: f32 = 40.0;
pub const MIN_WIDTH_FRACTION: f32 = 0.35;
pub const LONG_STRAIGHT_NARROWING: f32 = 0.25;
pub const LONG_STRAIGHT_BELL_SIGMA: f32 = 0.12;

// Blueprint generation
pub const POINTS_PER_UNIT: f32 = 0.5;
pub const MIN_BLUEPRINT_STEPS: usize = 16;
pub const MAX_STEP_HEADING: f32 = 0.06;
pub const TURN_EASE_LENGTH: f32 = 24.0;
pub const SEAM_BLEND_POINTS: usize = 8;
pub const MIN_SPAN: f32 = 1e-4;

// Segment choice
pub const LONG_STRAIGHT_CHANCE: f32 = 0.2;
pub const EXTRA_STRAIGHT_CHANCE: f32 = 0.35;
pub const DIRECTION_FLIP_CHANCE: f32 = 0.15;
pub const S_CURVE_CHANCE: f32 = 0.12;
pub const GENTLE_THRESHOLD: f32 = 0.45;
pub const MEDIUM_THRESHOLD: f32 = 0.8;

// Disposal
pub const DISPOSAL_INTERVAL: f32 = 0.25;
pub const MAX_DISPOSALS_PER_FLUSH: usize = 2;

// Vehicle
pub const BASE_SPEED: f32 = 38.0;
pub const SPEED_STEP: f32 = 0.05;
pub const SPEED_MILESTONE: f32 = 500.0;
pub const MAX_SPEED_MULTIPLIER: f32 = 1.8;
pub const VEHICLE_HALF_WIDTH: f32 = 1.0;
pub const DRIFT_DEADZONE: f32 = 0.05;
pub const MAX_ANGULAR_VELOCITY: f32 = 1.3;
pub const MAX_DRIFT_ANGLE: f32 = 0.6;
pub const TURN_GROWTH_RATE: f32 = 1.6;
pub const TURN_DECAY_RATE: f32 = 0.6;
pub const TURN_STRENGTH_CAP: f32 = 1.0;
pub const TURN_EXPONENT: f32 = 1.6;
pub const DRIFT_SPEED_FACTOR: f32 = 0.93;
pub const IDLE_THROTTLE_FRACTION: f32 = 0.5;
pub const DRIFT_ENTER_TIME_CONSTANT: f32 = 0.12;
pub const DRIFT_EXIT_TIME_CONSTANT: f32 = 0.3;
pub const BLEND_DAMPING: f32 = 0.9;
pub const SPEED_TIME_CONSTANT: f32 = 0.6;
pub const GROUND_CLEARANCE: f32 = 0.35;
pub const VERTICAL_CORRECTION_RATE: f32 = 6.0;
pub const SAFE_FALLBACK_HEIGHT: f32 = 0.35;
pub const ORIENTATION_RATE: f32 = 6.0;
pub const MAX_PITCH: f32 = 0.35;

// Camera
pub const CAMERA_POSITION_TIME_CONSTANT: f32 = 0.25;
pub const CAMERA_YAW_TIME_CONSTANT: f32 = 0.35;
pub const CAMERA_TILT_TIME_CONSTANT: f32 = 0.4;

// Network sync
pub const SNAPSHOT_INTERVAL: f32 = 0.1; // 10 Hz
