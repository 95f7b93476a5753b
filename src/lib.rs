pub mod camera;
pub mod game_logic;
pub mod interpolation;
pub mod networking;
pub mod session;

pub use session::{DriftSession, TickReport, VehiclePose};
