pub mod blueprint;
pub mod collisions;
pub mod components;
pub mod config;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod math;
pub mod physics;
pub mod planner;
pub mod random;
pub mod segment;
pub mod surface;
pub mod track;

pub use blueprint::*;
pub use collisions::*;
pub use components::*;
pub use config::*;
pub use constants::*;
pub use difficulty::*;
pub use error::*;
pub use math::*;
pub use physics::*;
pub use planner::*;
pub use random::*;
pub use segment::*;
pub use surface::*;
pub use track::*;
