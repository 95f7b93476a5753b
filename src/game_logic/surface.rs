use bevy::prelude::*;

use crate::game_logic::segment::SegmentId;

/// Track frame at one arc-length. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub segment: SegmentId,
    pub distance: f32,
    pub position: Vec3,
    /// Unit tangent, including the vertical slope.
    pub forward: Vec3,
    /// Unit vector from the left edge to the right edge, including banking.
    pub right: Vec3,
    pub half_width: f32,
    pub heading: f32,
}

/// Result of testing a vehicle footprint against the track edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsCheck {
    pub segment: SegmentId,
    /// Signed distance from the centerline, positive to the right.
    pub lateral_offset: f32,
    /// Ground-plane distance to the closest edge, negative once outside.
    pub edge_distance: f32,
    pub in_bounds: bool,
}

/// Read-only view of a drivable surface.
pub trait TrackSurface {
    /// `None` only while there is no geometry at all.
    fn sample_at(&self, distance: f32) -> Option<Sample>;

    fn check_bounds(&self, position: Vec3, vehicle_half_width: f32) -> Option<BoundsCheck>;
}
