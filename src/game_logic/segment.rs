use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game_logic::blueprint::{SegmentKind, SegmentParams};
use crate::game_logic::collisions::{closest_on_span, distance_to_polyline};
use crate::game_logic::constants::MIN_SPAN;
use crate::game_logic::math::{
    ground, heading_forward, heading_right, lerp_angle, normalize_or_fallback,
};
use crate::game_logic::surface::Sample;

/// Stable handle the rendering side uses to refer to a segment's meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// One placed piece of track in world space. Immutable once published.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub params: SegmentParams,
    pub centerline: Vec<Vec3>,
    pub left_edge: Vec<Vec3>,
    pub right_edge: Vec<Vec3>,
    pub half_widths: Vec<f32>,
    pub headings: Vec<f32>,
    /// Cumulative centerline length from the first point.
    pub arc_lengths: Vec<f32>,
    pub start_distance: f32,
    pub end_distance: f32,
    pub start_heading: f32,
    pub end_heading: f32,
}

/// Closest point on a segment's centerline in the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct CenterlineHit {
    pub distance: f32,
    /// Positive when the query point lies right of the centerline.
    pub lateral: f32,
    pub half_width: f32,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.end_distance - self.start_distance
    }

    pub fn first_point(&self) -> Vec3 {
        self.centerline[0]
    }

    pub fn last_point(&self) -> Vec3 {
        self.centerline[self.centerline.len() - 1]
    }

    /// Span index and interpolation factor for a distance local to this segment.
    fn locate(&self, local: f32) -> (usize, f32) {
        let last_span = self.arc_lengths.len().saturating_sub(2);
        let index = self
            .arc_lengths
            .partition_point(|&a| a <= local)
            .saturating_sub(1)
            .min(last_span);
        let span = (self.arc_lengths[index + 1] - self.arc_lengths[index]).max(MIN_SPAN);
        let t = ((local - self.arc_lengths[index]) / span).clamp(0.0, 1.0);
        (index, t)
    }

    /// Interpolate the track frame at a global arc-length. Distances outside
    /// the segment clamp to its ends.
    pub fn sample(&self, distance: f32) -> Sample {
        let local = (distance - self.start_distance).clamp(0.0, self.length());
        let (i, t) = self.locate(local);

        let heading = lerp_angle(self.headings[i], self.headings[i + 1], t);
        let position = self.centerline[i].lerp(self.centerline[i + 1], t);
        let forward = normalize_or_fallback(
            self.centerline[i + 1] - self.centerline[i],
            heading_forward(heading),
        );
        let across_a = self.right_edge[i] - self.left_edge[i];
        let across_b = self.right_edge[i + 1] - self.left_edge[i + 1];
        let right = normalize_or_fallback(across_a.lerp(across_b, t), heading_right(heading));
        let half_width = self.half_widths[i] + (self.half_widths[i + 1] - self.half_widths[i]) * t;

        Sample {
            segment: self.id,
            distance: self.start_distance + local,
            position,
            forward,
            right,
            half_width,
            heading,
        }
    }

    pub fn closest_centerline(&self, point: Vec2) -> CenterlineHit {
        let mut best = CenterlineHit {
            distance: f32::INFINITY,
            lateral: 0.0,
            half_width: self.half_widths[0],
        };

        for i in 0..self.centerline.len() - 1 {
            let a = ground(self.centerline[i]);
            let b = ground(self.centerline[i + 1]);
            let (foot, t) = closest_on_span(point, a, b);
            let distance = point.distance(foot);
            if distance < best.distance {
                let side = (b - a).perp_dot(point - a);
                best = CenterlineHit {
                    distance,
                    lateral: if side < 0.0 { -distance } else { distance },
                    half_width: self.half_widths[i]
                        + (self.half_widths[i + 1] - self.half_widths[i]) * t,
                };
            }
        }
        best
    }

    /// Ground-plane distance to the nearer of the two edge polylines.
    pub fn edge_distance(&self, point: Vec2) -> f32 {
        distance_to_polyline(point, &self.left_edge)
            .min(distance_to_polyline(point, &self.right_edge))
    }
}

/// Running centerline length, starting at zero.
pub fn cumulative_lengths(points: &[Vec3]) -> Vec<f32> {
    let mut lengths = Vec::with_capacity(points.len());
    let mut total = 0.0;
    lengths.push(total);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        lengths.push(total);
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_segment(start_distance: f32) -> Segment {
        let centerline: Vec<Vec3> = (0..=10).map(|i| Vec3::new(i as f32 * 10.0, 0.0, 0.0)).collect();
        let left_edge = centerline.iter().map(|c| *c - Vec3::Z * 5.0).collect();
        let right_edge = centerline.iter().map(|c| *c + Vec3::Z * 5.0).collect();
        let arc_lengths = cumulative_lengths(&centerline);
        let length = arc_lengths[arc_lengths.len() - 1];
        Segment {
            id: SegmentId(3),
            kind: SegmentKind::Straight,
            params: SegmentKind::Straight.params(),
            half_widths: vec![5.0; centerline.len()],
            headings: vec![0.0; centerline.len()],
            centerline,
            left_edge,
            right_edge,
            arc_lengths,
            start_distance,
            end_distance: start_distance + length,
            start_heading: 0.0,
            end_heading: 0.0,
        }
    }

    #[test]
    fn test_cumulative_lengths() {
        let points = [Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0), Vec3::new(3.0, 0.0, 4.0)];
        assert_eq!(cumulative_lengths(&points), vec![0.0, 5.0, 5.0]);
    }

    #[test]
    fn test_sample_interpolates_inside_span() {
        let segment = straight_segment(200.0);
        let sample = segment.sample(235.0);
        assert!((sample.position.x - 35.0).abs() < 1e-4);
        assert!((sample.forward - Vec3::X).length() < 1e-6);
        assert!((sample.right - Vec3::Z).length() < 1e-6);
        assert_eq!(sample.half_width, 5.0);
        assert_eq!(sample.segment, SegmentId(3));
    }

    #[test]
    fn test_sample_clamps_to_ends() {
        let segment = straight_segment(200.0);
        assert_eq!(segment.sample(0.0).position, segment.first_point());
        assert!(segment.sample(10_000.0).position.distance(segment.last_point()) < 1e-4);
    }

    #[test]
    fn test_closest_centerline_sign() {
        let segment = straight_segment(0.0);
        let right = segment.closest_centerline(Vec2::new(42.0, 3.0));
        assert!((right.lateral - 3.0).abs() < 1e-5);
        let left = segment.closest_centerline(Vec2::new(42.0, -2.0));
        assert!((left.lateral + 2.0).abs() < 1e-5);
        assert_eq!(left.half_width, 5.0);
    }

    #[test]
    fn test_edge_distance() {
        let segment = straight_segment(0.0);
        assert!((segment.edge_distance(Vec2::new(50.0, 1.0)) - 4.0).abs() < 1e-5);
        assert!(segment.edge_distance(Vec2::new(50.0, 5.0)).abs() < 1e-6);
    }
}
