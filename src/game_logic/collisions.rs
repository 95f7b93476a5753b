use bevy::prelude::*;
use std::collections::VecDeque;

use crate::game_logic::constants::MIN_SPAN;
use crate::game_logic::math::ground;
use crate::game_logic::segment::Segment;
use crate::game_logic::surface::BoundsCheck;

/// Closest point on the span `a..b` and its parameter along the span.
pub fn closest_on_span(point: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let span = b - a;
    let length_sq = span.length_squared();
    if length_sq <= MIN_SPAN * MIN_SPAN {
        return (a, 0.0);
    }
    let t = ((point - a).dot(span) / length_sq).clamp(0.0, 1.0);
    (a + span * t, t)
}

pub fn distance_to_span(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let (foot, _) = closest_on_span(point, a, b);
    point.distance(foot)
}

/// Minimum ground-plane distance from `point` to a polyline.
pub fn distance_to_polyline(point: Vec2, polyline: &[Vec3]) -> f32 {
    match polyline {
        [] => f32::INFINITY,
        [only] => point.distance(ground(*only)),
        _ => polyline
            .windows(2)
            .map(|pair| distance_to_span(point, ground(pair[0]), ground(pair[1])))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Test a vehicle footprint against the live window.
///
/// The owning segment is the one whose centerline passes closest. A position
/// laterally past the edges is out regardless of how far it is from them,
/// otherwise the clearance to the nearest edge must cover the vehicle
/// half-width plus the barrier thickness.
pub fn check_bounds_in(
    segments: &VecDeque<Segment>,
    position: Vec3,
    vehicle_half_width: f32,
    boundary_thickness: f32,
) -> Option<BoundsCheck> {
    let point = ground(position);
    let (index, hit) = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| (i, segment.closest_centerline(point)))
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))?;

    let owner = &segments[index];
    let mut edge = owner.edge_distance(point);
    // Edges near a seam may belong to the neighbors.
    for neighbor in [index.checked_sub(1), index.checked_add(1)].into_iter().flatten() {
        if let Some(segment) = segments.get(neighbor) {
            edge = edge.min(segment.edge_distance(point));
        }
    }

    let outside = hit.lateral.abs() > hit.half_width;
    let required = vehicle_half_width.max(0.0) + boundary_thickness;

    Some(BoundsCheck {
        segment: owner.id,
        lateral_offset: hit.lateral,
        edge_distance: if outside { -edge } else { edge },
        in_bounds: !outside && edge >= required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_on_span_clamps() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_on_span(Vec2::new(-5.0, 2.0), a, b), (a, 0.0));
        assert_eq!(closest_on_span(Vec2::new(15.0, 2.0), a, b), (b, 1.0));
        let (foot, t) = closest_on_span(Vec2::new(4.0, 3.0), a, b);
        assert_eq!(foot, Vec2::new(4.0, 0.0));
        assert!((t - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_span_does_not_divide_by_zero() {
        let a = Vec2::new(1.0, 1.0);
        let (foot, t) = closest_on_span(Vec2::new(4.0, 5.0), a, a);
        assert_eq!(foot, a);
        assert_eq!(t, 0.0);
        assert!((distance_to_span(Vec2::new(4.0, 5.0), a, a) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_polyline() {
        let polyline = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
        ];
        assert!((distance_to_polyline(Vec2::new(12.0, 5.0), &polyline) - 2.0).abs() < 1e-6);
        assert!((distance_to_polyline(Vec2::new(5.0, -1.0), &polyline) - 1.0).abs() < 1e-6);
        assert_eq!(distance_to_polyline(Vec2::ZERO, &[]), f32::INFINITY);
    }

    #[test]
    fn test_empty_window_has_no_answer() {
        assert!(check_bounds_in(&VecDeque::new(), Vec3::ZERO, 1.0, 0.5).is_none());
    }
}
