//! Small value-type helpers shared by track generation and vehicle dynamics.
//!
//! The track lives in the XZ plane with +Y up. A heading of `0.0` points along
//! +X and positive heading changes turn toward the right-hand side.

use bevy::prelude::*;
use std::f32::consts::{PI, TAU};

use crate::game_logic::constants::MIN_SPAN;

/// Wrap an angle into (-PI, PI].
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Shortest signed difference `to - from`, normalized.
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Interpolate between two headings along the short way round.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    normalize_angle(from + angle_delta(from, to) * t)
}

/// Horizontal unit vector for a heading.
pub fn heading_forward(heading: f32) -> Vec3 {
    let (sin, cos) = heading.sin_cos();
    Vec3::new(cos, 0.0, sin)
}

/// Horizontal unit vector pointing to the right of a heading.
pub fn heading_right(heading: f32) -> Vec3 {
    let (sin, cos) = heading.sin_cos();
    Vec3::new(-sin, 0.0, cos)
}

/// Rotate a point about the Y axis so that local +X lines up with `heading`.
pub fn rotate_about_y(point: Vec3, heading: f32) -> Vec3 {
    let (sin, cos) = heading.sin_cos();
    Vec3::new(
        point.x * cos - point.z * sin,
        point.y,
        point.x * sin + point.z * cos,
    )
}

/// Ground-plane projection used by collision checks.
pub fn ground(point: Vec3) -> Vec2 {
    Vec2::new(point.x, point.z)
}

/// Normalize, falling back when the vector is too short to carry a direction.
pub fn normalize_or_fallback(v: Vec3, fallback: Vec3) -> Vec3 {
    let length = v.length();
    if length.is_finite() && length > MIN_SPAN {
        v / length
    } else {
        fallback
    }
}

pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Frame-rate independent blend factor for a first-order lag.
pub fn exp_blend(dt: f32, time_constant: f32) -> f32 {
    if time_constant <= 0.0 {
        return 1.0;
    }
    1.0 - (-dt / time_constant).exp()
}

/// Move `current` toward `target` with exponential smoothing. `damping` scales
/// the step and stays below one so the value never overshoots.
pub fn approach(current: f32, target: f32, dt: f32, time_constant: f32, damping: f32) -> f32 {
    let step = (target - current) * exp_blend(dt, time_constant) * damping.clamp(0.0, 1.0);
    current + step
}

/// Weighted 3-point moving average over the vertical component. End points
/// are left untouched so seams stay pinned.
pub fn smooth_heights(points: &mut [Vec3]) {
    if points.len() < 3 {
        return;
    }
    let heights: Vec<f32> = points.iter().map(|p| p.y).collect();
    for i in 1..points.len() - 1 {
        points[i].y = 0.25 * heights[i - 1] + 0.5 * heights[i] + 0.25 * heights[i + 1];
    }
}
