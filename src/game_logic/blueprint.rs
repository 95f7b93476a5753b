use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::game_logic::constants::{
    MAX_STEP_HEADING, MIN_BLUEPRINT_STEPS, POINTS_PER_UNIT, TURN_EASE_LENGTH,
};
use crate::game_logic::math::{heading_forward, heading_right, rotate_about_y, smooth_heights};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Heading change sign. Positive headings turn to the right.
    pub fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Gentle,
    Medium,
    Sharp,
}

/// Segment type tag. Local geometry is a pure function of the kind, which is
/// what makes it a valid cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Straight,
    LongStraight,
    ShortStraight,
    Turn {
        direction: TurnDirection,
        severity: Severity,
    },
    SCurve {
        direction: TurnDirection,
    },
}

/// Generation parameters for one segment kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    pub length: f32,
    /// Net heading change for turns, radians, unsigned.
    pub turn_angle: f32,
    /// Peak curvature of an S-curve, 1/units.
    pub s_amplitude: f32,
    pub bank_limit: f32,
    pub elevation_gain: f32,
    /// Local width factor at the middle of the segment. Never above 1, so a
    /// segment is at most as wide as the global narrowing allows.
    pub width_multiplier: f32,
}

impl SegmentParams {
    const fn straight(length: f32, elevation_gain: f32) -> Self {
        Self {
            length,
            turn_angle: 0.0,
            s_amplitude: 0.0,
            bank_limit: 0.0,
            elevation_gain,
            width_multiplier: 1.0,
        }
    }
}

impl SegmentKind {
    pub fn params(self) -> SegmentParams {
        match self {
            SegmentKind::Straight => SegmentParams::straight(120.0, 1.0),
            SegmentKind::LongStraight => SegmentParams::straight(220.0, 2.0),
            SegmentKind::ShortStraight => SegmentParams::straight(60.0, 0.0),
            SegmentKind::Turn { severity, .. } => match severity {
                Severity::Gentle => SegmentParams {
                    length: 140.0,
                    turn_angle: 35f32.to_radians(),
                    s_amplitude: 0.0,
                    bank_limit: 0.06,
                    elevation_gain: 0.8,
                    width_multiplier: 1.0,
                },
                Severity::Medium => SegmentParams {
                    length: 150.0,
                    turn_angle: 65f32.to_radians(),
                    s_amplitude: 0.0,
                    bank_limit: 0.10,
                    elevation_gain: -0.6,
                    width_multiplier: 0.96,
                },
                Severity::Sharp => SegmentParams {
                    length: 130.0,
                    turn_angle: 95f32.to_radians(),
                    s_amplitude: 0.0,
                    bank_limit: 0.15,
                    elevation_gain: -0.3,
                    width_multiplier: 0.92,
                },
            },
            SegmentKind::SCurve { .. } => SegmentParams {
                length: 180.0,
                turn_angle: 0.0,
                s_amplitude: 0.012,
                bank_limit: 0.08,
                elevation_gain: 0.5,
                width_multiplier: 1.0,
            },
        }
    }

    /// Smallest local width factor any kind applies.
    pub fn narrowest_width_multiplier() -> f32 {
        SegmentKind::Turn {
            direction: TurnDirection::Right,
            severity: Severity::Sharp,
        }
        .params()
        .width_multiplier
    }

    /// Shortest length any kind can produce. Used for streaming bounds.
    pub fn min_length() -> f32 {
        SegmentKind::ShortStraight.params().length
    }

    pub fn is_straight(self) -> bool {
        matches!(
            self,
            SegmentKind::Straight | SegmentKind::LongStraight | SegmentKind::ShortStraight
        )
    }

    pub fn direction(self) -> Option<TurnDirection> {
        match self {
            SegmentKind::Turn { direction, .. } | SegmentKind::SCurve { direction } => {
                Some(direction)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Straight => "straight",
            SegmentKind::LongStraight => "long-straight",
            SegmentKind::ShortStraight => "short-straight",
            SegmentKind::Turn { severity, .. } => match severity {
                Severity::Gentle => "gentle-turn",
                Severity::Medium => "medium-turn",
                Severity::Sharp => "sharp-turn",
            },
            SegmentKind::SCurve { .. } => "s-curve",
        }
    }
}

/// Curvature as a function of distance along the segment.
#[derive(Debug, Clone, Copy)]
enum CurvatureProfile {
    Flat,
    Turn { plateau: f32, ease: f32, length: f32 },
    Wave { amplitude: f32, length: f32 },
}

impl CurvatureProfile {
    fn for_kind(kind: SegmentKind, params: &SegmentParams) -> Self {
        match kind {
            SegmentKind::Turn { direction, .. } => {
                let ease = TURN_EASE_LENGTH.min(params.length / 3.0);
                // Linear ramps on both ends cover half their length each, so the
                // plateau must span `length - ease` to integrate to the target.
                let plateau = direction.sign() * params.turn_angle / (params.length - ease);
                CurvatureProfile::Turn {
                    plateau,
                    ease,
                    length: params.length,
                }
            }
            SegmentKind::SCurve { direction } => CurvatureProfile::Wave {
                amplitude: direction.sign() * params.s_amplitude,
                length: params.length,
            },
            _ => CurvatureProfile::Flat,
        }
    }

    fn at(&self, s: f32) -> f32 {
        match *self {
            CurvatureProfile::Flat => 0.0,
            CurvatureProfile::Turn {
                plateau,
                ease,
                length,
            } => {
                let ramp = (s / ease).min((length - s) / ease).clamp(0.0, 1.0);
                plateau * ramp
            }
            CurvatureProfile::Wave { amplitude, length } => amplitude * (TAU * s / length).sin(),
        }
    }

    fn peak(&self) -> f32 {
        match *self {
            CurvatureProfile::Flat => 0.0,
            CurvatureProfile::Turn { plateau, .. } => plateau.abs(),
            CurvatureProfile::Wave { amplitude, .. } => amplitude.abs(),
        }
    }
}

/// Offset the two track edges from a centerline point. `bank` tilts the
/// cross-section; positive bank lowers the right edge.
pub fn edge_pair(center: Vec3, heading: f32, bank: f32, half_width: f32) -> (Vec3, Vec3) {
    let lateral = heading_right(heading) * half_width;
    let lift = Vec3::Y * (half_width * bank.sin());
    (center - lateral + lift, center + lateral - lift)
}

/// Local-space geometry for one segment kind: starts at the origin heading
/// along +X. Edges are built at `half_width` and rescaled once placed.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub kind: SegmentKind,
    pub params: SegmentParams,
    pub half_width: f32,
    pub centerline: Vec<Vec3>,
    pub left_edge: Vec<Vec3>,
    pub right_edge: Vec<Vec3>,
    pub headings: Vec<f32>,
    pub banks: Vec<f32>,
    pub step_length: f32,
    pub net_heading: f32,
}

impl Blueprint {
    pub fn build(kind: SegmentKind, base_half_width: f32) -> Self {
        let params = kind.params();
        let steps = ((params.length * POINTS_PER_UNIT).ceil() as usize).max(MIN_BLUEPRINT_STEPS);
        let ds = params.length / steps as f32;
        let profile = CurvatureProfile::for_kind(kind, &params);
        let peak = profile.peak();

        let bank_at = |s: f32| {
            if peak > 0.0 {
                params.bank_limit * (profile.at(s) / peak).clamp(-1.0, 1.0)
            } else {
                0.0
            }
        };

        let mut centerline = Vec::with_capacity(steps + 1);
        let mut headings = Vec::with_capacity(steps + 1);
        let mut banks = Vec::with_capacity(steps + 1);

        let mut position = Vec3::ZERO;
        let mut heading = 0.0_f32;
        centerline.push(position);
        headings.push(heading);
        banks.push(bank_at(0.0));

        for i in 0..steps {
            let mid = (i as f32 + 0.5) * ds;
            let delta = (profile.at(mid) * ds).clamp(-MAX_STEP_HEADING, MAX_STEP_HEADING);
            position += heading_forward(heading + delta * 0.5) * ds;
            heading += delta;

            let fraction = (i + 1) as f32 / steps as f32;
            position.y = params.elevation_gain * fraction;

            centerline.push(position);
            headings.push(heading);
            banks.push(bank_at((i + 1) as f32 * ds));
        }

        let half_width = base_half_width * params.width_multiplier;
        let (mut left_edge, mut right_edge): (Vec<Vec3>, Vec<Vec3>) = centerline
            .iter()
            .zip(headings.iter().zip(banks.iter()))
            .map(|(&center, (&heading, &bank))| edge_pair(center, heading, bank, half_width))
            .unzip();

        if kind.is_straight() {
            smooth_heights(&mut centerline);
            smooth_heights(&mut left_edge);
            smooth_heights(&mut right_edge);
        }

        Self {
            kind,
            params,
            half_width,
            centerline,
            left_edge,
            right_edge,
            headings,
            banks,
            step_length: ds,
            net_heading: heading,
        }
    }

    pub fn point_count(&self) -> usize {
        self.centerline.len()
    }

    /// Left and right edge offsets from the centerline at point `i`, rotated
    /// by `heading` and rescaled to `half_width`.
    pub fn edge_offsets(&self, i: usize, heading: f32, half_width: f32) -> (Vec3, Vec3) {
        let scale = half_width / self.half_width.max(f32::EPSILON);
        let center = self.centerline[i];
        (
            rotate_about_y(self.left_edge[i] - center, heading) * scale,
            rotate_about_y(self.right_edge[i] - center, heading) * scale,
        )
    }
}

/// Builds blueprints on first use and hands out shared copies afterwards.
#[derive(Debug, Default)]
pub struct BlueprintLibrary {
    base_half_width: f32,
    cache: HashMap<SegmentKind, Arc<Blueprint>>,
}

impl BlueprintLibrary {
    pub fn new(base_half_width: f32) -> Self {
        Self {
            base_half_width,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, kind: SegmentKind) -> Arc<Blueprint> {
        let base_half_width = self.base_half_width;
        self.cache
            .entry(kind)
            .or_insert_with(|| Arc::new(Blueprint::build(kind, base_half_width)))
            .clone()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
