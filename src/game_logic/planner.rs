use crate::game_logic::blueprint::{SegmentKind, Severity, TurnDirection};
use crate::game_logic::constants::{
    DIRECTION_FLIP_CHANCE, EXTRA_STRAIGHT_CHANCE, GENTLE_THRESHOLD, LONG_STRAIGHT_CHANCE,
    MEDIUM_THRESHOLD, S_CURVE_CHANCE,
};
use crate::game_logic::random::SeededRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanPhase {
    Opening,
    Straight,
    ExtraStraight,
    Curve,
}

/// Decides which segment kind comes next.
///
/// Straights and curves alternate. Curves keep their direction from one to the
/// next unless a flip is rolled.
#[derive(Debug, Clone)]
pub struct SegmentPlanner {
    phase: PlanPhase,
    direction: TurnDirection,
}

impl SegmentPlanner {
    pub fn new(rng: &mut SeededRandom) -> Self {
        let direction = if rng.chance(0.5) {
            TurnDirection::Right
        } else {
            TurnDirection::Left
        };
        Self {
            phase: PlanPhase::Opening,
            direction,
        }
    }

    pub fn next_kind(&mut self, rng: &mut SeededRandom) -> SegmentKind {
        match self.phase {
            PlanPhase::Opening => {
                self.phase = PlanPhase::Straight;
                SegmentKind::Straight
            }
            PlanPhase::Straight => {
                let kind = if rng.chance(LONG_STRAIGHT_CHANCE) {
                    SegmentKind::LongStraight
                } else {
                    SegmentKind::Straight
                };
                self.phase = if rng.chance(EXTRA_STRAIGHT_CHANCE) {
                    PlanPhase::ExtraStraight
                } else {
                    PlanPhase::Curve
                };
                kind
            }
            PlanPhase::ExtraStraight => {
                self.phase = PlanPhase::Curve;
                SegmentKind::ShortStraight
            }
            PlanPhase::Curve => {
                self.phase = PlanPhase::Straight;
                self.next_curve(rng)
            }
        }
    }

    fn next_curve(&mut self, rng: &mut SeededRandom) -> SegmentKind {
        if rng.chance(DIRECTION_FLIP_CHANCE) {
            self.direction = self.direction.flipped();
        }
        let direction = self.direction;

        if rng.chance(S_CURVE_CHANCE) {
            return SegmentKind::SCurve { direction };
        }

        let roll = rng.next_f32();
        let severity = if roll < GENTLE_THRESHOLD {
            Severity::Gentle
        } else if roll < MEDIUM_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Sharp
        };
        SegmentKind::Turn {
            direction,
            severity,
        }
    }
}
