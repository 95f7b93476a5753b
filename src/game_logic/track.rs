use bevy::prelude::*;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::game_logic::blueprint::{BlueprintLibrary, SegmentKind};
use crate::game_logic::collisions::check_bounds_in;
use crate::game_logic::config::TrackConfig;
use crate::game_logic::constants::{
    LONG_STRAIGHT_BELL_SIGMA, MIN_SPAN, PRIME_SEGMENT_LIMIT, SEAM_BLEND_POINTS,
};
use crate::game_logic::math::{normalize_angle, rotate_about_y, smooth_heights, smoothstep};
use crate::game_logic::planner::SegmentPlanner;
use crate::game_logic::random::SeededRandom;
use crate::game_logic::segment::{Segment, SegmentId, cumulative_lengths};
use crate::game_logic::surface::{BoundsCheck, Sample, TrackSurface};

/// Where the next segment gets attached.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackCursor {
    pub position: Vec3,
    pub heading: f32,
    /// Vertical slope at the end of the last segment, rise over run.
    pub grade: f32,
}

/// Global width factor at a travel distance.
///
/// Each full `narrowing_interval` multiplies the width by
/// `narrowing_per_interval`. The step into the next factor is eased over
/// `narrowing_ramp` units that end exactly at the interval mark.
pub fn narrowing_factor(distance: f32, config: &TrackConfig) -> f32 {
    let distance = distance.max(0.0);
    let decay = config.narrowing_per_interval;
    let steps = (distance / config.narrowing_interval).floor();
    let mut factor = decay.powf(steps);

    let ramp_start = (steps + 1.0) * config.narrowing_interval - config.narrowing_ramp;
    if config.narrowing_ramp > 0.0 && distance > ramp_start {
        let t = smoothstep((distance - ramp_start) / config.narrowing_ramp);
        factor *= 1.0 + (decay - 1.0) * t;
    }
    factor.max(config.min_width_fraction)
}

/// Extra narrowing in the middle of a long straight, `t` in [0, 1].
fn straight_bell(t: f32, depth: f32) -> f32 {
    let offset = t - 0.5;
    1.0 - depth * (-(offset * offset) / (2.0 * LONG_STRAIGHT_BELL_SIGMA * LONG_STRAIGHT_BELL_SIGMA)).exp()
}

/// Owns the live window of segments around the player.
///
/// Segments are generated ahead of the travel distance and retired behind
/// it. Retired segments wait in a pending queue until a disposal flush hands
/// them to the renderer.
#[derive(Resource, Debug)]
pub struct TrackStreamer {
    config: TrackConfig,
    rng: SeededRandom,
    planner: SegmentPlanner,
    library: BlueprintLibrary,
    segments: VecDeque<Segment>,
    pending: VecDeque<Segment>,
    created: Vec<SegmentId>,
    cursor: TrackCursor,
    seam_edges: Option<(Vec3, Vec3)>,
    total_length: f32,
    next_id: u64,
    last_flush: Option<f32>,
}

impl TrackStreamer {
    pub fn new(seed: u64, config: TrackConfig) -> Self {
        let library = BlueprintLibrary::new(config.base_half_width);
        Self::with_library(seed, config, library)
    }

    fn with_library(seed: u64, config: TrackConfig, library: BlueprintLibrary) -> Self {
        let mut rng = SeededRandom::new(seed);
        let planner = SegmentPlanner::new(&mut rng);
        let mut streamer = Self {
            config,
            rng,
            planner,
            library,
            segments: VecDeque::new(),
            pending: VecDeque::new(),
            created: Vec::new(),
            cursor: TrackCursor::default(),
            seam_edges: None,
            total_length: 0.0,
            next_id: 0,
            last_flush: None,
        };
        streamer.prime();
        streamer
    }

    fn prime(&mut self) {
        let mut generated = 0;
        while self.total_length < self.config.look_ahead && generated < PRIME_SEGMENT_LIMIT {
            self.append_segment();
            generated += 1;
        }
    }

    /// Throw away every segment and start over from distance zero with the
    /// same seed. Returns the ids the renderer should drop.
    pub fn reset(&mut self) -> Vec<SegmentId> {
        let discarded: Vec<SegmentId> = self
            .segments
            .iter()
            .chain(self.pending.iter())
            .map(|segment| segment.id)
            .collect();
        let seed = self.rng.seed();
        let library = std::mem::take(&mut self.library);
        *self = Self::with_library(seed, self.config.clone(), library);
        info!(seed, discarded = discarded.len(), "track reset");
        discarded
    }

    /// Keep geometry ahead of `distance` and retire what is far behind it.
    /// Generates at most one segment per call.
    pub fn advance(&mut self, distance: f32) {
        if !distance.is_finite() {
            warn!(distance, "ignoring non-finite travel distance");
            return;
        }

        if self.total_length < distance + self.config.look_ahead {
            self.append_segment();
        }

        let retire_before = distance - self.config.behind_margin;
        while self.segments.len() > 1 {
            let behind = self
                .segments
                .front()
                .is_some_and(|segment| segment.end_distance < retire_before);
            if !behind {
                break;
            }
            if let Some(segment) = self.segments.pop_front() {
                debug!(id = segment.id.0, "retiring track segment");
                self.pending.push_back(segment);
            }
        }
    }

    /// Release a few retired segments, at most once per disposal interval.
    pub fn flush_disposals(&mut self, now: f32) -> Vec<SegmentId> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        if let Some(last) = self.last_flush {
            if now - last < self.config.disposal_interval {
                return Vec::new();
            }
        }
        self.last_flush = Some(now);
        let count = self.config.max_disposals_per_flush.min(self.pending.len());
        self.pending.drain(..count).map(|segment| segment.id).collect()
    }

    /// Ids of segments created since the last call.
    pub fn take_created(&mut self) -> Vec<SegmentId> {
        std::mem::take(&mut self.created)
    }

    /// Look up a live or pending segment.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments
            .iter()
            .chain(self.pending.iter())
            .find(|segment| segment.id == id)
    }

    pub fn segments(&self) -> &VecDeque<Segment> {
        &self.segments
    }

    pub fn pending_disposals(&self) -> usize {
        self.pending.len()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn cursor(&self) -> TrackCursor {
        self.cursor
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    fn append_segment(&mut self) {
        let kind = self.planner.next_kind(&mut self.rng);
        let blueprint = self.library.get(kind);
        let origin = self.cursor.position;
        let start_heading = self.cursor.heading;
        let n = blueprint.point_count();

        // Place the local geometry, then pin the seam exactly.
        let mut centerline: Vec<Vec3> = blueprint
            .centerline
            .iter()
            .map(|&p| rotate_about_y(p, start_heading) + origin)
            .collect();
        let offset = origin - centerline[0];
        for point in centerline.iter_mut() {
            *point += offset;
        }
        centerline[0] = origin;

        let headings: Vec<f32> = blueprint
            .headings
            .iter()
            .map(|&h| normalize_angle(h + start_heading))
            .collect();

        // Ease heights from the previous slope into the new profile.
        let blend = SEAM_BLEND_POINTS.min(n - 2);
        for i in 1..=blend {
            let carried = origin.y + self.cursor.grade * blueprint.step_length * i as f32;
            let w = smoothstep(i as f32 / blend as f32);
            centerline[i].y = carried + (centerline[i].y - carried) * w;
        }
        smooth_heights(&mut centerline[blend..]);

        let arc_lengths = cumulative_lengths(&centerline);
        let length = arc_lengths[n - 1];
        let start_distance = self.total_length;

        let half_widths: Vec<f32> = arc_lengths
            .iter()
            .map(|&arc| self.half_width_at(kind, start_distance + arc, arc / length.max(MIN_SPAN)))
            .collect();

        let (mut left_edge, mut right_edge): (Vec<Vec3>, Vec<Vec3>) = (0..n)
            .map(|i| {
                let (left, right) = blueprint.edge_offsets(i, start_heading, half_widths[i]);
                (centerline[i] + left, centerline[i] + right)
            })
            .unzip();

        if let Some((seam_left, seam_right)) = self.seam_edges {
            let left_fix = seam_left - left_edge[0];
            let right_fix = seam_right - right_edge[0];
            for i in 0..=blend {
                let fade = 1.0 - smoothstep(i as f32 / blend as f32);
                left_edge[i] += left_fix * fade;
                right_edge[i] += right_fix * fade;
            }
            left_edge[0] = seam_left;
            right_edge[0] = seam_right;
        }

        let id = SegmentId(self.next_id);
        self.next_id += 1;

        let end = centerline[n - 1];
        let before_end = centerline[n - 2];
        let run = Vec2::new(end.x - before_end.x, end.z - before_end.z).length();
        let grade = if run > MIN_SPAN {
            (end.y - before_end.y) / run
        } else {
            self.cursor.grade
        };
        let end_heading = headings[n - 1];

        self.cursor = TrackCursor {
            position: end,
            heading: end_heading,
            grade,
        };
        self.seam_edges = Some((left_edge[n - 1], right_edge[n - 1]));
        self.total_length = start_distance + length;

        debug!(
            id = id.0,
            kind = kind.as_str(),
            start = start_distance,
            length,
            "generated track segment"
        );

        self.segments.push_back(Segment {
            id,
            kind,
            params: blueprint.params,
            centerline,
            left_edge,
            right_edge,
            half_widths,
            headings,
            arc_lengths,
            start_distance,
            end_distance: start_distance + length,
            start_heading: normalize_angle(start_heading),
            end_heading,
        });
        self.created.push(id);
    }

    fn half_width_at(&self, kind: SegmentKind, distance: f32, t: f32) -> f32 {
        let params = kind.params();
        let multiplier = params.width_multiplier.min(1.0);
        let eased_multiplier = 1.0 + (multiplier - 1.0) * (std::f32::consts::PI * t).sin();
        let bell = if kind == SegmentKind::LongStraight {
            straight_bell(t, self.config.long_straight_narrowing)
        } else {
            1.0
        };
        self.config.base_half_width * narrowing_factor(distance, &self.config) * eased_multiplier * bell
    }
}

impl TrackSurface for TrackStreamer {
    fn sample_at(&self, distance: f32) -> Option<Sample> {
        let last = self.segments.len().checked_sub(1)?;
        let index = self
            .segments
            .partition_point(|segment| segment.end_distance <= distance)
            .min(last);
        Some(self.segments[index].sample(distance))
    }

    fn check_bounds(&self, position: Vec3, vehicle_half_width: f32) -> Option<BoundsCheck> {
        check_bounds_in(
            &self.segments,
            position,
            vehicle_half_width,
            self.config.boundary_thickness,
        )
    }
}
