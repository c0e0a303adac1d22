//! Player modeling: observes the human player during a match and derives
//! a [`CounterStrategy`] the controller can bias toward.
//!
//! # Lifecycle
//!
//! 1. [`AiLearningSystem::reset`] at match start (nothing survives a match).
//! 2. `track_*` calls from host gameplay code whenever the player does
//!    something relevant.
//! 3. [`AiLearningSystem::analyze_patterns`] once per round end. Only every
//!    `analysis_interval` rounds is the strategy actually recomputed; in
//!    between it is stale on purpose.
//! 4. The controller reads [`AiLearningSystem::recommendations`] and gates
//!    use with [`AiLearningSystem::should_use_counter_play`], whose
//!    probability ramps with the number of rounds observed so sparse early
//!    data does not dominate.

use crate::config::AiConfig;
use crate::constants::learning::*;
use crate::geometry::Vec2;
use crate::scene::LaneSide;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the player tends to open a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundStartBehavior {
    Rush,
    #[default]
    Slow,
    Camp,
}

/// Counter-play stance recommended against the observed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CounterStyle {
    /// Player is aggressive: hold angles.
    Defensive,
    /// Player is passive: take space.
    Aggressive,
    #[default]
    Adaptive,
}

impl CounterStyle {
    pub fn aggression_target(self) -> f32 {
        match self {
            CounterStyle::Defensive => 0.3,
            CounterStyle::Aggressive => 0.8,
            CounterStyle::Adaptive => 0.5,
        }
    }
}

/// Ways the player fell for AI tactics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterKind {
    FellForFake,
    GotFlanked,
}

/// One engagement summary reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatSample {
    pub distance: f32,
    pub was_moving: bool,
    pub shots_fired: u32,
    pub shots_hit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotRecord {
    pub position: Vec2,
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmokeRecord {
    pub position: Vec2,
    pub aggressive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneUsage {
    pub left: u32,
    pub mid: u32,
    pub right: u32,
}

impl LaneUsage {
    fn bump(&mut self, side: LaneSide) {
        match side {
            LaneSide::Left => self.left += 1,
            LaneSide::Mid => self.mid += 1,
            LaneSide::Right => self.right += 1,
        }
    }
}

/// Everything observed about the player this match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Quantized cell (in cell units) → visit count.
    pub position_visits: HashMap<(i32, i32), u32>,
    pub lane_usage: LaneUsage,

    pub close_range_engagements: u32,
    pub long_range_engagements: u32,
    pub prefers_close_range: bool,
    pub prefers_long_range: bool,
    pub total_engagements: u32,
    pub moving_engagements: u32,
    pub shots_fired: u32,
    /// Shot-weighted running accuracy.
    pub accuracy: f32,

    pub plant_times: Vec<f32>,
    pub average_plant_time: Option<f32>,

    pub smokes: Vec<SmokeRecord>,
    pub aggressive_smokes: u32,

    pub rush_rounds: u32,
    pub camp_rounds: u32,
    pub round_start_behavior: RoundStartBehavior,

    pub deaths: Vec<SpotRecord>,
    pub kills: Vec<SpotRecord>,

    pub fell_for_fake: u32,
    pub got_flanked: u32,
}

impl PlayerProfile {
    /// Smoothed share of round starts that were rushes.
    pub fn rush_ratio(&self) -> f32 {
        (self.rush_rounds + 1) as f32 / (self.rush_rounds + self.camp_rounds + 2) as f32
    }

    pub fn plants_early(&self) -> bool {
        self.average_plant_time
            .map(|t| t < EARLY_PLANT_SECS)
            .unwrap_or(false)
    }

    pub fn smokes_aggressively(&self) -> bool {
        !self.smokes.is_empty() && self.aggressive_smokes * 2 > self.smokes.len() as u32
    }

    /// Mean of the four aggression indicators, in [0.375, 0.7].
    pub fn aggression_score(&self) -> f32 {
        let indicator = |flag: bool, yes: f32, no: f32| if flag { yes } else { no };
        let parts = [
            indicator(self.round_start_behavior == RoundStartBehavior::Rush, 0.7, 0.3),
            indicator(self.prefers_close_range, 0.8, 0.4),
            indicator(self.plants_early(), 0.7, 0.4),
            indicator(self.smokes_aggressively(), 0.6, 0.4),
        ];
        parts.iter().sum::<f32>() / parts.len() as f32
    }
}

/// Counter-play derived from a [`PlayerProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterStrategy {
    /// Most-visited player cells, at most five.
    pub pre_aim_positions: Vec<Vec2>,
    /// Recent spots where the player got kills.
    pub avoid_positions: Vec<Vec2>,
    pub preferred_lane: LaneSide,
    /// Side to flank from; `Mid` until the first analysis.
    pub flank_route: LaneSide,
    pub counter_style: CounterStyle,
    pub aggression_target: f32,
    /// Seconds to shift the AI's own push timing (negative = earlier).
    pub timing_adjustment_secs: f32,
    pub utility_targets: Vec<Vec2>,
    pub fake_effective: bool,
    pub flank_effective: bool,
}

impl Default for CounterStrategy {
    fn default() -> Self {
        Self {
            pre_aim_positions: Vec::new(),
            avoid_positions: Vec::new(),
            preferred_lane: LaneSide::Mid,
            flank_route: LaneSide::Mid,
            counter_style: CounterStyle::Adaptive,
            aggression_target: CounterStyle::Adaptive.aggression_target(),
            timing_adjustment_secs: 0.0,
            utility_targets: Vec::new(),
            fake_effective: false,
            flank_effective: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Recommendations<'a> {
    pub strategy: &'a CounterStrategy,
    /// `min(1, rounds / 4)`.
    pub confidence: f32,
}

pub struct AiLearningSystem {
    enabled: bool,
    analysis_interval: u32,
    profile: PlayerProfile,
    strategy: CounterStrategy,
    rounds_analyzed: u32,
    rng: StdRng,
}

impl AiLearningSystem {
    pub fn new(config: &AiConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: &AiConfig, rng: StdRng) -> Self {
        Self {
            enabled: config.learning_enabled,
            analysis_interval: config.analysis_interval.max(1),
            profile: PlayerProfile::default(),
            strategy: CounterStrategy::default(),
            rounds_analyzed: 0,
            rng,
        }
    }

    /// Discard everything learned. Call at match start.
    pub fn reset(&mut self) {
        self.profile = PlayerProfile::default();
        self.strategy = CounterStrategy::default();
        self.rounds_analyzed = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn strategy(&self) -> &CounterStrategy {
        &self.strategy
    }

    pub fn rounds_analyzed(&self) -> u32 {
        self.rounds_analyzed
    }

    // ── Recording ──────────────────────────────────────────────────────

    pub fn track_position(&mut self, position: Vec2, world_width: f32) {
        if !self.enabled {
            return;
        }
        *self
            .profile
            .position_visits
            .entry(quantize(position))
            .or_insert(0) += 1;
        self.profile
            .lane_usage
            .bump(lane_for(position.x, world_width));
    }

    /// The player died at `position`.
    pub fn track_death(&mut self, position: Vec2) {
        if !self.enabled {
            return;
        }
        self.profile.deaths.push(SpotRecord {
            position,
            round: self.rounds_analyzed,
        });
    }

    /// The player got a kill from `position`.
    pub fn track_kill(&mut self, position: Vec2) {
        if !self.enabled {
            return;
        }
        self.profile.kills.push(SpotRecord {
            position,
            round: self.rounds_analyzed,
        });
    }

    pub fn track_combat(&mut self, sample: CombatSample) {
        if !self.enabled {
            return;
        }
        let p = &mut self.profile;
        if sample.distance > LONG_RANGE {
            p.long_range_engagements += 1;
        } else if sample.distance < CLOSE_RANGE {
            p.close_range_engagements += 1;
        }
        p.prefers_long_range = p.long_range_engagements > p.close_range_engagements;
        p.prefers_close_range = p.close_range_engagements > p.long_range_engagements;

        p.total_engagements += 1;
        if sample.was_moving {
            p.moving_engagements += 1;
        }

        if sample.shots_fired > 0 {
            let hits = sample.shots_hit.min(sample.shots_fired) as f32;
            let prior = p.accuracy * p.shots_fired as f32;
            p.shots_fired += sample.shots_fired;
            p.accuracy = (prior + hits) / p.shots_fired as f32;
        }
    }

    pub fn track_smoke(&mut self, position: Vec2, was_aggressive: bool) {
        if !self.enabled {
            return;
        }
        self.profile.smokes.push(SmokeRecord {
            position,
            aggressive: was_aggressive,
        });
        if was_aggressive {
            self.profile.aggressive_smokes += 1;
        }
    }

    pub fn track_plant(&mut self, time_into_round_secs: f32) {
        if !self.enabled {
            return;
        }
        let p = &mut self.profile;
        p.plant_times.push(time_into_round_secs);
        let total: f32 = p.plant_times.iter().sum();
        p.average_plant_time = Some(total / p.plant_times.len() as f32);
    }

    pub fn track_round_start(&mut self, distance_moved: f32, time_elapsed_secs: f32) {
        if !self.enabled || time_elapsed_secs <= 0.0 {
            return;
        }
        let p = &mut self.profile;
        let rate = distance_moved / time_elapsed_secs;
        if rate > RUSH_RATE {
            p.rush_rounds += 1;
        } else if rate < CAMP_RATE {
            p.camp_rounds += 1;
        }
        let ratio = p.rush_ratio();
        p.round_start_behavior = if ratio > 0.6 {
            RoundStartBehavior::Rush
        } else if ratio < 0.3 {
            RoundStartBehavior::Camp
        } else {
            RoundStartBehavior::Slow
        };
    }

    pub fn track_countered(&mut self, kind: CounterKind) {
        if !self.enabled {
            return;
        }
        match kind {
            CounterKind::FellForFake => self.profile.fell_for_fake += 1,
            CounterKind::GotFlanked => self.profile.got_flanked += 1,
        }
    }

    // ── Analysis ───────────────────────────────────────────────────────

    /// Round-end hook. Recomputes the strategy every `analysis_interval`
    /// rounds.
    pub fn analyze_patterns(&mut self) {
        if !self.enabled {
            return;
        }
        self.rounds_analyzed += 1;
        if self.rounds_analyzed % self.analysis_interval != 0 {
            return;
        }
        self.strategy = self.compute_strategy();
        log::debug!(
            "Counter strategy after round {}: style={:?} lane={:?} flank={:?} pre_aim={} timing={:+.0}s",
            self.rounds_analyzed,
            self.strategy.counter_style,
            self.strategy.preferred_lane,
            self.strategy.flank_route,
            self.strategy.pre_aim_positions.len(),
            self.strategy.timing_adjustment_secs,
        );
    }

    fn compute_strategy(&mut self) -> CounterStrategy {
        let p = &self.profile;

        let mut cells: Vec<(&(i32, i32), &u32)> = p.position_visits.iter().collect();
        cells.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let pre_aim_positions = cells
            .into_iter()
            .take(MAX_PRE_AIM)
            .map(|(&cell, _)| cell_center(cell))
            .collect();

        let avoid_positions = last_n(&p.kills, MAX_AVOID)
            .iter()
            .map(|s| s.position)
            .collect();
        let utility_targets = last_n(&p.smokes, MAX_UTILITY_TARGETS)
            .iter()
            .map(|s| s.position)
            .collect();

        let preferred_lane = dominant_lane(&p.lane_usage);
        let flank_route = match preferred_lane {
            LaneSide::Mid => {
                if self.rng.gen_bool(0.5) {
                    LaneSide::Left
                } else {
                    LaneSide::Right
                }
            }
            side => side.opposite(),
        };

        let score = p.aggression_score();
        let counter_style = if score > 0.65 {
            CounterStyle::Defensive
        } else if score < 0.35 {
            CounterStyle::Aggressive
        } else {
            CounterStyle::Adaptive
        };

        let timing_adjustment_secs = match p.average_plant_time {
            Some(t) if t < EARLY_PLANT_SECS => -TIMING_SHIFT_SECS,
            Some(t) if t > LATE_PLANT_SECS => TIMING_SHIFT_SECS,
            _ => 0.0,
        };

        CounterStrategy {
            pre_aim_positions,
            avoid_positions,
            preferred_lane,
            flank_route,
            counter_style,
            aggression_target: counter_style.aggression_target(),
            timing_adjustment_secs,
            utility_targets,
            fake_effective: p.fell_for_fake >= 2,
            flank_effective: p.got_flanked >= 2,
        }
    }

    pub fn confidence(&self) -> f32 {
        (self.rounds_analyzed as f32 / FULL_CONFIDENCE_ROUNDS).min(1.0)
    }

    pub fn recommendations(&self) -> Recommendations<'_> {
        Recommendations {
            strategy: &self.strategy,
            confidence: self.confidence(),
        }
    }

    /// Roll whether to apply learned behavior, with probability
    /// `confidence * 0.7`.
    pub fn should_use_counter_play<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if !self.enabled {
            return false;
        }
        let p = (self.confidence() as f64 * COUNTER_PLAY_SCALE).clamp(0.0, 1.0);
        rng.gen_bool(p)
    }
}

fn quantize(position: Vec2) -> (i32, i32) {
    (
        (position.x / CELL_SIZE).round() as i32,
        (position.y / CELL_SIZE).round() as i32,
    )
}

fn cell_center(cell: (i32, i32)) -> Vec2 {
    Vec2::new(cell.0 as f32 * CELL_SIZE, cell.1 as f32 * CELL_SIZE)
}

/// Lane of an x coordinate relative to the world center.
pub fn lane_for(x: f32, world_width: f32) -> LaneSide {
    let center = world_width / 2.0;
    if x < center - MID_DEAD_ZONE {
        LaneSide::Left
    } else if x > center + MID_DEAD_ZONE {
        LaneSide::Right
    } else {
        LaneSide::Mid
    }
}

/// Lane with a smoothed share above one half, else `Mid`.
fn dominant_lane(usage: &LaneUsage) -> LaneSide {
    let total = (usage.left + usage.mid + usage.right + 3) as f32;
    let share = |n: u32| (n + 1) as f32 / total;
    if share(usage.left) > 0.5 {
        LaneSide::Left
    } else if share(usage.right) > 0.5 {
        LaneSide::Right
    } else {
        LaneSide::Mid
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
