//! Skill-score matchmaking: maps a trophy count to a difficulty profile.
//!
//! Brackets cover `0..∞`. Each bracket names a base tier plus a blend
//! factor toward a neighbouring tier, so difficulty scales smoothly as a
//! player climbs instead of jumping at tier boundaries.
//!
//! | Trophies | Tier | Blend |
//! |----------|------|-------|
//! | 0–99 | easy | 0 |
//! | 100–199 | easy | +0.5 |
//! | 200–399 | normal | 0 |
//! | 400–599 | normal | +0.5 |
//! | 600–899 | hard | 0 |
//! | 900–1199 | hard | +0.5 |
//! | 1200–1599 | veryHard | 0 |
//! | 1600–1999 | veryHard | +0.5 |
//! | 2000–2499 | insane | 0 |
//! | 2500–2999 | insane | +0.5 |
//! | 3000–3499 | expert | −0.25 |
//! | 3500+ | expert | 0 |

use crate::config::AiConfig;
use crate::difficulty::{DifficultyProfile, Tier};
use rand::Rng;

/// One skill range `[min, max)` and the profile it resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub min: f32,
    pub max: f32,
    pub tier: Tier,
    /// Positive blends toward the next tier, negative toward the previous.
    pub blend: f32,
}

const fn bracket(min: f32, max: f32, tier: Tier, blend: f32) -> Bracket {
    Bracket {
        min,
        max,
        tier,
        blend,
    }
}

pub const BRACKETS: [Bracket; 12] = [
    bracket(0.0, 100.0, Tier::Easy, 0.0),
    bracket(100.0, 200.0, Tier::Easy, 0.5),
    bracket(200.0, 400.0, Tier::Normal, 0.0),
    bracket(400.0, 600.0, Tier::Normal, 0.5),
    bracket(600.0, 900.0, Tier::Hard, 0.0),
    bracket(900.0, 1200.0, Tier::Hard, 0.5),
    bracket(1200.0, 1600.0, Tier::VeryHard, 0.0),
    bracket(1600.0, 2000.0, Tier::VeryHard, 0.5),
    bracket(2000.0, 2500.0, Tier::Insane, 0.0),
    bracket(2500.0, 3000.0, Tier::Insane, 0.5),
    bracket(3000.0, 3500.0, Tier::Expert, -0.25),
    bracket(3500.0, f32::INFINITY, Tier::Expert, 0.0),
];

/// Find the bracket for a score. Scores outside every bracket (negative,
/// NaN) clamp to the nearest end.
pub fn bracket_for(score: f32) -> &'static Bracket {
    if let Some(b) = BRACKETS.iter().find(|b| score >= b.min && score < b.max) {
        return b;
    }
    if score >= BRACKETS[BRACKETS.len() - 1].min {
        &BRACKETS[BRACKETS.len() - 1]
    } else {
        &BRACKETS[0]
    }
}

#[derive(Debug, Clone)]
pub struct MatchmakerAi {
    jitter_enabled: bool,
}

impl Default for MatchmakerAi {
    fn default() -> Self {
        Self::new(&AiConfig::default())
    }
}

impl MatchmakerAi {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            jitter_enabled: config.jitter_enabled,
        }
    }

    /// Blended profile for a skill score, without jitter.
    pub fn for_skill_score(&self, score: f32) -> DifficultyProfile {
        let b = bracket_for(score);
        let base = b.tier.profile();
        let neighbour = if b.blend > 0.0 {
            b.tier.next()
        } else if b.blend < 0.0 {
            b.tier.previous()
        } else {
            None
        };
        let profile = match neighbour {
            Some(n) => base.blend(&n.profile(), b.blend.abs()),
            None => base,
        };
        log::debug!(
            "Skill score {} -> bracket {:?} blend {:.2} -> '{}'",
            score,
            b.tier,
            b.blend,
            profile.name
        );
        profile
    }

    /// Profile for a new match: the blended profile plus per-match jitter
    /// (if enabled).
    pub fn match_profile<R: Rng + ?Sized>(&self, score: f32, rng: &mut R) -> DifficultyProfile {
        let profile = self.for_skill_score(score);
        if self.jitter_enabled {
            profile.jittered(rng)
        } else {
            profile
        }
    }

    /// Raw named tier for practice modes, no blending or jitter.
    pub fn for_training_tier(&self, tier: Tier) -> DifficultyProfile {
        tier.profile()
    }
}
