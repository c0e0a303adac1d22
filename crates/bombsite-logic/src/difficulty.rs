//! Difficulty tiers: named bundles of AI tuning parameters.
//!
//! Six tiers ordered from weakest to strongest. Accuracy and aggression
//! rise and reaction time falls monotonically along the ordering, which
//! the matchmaker relies on when blending between neighbours.

use crate::personality::BehaviorModifiers;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Skill tier, in ascending strength order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Easy,
    Normal,
    Hard,
    VeryHard,
    Insane,
    Expert,
}

impl Tier {
    /// All tiers in ascending order.
    pub fn all() -> &'static [Tier] {
        &[
            Tier::Easy,
            Tier::Normal,
            Tier::Hard,
            Tier::VeryHard,
            Tier::Insane,
            Tier::Expert,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Tier> {
        Tier::all().get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Tier> {
        self.index().checked_sub(1).map(|i| Tier::all()[i])
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Normal => "normal",
            Tier::Hard => "hard",
            Tier::VeryHard => "veryHard",
            Tier::Insane => "insane",
            Tier::Expert => "expert",
        }
    }

    /// Parse a tier from its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Tier> {
        Tier::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Raw table entry for this tier.
    pub fn profile(self) -> DifficultyProfile {
        let (reaction, accuracy, aggression, utility, speed) = match self {
            Tier::Easy => (650.0, 0.25, 0.20, 0.10, 0.80),
            Tier::Normal => (500.0, 0.40, 0.35, 0.20, 0.90),
            Tier::Hard => (380.0, 0.55, 0.50, 0.35, 1.00),
            Tier::VeryHard => (280.0, 0.68, 0.60, 0.50, 1.05),
            Tier::Insane => (200.0, 0.80, 0.70, 0.65, 1.10),
            Tier::Expert => (150.0, 0.90, 0.80, 0.80, 1.15),
        };
        let (strafe, cover, flank, headshot) = match self {
            Tier::Easy => (0.10, 0.10, 0.00, 0.05),
            Tier::Normal => (0.20, 0.25, 0.10, 0.10),
            Tier::Hard => (0.40, 0.45, 0.25, 0.18),
            Tier::VeryHard => (0.55, 0.60, 0.40, 0.25),
            Tier::Insane => (0.70, 0.75, 0.55, 0.35),
            Tier::Expert => (0.85, 0.85, 0.70, 0.45),
        };
        let at_least = |t: Tier| self >= t;
        DifficultyProfile {
            name: self.name().to_string(),
            reaction_time_ms: reaction,
            accuracy,
            aggression,
            utility_chance: utility,
            move_speed_multiplier: speed,
            strafe_chance: strafe,
            uses_cover_chance: cover,
            flank_chance: flank,
            headshot_chance: headshot,
            pre_fire: at_least(Tier::VeryHard),
            checks_corners: at_least(Tier::Hard),
            fakes_actions: at_least(Tier::Insane),
            adapts_to_player: at_least(Tier::Hard),
            retreats_smartly: at_least(Tier::Normal),
            trophy_variance: 50.0 + 25.0 * self.index() as f32,
        }
    }
}

/// Tuning parameters for one opponent. Treat as immutable: derivations
/// return fresh copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub name: String,
    /// Delay between high-level decisions.
    pub reaction_time_ms: f32,
    /// Hit probability applied by the host when resolving a shot.
    pub accuracy: f32,
    pub aggression: f32,
    pub utility_chance: f32,
    pub move_speed_multiplier: f32,
    /// Consumed by the host's movement layer.
    pub strafe_chance: f32,
    pub uses_cover_chance: f32,
    pub flank_chance: f32,
    /// Consumed by the host when resolving damage.
    pub headshot_chance: f32,
    pub pre_fire: bool,
    pub checks_corners: bool,
    pub fakes_actions: bool,
    pub adapts_to_player: bool,
    pub retreats_smartly: bool,
    pub trophy_variance: f32,
}

impl DifficultyProfile {
    /// Interpolate toward `other` by `t` in [0, 1]. Booleans switch to
    /// `other` only when `t > 0.5`.
    pub fn blend(&self, other: &DifficultyProfile, t: f32) -> DifficultyProfile {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        let pick = |a: bool, b: bool| if t > 0.5 { b } else { a };
        DifficultyProfile {
            name: if t == 0.0 {
                self.name.clone()
            } else {
                format!("{}~{}", self.name, other.name)
            },
            reaction_time_ms: lerp(self.reaction_time_ms, other.reaction_time_ms),
            accuracy: lerp(self.accuracy, other.accuracy),
            aggression: lerp(self.aggression, other.aggression),
            utility_chance: lerp(self.utility_chance, other.utility_chance),
            move_speed_multiplier: lerp(self.move_speed_multiplier, other.move_speed_multiplier),
            strafe_chance: lerp(self.strafe_chance, other.strafe_chance),
            uses_cover_chance: lerp(self.uses_cover_chance, other.uses_cover_chance),
            flank_chance: lerp(self.flank_chance, other.flank_chance),
            headshot_chance: lerp(self.headshot_chance, other.headshot_chance),
            pre_fire: pick(self.pre_fire, other.pre_fire),
            checks_corners: pick(self.checks_corners, other.checks_corners),
            fakes_actions: pick(self.fakes_actions, other.fakes_actions),
            adapts_to_player: pick(self.adapts_to_player, other.adapts_to_player),
            retreats_smartly: pick(self.retreats_smartly, other.retreats_smartly),
            trophy_variance: lerp(self.trophy_variance, other.trophy_variance),
        }
    }

    /// Copy with reaction time ±25 ms and accuracy ±0.025.
    pub fn jittered<R: Rng + ?Sized>(&self, rng: &mut R) -> DifficultyProfile {
        let mut out = self.clone();
        out.reaction_time_ms = (self.reaction_time_ms + rng.gen_range(-25.0..=25.0)).max(0.0);
        out.accuracy = (self.accuracy + rng.gen_range(-0.025..=0.025)).clamp(0.0, 1.0);
        out
    }

    /// Fold personality multipliers into a fresh, clamped copy.
    pub fn with_modifiers(&self, m: &BehaviorModifiers) -> DifficultyProfile {
        let mut out = self.clone();
        out.aggression = (self.aggression * m.aggression).clamp(0.0, 1.0);
        out.accuracy = (self.accuracy * m.accuracy).clamp(0.0, 1.0);
        out.flank_chance = (self.flank_chance * m.risk_taking).clamp(0.0, 1.0);
        out.reaction_time_ms = (self.reaction_time_ms * m.patience).max(0.0);
        out
    }
}
