//! Opponent personality: display name, mood, and flavor callouts.
//!
//! Purely reactive bookkeeping fed by the host at round and match
//! boundaries. The only gameplay-relevant output is
//! [`AiPersonality::behavior_modifiers`], which hosts fold into a profile
//! with [`crate::difficulty::DifficultyProfile::with_modifiers`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mood {
    #[default]
    Neutral,
    Confident,
    Frustrated,
}

/// Multipliers a personality applies on top of a difficulty profile.
/// `1.0` everywhere is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorModifiers {
    pub aggression: f32,
    pub risk_taking: f32,
    /// Scales the decision interval (< 1.0 decides faster, more rashly).
    pub patience: f32,
    pub accuracy: f32,
}

impl BehaviorModifiers {
    pub const NEUTRAL: BehaviorModifiers = BehaviorModifiers {
        aggression: 1.0,
        risk_taking: 1.0,
        patience: 1.0,
        accuracy: 1.0,
    };
}

/// Situations the controller or host can request a line for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalloutKind {
    Greeting,
    Planting,
    Defusing,
    FakeAction,
    Retreating,
    GotKill,
    Died,
}

/// Trophy brackets for display names, lowest first.
const NAME_BRACKETS: [(f32, &str); 6] = [
    (0.0, "Rookie"),
    (300.0, "Grunt"),
    (800.0, "Veteran"),
    (1500.0, "Elite"),
    (2500.0, "Phantom"),
    (3500.0, "Legend"),
];

const STREAK_FOR_MOOD: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPersonality {
    name: String,
    mood: Mood,
    respect_for_player: f32,
    win_streak: u32,
    loss_streak: u32,
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl AiPersonality {
    pub fn new(skill_score: f32) -> Self {
        Self {
            name: name_for(skill_score).to_string(),
            mood: Mood::Neutral,
            respect_for_player: 0.5,
            win_streak: 0,
            loss_streak: 0,
        }
    }

    /// Start a new match against a player with `skill_score` trophies.
    pub fn reset(&mut self, skill_score: f32) {
        *self = Self::new(skill_score);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn respect_for_player(&self) -> f32 {
        self.respect_for_player
    }

    /// Round result from the AI's point of view.
    pub fn record_round(&mut self, ai_won: bool) {
        if ai_won {
            self.win_streak += 1;
            self.loss_streak = 0;
            self.adjust_respect(-0.05);
        } else {
            self.loss_streak += 1;
            self.win_streak = 0;
            self.adjust_respect(0.1);
        }
        self.mood = if self.win_streak >= STREAK_FOR_MOOD {
            Mood::Confident
        } else if self.loss_streak >= STREAK_FOR_MOOD {
            Mood::Frustrated
        } else {
            Mood::Neutral
        };
    }

    /// The AI killed the player.
    pub fn record_kill(&mut self) {
        self.adjust_respect(-0.02);
    }

    /// The player killed the AI.
    pub fn record_death(&mut self) {
        self.adjust_respect(0.05);
    }

    fn adjust_respect(&mut self, delta: f32) {
        self.respect_for_player = (self.respect_for_player + delta).clamp(0.0, 1.0);
    }

    pub fn behavior_modifiers(&self) -> BehaviorModifiers {
        match self.mood {
            Mood::Neutral => BehaviorModifiers::NEUTRAL,
            Mood::Confident => BehaviorModifiers {
                aggression: 1.2,
                risk_taking: 1.2,
                patience: 0.9,
                accuracy: 1.0,
            },
            Mood::Frustrated => BehaviorModifiers {
                aggression: 1.3,
                risk_taking: 1.4,
                patience: 0.7,
                accuracy: 0.95,
            },
        }
    }

    /// Flavor line for a situation, picked by mood.
    pub fn callout<R: Rng + ?Sized>(&self, kind: CalloutKind, rng: &mut R) -> &'static str {
        lines(kind, self.mood).choose(rng).copied().unwrap_or("...")
    }
}

/// Display name for a trophy count.
pub fn name_for(skill_score: f32) -> &'static str {
    NAME_BRACKETS
        .iter()
        .rev()
        .find(|(min, _)| skill_score >= *min)
        .map(|(_, name)| *name)
        .unwrap_or(NAME_BRACKETS[0].1)
}

fn lines(kind: CalloutKind, mood: Mood) -> &'static [&'static str] {
    use CalloutKind::*;
    match (kind, mood) {
        (Greeting, Mood::Confident) => &["Back for more?", "This won't take long."],
        (Greeting, _) => &["Good luck.", "Let's see what you've got."],
        (Planting, Mood::Frustrated) => &["Planting. Stay out of my way.", "Bomb going down."],
        (Planting, _) => &["Planting the bomb.", "Setting it up."],
        (Defusing, Mood::Frustrated) => &["Not this time.", "Defusing. Finally."],
        (Defusing, _) => &["Defusing.", "On the bomb."],
        (FakeAction, _) => &["Hear that?", "Come and check."],
        (Retreating, Mood::Confident) => &["Tactical reset.", "Just repositioning."],
        (Retreating, _) => &["Falling back!", "Need cover!"],
        (GotKill, Mood::Confident) => &["Too easy.", "Next."],
        (GotKill, Mood::Frustrated) => &["About time.", "Finally."],
        (GotKill, Mood::Neutral) => &["Got you.", "One down."],
        (Died, Mood::Frustrated) => &["Seriously?", "Lucky shot."],
        (Died, _) => &["Nice shot.", "Well played."],
    }
}
