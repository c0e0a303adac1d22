//! Host-facing types: the [`Scene`] capability trait, combatant state,
//! weapons, and the event outbox variants.
//!
//! The AI core never touches the host's world directly. Everything it needs
//! to perceive goes through [`Scene`], and everything it wants to happen is
//! either written onto the bot's [`Combatant`] (velocity, aim) or returned
//! as an [`AiEvent`].

use crate::geometry::{Smoke, Vec2, Wall};
use crate::personality::CalloutKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Attacker,
    Defender,
}

impl Role {
    pub fn from_attacker(is_attacker: bool) -> Self {
        if is_attacker {
            Role::Attacker
        } else {
            Role::Defender
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Role::Attacker => Role::Defender,
            Role::Defender => Role::Attacker,
        }
    }
}

/// Horizontal lane of the map, relative to the world center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LaneSide {
    Left,
    Mid,
    Right,
}

impl LaneSide {
    pub fn opposite(self) -> Self {
        match self {
            LaneSide::Left => LaneSide::Right,
            LaneSide::Right => LaneSide::Left,
            LaneSide::Mid => LaneSide::Mid,
        }
    }
}

/// Attacker route from spawn toward the bomb site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub side: LaneSide,
    pub waypoints: Vec<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BombState {
    Carried,
    Planted { position: Vec2, timer_ms: f32 },
    Defused,
    Exploded,
}

impl BombState {
    pub fn is_planted(&self) -> bool {
        matches!(self, BombState::Planted { .. })
    }

    pub fn planted_at(&self) -> Option<Vec2> {
        match self {
            BombState::Planted { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Everything the controller reads from the host world.
pub trait Scene {
    fn walls(&self) -> &[Wall];
    fn active_smokes(&self) -> &[Smoke];
    fn bomb_site(&self) -> Vec2;
    fn bomb(&self) -> BombState;
    fn lanes(&self) -> &[Lane];
    fn world_width(&self) -> f32;
    fn round_ended(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weapon {
    Pistol,
    Smg,
    Rifle,
    Sniper,
}

impl Weapon {
    /// Minimum time between shots.
    pub fn fire_rate_ms(self) -> f32 {
        match self {
            Weapon::Pistol => 400.0,
            Weapon::Smg => 100.0,
            Weapon::Rifle => 150.0,
            Weapon::Sniper => 1200.0,
        }
    }

    /// Body-shot damage, applied by the host.
    pub fn damage(self) -> f32 {
        match self {
            Weapon::Pistol => 25.0,
            Weapon::Smg => 14.0,
            Weapon::Rifle => 22.0,
            Weapon::Sniper => 90.0,
        }
    }
}

/// Per-combatant state shared between host and AI. The host owns position
/// and health; the controller writes `velocity` and `aim`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing in radians.
    pub aim: f32,
    pub hp: f32,
    pub active: bool,
    pub weapon: Weapon,
    pub smoke_charges: u8,
}

impl Combatant {
    pub fn new(position: Vec2, weapon: Weapon) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            aim: 0.0,
            hp: 100.0,
            active: true,
            weapon,
            smoke_charges: 1,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.active && self.hp > 0.0
    }
}

/// Discrete actions the host must turn into world effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AiEvent {
    /// Fire the equipped weapon from `origin` at `angle`. Hit resolution is
    /// the host's job.
    Fired { origin: Vec2, angle: f32 },
    SmokeDeployed { position: Vec2 },
    Callout { kind: CalloutKind },
}
