//! Opponent AI for a one-versus-one bomb-site shooter.
//!
//! This crate holds the bot's brain and nothing else. It never renders,
//! never touches physics, and never owns the world: the host implements
//! [`scene::Scene`], feeds [`scene::Combatant`] state in, and applies the
//! [`scene::AiEvent`]s that come back. All randomness flows through a
//! seeded `StdRng` and all time through the `dt` passed to each update,
//! so a match replays identically for the same seed.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Tunable AI settings, JSON loading and validation |
//! | [`constants`] | Timing, distance, and probability constants by concern |
//! | [`controller`] | Per-bot state machine: perceive, decide, act |
//! | [`difficulty`] | Six named tiers, profile blending and jitter |
//! | [`geometry`] | 2D vectors, walls, smokes, line-of-sight |
//! | [`learning`] | Cross-round player profiling and counter-strategy |
//! | [`matchmaker`] | Skill score to blended difficulty profile |
//! | [`personality`] | Display name, mood, behavior modifiers, callouts |
//! | [`scene`] | Host capability trait, combatants, weapons, events |

pub mod config;
pub mod constants;
pub mod controller;
pub mod difficulty;
pub mod geometry;
pub mod learning;
pub mod matchmaker;
pub mod personality;
pub mod scene;
