//! Fixed world and behavior constants shared by the AI core and hosts.
//!
//! Tunables that a host may reasonably want to change live in
//! [`crate::config::AiConfig`] instead.

pub mod movement {
    /// Base run speed in units per second, before the difficulty multiplier.
    pub const BASE_MOVE_SPEED: f32 = 160.0;
    /// Distance at which a waypoint counts as reached.
    pub const ARRIVAL_RADIUS: f32 = 20.0;
    /// Lateral jitter applied to a defender's hold position.
    pub const DEFENDER_JITTER: f32 = 50.0;
    /// Strafe speed as a fraction of run speed.
    pub const STRAFE_FACTOR: f32 = 0.6;
    /// Lateral share of a smart retreat vector.
    pub const RETREAT_LATERAL: f32 = 0.5;
    /// Nudge applied to waypoints that sit on a learned danger spot.
    pub const AVOID_NUDGE: f32 = 80.0;
    /// Waypoints closer than this to an avoid spot get nudged.
    pub const AVOID_RADIUS: f32 = 60.0;
}

pub mod stuck {
    /// How often the current position is sampled.
    pub const SAMPLE_INTERVAL_MS: f32 = 500.0;
    /// Displacement below this between samples counts as no progress.
    pub const MIN_PROGRESS: f32 = 5.0;
    /// Accumulated no-progress time that triggers an unstuck burst.
    pub const TRIGGER_MS: f32 = 2000.0;
    /// Duration of the random-direction burst.
    pub const BURST_MS: f32 = 300.0;
}

pub mod combat {
    /// Time after losing sight before combat degrades to moving.
    pub const LOST_SIGHT_MS: f32 = 2000.0;
    /// Pre-fire window after losing sight.
    pub const PRE_FIRE_MS: f32 = 300.0;
    /// Strafe roll probability per think cycle.
    pub const STRAFE_PROBABILITY: f64 = 0.3;
    /// Aggression above which strafing is considered.
    pub const STRAFE_AGGRESSION: f32 = 0.5;
    /// Health below which the bot tries to smoke out and retreat.
    pub const RETREAT_HP: f32 = 40.0;
    /// Health above which a retreating bot returns to moving.
    pub const RECOVER_HP: f32 = 50.0;
    /// Smoke cooldown in milliseconds.
    pub const SMOKE_COOLDOWN_MS: f32 = 10_000.0;
    /// Per think-cycle smoke roll is `utility_chance * SMOKE_ROLL_SCALE`.
    pub const SMOKE_ROLL_SCALE: f64 = 0.1;
    /// Smokes thrown while moving land this far ahead of the bot.
    pub const SMOKE_THROW_DISTANCE: f32 = 150.0;
}

pub mod objective {
    /// Attacker must be within this of the bomb site to plant.
    pub const PLANT_RADIUS: f32 = 60.0;
    /// Defender must be within this of the planted bomb to defuse.
    pub const DEFUSE_RADIUS: f32 = 50.0;
    /// Bomb timer below which a defuser ignores the opponent.
    pub const COMMIT_DEFUSE_MS: f32 = 5000.0;
    /// Flat probability of risking a defuse under fire, and of faking.
    pub const RISK_PROBABILITY: f64 = 0.3;
    /// Length of a faked plant or defuse.
    pub const FAKE_DURATION_MS: f32 = 600.0;
}

pub mod learning {
    /// Grid cell size used to quantize player positions.
    pub const CELL_SIZE: f32 = 50.0;
    /// Half-width of the "mid" lane around the world center.
    pub const MID_DEAD_ZONE: f32 = 100.0;
    pub const LONG_RANGE: f32 = 300.0;
    pub const CLOSE_RANGE: f32 = 150.0;
    /// Round-start movement rate (u/s) above which a round counts as a rush.
    pub const RUSH_RATE: f32 = 150.0;
    /// Round-start movement rate (u/s) below which a round counts as a camp.
    pub const CAMP_RATE: f32 = 50.0;
    pub const MAX_PRE_AIM: usize = 5;
    pub const MAX_AVOID: usize = 3;
    pub const MAX_UTILITY_TARGETS: usize = 3;
    /// Plants earlier than this (seconds into round) are "early".
    pub const EARLY_PLANT_SECS: f32 = 25.0;
    /// Plants later than this are "late".
    pub const LATE_PLANT_SECS: f32 = 50.0;
    pub const TIMING_SHIFT_SECS: f32 = 5.0;
    /// Rounds of data for full confidence.
    pub const FULL_CONFIDENCE_ROUNDS: f32 = 4.0;
    pub const COUNTER_PLAY_SCALE: f64 = 0.7;
    /// How often (sim ms) the controller re-asks whether to use counter-play.
    pub const COUNTER_REFRESH_MS: f32 = 3000.0;
}
