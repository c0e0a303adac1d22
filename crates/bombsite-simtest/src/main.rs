//! Bombsite Headless Duel Harness
//!
//! Validates the AI core and plays full bot-versus-script matches in a
//! `hecs` world. Runs entirely in-process: no rendering, no input.
//!
//! Usage:
//!   cargo run -p bombsite-simtest
//!   cargo run -p bombsite-simtest -- --verbose
//!   cargo run -p bombsite-simtest -- --json --seed 7 --rounds 12
//!   cargo run -p bombsite-simtest -- --config ai.json

mod duel;

use bombsite_logic::config::AiConfig;
use bombsite_logic::controller::{AiController, AiState};
use bombsite_logic::difficulty::Tier;
use bombsite_logic::geometry::{distance, has_line_of_sight, Vec2, Wall};
use bombsite_logic::learning::{AiLearningSystem, RoundStartBehavior};
use bombsite_logic::matchmaker::{MatchmakerAi, BRACKETS};
use bombsite_logic::scene::{AiEvent, Combatant, LaneSide, Role, Weapon};
use clap::Parser;
use duel::{run_match, DuelMap, MatchReport, MatchSetup, RoundEnd, TICK_MS};
use env_logger::Env;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Headless duel harness for the Bombsite AI
#[derive(Debug, Parser)]
#[command(name = "bombsite-simtest")]
#[command(about = "Validate the Bombsite AI and replay seeded duels", long_about = None)]
struct Args {
    /// Print every check and info-level logs
    #[arg(short, long)]
    verbose: bool,

    /// Print the match reports as JSON
    #[arg(long)]
    json: bool,

    /// Seed for the duel section
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Rounds per duel
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,

    /// AI config JSON; defaults to the deterministic config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> AiConfig {
    let Some(path) = path else {
        return AiConfig::deterministic();
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| AiConfig::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load AI config from {}: {}", path.display(), e);
            std::process::exit(2);
        }
    }
}

fn main() {
    let Args {
        verbose,
        json,
        seed,
        rounds,
        config,
    } = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if verbose {
        "info"
    } else {
        "warn"
    }))
    .init();

    let config = load_config(config.as_deref());

    println!("=== Bombsite AI Duel Harness ===\n");

    let mut results = Vec::new();

    // 1. Difficulty table invariants
    results.extend(validate_difficulty(verbose));

    // 2. Matchmaker brackets
    results.extend(validate_matchmaker(&config, verbose));

    // 3. Line of sight
    results.extend(validate_line_of_sight(&config, verbose));

    // 4. Learning system
    results.extend(validate_learning(&config, verbose));

    // 5. Controller micro-scenarios
    results.extend(validate_controller(&config, verbose));

    // 6. Full duels
    let (duel_results, reports) = validate_duels(&config, seed, rounds, verbose);
    results.extend(duel_results);

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(out) => println!("{}", out),
            Err(e) => log::error!("Could not serialize match reports: {}", e),
        }
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Difficulty ───────────────────────────────────────────────────────

fn validate_difficulty(verbose: bool) -> Vec<TestResult> {
    println!("--- Difficulty Tiers ---");
    let mut results = Vec::new();

    let tiers = Tier::all();
    let mut regressions = Vec::new();
    for pair in tiers.windows(2) {
        let (a, b) = (pair[0].profile(), pair[1].profile());
        if b.accuracy < a.accuracy
            || b.reaction_time_ms > a.reaction_time_ms
            || b.aggression < a.aggression
        {
            regressions.push(format!("{} -> {}", a.name, b.name));
        }
    }
    results.push(TestResult {
        name: "tiers_monotonic".into(),
        passed: regressions.is_empty(),
        detail: if regressions.is_empty() {
            format!("{} tiers strictly ordered", tiers.len())
        } else {
            format!("regressions: {}", regressions.join(", "))
        },
    });

    let mut out_of_bounds = 0;
    for pair in tiers.windows(2) {
        let (a, b) = (pair[0].profile(), pair[1].profile());
        for step in 0..=10 {
            let t = step as f32 / 10.0;
            let m = a.blend(&b, t);
            let within = |v: f32, x: f32, y: f32| v >= x.min(y) - 1e-4 && v <= x.max(y) + 1e-4;
            if !within(m.accuracy, a.accuracy, b.accuracy)
                || !within(m.reaction_time_ms, a.reaction_time_ms, b.reaction_time_ms)
                || !within(m.aggression, a.aggression, b.aggression)
                || !within(m.move_speed_multiplier, a.move_speed_multiplier, b.move_speed_multiplier)
            {
                out_of_bounds += 1;
            }
        }
    }
    results.push(TestResult {
        name: "blend_bounds".into(),
        passed: out_of_bounds == 0,
        detail: format!("{} blended profiles outside their endpoints", out_of_bounds),
    });

    let names_ok = tiers.iter().all(|t| Tier::from_name(t.name()) == Some(*t));
    results.push(TestResult {
        name: "tier_names_round_trip".into(),
        passed: names_ok,
        detail: tiers.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
    });

    if verbose {
        for t in tiers {
            let p = t.profile();
            println!(
                "  {:>9}: react {:>3.0}ms acc {:.2} aggr {:.2} speed {:.2}",
                p.name, p.reaction_time_ms, p.accuracy, p.aggression, p.move_speed_multiplier
            );
        }
    }
    results
}

// ── 2. Matchmaker ───────────────────────────────────────────────────────

fn validate_matchmaker(config: &AiConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Matchmaker ---");
    let mut results = Vec::new();
    let mm = MatchmakerAi::new(&AiConfig {
        jitter_enabled: false,
        ..config.clone()
    });
    let mut rng = StdRng::seed_from_u64(1);

    let mismatched: Vec<_> = BRACKETS
        .iter()
        .filter(|b| b.blend == 0.0)
        .filter(|b| mm.match_profile(b.min, &mut rng) != b.tier.profile())
        .map(|b| b.min)
        .collect();
    results.push(TestResult {
        name: "boundary_is_base_profile".into(),
        passed: mismatched.is_empty(),
        detail: if mismatched.is_empty() {
            "zero-blend boundaries return the base tier".into()
        } else {
            format!("mismatched at {:?}", mismatched)
        },
    });

    let low = mm.for_skill_score(-500.0);
    let high = mm.for_skill_score(1.0e7);
    results.push(TestResult {
        name: "out_of_range_clamps".into(),
        passed: low == Tier::Easy.profile() && high == Tier::Expert.profile(),
        detail: format!("-500 -> '{}', 1e7 -> '{}'", low.name, high.name),
    });

    if verbose {
        for score in [0.0, 150.0, 450.0, 1000.0, 1800.0, 2700.0, 3200.0, 4000.0] {
            let p = mm.for_skill_score(score);
            println!("  {:>6.0} trophies -> '{}' acc {:.2}", score, p.name, p.accuracy);
        }
    }
    results
}

// ── 3. Line of sight ────────────────────────────────────────────────────

fn validate_line_of_sight(config: &AiConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Line of Sight ---");
    let mut results = Vec::new();
    let range = config.sight_range;
    let radius = config.smoke_radius;

    let near = has_line_of_sight(Vec2::ZERO, Vec2::new(100.0, 0.0), &[], &[], range, radius);
    let far = has_line_of_sight(Vec2::ZERO, Vec2::new(700.0, 0.0), &[], &[], range, radius);
    results.push(TestResult {
        name: "los_range_limit".into(),
        passed: near && !far,
        detail: format!("100u visible={}, 700u visible={}", near, far),
    });

    let mut asymmetric = 0;
    let mut range_mismatch = 0;
    for i in 0..40 {
        let a = Vec2::new((i * 37 % 900) as f32, (i * 53 % 700) as f32);
        let b = Vec2::new((i * 71 % 800) as f32, (i * 19 % 900) as f32);
        let ab = has_line_of_sight(a, b, &[], &[], range, radius);
        let ba = has_line_of_sight(b, a, &[], &[], range, radius);
        if ab != ba {
            asymmetric += 1;
        }
        if ab != (distance(a, b) <= range) {
            range_mismatch += 1;
        }
    }
    results.push(TestResult {
        name: "los_symmetric_on_empty_map".into(),
        passed: asymmetric == 0 && range_mismatch == 0,
        detail: format!("{} asymmetric, {} range mismatches", asymmetric, range_mismatch),
    });

    let wall = [Wall::new(40.0, -50.0, 20.0, 100.0)];
    let blocked = !has_line_of_sight(Vec2::ZERO, Vec2::new(100.0, 0.0), &wall, &[], range, radius);
    results.push(TestResult {
        name: "los_wall_blocks".into(),
        passed: blocked,
        detail: "wall across the segment hides the target".into(),
    });
    results
}

// ── 4. Learning ─────────────────────────────────────────────────────────

fn validate_learning(config: &AiConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Learning ---");
    let mut results = Vec::new();

    let mut learning = AiLearningSystem::new(config, 5);
    for _ in 0..10 {
        learning.track_round_start(20.0, 1.0);
    }
    learning.analyze_patterns();
    learning.analyze_patterns();
    let behavior = learning.profile().round_start_behavior;
    results.push(TestResult {
        name: "slow_starts_are_camping".into(),
        passed: behavior == RoundStartBehavior::Camp,
        detail: format!("10 starts at 20 u/s -> {:?}", behavior),
    });

    let mut learning = AiLearningSystem::new(config, 6);
    let mut ramp = vec![learning.confidence()];
    let mut max_pre_aim = 0;
    for round in 0..8 {
        for i in 0..30 {
            let p = Vec2::new(((i * 41 + round * 7) % 1000) as f32, ((i * 67) % 1000) as f32);
            learning.track_position(p, 1000.0);
        }
        learning.analyze_patterns();
        ramp.push(learning.confidence());
        max_pre_aim = max_pre_aim.max(learning.strategy().pre_aim_positions.len());
    }
    let non_decreasing = ramp.windows(2).all(|w| w[1] >= w[0]);
    results.push(TestResult {
        name: "confidence_ramp".into(),
        passed: ramp[0] == 0.0 && ramp[4] == 1.0 && non_decreasing,
        detail: format!("{:?}", ramp),
    });
    results.push(TestResult {
        name: "pre_aim_cap".into(),
        passed: max_pre_aim <= 5,
        detail: format!("max {} pre-aim spots over 8 rounds", max_pre_aim),
    });
    results
}

// ── 5. Controller ───────────────────────────────────────────────────────

fn validate_controller(config: &AiConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Controller ---");
    let mut results = Vec::new();
    let map = DuelMap::three_lanes();

    // Wounded bot with a smoke retreats behind it.
    let mut ai = AiController::with_seed(Tier::Hard.profile(), Role::Defender, config, 3);
    let mut me = Combatant::new(Vec2::new(500.0, 250.0), Weapon::Rifle);
    let enemy = Combatant::new(Vec2::new(500.0, 420.0), Weapon::Rifle);
    ai.update(TICK_MS, &map, &mut me, Some(&enemy), None);
    let entered_combat = ai.state() == AiState::Combat;
    me.hp = 35.0;
    let events = ai.update(TICK_MS, &map, &mut me, Some(&enemy), None);
    let smokes = events
        .iter()
        .filter(|e| matches!(e, AiEvent::SmokeDeployed { .. }))
        .count();
    results.push(TestResult {
        name: "low_hp_smoke_retreat".into(),
        passed: entered_combat && ai.state() == AiState::Retreat && smokes == 1,
        detail: format!("state {:?}, {} smoke event(s)", ai.state(), smokes),
    });

    // Fire cadence holds for the slowest thinker.
    let mut ai = AiController::with_seed(Tier::Easy.profile(), Role::Defender, config, 4);
    let mut me = Combatant::new(Vec2::new(500.0, 250.0), Weapon::Smg);
    let mut last = None;
    let mut worst_gap = 0.0f32;
    for tick in 0..400u32 {
        let events = ai.update(TICK_MS, &map, &mut me, Some(&enemy), None);
        if events.iter().any(|e| matches!(e, AiEvent::Fired { .. })) {
            if let Some(prev) = last {
                worst_gap = worst_gap.max((tick - prev) as f32 * TICK_MS);
            }
            last = Some(tick);
        }
    }
    let limit = Weapon::Smg.fire_rate_ms() + TICK_MS;
    results.push(TestResult {
        name: "fire_cadence".into(),
        passed: last.is_some() && worst_gap <= limit,
        detail: format!("worst gap {:.0}ms (limit {:.0}ms)", worst_gap, limit),
    });
    results
}

// ── 6. Duels ────────────────────────────────────────────────────────────

fn validate_duels(
    config: &AiConfig,
    seed: u64,
    rounds: u32,
    verbose: bool,
) -> (Vec<TestResult>, Vec<MatchReport>) {
    println!("--- Duels ---");
    let mut results = Vec::new();
    let mut reports = Vec::new();

    for (i, score) in [50.0, 450.0, 1000.0, 1700.0, 2600.0, 3800.0].into_iter().enumerate() {
        let setup = MatchSetup {
            seed: seed + i as u64,
            skill_score: score,
            rounds,
            player_lane: LaneSide::Left,
        };
        let report = run_match(&setup, config);

        let complete = report.rounds.len() == rounds as usize
            && report.rounds.iter().all(|r| r.duration_ms > 0.0);
        let shots: u32 = report.rounds.iter().map(|r| r.bot_shots).sum();
        let timeouts = report
            .rounds
            .iter()
            .filter(|r| r.end == RoundEnd::TimeOut)
            .count();
        results.push(TestResult {
            name: format!("duel_{}_completes", report.profile),
            passed: complete && shots > 0,
            detail: format!(
                "AI {}-{} player, {} bot shots, {} timeouts, style {:?}",
                report.ai_rounds, report.player_rounds, shots, timeouts, report.counter_style
            ),
        });

        if rounds >= 4 {
            results.push(TestResult {
                name: format!("duel_{}_learned", report.profile),
                passed: report.confidence == 1.0 && report.pre_aim_spots <= 5,
                detail: format!(
                    "confidence {:.2}, {} pre-aim spots, player lane {:?}",
                    report.confidence, report.pre_aim_spots, report.preferred_lane
                ),
            });
        }

        if verbose {
            for r in &report.rounds {
                println!(
                    "  [{}] round {:>2} {:?} bot: {:?} by {:?} ({:.1}s, {}/{} hits, {} smokes)",
                    report.profile,
                    r.number,
                    r.ai_role,
                    r.winner,
                    r.end,
                    r.duration_ms / 1000.0,
                    r.bot_hits,
                    r.bot_shots,
                    r.bot_smokes
                );
            }
        }
        reports.push(report);
    }

    let setup = MatchSetup {
        seed,
        skill_score: 1000.0,
        rounds: rounds.min(4),
        player_lane: LaneSide::Right,
    };
    let first = run_match(&setup, config);
    let second = run_match(&setup, config);
    results.push(TestResult {
        name: "duel_replay_deterministic".into(),
        passed: first == second,
        detail: format!("seed {} replayed over {} rounds", seed, setup.rounds),
    });

    (results, reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let args = Args::try_parse_from(["bombsite-simtest"]).unwrap();
        assert!(!args.verbose);
        assert!(!args.json);
        assert_eq!(args.seed, 42);
        assert_eq!(args.rounds, 8);
        assert!(args.config.is_none());
    }

    #[test]
    fn all_flags_parse() {
        let args = Args::try_parse_from([
            "bombsite-simtest",
            "--verbose",
            "--json",
            "--seed",
            "7",
            "--rounds",
            "12",
            "--config",
            "ai.json",
        ])
        .unwrap();
        assert!(args.verbose && args.json);
        assert_eq!(args.seed, 7);
        assert_eq!(args.rounds, 12);
        assert_eq!(args.config, Some(PathBuf::from("ai.json")));
    }

    #[test]
    fn malformed_values_are_rejected() {
        for bad in [
            &["bombsite-simtest", "--seed", "abc"][..],
            &["bombsite-simtest", "--seed", "-1"][..],
            &["bombsite-simtest", "--rounds", "0"][..],
            &["bombsite-simtest", "--rounds", "many"][..],
            &["bombsite-simtest", "--seed"][..],
            &["bombsite-simtest", "--sead", "7"][..],
        ] {
            let parsed = Args::try_parse_from(bad.iter().copied());
            assert!(parsed.is_err(), "{bad:?} parsed");
        }
    }
}
