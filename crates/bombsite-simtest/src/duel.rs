//! Headless duel host: one bot, one scripted player, a three-lane map.
//!
//! Entities live in a `hecs` world. The host owns everything the AI core
//! refuses to: collision, shot resolution, smoke lifetimes, plant/defuse
//! progress and the bomb timer. It also plays the part of the game shell
//! by feeding player telemetry into the learning system and round results
//! into the personality.

use bombsite_logic::config::AiConfig;
use bombsite_logic::constants::objective::{DEFUSE_RADIUS, PLANT_RADIUS};
use bombsite_logic::controller::AiController;
use bombsite_logic::geometry::{angle_between, distance, has_line_of_sight, Smoke, Vec2, Wall};
use bombsite_logic::learning::{AiLearningSystem, CombatSample, CounterKind, CounterStyle};
use bombsite_logic::matchmaker::MatchmakerAi;
use bombsite_logic::personality::{AiPersonality, CalloutKind, Mood};
use bombsite_logic::scene::{AiEvent, BombState, Combatant, Lane, LaneSide, Role, Scene, Weapon};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::f32::consts::{PI, TAU};

pub const WORLD_SIZE: f32 = 1000.0;
pub const TICK_MS: f32 = 16.0;

const ROUND_LIMIT_MS: f32 = 60_000.0;
const HARD_CAP_MS: f32 = 120_000.0;
const BOMB_TIMER_MS: f32 = 30_000.0;
const PLANT_TIME_MS: f32 = 3_000.0;
const DEFUSE_TIME_MS: f32 = 5_000.0;
const SMOKE_LIFETIME_MS: f32 = 8_000.0;
const BODY_RADIUS: f32 = 12.0;
const AIM_TOLERANCE: f32 = 0.15;
const TELEMETRY_INTERVAL_MS: f32 = 500.0;
const ROUND_START_WINDOW_MS: f32 = 3_000.0;
const PLAYER_ACCURACY: f32 = 0.45;
const PLAYER_SPEED: f32 = 170.0;
const FAKE_WINDOW_MS: f32 = 2_000.0;

const ATTACKER_SPAWN: Vec2 = Vec2 { x: 500.0, y: 950.0 };
const DEFENDER_SPAWN: Vec2 = Vec2 { x: 500.0, y: 60.0 };
const DEFENDER_HOLD: Vec2 = Vec2 { x: 500.0, y: 220.0 };

// ── Components ──────────────────────────────────────────────────────────

struct Bot(AiController);

/// Scripted stand-in for the human. Rushes its favourite lane on attack,
/// holds the site on defense, retakes a planted bomb.
struct Player {
    lane: LaneSide,
    cursor: usize,
    shot_timer: f32,
    smoke_thrown: bool,
}

#[derive(Default)]
struct ObjectiveProgress {
    plant_ms: f32,
    defuse_ms: f32,
}

struct SmokeCloud {
    smoke: Smoke,
    remaining_ms: f32,
}

// ── Map ─────────────────────────────────────────────────────────────────

pub struct DuelMap {
    walls: Vec<Wall>,
    lanes: Vec<Lane>,
    site: Vec2,
    smokes: Vec<Smoke>,
    bomb: BombState,
    ended: bool,
}

impl DuelMap {
    /// Two long dividers split the map into left/mid/right lanes that all
    /// converge on a site at the top.
    pub fn three_lanes() -> Self {
        let lane = |side, x: f32| Lane {
            side,
            waypoints: vec![Vec2::new(x, 800.0), Vec2::new(x, 250.0)],
        };
        Self {
            walls: vec![
                Wall::new(280.0, 300.0, 40.0, 450.0),
                Wall::new(680.0, 300.0, 40.0, 450.0),
                Wall::new(530.0, 480.0, 50.0, 40.0),
            ],
            lanes: vec![
                lane(LaneSide::Left, 150.0),
                lane(LaneSide::Mid, 500.0),
                lane(LaneSide::Right, 850.0),
            ],
            site: Vec2::new(500.0, 150.0),
            smokes: Vec::new(),
            bomb: BombState::Carried,
            ended: false,
        }
    }

    fn lane(&self, side: LaneSide) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.side == side)
    }

    fn blocked(&self, p: Vec2) -> bool {
        self.walls.iter().filter(|w| w.active).any(|w| {
            p.x > w.min_x() - BODY_RADIUS
                && p.x < w.max_x() + BODY_RADIUS
                && p.y > w.min_y() - BODY_RADIUS
                && p.y < w.max_y() + BODY_RADIUS
        })
    }

    /// Move with wall sliding: full step, then each axis alone.
    fn step(&self, from: Vec2, delta: Vec2) -> Vec2 {
        let clamp = |p: Vec2| {
            Vec2::new(
                p.x.clamp(BODY_RADIUS, WORLD_SIZE - BODY_RADIUS),
                p.y.clamp(BODY_RADIUS, WORLD_SIZE - BODY_RADIUS),
            )
        };
        [
            from + delta,
            from + Vec2::new(delta.x, 0.0),
            from + Vec2::new(0.0, delta.y),
        ]
        .into_iter()
        .map(clamp)
        .find(|p| !self.blocked(*p))
        .unwrap_or(from)
    }
}

impl Scene for DuelMap {
    fn walls(&self) -> &[Wall] {
        &self.walls
    }

    fn active_smokes(&self) -> &[Smoke] {
        &self.smokes
    }

    fn bomb_site(&self) -> Vec2 {
        self.site
    }

    fn bomb(&self) -> BombState {
        self.bomb
    }

    fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    fn world_width(&self) -> f32 {
        WORLD_SIZE
    }

    fn round_ended(&self) -> bool {
        self.ended
    }
}

// ── Reports ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundEnd {
    Elimination,
    Exploded,
    Defused,
    TimeOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    pub number: u32,
    pub ai_role: Role,
    pub winner: Role,
    pub end: RoundEnd,
    pub duration_ms: f32,
    pub bot_shots: u32,
    pub bot_hits: u32,
    pub player_shots: u32,
    pub bot_smokes: u32,
    pub bomb_planted: bool,
    pub counter_play: bool,
    pub callouts: Vec<String>,
}

impl RoundReport {
    pub fn ai_won(&self) -> bool {
        self.winner == self.ai_role
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub seed: u64,
    pub skill_score: f32,
    pub profile: String,
    pub opponent_name: String,
    pub final_mood: Mood,
    pub ai_rounds: u32,
    pub player_rounds: u32,
    pub confidence: f32,
    pub counter_style: CounterStyle,
    pub preferred_lane: LaneSide,
    pub pre_aim_spots: usize,
    pub rounds: Vec<RoundReport>,
}

#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub seed: u64,
    pub skill_score: f32,
    pub rounds: u32,
    /// Lane the scripted player always attacks through.
    pub player_lane: LaneSide,
}

// ── Match ───────────────────────────────────────────────────────────────

/// Play a full match. Sides swap every round; the bot attacks first.
pub fn run_match(setup: &MatchSetup, config: &AiConfig) -> MatchReport {
    let mut rng = StdRng::seed_from_u64(setup.seed);
    let base = MatchmakerAi::new(config).match_profile(setup.skill_score, &mut rng);
    let mut personality = AiPersonality::new(setup.skill_score);
    let mut learning = AiLearningSystem::new(config, rng.gen());

    log::info!(
        "Match seed {}: {} ('{}') at {} trophies",
        setup.seed,
        personality.name(),
        base.name,
        setup.skill_score
    );

    let mut rounds = Vec::with_capacity(setup.rounds as usize);
    for number in 1..=setup.rounds {
        let ai_role = if number % 2 == 1 {
            Role::Attacker
        } else {
            Role::Defender
        };
        let profile = base.with_modifiers(&personality.behavior_modifiers());
        let mut round = RoundRunner::new(number, ai_role, setup, config, &mut rng, profile.accuracy);
        let report = round.play(
            AiController::with_seed(profile, ai_role, config, rng.gen()),
            &mut learning,
            &mut personality,
            &mut rng,
        );

        learning.analyze_patterns();
        personality.record_round(report.ai_won());
        log::info!(
            "Round {} ({:?} bot): {:?} wins by {:?} after {:.1}s",
            number,
            ai_role,
            report.winner,
            report.end,
            report.duration_ms / 1000.0
        );
        rounds.push(report);
    }

    let ai_rounds = rounds.iter().filter(|r| r.ai_won()).count() as u32;
    let strategy = learning.strategy();
    MatchReport {
        seed: setup.seed,
        skill_score: setup.skill_score,
        profile: base.name.clone(),
        opponent_name: personality.name().to_string(),
        final_mood: personality.mood(),
        ai_rounds,
        player_rounds: rounds.len() as u32 - ai_rounds,
        confidence: learning.confidence(),
        counter_style: strategy.counter_style,
        preferred_lane: strategy.preferred_lane,
        pre_aim_spots: strategy.pre_aim_positions.len(),
        rounds,
    }
}

// ── Round ───────────────────────────────────────────────────────────────

struct RoundRunner<'a> {
    world: World,
    map: DuelMap,
    config: &'a AiConfig,
    ai_role: Role,
    bot_accuracy: f32,
    player: Entity,
    clock_ms: f32,
    telemetry_ms: f32,
    round_start_tracked: bool,
    engagement: Option<CombatSample>,
    last_fake_at: Option<f32>,
    report: RoundReport,
}

impl<'a> RoundRunner<'a> {
    fn new(
        number: u32,
        ai_role: Role,
        setup: &MatchSetup,
        config: &'a AiConfig,
        rng: &mut StdRng,
        bot_accuracy: f32,
    ) -> Self {
        let mut world = World::new();
        let player_role = ai_role.opposite();
        let player = world.spawn((
            Combatant::new(spawn_for(player_role), Weapon::Rifle),
            Player {
                lane: setup.player_lane,
                cursor: 0,
                // stagger the opening shot a little
                shot_timer: rng.gen_range(0.0..100.0),
                smoke_thrown: false,
            },
            ObjectiveProgress::default(),
        ));
        Self {
            world,
            map: DuelMap::three_lanes(),
            config,
            ai_role,
            bot_accuracy,
            player,
            clock_ms: 0.0,
            telemetry_ms: 0.0,
            round_start_tracked: false,
            engagement: None,
            last_fake_at: None,
            report: RoundReport {
                number,
                ai_role,
                winner: Role::Defender,
                end: RoundEnd::TimeOut,
                duration_ms: 0.0,
                bot_shots: 0,
                bot_hits: 0,
                player_shots: 0,
                bot_smokes: 0,
                bomb_planted: false,
                counter_play: false,
                callouts: Vec::new(),
            },
        }
    }

    fn play(
        &mut self,
        ai: AiController,
        learning: &mut AiLearningSystem,
        personality: &mut AiPersonality,
        rng: &mut StdRng,
    ) -> RoundReport {
        let bot = self.world.spawn((
            Combatant::new(spawn_for(self.ai_role), Weapon::Rifle),
            Bot(ai),
            ObjectiveProgress::default(),
        ));
        if let Ok(mut b) = self.world.get::<&mut Bot>(bot) {
            b.0.set_role(self.ai_role == Role::Attacker);
        }
        let greeting = personality.callout(CalloutKind::Greeting, rng);
        self.report.callouts.push(greeting.to_string());

        let (winner, end) = loop {
            if let Some(result) = self.tick(bot, learning, personality, rng) {
                break result;
            }
        };

        self.map.ended = true;
        if let Some(sample) = self.engagement.take() {
            learning.track_combat(sample);
        }
        self.report.winner = winner;
        self.report.end = end;
        self.report.duration_ms = self.clock_ms;
        self.report.bomb_planted = self.report.bomb_planted || self.map.bomb != BombState::Carried;
        self.report.clone()
    }

    fn tick(
        &mut self,
        bot: Entity,
        learning: &mut AiLearningSystem,
        personality: &mut AiPersonality,
        rng: &mut StdRng,
    ) -> Option<(Role, RoundEnd)> {
        self.clock_ms += TICK_MS;
        let player_role = self.ai_role.opposite();
        if self.clock_ms >= HARD_CAP_MS {
            return Some((Role::Defender, RoundEnd::TimeOut));
        }

        self.update_smokes();
        if let Some(result) = self.update_bomb() {
            return Some(result);
        }

        let bot_c = combatant(&self.world, bot)?;
        let player_c = combatant(&self.world, self.player)?;

        // ── Bot ──
        let events = match self.world.query_one_mut::<(&mut Combatant, &mut Bot)>(bot) {
            Ok((me, Bot(ai))) => {
                let events = ai.update(TICK_MS, &self.map, me, Some(&player_c), Some(&*learning));
                self.report.counter_play |= ai.counter_play_active();
                events
            }
            Err(_) => Vec::new(),
        };
        for event in events {
            match event {
                AiEvent::Fired { origin, angle } => {
                    self.report.bot_shots += 1;
                    if self.shot_lands(origin, angle, player_c.position)
                        && rng.gen::<f32>() < self.bot_accuracy
                    {
                        self.report.bot_hits += 1;
                        damage(&mut self.world, self.player, bot_c.weapon.damage());
                    }
                }
                AiEvent::SmokeDeployed { position } => {
                    self.report.bot_smokes += 1;
                    self.spawn_smoke(position);
                }
                AiEvent::Callout { kind } => {
                    if kind == CalloutKind::FakeAction {
                        self.last_fake_at = Some(self.clock_ms);
                    }
                    let line = personality.callout(kind, rng);
                    log::debug!("{}: \"{}\"", personality.name(), line);
                    self.report.callouts.push(line.to_string());
                }
            }
        }

        // ── Player ──
        let player_sees_bot = has_line_of_sight(
            player_c.position,
            bot_c.position,
            &self.map.walls,
            &self.map.smokes,
            self.config.sight_range,
            self.config.smoke_radius,
        );
        let intent = match self
            .world
            .query_one_mut::<(&mut Combatant, &mut Player)>(self.player)
        {
            Ok((me, script)) => {
                drive_player(script, me, player_role, &self.map, &bot_c, player_sees_bot, self.clock_ms)
            }
            Err(_) => PlayerIntent::default(),
        };
        if let Some(position) = intent.smoke {
            self.spawn_smoke(position);
            learning.track_smoke(position, player_role == Role::Attacker);
        }
        if intent.fired {
            self.report.player_shots += 1;
            let hit = rng.gen::<f32>() < PLAYER_ACCURACY;
            if hit {
                damage(&mut self.world, bot, player_c.weapon.damage());
            }
            let sample = self.engagement.get_or_insert(CombatSample {
                distance: distance(player_c.position, bot_c.position),
                was_moving: player_c.velocity.length() > 1.0,
                shots_fired: 0,
                shots_hit: 0,
            });
            sample.shots_fired += 1;
            sample.shots_hit += hit as u32;

            if let Some(at) = self.last_fake_at {
                if self.clock_ms - at <= FAKE_WINDOW_MS {
                    learning.track_countered(CounterKind::FellForFake);
                    self.last_fake_at = None;
                }
            }
        }

        // ── Physics ──
        for (_, c) in self.world.query_mut::<&mut Combatant>() {
            if c.is_alive() {
                c.position = self.map.step(c.position, c.velocity * (TICK_MS / 1000.0));
            }
        }

        // ── Objectives ──
        let bot_wants = self
            .world
            .get::<&Bot>(bot)
            .map(|b| b.0.wants_to_plant() || b.0.wants_to_defuse())
            .unwrap_or(false);
        let was_carried = self.map.bomb == BombState::Carried;
        if let Some(result) = self.advance_objective(bot, self.ai_role, bot_wants) {
            return Some(result);
        }
        if let Some(result) = self.advance_objective(self.player, player_role, intent.wants_objective) {
            return Some(result);
        }
        if was_carried && self.map.bomb.is_planted() {
            self.report.bomb_planted = true;
            if player_role == Role::Attacker {
                learning.track_plant(self.clock_ms / 1000.0);
            }
        }

        // ── Telemetry ──
        let player_now = combatant(&self.world, self.player)?;
        self.telemetry_ms += TICK_MS;
        if self.telemetry_ms >= TELEMETRY_INTERVAL_MS {
            self.telemetry_ms = 0.0;
            learning.track_position(player_now.position, WORLD_SIZE);
        }
        if !self.round_start_tracked && self.clock_ms >= ROUND_START_WINDOW_MS {
            self.round_start_tracked = true;
            let moved = distance(spawn_for(player_role), player_now.position);
            learning.track_round_start(moved, ROUND_START_WINDOW_MS / 1000.0);
        }

        // ── Eliminations ──
        let bot_now = combatant(&self.world, bot)?;
        if !player_now.is_alive() {
            learning.track_death(player_now.position);
            personality.record_kill();
            if self.report.counter_play && self.ai_role == Role::Attacker {
                learning.track_countered(CounterKind::GotFlanked);
            }
            return Some((self.ai_role, RoundEnd::Elimination));
        }
        if !bot_now.is_alive() {
            learning.track_kill(player_now.position);
            personality.record_death();
            return Some((player_role, RoundEnd::Elimination));
        }

        if self.clock_ms >= ROUND_LIMIT_MS && self.map.bomb == BombState::Carried {
            return Some((Role::Defender, RoundEnd::TimeOut));
        }
        None
    }

    fn update_smokes(&mut self) {
        let mut expired = Vec::new();
        for (entity, cloud) in self.world.query_mut::<&mut SmokeCloud>() {
            cloud.remaining_ms -= TICK_MS;
            if cloud.remaining_ms <= 0.0 {
                expired.push(entity);
            }
        }
        for entity in expired {
            let _ = self.world.despawn(entity);
        }
        self.map.smokes = self
            .world
            .query::<&SmokeCloud>()
            .iter()
            .filter(|(_, c)| c.smoke.active)
            .map(|(_, c)| c.smoke)
            .collect();
    }

    fn spawn_smoke(&mut self, position: Vec2) {
        self.world.spawn((SmokeCloud {
            smoke: Smoke::new(position),
            remaining_ms: SMOKE_LIFETIME_MS,
        },));
    }

    fn update_bomb(&mut self) -> Option<(Role, RoundEnd)> {
        if let BombState::Planted { position, timer_ms } = self.map.bomb {
            let remaining = timer_ms - TICK_MS;
            if remaining <= 0.0 {
                self.map.bomb = BombState::Exploded;
                return Some((Role::Attacker, RoundEnd::Exploded));
            }
            self.map.bomb = BombState::Planted {
                position,
                timer_ms: remaining,
            };
        }
        None
    }

    /// Host-side re-validation of plant/defuse requests.
    fn advance_objective(&mut self, entity: Entity, role: Role, wants: bool) -> Option<(Role, RoundEnd)> {
        let position = combatant(&self.world, entity)?.position;
        let mut progress = self.world.get::<&mut ObjectiveProgress>(entity).ok()?;
        match (role, self.map.bomb) {
            (Role::Attacker, BombState::Carried)
                if wants && distance(position, self.map.site) <= PLANT_RADIUS =>
            {
                progress.plant_ms += TICK_MS;
                if progress.plant_ms >= PLANT_TIME_MS {
                    log::info!("{:?} planted at ({:.0}, {:.0})", role, position.x, position.y);
                    self.map.bomb = BombState::Planted {
                        position,
                        timer_ms: BOMB_TIMER_MS,
                    };
                }
            }
            (Role::Defender, BombState::Planted { position: bomb, .. })
                if wants && distance(position, bomb) <= DEFUSE_RADIUS =>
            {
                progress.defuse_ms += TICK_MS;
                if progress.defuse_ms >= DEFUSE_TIME_MS {
                    self.map.bomb = BombState::Defused;
                    return Some((Role::Defender, RoundEnd::Defused));
                }
            }
            _ => {
                progress.plant_ms = 0.0;
                progress.defuse_ms = 0.0;
            }
        }
        None
    }

    fn shot_lands(&self, origin: Vec2, angle: f32, target: Vec2) -> bool {
        let off = (angle_between(origin, target) - angle + PI).rem_euclid(TAU) - PI;
        off.abs() <= AIM_TOLERANCE
            && has_line_of_sight(
                origin,
                target,
                &self.map.walls,
                &self.map.smokes,
                self.config.sight_range,
                self.config.smoke_radius,
            )
    }
}

// ── Scripted player ─────────────────────────────────────────────────────

#[derive(Default)]
struct PlayerIntent {
    fired: bool,
    wants_objective: bool,
    smoke: Option<Vec2>,
}

fn drive_player(
    script: &mut Player,
    me: &mut Combatant,
    role: Role,
    map: &DuelMap,
    bot: &Combatant,
    sees_bot: bool,
    clock_ms: f32,
) -> PlayerIntent {
    let mut intent = PlayerIntent::default();
    script.shot_timer += TICK_MS;

    if sees_bot {
        me.aim = angle_between(me.position, bot.position);
        me.velocity = Vec2::ZERO;
        if script.shot_timer >= me.weapon.fire_rate_ms() {
            script.shot_timer = 0.0;
            intent.fired = true;
        }
        return intent;
    }

    let target = match (role, map.bomb) {
        (Role::Attacker, BombState::Carried) => {
            let route: Vec<Vec2> = map
                .lane(script.lane)
                .map(|l| l.waypoints.clone())
                .unwrap_or_default()
                .into_iter()
                .chain(std::iter::once(map.site))
                .collect();
            if !script.smoke_thrown && clock_ms >= ROUND_START_WINDOW_MS {
                script.smoke_thrown = true;
                intent.smoke = route.last().map(|s| Vec2::new(s.x, s.y + 150.0));
            }
            while script.cursor + 1 < route.len() && distance(me.position, route[script.cursor]) < 20.0 {
                script.cursor += 1;
            }
            let at_site = distance(me.position, map.site) <= PLANT_RADIUS * 0.5;
            intent.wants_objective = at_site;
            if at_site {
                None
            } else {
                route.get(script.cursor).copied()
            }
        }
        (Role::Defender, BombState::Planted { position, .. }) => {
            let close = distance(me.position, position) <= DEFUSE_RADIUS * 0.5;
            intent.wants_objective = close;
            if close {
                None
            } else {
                Some(position)
            }
        }
        (Role::Defender, _) => Some(DEFENDER_HOLD),
        _ => None,
    };

    me.velocity = match target {
        Some(t) if distance(me.position, t) > 5.0 => (t - me.position).normalized() * PLAYER_SPEED,
        _ => Vec2::ZERO,
    };
    if me.velocity.length() > 0.0 {
        me.aim = me.velocity.y.atan2(me.velocity.x);
    }
    intent
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn spawn_for(role: Role) -> Vec2 {
    match role {
        Role::Attacker => ATTACKER_SPAWN,
        Role::Defender => DEFENDER_SPAWN,
    }
}

fn combatant(world: &World, entity: Entity) -> Option<Combatant> {
    world.get::<&Combatant>(entity).ok().map(|c| *c)
}

fn damage(world: &mut World, entity: Entity, amount: f32) {
    if let Ok(mut c) = world.get::<&mut Combatant>(entity) {
        c.hp = (c.hp - amount).max(0.0);
        if c.hp <= 0.0 {
            c.active = false;
            c.velocity = Vec2::ZERO;
        }
    }
}
