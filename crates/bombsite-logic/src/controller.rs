//! Per-bot tactical state machine.
//!
//! One [`AiController`] drives one bot for one round. The host calls
//! [`AiController::update`] every frame and drains the returned events.
//!
//! Each tick runs in a fixed order so reactions are never a tick stale:
//!
//! 1. **Perception**: line-of-sight to the opponent, every tick. A visible
//!    opponent forces combat and reflexive aim/fire immediately.
//! 2. **Decision**: high-level transitions, gated by the profile's
//!    reaction time (the "think timer").
//! 3. **Action**: velocity and aim written onto the bot's [`Combatant`].
//!
//! ```text
//!   Idle ──► Moving ──► Planting / Defusing
//!     │        ▲  │          │ (opponent seen)
//!     ▼        │  ▼          ▼
//!   Combat ◄───┴─ Combat ◄───┘
//!     │ HP < 40 + smoke
//!     ▼
//!   Retreat ──(lost sight / HP > 50)──► Moving
//! ```

use crate::config::AiConfig;
use crate::constants::{combat, learning as learn, movement, objective, stuck};
use crate::difficulty::DifficultyProfile;
use crate::geometry::{angle_between, distance, has_line_of_sight, Vec2};
use crate::learning::{AiLearningSystem, CounterStrategy};
use crate::personality::CalloutKind;
use crate::scene::{AiEvent, BombState, Combatant, LaneSide, Role, Scene};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Moving,
    Combat,
    Planting,
    Defusing,
    Retreat,
}

pub struct AiController {
    profile: DifficultyProfile,
    config: AiConfig,
    role: Role,
    state: AiState,
    rng: StdRng,

    /// Simulation time, advanced only by `update`.
    clock_ms: f32,
    think_timer: f32,
    shot_timer: f32,

    waypoints: Vec<Vec2>,
    cursor: usize,
    path_dirty: bool,
    chasing_bomb: bool,
    push_delay_ms: f32,
    /// The learned push delay is applied once per round.
    push_delay_applied: bool,

    opponent_visible: bool,
    last_seen_at: Option<f32>,
    last_seen_pos: Option<Vec2>,
    holding_cover: bool,
    strafe_side: Option<f32>,
    retreat_side: f32,

    stuck_sample_timer: f32,
    stuck_sample_pos: Option<Vec2>,
    stuck_ms: f32,
    unstuck_ms: f32,
    unstuck_dir: Vec2,

    last_smoke_at: Option<f32>,

    wants_to_plant: bool,
    wants_to_defuse: bool,
    fake_ms: f32,
    risk_committed: bool,

    counter_refresh_ms: f32,
    counter: Option<CounterStrategy>,

    outbox: Vec<AiEvent>,
}

impl AiController {
    pub fn new(profile: DifficultyProfile, role: Role, config: &AiConfig, rng: StdRng) -> Self {
        Self {
            profile,
            config: config.clone(),
            role,
            state: AiState::Idle,
            rng,
            clock_ms: 0.0,
            think_timer: 0.0,
            shot_timer: f32::INFINITY,
            waypoints: Vec::new(),
            cursor: 0,
            path_dirty: true,
            chasing_bomb: false,
            push_delay_ms: 0.0,
            push_delay_applied: false,
            opponent_visible: false,
            last_seen_at: None,
            last_seen_pos: None,
            holding_cover: false,
            strafe_side: None,
            retreat_side: 1.0,
            stuck_sample_timer: 0.0,
            stuck_sample_pos: None,
            stuck_ms: 0.0,
            unstuck_ms: 0.0,
            unstuck_dir: Vec2::ZERO,
            last_smoke_at: None,
            wants_to_plant: false,
            wants_to_defuse: false,
            fake_ms: 0.0,
            risk_committed: false,
            counter_refresh_ms: 0.0,
            counter: None,
            outbox: Vec::new(),
        }
    }

    pub fn with_seed(profile: DifficultyProfile, role: Role, config: &AiConfig, seed: u64) -> Self {
        Self::new(profile, role, config, StdRng::seed_from_u64(seed))
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn waypoint_cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_seen_position(&self) -> Option<Vec2> {
        self.last_seen_pos
    }

    pub fn wants_to_plant(&self) -> bool {
        self.wants_to_plant
    }

    pub fn wants_to_defuse(&self) -> bool {
        self.wants_to_defuse
    }

    pub fn counter_play_active(&self) -> bool {
        self.counter.is_some()
    }

    /// Assign a role for a new round. Always returns the bot to `Idle`; a
    /// changed role also regenerates the path on the next tick.
    pub fn set_role(&mut self, is_attacker: bool) {
        let role = Role::from_attacker(is_attacker);
        if role != self.role || self.waypoints.is_empty() {
            self.path_dirty = true;
            self.push_delay_applied = false;
        }
        self.role = role;
        self.transition(AiState::Idle);
    }

    // ── Tick ───────────────────────────────────────────────────────────

    /// Advance the bot by `dt_ms`. Writes velocity and aim onto `me` and
    /// returns the events raised this tick. A missing or inactive
    /// opponent, a dead bot, or an ended round makes this a no-op.
    pub fn update(
        &mut self,
        dt_ms: f32,
        scene: &dyn Scene,
        me: &mut Combatant,
        opponent: Option<&Combatant>,
        learning: Option<&AiLearningSystem>,
    ) -> Vec<AiEvent> {
        let opponent = match opponent {
            Some(o) if o.is_alive() => *o,
            _ => return Vec::new(),
        };
        if scene.round_ended() || !me.is_alive() {
            return Vec::new();
        }

        self.clock_ms += dt_ms;
        self.think_timer += dt_ms;
        self.shot_timer += dt_ms;
        self.fake_ms = (self.fake_ms - dt_ms).max(0.0);
        self.push_delay_ms = (self.push_delay_ms - dt_ms).max(0.0);

        self.refresh_counter_play(dt_ms, learning);
        if self.path_dirty {
            self.generate_path(scene);
        }
        self.detect_stuck(dt_ms, me, scene);

        // Perception
        let visible = has_line_of_sight(
            me.position,
            opponent.position,
            scene.walls(),
            scene.active_smokes(),
            self.config.sight_range,
            self.config.smoke_radius,
        );
        self.perceive(visible, scene, me, &opponent);

        // Decision
        let think_interval = self.profile.reaction_time_ms.max(self.config.think_floor_ms);
        if self.think_timer >= think_interval {
            self.think_timer = 0.0;
            self.think(visible, scene, me);
        }

        // Action
        self.act(dt_ms, visible, me, &opponent);

        std::mem::take(&mut self.outbox)
    }

    fn perceive(&mut self, visible: bool, scene: &dyn Scene, me: &mut Combatant, opp: &Combatant) {
        let newly_visible = visible && !self.opponent_visible;
        let just_lost = !visible && self.opponent_visible;
        self.opponent_visible = visible;

        if just_lost && self.state == AiState::Combat {
            self.holding_cover = self.roll(self.profile.uses_cover_chance as f64);
        }
        if !visible {
            return;
        }

        self.last_seen_at = Some(self.clock_ms);
        self.last_seen_pos = Some(opp.position);

        match self.state {
            AiState::Idle | AiState::Moving | AiState::Combat => {
                if self.state != AiState::Combat {
                    me.velocity = Vec2::ZERO;
                    self.transition(AiState::Combat);
                }
                self.combat_micro(me, opp);
            }
            AiState::Planting => {
                self.transition(AiState::Combat);
                self.combat_micro(me, opp);
            }
            AiState::Defusing => {
                if newly_visible {
                    self.risk_committed = self.roll(objective::RISK_PROBABILITY);
                }
                let nearly_out = match scene.bomb() {
                    BombState::Planted { timer_ms, .. } => timer_ms < objective::COMMIT_DEFUSE_MS,
                    _ => false,
                };
                if !(nearly_out || self.risk_committed) {
                    self.transition(AiState::Combat);
                    self.combat_micro(me, opp);
                }
            }
            AiState::Retreat => {}
        }
    }

    /// Reflexive combat: face, bail out on low health, fire.
    fn combat_micro(&mut self, me: &mut Combatant, opp: &Combatant) {
        me.aim = angle_between(me.position, opp.position);

        if me.hp < combat::RETREAT_HP && self.smoke_ready(me) {
            let toward = (opp.position - me.position).normalized();
            let reach = (distance(me.position, opp.position) * 0.5).min(combat::SMOKE_THROW_DISTANCE);
            self.deploy_smoke(me, me.position + toward * reach);
            self.retreat_side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            self.transition(AiState::Retreat);
            self.outbox.push(AiEvent::Callout {
                kind: CalloutKind::Retreating,
            });
            return;
        }

        self.try_fire(me);
    }

    fn try_fire(&mut self, me: &Combatant) {
        if self.shot_timer < me.weapon.fire_rate_ms() {
            return;
        }
        self.shot_timer = 0.0;
        self.outbox.push(AiEvent::Fired {
            origin: me.position,
            angle: me.aim,
        });
    }

    fn think(&mut self, visible: bool, scene: &dyn Scene, me: &mut Combatant) {
        match self.state {
            AiState::Idle => {
                self.transition(if visible {
                    AiState::Combat
                } else {
                    AiState::Moving
                });
            }
            AiState::Moving => {
                if visible {
                    me.velocity = Vec2::ZERO;
                    self.transition(AiState::Combat);
                    return;
                }
                if self.check_objective(scene, me) {
                    return;
                }
                self.maybe_smoke_while_moving(me);
            }
            AiState::Combat => {
                if visible {
                    self.strafe_side = if self.effective_aggression() > combat::STRAFE_AGGRESSION
                        && self.roll(combat::STRAFE_PROBABILITY)
                    {
                        Some(if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 })
                    } else {
                        None
                    };
                } else {
                    let since = self
                        .last_seen_at
                        .map(|t| self.clock_ms - t)
                        .unwrap_or(f32::MAX);
                    if since > combat::LOST_SIGHT_MS {
                        self.transition(AiState::Moving);
                    }
                }
            }
            AiState::Planting => {
                if scene.bomb() != BombState::Carried {
                    self.transition(AiState::Moving);
                }
            }
            AiState::Defusing => {
                if !scene.bomb().is_planted() {
                    self.transition(AiState::Moving);
                }
            }
            AiState::Retreat => {
                if !visible || me.hp > combat::RECOVER_HP {
                    self.transition(AiState::Moving);
                }
            }
        }
    }

    /// Objective opportunities while moving. Returns true if the state
    /// changed.
    fn check_objective(&mut self, scene: &dyn Scene, me: &Combatant) -> bool {
        match (self.role, scene.bomb()) {
            (Role::Attacker, BombState::Carried) => {
                if distance(me.position, scene.bomb_site()) <= objective::PLANT_RADIUS {
                    self.enter_objective(AiState::Planting);
                    return true;
                }
            }
            (Role::Defender, BombState::Planted { position, .. }) => {
                if distance(me.position, position) <= objective::DEFUSE_RADIUS {
                    self.enter_objective(AiState::Defusing);
                    return true;
                }
                if !self.chasing_bomb {
                    self.chasing_bomb = true;
                    self.waypoints = vec![position];
                    self.cursor = 0;
                }
            }
            _ => {}
        }
        false
    }

    fn enter_objective(&mut self, state: AiState) {
        self.transition(state);
        self.risk_committed = false;
        let can_fake = self.profile.fakes_actions
            || self.counter.as_ref().is_some_and(|c| c.fake_effective);
        if can_fake && self.roll(objective::RISK_PROBABILITY) {
            self.fake_ms = objective::FAKE_DURATION_MS;
            self.outbox.push(AiEvent::Callout {
                kind: CalloutKind::FakeAction,
            });
        } else {
            self.begin_objective();
        }
    }

    fn begin_objective(&mut self) {
        let kind = match self.state {
            AiState::Planting => {
                self.wants_to_plant = true;
                CalloutKind::Planting
            }
            AiState::Defusing => {
                self.wants_to_defuse = true;
                CalloutKind::Defusing
            }
            _ => return,
        };
        self.outbox.push(AiEvent::Callout { kind });
    }

    fn maybe_smoke_while_moving(&mut self, me: &mut Combatant) {
        if !self.smoke_ready(me) {
            return;
        }
        let chance = self.profile.utility_chance as f64 * combat::SMOKE_ROLL_SCALE;
        if !self.roll(chance) {
            return;
        }
        let learned = self.counter.as_ref().and_then(|c| {
            c.utility_targets
                .iter()
                .copied()
                .filter(|t| distance(me.position, *t) <= self.config.sight_range * 0.5)
                .min_by(|a, b| {
                    distance(me.position, *a).total_cmp(&distance(me.position, *b))
                })
        });
        let target = learned.unwrap_or_else(|| {
            let ahead = self
                .current_waypoint()
                .map(|wp| (wp - me.position).normalized())
                .unwrap_or_else(|| Vec2::from_angle(me.aim));
            me.position + ahead * combat::SMOKE_THROW_DISTANCE
        });
        self.deploy_smoke(me, target);
    }

    fn act(&mut self, dt_ms: f32, visible: bool, me: &mut Combatant, opp: &Combatant) {
        let speed = movement::BASE_MOVE_SPEED * self.profile.move_speed_multiplier;

        if self.unstuck_ms > 0.0 {
            self.unstuck_ms -= dt_ms;
            me.velocity = self.unstuck_dir * speed;
            return;
        }

        match self.state {
            AiState::Idle => me.velocity = Vec2::ZERO,
            AiState::Moving => {
                self.follow_path(me, speed);
                self.aim_while_moving(me);
            }
            AiState::Combat => {
                if visible {
                    let dir = (opp.position - me.position).normalized();
                    me.velocity = match self.strafe_side {
                        Some(side) => dir.perp() * (side * speed * movement::STRAFE_FACTOR),
                        None => Vec2::ZERO,
                    };
                } else if let Some(target) = self.last_seen_pos {
                    me.aim = angle_between(me.position, target);
                    let close = distance(me.position, target) <= movement::ARRIVAL_RADIUS;
                    me.velocity = if self.holding_cover || close {
                        Vec2::ZERO
                    } else {
                        (target - me.position).normalized() * speed
                    };
                    let since = self.last_seen_at.map(|t| self.clock_ms - t);
                    if self.profile.pre_fire && since.is_some_and(|s| s <= combat::PRE_FIRE_MS) {
                        self.try_fire(me);
                    }
                } else {
                    me.velocity = Vec2::ZERO;
                }
            }
            AiState::Planting | AiState::Defusing => {
                me.velocity = Vec2::ZERO;
                let pending = !(self.wants_to_plant || self.wants_to_defuse);
                if pending && self.fake_ms <= 0.0 {
                    self.begin_objective();
                }
            }
            AiState::Retreat => {
                let away = (me.position - opp.position).normalized();
                let dir = if self.profile.retreats_smartly {
                    (away + away.perp() * (self.retreat_side * movement::RETREAT_LATERAL))
                        .normalized()
                } else {
                    away
                };
                me.velocity = dir * speed;
                me.aim = angle_between(me.position, opp.position);
            }
        }
    }

    fn follow_path(&mut self, me: &mut Combatant, speed: f32) {
        if self.push_delay_ms > 0.0 {
            me.velocity = Vec2::ZERO;
            return;
        }
        let Some(target) = self.current_waypoint() else {
            me.velocity = Vec2::ZERO;
            return;
        };
        let mut target = target;
        if distance(me.position, target) <= movement::ARRIVAL_RADIUS {
            if self.cursor + 1 < self.waypoints.len() {
                self.cursor += 1;
                target = self.waypoints[self.cursor];
            } else {
                me.velocity = Vec2::ZERO;
                return;
            }
        }
        me.velocity = (target - me.position).normalized() * speed;
    }

    fn aim_while_moving(&mut self, me: &mut Combatant) {
        if self.profile.checks_corners {
            if let Some(spot) = self.counter.as_ref().and_then(|c| {
                c.pre_aim_positions
                    .iter()
                    .copied()
                    .filter(|p| distance(me.position, *p) <= self.config.sight_range)
                    .min_by(|a, b| {
                        distance(me.position, *a).total_cmp(&distance(me.position, *b))
                    })
            }) {
                me.aim = angle_between(me.position, spot);
                return;
            }
        }
        if me.velocity.length() > f32::EPSILON {
            me.aim = me.velocity.y.atan2(me.velocity.x);
        }
    }

    fn current_waypoint(&self) -> Option<Vec2> {
        if self.waypoints.is_empty() {
            None
        } else {
            Some(self.waypoints[self.cursor.min(self.waypoints.len() - 1)])
        }
    }

    // ── Paths ──────────────────────────────────────────────────────────

    fn generate_path(&mut self, scene: &dyn Scene) {
        let site = scene.bomb_site();
        self.cursor = 0;
        self.chasing_bomb = false;
        self.path_dirty = false;

        match self.role {
            Role::Attacker => {
                let lanes = scene.lanes();
                let flank = self.counter.as_ref().map(|c| c.flank_route);
                let preferred = match flank {
                    Some(side) if side != LaneSide::Mid => lanes.iter().find(|l| l.side == side),
                    _ if self.roll(self.profile.flank_chance as f64) => {
                        let sides: Vec<_> =
                            lanes.iter().filter(|l| l.side != LaneSide::Mid).collect();
                        sides.choose(&mut self.rng).copied()
                    }
                    _ => None,
                };
                let lane = preferred.or_else(|| lanes.choose(&mut self.rng));
                let mut path: Vec<Vec2> = lane.map(|l| l.waypoints.clone()).unwrap_or_default();
                if let Some(counter) = &self.counter {
                    for wp in path.iter_mut() {
                        *wp = nudge_away(*wp, &counter.avoid_positions);
                    }
                }
                path.push(site);
                self.waypoints = path;

                // only the round's opening path waits for a late planter
                if !self.push_delay_applied {
                    self.push_delay_applied = true;
                    if let Some(counter) = &self.counter {
                        if counter.timing_adjustment_secs > 0.0 {
                            self.push_delay_ms = counter.timing_adjustment_secs * 1000.0;
                        }
                    }
                }
            }
            Role::Defender => {
                let jitter = self
                    .rng
                    .gen_range(-movement::DEFENDER_JITTER..=movement::DEFENDER_JITTER);
                self.waypoints = vec![Vec2::new(site.x + jitter, site.y)];
            }
        }
        log::debug!(
            "{:?} bot path: {} waypoints (counter-play: {})",
            self.role,
            self.waypoints.len(),
            self.counter.is_some()
        );
    }

    // ── Stuck recovery ─────────────────────────────────────────────────

    fn detect_stuck(&mut self, dt_ms: f32, me: &Combatant, scene: &dyn Scene) {
        let trying = self.state == AiState::Moving
            && self.unstuck_ms <= 0.0
            && me.velocity.length() > f32::EPSILON;
        if !trying {
            self.stuck_ms = 0.0;
            self.stuck_sample_timer = 0.0;
            self.stuck_sample_pos = None;
            return;
        }

        self.stuck_sample_timer += dt_ms;
        if self.stuck_sample_timer < stuck::SAMPLE_INTERVAL_MS {
            return;
        }
        self.stuck_sample_timer = 0.0;
        if let Some(prev) = self.stuck_sample_pos {
            if distance(prev, me.position) < stuck::MIN_PROGRESS {
                self.stuck_ms += stuck::SAMPLE_INTERVAL_MS;
            } else {
                self.stuck_ms = 0.0;
            }
        }
        self.stuck_sample_pos = Some(me.position);

        if self.stuck_ms >= stuck::TRIGGER_MS {
            self.unstuck(scene, me);
        }
    }

    /// Random-direction burst plus a fresh path.
    fn unstuck(&mut self, scene: &dyn Scene, me: &Combatant) {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        self.unstuck_dir = Vec2::from_angle(angle);
        self.unstuck_ms = stuck::BURST_MS;
        self.stuck_ms = 0.0;
        self.stuck_sample_pos = None;
        log::info!(
            "{:?} bot stuck at ({:.0}, {:.0}), regenerating path",
            self.role,
            me.position.x,
            me.position.y
        );
        self.generate_path(scene);
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn refresh_counter_play(&mut self, dt_ms: f32, learning: Option<&AiLearningSystem>) {
        self.counter_refresh_ms -= dt_ms;
        if self.counter_refresh_ms > 0.0 {
            return;
        }
        self.counter_refresh_ms = learn::COUNTER_REFRESH_MS;
        self.counter = match learning {
            Some(l) if self.profile.adapts_to_player && l.should_use_counter_play(&mut self.rng) => {
                Some(l.recommendations().strategy.clone())
            }
            _ => None,
        };
    }

    fn effective_aggression(&self) -> f32 {
        self.counter
            .as_ref()
            .map(|c| c.aggression_target)
            .unwrap_or(self.profile.aggression)
    }

    fn smoke_ready(&self, me: &Combatant) -> bool {
        me.smoke_charges > 0
            && self
                .last_smoke_at
                .map_or(true, |t| self.clock_ms - t >= combat::SMOKE_COOLDOWN_MS)
    }

    fn deploy_smoke(&mut self, me: &mut Combatant, position: Vec2) {
        me.smoke_charges = me.smoke_charges.saturating_sub(1);
        self.last_smoke_at = Some(self.clock_ms);
        self.outbox.push(AiEvent::SmokeDeployed { position });
    }

    fn roll(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn transition(&mut self, to: AiState) {
        if self.state == to {
            return;
        }
        log::debug!("{:?} bot: {:?} -> {:?}", self.role, self.state, to);
        // an unstuck burst only belongs to the path it was fired for
        self.unstuck_ms = 0.0;
        match self.state {
            AiState::Planting | AiState::Defusing => {
                self.wants_to_plant = false;
                self.wants_to_defuse = false;
                self.fake_ms = 0.0;
            }
            AiState::Combat => {
                self.strafe_side = None;
                self.holding_cover = false;
            }
            _ => {}
        }
        self.state = to;
    }
}

/// Push a waypoint off any nearby learned danger spot.
fn nudge_away(wp: Vec2, avoid: &[Vec2]) -> Vec2 {
    avoid
        .iter()
        .find(|a| distance(wp, **a) < movement::AVOID_RADIUS)
        .map(|a| {
            let away = (wp - *a).normalized();
            let dir = if away == Vec2::ZERO {
                Vec2::new(1.0, 0.0)
            } else {
                away
            };
            wp + dir * movement::AVOID_NUDGE
        })
        .unwrap_or(wp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Tier;
    use crate::geometry::{Smoke, Wall};
    use crate::scene::{Lane, Weapon};

    struct TestScene {
        walls: Vec<Wall>,
        smokes: Vec<Smoke>,
        lanes: Vec<Lane>,
        bomb: BombState,
        site: Vec2,
        ended: bool,
    }

    impl TestScene {
        fn new() -> Self {
            Self {
                walls: Vec::new(),
                smokes: Vec::new(),
                lanes: vec![Lane {
                    side: LaneSide::Mid,
                    waypoints: vec![Vec2::new(500.0, 700.0)],
                }],
                bomb: BombState::Carried,
                site: Vec2::new(500.0, 200.0),
                ended: false,
            }
        }
    }

    impl Scene for TestScene {
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
            1000.0
        }
        fn round_ended(&self) -> bool {
            self.ended
        }
    }

    fn controller(tier: Tier, role: Role) -> AiController {
        AiController::with_seed(tier.profile(), role, &AiConfig::deterministic(), 42)
    }

    /// Integrate position like a host physics step would.
    fn step(
        ai: &mut AiController,
        scene: &TestScene,
        me: &mut Combatant,
        opp: &Combatant,
        dt: f32,
    ) -> Vec<AiEvent> {
        let events = ai.update(dt, scene, me, Some(opp), None);
        me.position = me.position + me.velocity * (dt / 1000.0);
        events
    }

    #[test]
    fn ended_round_is_noop() {
        let mut scene = TestScene::new();
        scene.ended = true;
        let mut ai = controller(Tier::Hard, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(100.0, 0.0), Weapon::Rifle);
        assert!(ai.update(16.0, &scene, &mut me, Some(&opp), None).is_empty());
        assert_eq!(ai.state(), AiState::Idle);
    }

    #[test]
    fn missing_opponent_is_noop() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Hard, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        assert!(ai.update(1000.0, &scene, &mut me, None, None).is_empty());
        let mut dead = Combatant::new(Vec2::new(100.0, 0.0), Weapon::Rifle);
        dead.hp = 0.0;
        assert!(ai.update(1000.0, &scene, &mut me, Some(&dead), None).is_empty());
        assert_eq!(ai.state(), AiState::Idle);
    }

    #[test]
    fn visible_opponent_forces_combat_and_fires_same_tick() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Easy, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(100.0, 0.0), Weapon::Rifle);
        let events = ai.update(16.0, &scene, &mut me, Some(&opp), None);
        assert_eq!(ai.state(), AiState::Combat);
        assert!(events
            .iter()
            .any(|e| matches!(e, AiEvent::Fired { angle, .. } if angle.abs() < 1e-6)));
    }

    #[test]
    fn fire_cadence_ignores_reaction_time() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Easy, Role::Defender);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(300.0, 0.0), Weapon::Rifle);
        let dt = 16.0;
        let mut last_shot = None;
        let mut shots = 0;
        for tick in 0..300 {
            let events = ai.update(dt, &scene, &mut me, Some(&opp), None);
            if events.iter().any(|e| matches!(e, AiEvent::Fired { .. })) {
                if let Some(prev) = last_shot {
                    let gap = (tick - prev) as f32 * dt;
                    assert!(gap <= Weapon::Rifle.fire_rate_ms() + dt, "gap {gap}");
                }
                last_shot = Some(tick);
                shots += 1;
            }
        }
        assert!(shots > 20);
    }

    #[test]
    fn idle_moves_when_nothing_visible() {
        let mut scene = TestScene::new();
        scene.walls.push(Wall::new(-1000.0, 400.0, 3000.0, 20.0));
        let mut ai = controller(Tier::Normal, Role::Defender);
        let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(500.0, 100.0), Weapon::Rifle);
        for _ in 0..100 {
            step(&mut ai, &scene, &mut me, &opp, 16.0);
        }
        assert_eq!(ai.state(), AiState::Moving);
        assert_eq!(ai.waypoints().len(), 1);
    }

    #[test]
    fn cursor_clamped_at_final_waypoint() {
        let mut scene = TestScene::new();
        scene.walls.push(Wall::new(-1000.0, 1100.0, 3000.0, 20.0));
        let mut ai = controller(Tier::Normal, Role::Defender);
        let mut me = Combatant::new(Vec2::new(500.0, 250.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(500.0, 1500.0), Weapon::Rifle);
        for _ in 0..400 {
            step(&mut ai, &scene, &mut me, &opp, 16.0);
        }
        assert_eq!(ai.waypoint_cursor(), 0);
        assert!(distance(me.position, ai.waypoints()[0]) <= movement::ARRIVAL_RADIUS + 5.0);
        assert_eq!(me.velocity, Vec2::ZERO);
    }

    #[test]
    fn attacker_at_site_starts_planting() {
        let mut scene = TestScene::new();
        scene.lanes.clear();
        let mut ai = controller(Tier::Normal, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(500.0, 220.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(5000.0, 5000.0), Weapon::Rifle);
        let mut events = Vec::new();
        for _ in 0..100 {
            events.extend(step(&mut ai, &scene, &mut me, &opp, 16.0));
        }
        assert_eq!(ai.state(), AiState::Planting);
        assert!(ai.wants_to_plant());
        assert_eq!(me.velocity, Vec2::ZERO);
        let callouts = events
            .iter()
            .filter(|e| matches!(e, AiEvent::Callout { kind: CalloutKind::Planting }))
            .count();
        assert_eq!(callouts, 1);
    }

    #[test]
    fn planting_aborts_when_opponent_appears() {
        let mut scene = TestScene::new();
        scene.lanes.clear();
        let mut ai = controller(Tier::Normal, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(500.0, 220.0), Weapon::Rifle);
        let far = Combatant::new(Vec2::new(5000.0, 5000.0), Weapon::Rifle);
        for _ in 0..100 {
            step(&mut ai, &scene, &mut me, &far, 16.0);
        }
        assert_eq!(ai.state(), AiState::Planting);
        let near = Combatant::new(Vec2::new(500.0, 400.0), Weapon::Rifle);
        step(&mut ai, &scene, &mut me, &near, 16.0);
        assert_eq!(ai.state(), AiState::Combat);
        assert!(!ai.wants_to_plant());
    }

    #[test]
    fn defuser_commits_when_timer_low() {
        let mut scene = TestScene::new();
        scene.bomb = BombState::Planted {
            position: Vec2::new(500.0, 200.0),
            timer_ms: 3000.0,
        };
        let mut ai = controller(Tier::Normal, Role::Defender);
        let mut me = Combatant::new(Vec2::new(510.0, 210.0), Weapon::Rifle);
        let far = Combatant::new(Vec2::new(5000.0, 5000.0), Weapon::Rifle);
        for _ in 0..100 {
            step(&mut ai, &scene, &mut me, &far, 16.0);
        }
        assert_eq!(ai.state(), AiState::Defusing);
        assert!(ai.wants_to_defuse());
        let near = Combatant::new(Vec2::new(500.0, 400.0), Weapon::Rifle);
        step(&mut ai, &scene, &mut me, &near, 16.0);
        assert_eq!(ai.state(), AiState::Defusing);
        assert!(ai.wants_to_defuse());
    }

    #[test]
    fn low_health_smokes_and_retreats_once() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Hard, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(200.0, 0.0), Weapon::Rifle);
        ai.update(16.0, &scene, &mut me, Some(&opp), None);
        assert_eq!(ai.state(), AiState::Combat);

        me.hp = 35.0;
        let events = ai.update(16.0, &scene, &mut me, Some(&opp), None);
        assert_eq!(ai.state(), AiState::Retreat);
        let smokes = events
            .iter()
            .filter(|e| matches!(e, AiEvent::SmokeDeployed { .. }))
            .count();
        assert_eq!(smokes, 1);
        assert_eq!(me.smoke_charges, 0);

        // moving away from the opponent
        ai.update(16.0, &scene, &mut me, Some(&opp), None);
        assert!(me.velocity.x < 0.0);
    }

    #[test]
    fn low_health_without_smoke_keeps_fighting() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Hard, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(0.0, 0.0), Weapon::Rifle);
        me.smoke_charges = 0;
        me.hp = 20.0;
        let opp = Combatant::new(Vec2::new(200.0, 0.0), Weapon::Rifle);
        ai.update(16.0, &scene, &mut me, Some(&opp), None);
        assert_eq!(ai.state(), AiState::Combat);
    }

    #[test]
    fn combat_degrades_to_moving_after_losing_sight() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Insane, Role::Defender);
        let mut me = Combatant::new(Vec2::new(500.0, 600.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(500.0, 800.0), Weapon::Rifle);
        step(&mut ai, &scene, &mut me, &opp, 16.0);
        assert_eq!(ai.state(), AiState::Combat);

        let gone = Combatant::new(Vec2::new(500.0, 5000.0), Weapon::Rifle);
        step(&mut ai, &scene, &mut me, &gone, 16.0);
        assert_eq!(ai.state(), AiState::Combat);
        for _ in 0..200 {
            step(&mut ai, &scene, &mut me, &gone, 16.0);
            if ai.state() == AiState::Moving {
                break;
            }
        }
        assert_eq!(ai.state(), AiState::Moving);
        assert_eq!(ai.last_seen_position(), Some(Vec2::new(500.0, 800.0)));
    }

    #[test]
    fn set_role_resets_to_idle_and_repaths() {
        let scene = TestScene::new();
        let mut ai = controller(Tier::Hard, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
        let far = Combatant::new(Vec2::new(5000.0, 5000.0), Weapon::Rifle);
        step(&mut ai, &scene, &mut me, &far, 16.0);
        assert_eq!(ai.waypoints().len(), 2);
        ai.set_role(false);
        assert_eq!(ai.state(), AiState::Idle);
        assert_eq!(ai.role(), Role::Defender);
        step(&mut ai, &scene, &mut me, &far, 16.0);
        assert_eq!(ai.waypoints().len(), 1);
        assert!((ai.waypoints()[0].x - 500.0).abs() <= movement::DEFENDER_JITTER);
    }

    #[test]
    fn stuck_bot_bursts_and_repaths() {
        let mut scene = TestScene::new();
        scene.walls.push(Wall::new(-1000.0, 400.0, 3000.0, 20.0));
        let mut ai = controller(Tier::Normal, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
        let opp = Combatant::new(Vec2::new(500.0, 100.0), Weapon::Rifle);
        let mut burst_seen = false;
        // never integrate position: the bot is pinned
        for _ in 0..300 {
            ai.update(16.0, &scene, &mut me, Some(&opp), None);
            if ai.unstuck_ms > 0.0 {
                burst_seen = true;
                break;
            }
        }
        assert!(burst_seen);
        assert_eq!(ai.state(), AiState::Moving);
    }

    #[test]
    fn nudge_moves_waypoint_off_danger() {
        let wp = Vec2::new(100.0, 100.0);
        let moved = nudge_away(wp, &[Vec2::new(90.0, 100.0)]);
        assert!(moved.x > wp.x);
        assert_eq!(nudge_away(wp, &[Vec2::new(400.0, 400.0)]), wp);
        assert_eq!(nudge_away(wp, &[wp]), Vec2::new(180.0, 100.0));
    }

    // ── Tactics ────────────────────────────────────────────────────────

    fn far() -> Combatant {
        Combatant::new(Vec2::new(5000.0, 5000.0), Weapon::Rifle)
    }

    fn seeded(tier: Tier, role: Role, seed: u64) -> AiController {
        AiController::with_seed(tier.profile(), role, &AiConfig::deterministic(), seed)
    }

    /// Four analyzed rounds of a player who plants 70 s in.
    fn late_planter() -> AiLearningSystem {
        let mut learning = AiLearningSystem::new(&AiConfig::deterministic(), 8);
        for _ in 0..4 {
            learning.track_plant(70.0);
            learning.analyze_patterns();
        }
        assert_eq!(learning.strategy().timing_adjustment_secs, 5.0);
        learning
    }

    fn fired(events: &[AiEvent]) -> Option<f32> {
        events.iter().find_map(|e| match e {
            AiEvent::Fired { angle, .. } => Some(*angle),
            _ => None,
        })
    }

    #[test]
    fn defuser_with_time_left_risks_it_or_aborts() {
        let mut scene = TestScene::new();
        scene.bomb = BombState::Planted {
            position: Vec2::new(500.0, 200.0),
            timer_ms: 20_000.0,
        };
        let near = Combatant::new(Vec2::new(500.0, 400.0), Weapon::Rifle);
        let (mut aborted, mut risked) = (0, 0);
        for seed in 0..40 {
            let mut ai = seeded(Tier::Normal, Role::Defender, seed);
            let mut me = Combatant::new(Vec2::new(510.0, 210.0), Weapon::Rifle);
            for _ in 0..100 {
                step(&mut ai, &scene, &mut me, &far(), 16.0);
            }
            assert_eq!(ai.state(), AiState::Defusing, "seed {seed}");

            step(&mut ai, &scene, &mut me, &near, 16.0);
            match ai.state() {
                AiState::Combat => {
                    aborted += 1;
                    assert!(!ai.wants_to_defuse());
                }
                AiState::Defusing => {
                    risked += 1;
                    assert!(ai.wants_to_defuse());
                    assert_eq!(me.velocity, Vec2::ZERO);
                }
                other => panic!("seed {seed}: unexpected {other:?}"),
            }
        }
        assert!(aborted > 0, "never aborted");
        assert!(risked > 0, "never risked the defuse");
    }

    #[test]
    fn faked_plant_stalls_before_the_real_one() {
        let mut scene = TestScene::new();
        scene.lanes.clear();
        let (mut faked, mut straight) = (0, 0);
        for seed in 0..30 {
            let mut ai = seeded(Tier::Insane, Role::Attacker, seed);
            let mut me = Combatant::new(Vec2::new(500.0, 220.0), Weapon::Rifle);
            let mut fake_tick = None;
            let mut plant_tick = None;
            let mut plant_callouts = 0;
            for tick in 0..120usize {
                let events = step(&mut ai, &scene, &mut me, &far(), 16.0);
                for e in &events {
                    match e {
                        AiEvent::Callout {
                            kind: CalloutKind::FakeAction,
                        } => fake_tick = Some(tick),
                        AiEvent::Callout {
                            kind: CalloutKind::Planting,
                        } => {
                            plant_callouts += 1;
                            plant_tick.get_or_insert(tick);
                        }
                        _ => {}
                    }
                }
                if fake_tick.is_some() && plant_tick.is_none() {
                    assert_eq!(ai.state(), AiState::Planting);
                    assert!(!ai.wants_to_plant(), "seed {seed}: flag raised mid-fake");
                }
            }
            assert!(ai.wants_to_plant(), "seed {seed}");
            assert_eq!(plant_callouts, 1);
            let plant_tick = plant_tick.expect("never planted");
            match fake_tick {
                Some(fake) => {
                    faked += 1;
                    assert!(fake < plant_tick);
                    let stalled = (plant_tick - fake) as f32 * 16.0;
                    assert!(
                        (objective::FAKE_DURATION_MS..=objective::FAKE_DURATION_MS + 32.0)
                            .contains(&stalled),
                        "seed {seed}: stalled {stalled} ms"
                    );
                }
                None => straight += 1,
            }
        }
        assert!(faked > 0, "never faked");
        assert!(straight > 0, "always faked");
    }

    #[test]
    fn non_faking_tier_plants_immediately() {
        let mut scene = TestScene::new();
        scene.lanes.clear();
        for seed in 0..20 {
            let mut ai = seeded(Tier::Hard, Role::Attacker, seed);
            let mut me = Combatant::new(Vec2::new(500.0, 220.0), Weapon::Rifle);
            for _ in 0..100 {
                let events = step(&mut ai, &scene, &mut me, &far(), 16.0);
                assert!(!events.iter().any(|e| matches!(
                    e,
                    AiEvent::Callout {
                        kind: CalloutKind::FakeAction
                    }
                )));
            }
            assert!(ai.wants_to_plant(), "seed {seed}");
        }
    }

    #[test]
    fn pre_fire_only_inside_window_after_losing_sight() {
        let scene = TestScene::new();
        let opp = Combatant::new(Vec2::new(500.0, 800.0), Weapon::Rifle);
        let gone = Combatant::new(Vec2::new(500.0, 5000.0), Weapon::Rifle);
        for (tier, pre_fires) in [(Tier::VeryHard, true), (Tier::Hard, false)] {
            let mut ai = controller(tier, Role::Defender);
            // pinned: position is never integrated
            let mut me = Combatant::new(Vec2::new(500.0, 600.0), Weapon::Rifle);
            let events = ai.update(16.0, &scene, &mut me, Some(&opp), None);
            assert!(fired(&events).is_some());

            let mut shots = Vec::new();
            for tick in 1..60 {
                let events = ai.update(16.0, &scene, &mut me, Some(&gone), None);
                if let Some(angle) = fired(&events) {
                    shots.push((tick as f32 * 16.0, angle));
                }
            }
            assert_eq!(ai.state(), AiState::Combat);
            if pre_fires {
                assert!(!shots.is_empty(), "{tier:?} never pre-fired");
                for (since, angle) in shots {
                    assert!(since <= combat::PRE_FIRE_MS, "shot {since} ms after losing sight");
                    assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
                }
            } else {
                assert!(shots.is_empty(), "{tier:?} fired blind: {shots:?}");
            }
        }
    }

    #[test]
    fn lost_sight_holds_cover_or_pushes_last_seen() {
        let scene = TestScene::new();
        let opp = Combatant::new(Vec2::new(500.0, 800.0), Weapon::Rifle);
        let gone = Combatant::new(Vec2::new(500.0, 5000.0), Weapon::Rifle);
        let (mut held, mut pushed) = (0, 0);
        for seed in 0..30 {
            let mut ai = seeded(Tier::Hard, Role::Defender, seed);
            let mut me = Combatant::new(Vec2::new(500.0, 600.0), Weapon::Rifle);
            ai.update(16.0, &scene, &mut me, Some(&opp), None);
            ai.update(16.0, &scene, &mut me, Some(&gone), None);
            assert_eq!(ai.state(), AiState::Combat);
            assert!((me.aim - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
            if me.velocity == Vec2::ZERO {
                held += 1;
                // cover holds while sight stays lost
                ai.update(16.0, &scene, &mut me, Some(&gone), None);
                assert_eq!(me.velocity, Vec2::ZERO);
            } else {
                pushed += 1;
                assert!(me.velocity.y > 0.0 && me.velocity.x.abs() < 1e-4);
            }
        }
        assert!(held > 0, "never held cover");
        assert!(pushed > 0, "never pushed the last-seen spot");
    }

    #[test]
    fn smart_retreat_veers_to_either_side() {
        let scene = TestScene::new();
        let opp = Combatant::new(Vec2::new(200.0, 0.0), Weapon::Rifle);
        let mut sides = Vec::new();
        for seed in 0..20 {
            let mut ai = seeded(Tier::Normal, Role::Defender, seed);
            let mut me = Combatant::new(Vec2::ZERO, Weapon::Rifle);
            me.hp = 35.0;
            ai.update(16.0, &scene, &mut me, Some(&opp), None);
            assert_eq!(ai.state(), AiState::Retreat);
            assert!(me.velocity.x < 0.0);
            assert!(me.velocity.y.abs() > 1.0, "seed {seed}: no lateral component");
            sides.push(me.velocity.y > 0.0);

            // the side holds for the whole retreat
            let first = me.velocity;
            ai.update(16.0, &scene, &mut me, Some(&opp), None);
            assert_eq!(me.velocity, first);
        }
        assert!(sides.contains(&true) && sides.contains(&false), "{sides:?}");
    }

    #[test]
    fn plain_retreat_runs_straight_away() {
        let scene = TestScene::new();
        let opp = Combatant::new(Vec2::new(200.0, 0.0), Weapon::Rifle);
        for seed in 0..10 {
            let mut ai = seeded(Tier::Easy, Role::Defender, seed);
            let mut me = Combatant::new(Vec2::ZERO, Weapon::Rifle);
            me.hp = 35.0;
            ai.update(16.0, &scene, &mut me, Some(&opp), None);
            assert_eq!(ai.state(), AiState::Retreat);
            assert!(me.velocity.x < 0.0);
            assert_eq!(me.velocity.y, 0.0);
        }
    }

    #[test]
    fn corner_checker_pre_aims_learned_spot_while_moving() {
        let scene = TestScene::new();
        let mut learning = AiLearningSystem::new(&AiConfig::deterministic(), 5);
        for _ in 0..4 {
            for _ in 0..5 {
                learning.track_position(Vec2::new(800.0, 400.0), 1000.0);
            }
            learning.analyze_patterns();
        }
        assert_eq!(learning.strategy().pre_aim_positions, vec![Vec2::new(800.0, 400.0)]);

        let (mut countered, mut plain) = (0, 0);
        for seed in 0..20 {
            let mut ai = seeded(Tier::Hard, Role::Defender, seed);
            // pinned so the spot stays due east
            let mut me = Combatant::new(Vec2::new(500.0, 400.0), Weapon::Rifle);
            for _ in 0..40 {
                ai.update(16.0, &scene, &mut me, Some(&far()), Some(&learning));
            }
            assert_eq!(ai.state(), AiState::Moving);
            assert!(me.velocity.y < 0.0);
            if ai.counter_play_active() {
                countered += 1;
                assert!(me.aim.abs() < 1e-4, "seed {seed}: aim {}", me.aim);
            } else {
                plain += 1;
                // facing the direction of travel, up the map
                assert!(me.aim < -1.0, "seed {seed}: aim {}", me.aim);
            }
        }
        assert!(countered > 0);
        assert!(plain > 0);
    }

    #[test]
    fn late_planter_delays_the_opening_push() {
        let scene = TestScene::new();
        let learning = late_planter();
        let start = Vec2::new(500.0, 900.0);
        let mut delayed = 0;
        for seed in 0..20 {
            let mut ai = seeded(Tier::Hard, Role::Attacker, seed);
            let mut me = Combatant::new(start, Weapon::Rifle);
            let advance = |ai: &mut AiController, me: &mut Combatant, ticks: usize| {
                for _ in 0..ticks {
                    ai.update(16.0, &scene, me, Some(&far()), Some(&learning));
                    me.position = me.position + me.velocity * 0.016;
                }
            };
            advance(&mut ai, &mut me, 1);
            if !ai.counter_play_active() {
                continue;
            }
            delayed += 1;

            // 3.2 s in: moving, but holding spawn
            advance(&mut ai, &mut me, 200);
            assert_eq!(ai.state(), AiState::Moving);
            assert_eq!(me.velocity, Vec2::ZERO);
            assert_eq!(me.position, start);

            // 5.6 s in: pushing
            advance(&mut ai, &mut me, 150);
            assert!(me.velocity.length() > 0.0, "seed {seed}: still waiting");
            assert!(me.position.y < start.y);
        }
        assert!(delayed > 0);
    }

    #[test]
    fn pinned_attacker_waits_out_push_delay_only_once() {
        let mut scene = TestScene::new();
        scene.walls.push(Wall::new(-1000.0, 400.0, 3000.0, 20.0));
        let learning = late_planter();
        let hidden = Combatant::new(Vec2::new(500.0, 100.0), Weapon::Rifle);
        let mut checked = 0;
        for seed in 0..20 {
            let mut ai = seeded(Tier::Hard, Role::Attacker, seed);
            let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
            let mut countered = false;
            let mut delayed_ms = 0.0;
            let mut bursts = 0;
            let mut bursting = false;
            // 20 s pinned behind the wall: position is never integrated
            for tick in 0..1250 {
                ai.update(16.0, &scene, &mut me, Some(&hidden), Some(&learning));
                if tick == 0 {
                    countered = ai.counter_play_active();
                }
                if ai.push_delay_ms > 0.0 {
                    delayed_ms += 16.0;
                }
                let now = ai.unstuck_ms > 0.0;
                if now && !bursting {
                    bursts += 1;
                }
                bursting = now;
            }
            if !countered {
                continue;
            }
            checked += 1;
            assert!(
                (4900.0..=5016.0).contains(&delayed_ms),
                "seed {seed}: waited {delayed_ms} ms"
            );
            assert!(bursts >= 4, "seed {seed}: only {bursts} bursts");
        }
        assert!(checked > 0);
    }

    #[test]
    fn new_round_rearms_push_delay() {
        let scene = TestScene::new();
        let learning = late_planter();
        for seed in 0..20 {
            let mut ai = seeded(Tier::Hard, Role::Attacker, seed);
            let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
            ai.update(16.0, &scene, &mut me, Some(&far()), Some(&learning));
            if !ai.counter_play_active() {
                continue;
            }
            ai.set_role(false);
            ai.update(16.0, &scene, &mut me, Some(&far()), Some(&learning));
            ai.set_role(true);
            ai.counter_refresh_ms = 0.0;
            ai.update(16.0, &scene, &mut me, Some(&far()), Some(&learning));
            if ai.counter_play_active() {
                assert_eq!(ai.push_delay_ms, 5000.0);
                return;
            }
        }
        panic!("counter-play never held across a role swap");
    }

    #[test]
    fn unstuck_burst_yields_to_combat() {
        let mut scene = TestScene::new();
        scene.walls.push(Wall::new(-1000.0, 400.0, 3000.0, 20.0));
        let mut ai = controller(Tier::Normal, Role::Attacker);
        let mut me = Combatant::new(Vec2::new(500.0, 900.0), Weapon::Rifle);
        let hidden = Combatant::new(Vec2::new(500.0, 100.0), Weapon::Rifle);
        for _ in 0..300 {
            ai.update(16.0, &scene, &mut me, Some(&hidden), None);
            if ai.unstuck_ms > 0.0 {
                break;
            }
        }
        assert!(ai.unstuck_ms > 0.0);

        let near = Combatant::new(Vec2::new(500.0, 700.0), Weapon::Rifle);
        let events = ai.update(16.0, &scene, &mut me, Some(&near), None);
        assert_eq!(ai.state(), AiState::Combat);
        assert_eq!(ai.unstuck_ms, 0.0);
        assert_eq!(me.velocity, Vec2::ZERO);
        assert!(fired(&events).is_some());
    }
}
