//! Per-agent state machine: siege, breach, pursuit and movement.

use std::{collections::VecDeque, time::Duration};

use glam::Vec2;
use horde_core::{AgentId, AiState, BarricadeId, Event, PursuitTarget, ZoneId};
use horde_system_pathfinding::{PathOutcome, PathService, PathTicket};
use horde_world::{Barricade, Level, OccupancyGrid, SightLine};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};

use crate::AgentTuning;

/// Collaborators an agent reads and mutates during one tick.
pub struct TickContext<'a> {
    /// Level holding the grid and the barricades.
    pub level: &'a mut Level,
    /// Path service answering path requests.
    pub paths: &'a mut PathService,
    /// Entity the agents pursue, if any exists.
    pub target: Option<PursuitTarget>,
    /// Random source for re-plan jitter and anti-stacking nudges.
    pub rng: &'a mut dyn RngCore,
    /// Simulated time since the level started.
    pub now: Duration,
    /// Simulated time elapsed since the previous tick.
    pub dt: Duration,
    /// Sink for events produced during the tick.
    pub out: &'a mut Vec<Event>,
}

#[derive(Clone, Debug)]
struct FollowedPath {
    waypoints: Vec<Vec2>,
    cursor: usize,
}

#[derive(Clone, Debug)]
enum Plan {
    Barricade {
        target: BarricadeId,
        remaining: VecDeque<BarricadeId>,
    },
    Direct,
}

#[derive(Clone, Debug)]
struct PendingRequest {
    ticket: PathTicket,
    plan: Plan,
}

#[derive(Clone, Copy, Debug)]
struct Lunge {
    started_at: Duration,
    direction: Vec2,
}

/// Hostile agent driven by a per-tick state machine.
///
/// The agent besieges the nearest reachable barricade until it breaks, then
/// hunts the pursuit target. Once breached, it never returns to the
/// barricades.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    zone: ZoneId,
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    state: AiState,
    speed: f32,
    runner: bool,
    health: u32,
    collider: bool,
    breached: bool,
    siege_target: Option<BarricadeId>,
    barricade_target: Option<BarricadeId>,
    path: Option<FollowedPath>,
    pending: Option<PendingRequest>,
    sight: SightLine,
    spawned_at: Duration,
    died_at: Option<Duration>,
    hurt_until: Duration,
    slow_until: Duration,
    next_repath_at: Duration,
    last_attack: Option<Duration>,
    last_strike: Option<Duration>,
    lunge: Option<Lunge>,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        zone: ZoneId,
        position: Vec2,
        now: Duration,
        tuning: &AgentTuning,
        rng: &mut dyn RngCore,
    ) -> Self {
        let base = Normal::new(tuning.speed_mean, tuning.speed_deviation)
            .map(|normal| normal.sample(&mut *rng))
            .unwrap_or(tuning.speed_mean)
            .max(tuning.speed_min);
        let runner = rng.gen_bool(tuning.runner_chance.clamp(0.0, 1.0));
        let speed = if runner {
            base * tuning.runner_multiplier
        } else {
            base
        };

        Self {
            id,
            zone,
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            state: AiState::Spawn,
            speed,
            runner,
            health: tuning.health,
            collider: true,
            breached: false,
            siege_target: None,
            barricade_target: None,
            path: None,
            pending: None,
            sight: SightLine::new(),
            spawned_at: now,
            died_at: None,
            hurt_until: now,
            slow_until: now,
            next_repath_at: now,
            last_attack: None,
            last_strike: None,
            lunge: None,
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Zone whose spawner created the agent.
    #[must_use]
    pub const fn zone(&self) -> ZoneId {
        self.zone
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Facing in radians, measured from the positive x axis.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Current behaviour.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Base speed drawn at creation, runner bonus included.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Reports whether the agent rolled the runner variant.
    #[must_use]
    pub const fn is_runner(&self) -> bool {
        self.runner
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Reports whether the agent still collides with weapons and other agents.
    #[must_use]
    pub const fn has_collider(&self) -> bool {
        self.collider
    }

    /// Reports whether the agent got past the perimeter.
    #[must_use]
    pub const fn is_breached(&self) -> bool {
        self.breached
    }

    /// Barricade currently being torn down.
    #[must_use]
    pub const fn siege_target(&self) -> Option<BarricadeId> {
        self.siege_target
    }

    /// Barricade the agent is walking toward.
    #[must_use]
    pub const fn barricade_target(&self) -> Option<BarricadeId> {
        self.barricade_target
    }

    /// Ticket of the path request still awaiting an answer.
    #[must_use]
    pub fn pending_ticket(&self) -> Option<PathTicket> {
        self.pending.as_ref().map(|pending| pending.ticket)
    }

    /// Way-points not reached yet, nearest first.
    #[must_use]
    pub fn remaining_waypoints(&self) -> &[Vec2] {
        self.path
            .as_ref()
            .and_then(|path| path.waypoints.get(path.cursor..))
            .unwrap_or(&[])
    }

    /// Reports whether the hurt feedback window is open.
    #[must_use]
    pub fn is_hurt(&self, now: Duration) -> bool {
        now < self.hurt_until
    }

    /// Reports whether the slow effect is active.
    #[must_use]
    pub fn is_slowed(&self, now: Duration) -> bool {
        now < self.slow_until
    }

    /// Speed the agent moves at right now.
    #[must_use]
    pub fn current_speed(&self, now: Duration, tuning: &AgentTuning) -> f32 {
        if self.is_slowed(now) {
            self.speed * tuning.slow_factor
        } else {
            self.speed
        }
    }

    /// Displacement of the lunge tween at `now`, zero outside a lunge.
    #[must_use]
    pub fn lunge_offset(&self, now: Duration, tuning: &AgentTuning) -> Vec2 {
        let Some(lunge) = self.lunge else {
            return Vec2::ZERO;
        };
        let duration = tuning.lunge_duration().as_secs_f32();
        if duration <= 0.0 {
            return Vec2::ZERO;
        }
        let progress = (now.saturating_sub(lunge.started_at).as_secs_f32() / duration).clamp(0.0, 1.0);
        lunge.direction * tuning.lunge_distance * (1.0 - (2.0 * progress - 1.0).abs())
    }

    pub(crate) fn is_removable(&self, now: Duration, tuning: &AgentTuning) -> bool {
        self.died_at
            .is_some_and(|died_at| now.saturating_sub(died_at) >= tuning.death_duration())
    }

    /// Advances the state machine by one tick.
    pub(crate) fn update(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>) {
        match self.state {
            AiState::Dead => return,
            AiState::Spawn => {
                if ctx.now.saturating_sub(self.spawned_at) < tuning.spawn_duration() {
                    return;
                }
                self.transition(AiState::Pathing, ctx.out);
                self.next_repath_at = ctx.now;
            }
            _ => {}
        }
        if self
            .lunge
            .is_some_and(|lunge| ctx.now.saturating_sub(lunge.started_at) >= tuning.lunge_duration())
        {
            self.lunge = None;
        }

        let Some(target) = ctx.target else {
            self.velocity = Vec2::ZERO;
            return;
        };
        if !target.active {
            return;
        }

        if self.besiege(tuning, ctx, target) {
            return;
        }
        if self.approach_barricade(tuning, ctx, target) {
            return;
        }
        if self.pursue(tuning, ctx, target) {
            return;
        }

        self.nudge(tuning, ctx);
        self.integrate(ctx.level.grid(), ctx.dt);
        self.refresh_slow(tuning, ctx);
    }

    /// Accepts a finished path request. Returns `false` for stale results.
    pub(crate) fn deliver(&mut self, outcome: PathOutcome, ctx: &mut TickContext<'_>) -> bool {
        if self.state == AiState::Dead || self.pending_ticket() != Some(outcome.ticket) {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };

        match (outcome.result, pending.plan) {
            (Ok(path), Plan::Barricade { target, .. }) => {
                self.barricade_target = Some(target);
                self.path = Some(FollowedPath {
                    waypoints: path.waypoints().to_vec(),
                    cursor: 0,
                });
            }
            (Ok(path), Plan::Direct) => {
                self.path = Some(FollowedPath {
                    waypoints: path.waypoints().to_vec(),
                    cursor: 0,
                });
            }
            (Err(error), Plan::Barricade { target, remaining }) => {
                tracing::debug!(
                    agent = self.id.get(),
                    barricade = target.get(),
                    %error,
                    "barricade unreachable"
                );
                self.request_barricade(ctx, remaining);
            }
            (Err(error), Plan::Direct) => {
                tracing::debug!(agent = self.id.get(), %error, "target unreachable");
                self.path = None;
            }
        }
        true
    }

    /// Applies damage from a weapon. Returns `true` when the hit killed the agent.
    pub(crate) fn apply_damage(
        &mut self,
        amount: u32,
        now: Duration,
        tuning: &AgentTuning,
        out: &mut Vec<Event>,
    ) -> bool {
        if self.state == AiState::Dead {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.hurt_until = now + tuning.hurt_duration();
        if self.health > 0 {
            return false;
        }

        self.transition(AiState::Dead, out);
        self.collider = false;
        self.velocity = Vec2::ZERO;
        self.siege_target = None;
        self.barricade_target = None;
        self.path = None;
        self.pending = None;
        self.lunge = None;
        self.died_at = Some(now);
        out.push(Event::AgentDied {
            agent: self.id,
            position: self.position,
        });
        true
    }

    fn besiege(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>, target: PursuitTarget) -> bool {
        let Some(id) = self.siege_target else {
            return false;
        };

        match ctx.level.barricade(id).map(Barricade::panels) {
            None => {
                self.siege_target = None;
                self.barricade_target = None;
                self.next_repath_at = ctx.now;
                self.transition(AiState::Pathing, ctx.out);
                false
            }
            Some(0) => {
                self.break_through(tuning, ctx, target);
                true
            }
            Some(_) => {
                self.velocity = Vec2::ZERO;
                let ready = self
                    .last_strike
                    .map_or(true, |at| ctx.now.saturating_sub(at) >= tuning.siege_cooldown());
                if ready {
                    let _ = ctx.level.strike_barricade(id, self.id, ctx.out);
                    self.last_strike = Some(ctx.now);
                }
                true
            }
        }
    }

    fn approach_barricade(
        &mut self,
        tuning: &AgentTuning,
        ctx: &mut TickContext<'_>,
        target: PursuitTarget,
    ) -> bool {
        if self.breached {
            return false;
        }
        let Some(id) = self.barricade_target else {
            return false;
        };
        let Some((position, panels)) = ctx
            .level
            .barricade(id)
            .map(|barricade| (barricade.position(), barricade.panels()))
        else {
            self.barricade_target = None;
            self.path = None;
            self.next_repath_at = ctx.now;
            return false;
        };
        if self.position.distance(position) > tuning.siege_radius {
            return false;
        }

        self.path = None;
        if panels > 0 {
            self.siege_target = Some(id);
            self.pending = None;
            self.velocity = Vec2::ZERO;
            self.face(position);
            self.transition(AiState::AttackBarrier, ctx.out);
            return true;
        }

        self.break_through(tuning, ctx, target);
        true
    }

    /// Ends the tick in `Pathing` past the perimeter, moving on an impulse toward the target.
    fn break_through(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>, target: PursuitTarget) {
        self.siege_target = None;
        self.barricade_target = None;
        self.path = None;
        self.transition(AiState::Pathing, ctx.out);
        self.breach(false, ctx.out);
        self.steer_toward(target.position, self.current_speed(ctx.now, tuning));
        self.request_direct(ctx, target);
        self.integrate(ctx.level.grid(), ctx.dt);
        self.refresh_slow(tuning, ctx);
    }

    /// Returns `true` while the agent stands still attacking.
    fn pursue(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>, target: PursuitTarget) -> bool {
        let distance = self.position.distance(target.position);
        if distance <= tuning.melee_range {
            self.transition(AiState::Attack, ctx.out);
            self.velocity = Vec2::ZERO;
            self.face(target.position);
            let ready = self
                .last_attack
                .map_or(true, |at| ctx.now.saturating_sub(at) >= tuning.attack_cooldown());
            if ready {
                self.last_attack = Some(ctx.now);
                self.lunge = Some(Lunge {
                    started_at: ctx.now,
                    direction: self.heading(target.position),
                });
                ctx.out.push(Event::TargetDamaged {
                    agent: self.id,
                    amount: tuning.attack_damage,
                });
            }
            return true;
        }

        let speed = self.current_speed(ctx.now, tuning);
        if distance <= tuning.aggro_radius
            && self
                .sight
                .check(ctx.level.geometry(), self.position, target.position)
        {
            self.transition(AiState::Chase, ctx.out);
            self.keep_plan_fresh(tuning, ctx, target);
            self.steer_toward(target.position, speed);
            return false;
        }

        self.transition(AiState::Pathing, ctx.out);
        self.follow_path(tuning, ctx, target, speed);
        false
    }

    fn follow_path(
        &mut self,
        tuning: &AgentTuning,
        ctx: &mut TickContext<'_>,
        target: PursuitTarget,
        speed: f32,
    ) {
        self.keep_plan_fresh(tuning, ctx, target);

        if let Some(path) = self.path.as_mut() {
            while let Some(&waypoint) = path.waypoints.get(path.cursor) {
                if self.position.distance(waypoint) > tuning.waypoint_radius {
                    break;
                }
                path.cursor += 1;
            }
        }

        let waypoint = self
            .path
            .as_ref()
            .and_then(|path| path.waypoints.get(path.cursor).copied());
        let barricade = self
            .barricade_target
            .filter(|_| !self.breached)
            .and_then(|id| ctx.level.barricade(id))
            .map(Barricade::position);
        let goal = waypoint.or(barricade).unwrap_or(target.position);
        self.steer_toward(goal, speed);
    }

    /// Re-plans when the previous request was answered and the re-plan delay elapsed.
    ///
    /// Chasing agents keep planning so a barricade target is known when they
    /// run into the perimeter.
    fn keep_plan_fresh(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>, target: PursuitTarget) {
        if self.pending.is_none() && ctx.now >= self.next_repath_at {
            self.plan_path(tuning, ctx, target);
        }
    }

    fn plan_path(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>, target: PursuitTarget) {
        let jitter = if tuning.repath_jitter_ms == 0 {
            0
        } else {
            let spread = i64::try_from(tuning.repath_jitter_ms).unwrap_or(i64::MAX);
            ctx.rng.gen_range(-spread..=spread)
        };
        let base = i64::try_from(tuning.repath_ms).unwrap_or(i64::MAX);
        let delay = u64::try_from(base.saturating_add(jitter)).unwrap_or(0);
        self.next_repath_at = ctx.now + Duration::from_millis(delay);

        if self.breached {
            self.request_direct(ctx, target);
        } else {
            let ranked = ctx.level.barricades_by_distance(self.position).into();
            self.request_barricade(ctx, ranked);
        }
    }

    fn request_barricade(&mut self, ctx: &mut TickContext<'_>, mut remaining: VecDeque<BarricadeId>) {
        while let Some(id) = remaining.pop_front() {
            let Some(position) = ctx.level.barricade(id).map(Barricade::position) else {
                continue;
            };
            let ticket =
                ctx.paths
                    .find_path_to_neighbor_of(ctx.level.grid(), self.position, position, self.id);
            self.pending = Some(PendingRequest {
                ticket,
                plan: Plan::Barricade {
                    target: id,
                    remaining,
                },
            });
            return;
        }

        if ctx.level.barricades().is_empty() {
            tracing::debug!(agent = self.id.get(), "no barricades left, breaching");
        } else {
            tracing::warn!(agent = self.id.get(), "no barricade reachable, forcing breach");
        }
        self.barricade_target = None;
        self.path = None;
        self.breach(true, ctx.out);
        match ctx.target.filter(|target| target.active) {
            Some(target) => self.request_direct(ctx, target),
            None => self.pending = None,
        }
    }

    fn request_direct(&mut self, ctx: &mut TickContext<'_>, target: PursuitTarget) {
        let ticket = ctx
            .paths
            .find_path(ctx.level.grid(), self.position, target.position, self.id);
        self.pending = Some(PendingRequest {
            ticket,
            plan: Plan::Direct,
        });
    }

    fn breach(&mut self, forced: bool, out: &mut Vec<Event>) {
        if self.breached {
            return;
        }
        self.breached = true;
        tracing::debug!(agent = self.id.get(), forced, "agent breached");
        out.push(Event::AgentBreached {
            agent: self.id,
            forced,
        });
    }

    fn transition(&mut self, to: AiState, out: &mut Vec<Event>) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        tracing::debug!(agent = self.id.get(), %from, %to, "state changed");
        out.push(Event::AgentStateChanged {
            agent: self.id,
            from,
            to,
        });
    }

    /// Adds a random velocity kick worth `jitter_distance` over this tick.
    fn nudge(&mut self, tuning: &AgentTuning, ctx: &mut TickContext<'_>) {
        let dt = ctx.dt.as_secs_f32();
        if dt <= 0.0
            || tuning.jitter_chance <= 0.0
            || !ctx.rng.gen_bool(tuning.jitter_chance.min(1.0))
        {
            return;
        }
        let angle = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
        self.velocity += Vec2::from_angle(angle) * (tuning.jitter_distance / dt);
    }

    /// Moves along the velocity, sliding along blocked cells.
    fn integrate(&mut self, grid: &OccupancyGrid, dt: Duration) {
        let step = self.velocity * dt.as_secs_f32();
        if step == Vec2::ZERO {
            return;
        }
        if !is_open(grid, self.position) {
            let candidate = self.position + step;
            if grid.world_to_cell(candidate).is_some() {
                self.position = candidate;
            }
            return;
        }

        let candidates = [
            self.position + step,
            self.position + Vec2::new(step.x, 0.0),
            self.position + Vec2::new(0.0, step.y),
        ];
        if let Some(candidate) = candidates.into_iter().find(|point| is_open(grid, *point)) {
            self.position = candidate;
        }
    }

    fn refresh_slow(&mut self, tuning: &AgentTuning, ctx: &TickContext<'_>) {
        let Some(cell) = ctx.level.grid().world_to_cell(self.position) else {
            return;
        };
        let overlapping = ctx
            .level
            .barricades()
            .iter()
            .any(|barricade| barricade.is_open() && barricade.cell() == cell);
        if overlapping {
            self.slow_until = ctx.now + tuning.slow_duration();
        }
    }

    fn steer_toward(&mut self, goal: Vec2, speed: f32) {
        let heading = self.heading(goal);
        self.velocity = heading * speed;
        if heading != Vec2::ZERO {
            self.rotation = heading.y.atan2(heading.x);
        }
    }

    fn face(&mut self, point: Vec2) {
        let heading = self.heading(point);
        if heading != Vec2::ZERO {
            self.rotation = heading.y.atan2(heading.x);
        }
    }

    fn heading(&self, to: Vec2) -> Vec2 {
        (to - self.position).normalize_or_zero()
    }
}

fn is_open(grid: &OccupancyGrid, point: Vec2) -> bool {
    grid.world_to_cell(point)
        .is_some_and(|cell| grid.is_walkable(cell))
}
