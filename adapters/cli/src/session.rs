//! Fixed-step loop driving every system of a run.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use glam::Vec2;
use horde_core::{AgentId, DoorId, Event, PursuitTarget};
use horde_system_agent::{AgentPopulation, TickContext};
use horde_system_pathfinding::PathService;
use horde_system_spawning::{SpawnScheduler, ZoneRegistry};
use horde_world::{InteractTarget, Level};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{DoorOpening, ScenarioConfig, TargetConfig},
    RunReport,
};

/// Headless simulation of one level against a stationary defender.
#[derive(Debug)]
pub struct Session {
    level: Level,
    paths: PathService,
    population: AgentPopulation,
    zones: ZoneRegistry,
    scheduler: SpawnScheduler,
    rng: ChaCha8Rng,
    defender: TargetConfig,
    defender_position: Option<Vec2>,
    health: u32,
    last_shot: Option<Duration>,
    doors: Vec<DoorOpening>,
    step: Duration,
    now: Duration,
    report: RunReport,
}

impl Session {
    /// Loads the level and wires every system for a run.
    pub fn new(config: &ScenarioConfig) -> Result<Self> {
        if config.simulation.tick_ms == 0 {
            bail!("simulation.tick_ms must be positive");
        }

        let level = Level::from_ascii(
            config.level.rows.iter(),
            config.level.tile_size,
            config.level.panels,
        )
        .context("failed to load level")?;
        let defender_position = level.player_start();
        if defender_position.is_none() {
            tracing::warn!("map has no player start; agents have nothing to pursue");
        }

        let zones = ZoneRegistry::from_level(&level);
        tracing::info!(
            columns = level.grid().columns(),
            rows = level.grid().rows(),
            barricades = level.barricades().len(),
            doors = level.doors().len(),
            spawners = zones.coordinators().len(),
            seed = config.simulation.seed,
            "session ready"
        );

        Ok(Self {
            level,
            paths: PathService::new(config.paths),
            population: AgentPopulation::new(config.agents.clone()),
            zones,
            scheduler: SpawnScheduler::new(config.spawning),
            rng: ChaCha8Rng::seed_from_u64(config.simulation.seed),
            defender: config.target,
            defender_position,
            health: config.target.health,
            last_shot: None,
            doors: config.doors.clone(),
            step: Duration::from_millis(config.simulation.tick_ms),
            now: Duration::ZERO,
            report: RunReport::default(),
        })
    }

    /// Loaded level.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Agents currently in play.
    #[must_use]
    pub const fn population(&self) -> &AgentPopulation {
        &self.population
    }

    /// Remaining health of the defender.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Simulated time since the level loaded.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Runs up to `ticks` steps and reports the outcome. Stops early when the defender falls.
    pub fn run(mut self, ticks: u64) -> RunReport {
        for _ in 0..ticks {
            if !self.step() {
                tracing::info!(tick = self.report.ticks_run, "defender fell");
                break;
            }
        }
        let report = self.finish();
        tracing::info!(
            ticks = report.ticks_run,
            spawned = report.spawned,
            died = report.died,
            health = report.target_health,
            "run finished"
        );
        report
    }

    /// Advances the simulation by one fixed step. Returns `false` once the defender has fallen.
    pub fn step(&mut self) -> bool {
        let tick = self.report.ticks_run;
        let dt = self.step;
        self.now += dt;
        self.report.ticks_run += 1;

        let mut events = Vec::new();
        self.open_scheduled_doors(tick, &mut events);
        self.zones.handle(&events);

        let mut fired = Vec::new();
        self.scheduler.advance(
            dt,
            self.population.alive(),
            &self.zones.active_spawners(),
            &mut self.rng,
            &mut fired,
        );
        for index in fired {
            let _ = self.zones.spawn(
                index,
                &self.level,
                &mut self.population,
                self.now,
                &mut self.rng,
                &mut events,
            );
        }

        self.paths.calculate(self.level.grid());
        let mut outcomes = Vec::new();
        self.paths.drain_completed(&mut outcomes);

        let target = self.pursuit_target();
        let mut ctx = TickContext {
            level: &mut self.level,
            paths: &mut self.paths,
            target,
            rng: &mut self.rng,
            now: self.now,
            dt,
            out: &mut events,
        };
        let _ = self.population.deliver_paths(outcomes, &mut ctx);
        self.population.update_all(&mut ctx);

        self.defend(&mut events);
        self.tally(&events);
        let _ = self.population.reap(self.now);

        self.health > 0
    }

    /// Builds the report for the ticks simulated so far.
    #[must_use]
    pub fn finish(&self) -> RunReport {
        let mut report = self.report.clone();
        report.target_health = self.health;
        report.target_fell = self.health == 0;
        for agent in self.population.iter() {
            *report
                .alive_by_state
                .entry(agent.state().label().to_owned())
                .or_default() += 1;
        }
        report
    }

    fn pursuit_target(&self) -> Option<PursuitTarget> {
        self.defender_position.map(|position| PursuitTarget {
            position,
            active: self.health > 0,
        })
    }

    fn open_scheduled_doors(&mut self, tick: u64, out: &mut Vec<Event>) {
        for opening in self.doors.iter().filter(|opening| opening.tick == tick) {
            let id = DoorId::new(opening.door);
            let Some(actor) = self
                .level
                .door(id)
                .and_then(|door| door.positions().first().copied())
            else {
                tracing::warn!(door = opening.door, "scheduled door does not exist");
                continue;
            };
            if !self.level.interact(InteractTarget::Door(id), actor, out) {
                tracing::debug!(door = opening.door, "scheduled door already open");
            }
        }
    }

    fn defend(&mut self, out: &mut Vec<Event>) {
        let Some(position) = self.defender_position else {
            return;
        };
        if self.defender.damage == 0 || self.health == 0 {
            return;
        }
        let cooldown = Duration::from_millis(self.defender.cooldown_ms);
        if self
            .last_shot
            .is_some_and(|last| self.now.saturating_sub(last) < cooldown)
        {
            return;
        }
        let Some(victim) = self.closest_visible_agent(position) else {
            return;
        };

        self.last_shot = Some(self.now);
        let killed = self
            .population
            .apply_damage(victim, self.defender.damage, self.now, out);
        tracing::trace!(agent = victim.get(), killed, "defender fired");
    }

    fn closest_visible_agent(&self, from: Vec2) -> Option<AgentId> {
        self.population
            .iter()
            .filter(|agent| agent.state().is_thinking())
            .map(|agent| (agent.id(), agent.position().distance(from), agent.position()))
            .filter(|(_, distance, _)| *distance <= self.defender.range)
            .filter(|(_, _, position)| self.level.line_of_sight(from, *position))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _, _)| id)
    }

    fn tally(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AgentSpawned { .. } => self.report.spawned += 1,
                Event::AgentDied { .. } => self.report.died += 1,
                Event::TargetDamaged { amount, .. } => {
                    self.report.damage_taken += amount;
                    self.health = self.health.saturating_sub(*amount);
                }
                Event::BarricadeBreached { .. } => self.report.barricades_breached += 1,
                Event::DoorOpened { zone, .. } => self.report.zones_unlocked.push(zone.get()),
                Event::AgentStateChanged { .. }
                | Event::AgentBreached { .. }
                | Event::BarricadeStruck { .. }
                | Event::BarricadeRepaired { .. }
                | Event::BarricadeRemoved { .. } => {}
            }
        }
    }
}
