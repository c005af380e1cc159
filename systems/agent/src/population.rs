//! Registry owning every agent of a level.

use std::time::Duration;

use glam::Vec2;
use horde_core::{AgentId, AiState, Event, ZoneId};
use horde_system_pathfinding::PathOutcome;
use rand::RngCore;

use crate::{Agent, AgentTuning, TickContext};

/// Owned registry of every agent alive in a level.
#[derive(Clone, Debug, Default)]
pub struct AgentPopulation {
    tuning: AgentTuning,
    next_id: u32,
    agents: Vec<Agent>,
}

impl AgentPopulation {
    /// Creates an empty population sharing the provided tuning.
    #[must_use]
    pub fn new(tuning: AgentTuning) -> Self {
        Self {
            tuning,
            next_id: 0,
            agents: Vec::new(),
        }
    }

    /// Tuning shared by every agent.
    #[must_use]
    pub const fn tuning(&self) -> &AgentTuning {
        &self.tuning
    }

    /// Creates an agent in the `Spawn` state and announces it.
    pub fn spawn(
        &mut self,
        zone: ZoneId,
        position: Vec2,
        now: Duration,
        rng: &mut dyn RngCore,
        out: &mut Vec<Event>,
    ) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.agents
            .push(Agent::new(id, zone, position, now, &self.tuning, rng));
        out.push(Event::AgentSpawned {
            agent: id,
            zone,
            position,
        });
        id
    }

    /// Number of agents in the registry, dying ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether the registry holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of agents that are not dead.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.state() != AiState::Dead)
            .count()
    }

    /// Number of agents currently in `state`.
    #[must_use]
    pub fn count_in(&self, state: AiState) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.state() == state)
            .count()
    }

    /// Looks up an agent.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Iterates over agents in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Routes finished path requests to the agents that issued them.
    ///
    /// Results for unknown or dead agents and for superseded requests are
    /// dropped. Returns the number of results accepted.
    pub fn deliver_paths<I>(&mut self, outcomes: I, ctx: &mut TickContext<'_>) -> usize
    where
        I: IntoIterator<Item = PathOutcome>,
    {
        let mut accepted = 0;
        for outcome in outcomes {
            let ticket = outcome.ticket.get();
            let requester = outcome.requester;
            let Some(agent) = self.agents.iter_mut().find(|agent| agent.id() == requester) else {
                tracing::trace!(ticket, agent = requester.get(), "stale path result: agent gone");
                continue;
            };
            if agent.deliver(outcome, ctx) {
                accepted += 1;
            } else {
                tracing::trace!(ticket, agent = requester.get(), "stale path result: superseded");
            }
        }
        accepted
    }

    /// Advances every agent by one tick.
    pub fn update_all(&mut self, ctx: &mut TickContext<'_>) {
        for agent in &mut self.agents {
            agent.update(&self.tuning, ctx);
        }
    }

    /// Delivers weapon damage to an agent. Returns `true` when the hit killed it.
    pub fn apply_damage(
        &mut self,
        id: AgentId,
        amount: u32,
        now: Duration,
        out: &mut Vec<Event>,
    ) -> bool {
        let tuning = &self.tuning;
        self.agents
            .iter_mut()
            .find(|agent| agent.id() == id)
            .is_some_and(|agent| agent.apply_damage(amount, now, tuning, out))
    }

    /// Removes agents whose death animation has finished.
    pub fn reap(&mut self, now: Duration) -> Vec<AgentId> {
        let tuning = &self.tuning;
        let mut reaped = Vec::new();
        self.agents.retain(|agent| {
            let removable = agent.is_removable(now, tuning);
            if removable {
                reaped.push(agent.id());
            }
            !removable
        });
        reaped
    }

    /// Removes every agent, as when the level unloads.
    pub fn tear_down(&mut self) {
        self.agents.clear();
    }

    /// Captures a read-only view of every agent in creation order.
    #[must_use]
    pub fn snapshots(&self, now: Duration) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id(),
                zone: agent.zone(),
                position: agent.position() + agent.lunge_offset(now, &self.tuning),
                velocity: agent.velocity(),
                rotation: agent.rotation(),
                state: agent.state(),
                health: agent.health(),
                breached: agent.is_breached(),
                hurt: agent.is_hurt(now),
                slowed: agent.is_slowed(now),
                collider: agent.has_collider(),
            })
            .collect()
    }
}

/// Read-only description of an agent for presentation layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier of the agent.
    pub id: AgentId,
    /// Zone whose spawner created the agent.
    pub zone: ZoneId,
    /// Drawn position, lunge displacement included.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Facing in radians.
    pub rotation: f32,
    /// Current behaviour.
    pub state: AiState,
    /// Remaining health.
    pub health: u32,
    /// Whether the agent got past the perimeter.
    pub breached: bool,
    /// Whether the hurt feedback window is open.
    pub hurt: bool,
    /// Whether the slow effect is active.
    pub slowed: bool,
    /// Whether the agent still collides.
    pub collider: bool,
}
