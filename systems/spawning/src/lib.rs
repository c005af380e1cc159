#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Zone-gated spawning for the Horde AI engine.
//!
//! Each spawn point belongs to a zone. Only the primary zone is active when a
//! level loads; the others wake up when a door unlocks them and never go back
//! to sleep. The [`SpawnScheduler`] decides when agents appear and the
//! [`ZoneRegistry`] decides where.

mod scheduler;

use std::time::Duration;

use glam::Vec2;
use horde_core::{AgentId, Event, ZoneId};
use horde_system_agent::AgentPopulation;
use horde_world::Level;
use rand::RngCore;

pub use scheduler::{SpawnConfig, SpawnScheduler};

/// Spawn point gated by a zone activation latch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnCoordinator {
    zone: ZoneId,
    active: bool,
    position: Vec2,
}

impl SpawnCoordinator {
    /// Creates a spawn point. Only the primary zone starts active.
    #[must_use]
    pub fn new(zone: ZoneId, position: Vec2) -> Self {
        Self {
            zone,
            active: zone == ZoneId::PRIMARY,
            position,
        }
    }

    /// Zone gating this spawn point.
    #[must_use]
    pub const fn zone(&self) -> ZoneId {
        self.zone
    }

    /// World position agents appear at.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Reports whether the latch has been released.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Releases the latch when `zone` matches. Returns `true` on the first release only.
    pub fn activate_zone(&mut self, zone: ZoneId) -> bool {
        if zone != self.zone || self.active {
            return false;
        }
        self.active = true;
        tracing::debug!(zone = zone.get(), "spawn zone activated");
        true
    }

    /// Creates one agent at the spawn point.
    ///
    /// Does nothing while the zone is inactive or once the level is being torn down.
    pub fn spawn(
        &self,
        level: &Level,
        population: &mut AgentPopulation,
        now: Duration,
        rng: &mut dyn RngCore,
        out: &mut Vec<Event>,
    ) -> Option<AgentId> {
        if !self.active || level.is_torn_down() {
            return None;
        }
        let agent = population.spawn(self.zone, self.position, now, rng, out);
        tracing::trace!(agent = agent.get(), zone = self.zone.get(), "agent spawned");
        Some(agent)
    }
}

/// Every spawn point of a level.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
    coordinators: Vec<SpawnCoordinator>,
}

impl ZoneRegistry {
    /// Creates a spawn point at the centre of every spawn marker of the level.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        let grid = level.grid();
        let coordinators = level
            .spawn_markers()
            .iter()
            .map(|marker| SpawnCoordinator::new(marker.zone, grid.cell_center(marker.cell)))
            .collect();
        Self { coordinators }
    }

    /// Creates a registry from explicit spawn points.
    #[must_use]
    pub fn new(coordinators: Vec<SpawnCoordinator>) -> Self {
        Self { coordinators }
    }

    /// Spawn points in map order.
    #[must_use]
    pub fn coordinators(&self) -> &[SpawnCoordinator] {
        &self.coordinators
    }

    /// Forwards a zone activation to every spawn point. Returns how many woke up.
    pub fn activate_zone(&mut self, zone: ZoneId) -> usize {
        self.coordinators
            .iter_mut()
            .map(|coordinator| coordinator.activate_zone(zone))
            .filter(|woke| *woke)
            .count()
    }

    /// Activates the zones unlocked by doors among `events`.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::DoorOpened { zone, .. } = event {
                let _ = self.activate_zone(*zone);
            }
        }
    }

    /// Indices of the spawn points whose zone is active.
    #[must_use]
    pub fn active_spawners(&self) -> Vec<usize> {
        self.coordinators
            .iter()
            .enumerate()
            .filter(|(_, coordinator)| coordinator.is_active())
            .map(|(index, _)| index)
            .collect()
    }

    /// Spawns one agent from the spawn point at `index`.
    pub fn spawn(
        &self,
        index: usize,
        level: &Level,
        population: &mut AgentPopulation,
        now: Duration,
        rng: &mut dyn RngCore,
        out: &mut Vec<Event>,
    ) -> Option<AgentId> {
        self.coordinators
            .get(index)
            .and_then(|coordinator| coordinator.spawn(level, population, now, rng, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_primary_zone_starts_active() {
        assert!(SpawnCoordinator::new(ZoneId::PRIMARY, Vec2::ZERO).is_active());
        assert!(!SpawnCoordinator::new(ZoneId::new(2), Vec2::ZERO).is_active());
    }

    #[test]
    fn activation_latches_once() {
        let mut coordinator = SpawnCoordinator::new(ZoneId::new(3), Vec2::ZERO);
        assert!(!coordinator.activate_zone(ZoneId::new(2)));
        assert!(!coordinator.is_active());
        assert!(coordinator.activate_zone(ZoneId::new(3)));
        assert!(!coordinator.activate_zone(ZoneId::new(3)));
        assert!(coordinator.is_active());
    }

    #[test]
    fn registry_broadcasts_activation() {
        let mut registry = ZoneRegistry::new(vec![
            SpawnCoordinator::new(ZoneId::PRIMARY, Vec2::ZERO),
            SpawnCoordinator::new(ZoneId::new(2), Vec2::ONE),
            SpawnCoordinator::new(ZoneId::new(2), Vec2::X),
            SpawnCoordinator::new(ZoneId::new(4), Vec2::Y),
        ]);
        assert_eq!(registry.active_spawners(), vec![0]);
        assert_eq!(registry.activate_zone(ZoneId::new(2)), 2);
        assert_eq!(registry.activate_zone(ZoneId::new(2)), 0);
        assert_eq!(registry.active_spawners(), vec![0, 1, 2]);
    }
}
