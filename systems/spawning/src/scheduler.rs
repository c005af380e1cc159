//! Spawn cadence under a population cap.

use std::time::Duration;

use rand::{Rng, RngCore};
use serde::Deserialize;

/// Spawn cadence and population cap.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Simulated time between two spawns, in milliseconds. Zero disables spawning.
    pub interval_ms: u64,
    /// Maximum number of living agents.
    pub max_population: usize,
}

impl SpawnConfig {
    /// Creates a configuration with the provided cadence and cap.
    #[must_use]
    pub const fn new(interval_ms: u64, max_population: usize) -> Self {
        Self {
            interval_ms,
            max_population,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self::new(2_000, 24)
    }
}

/// Accumulates simulated time and decides which spawn points fire.
#[derive(Debug)]
pub struct SpawnScheduler {
    spawn_interval: Duration,
    max_population: usize,
    accumulator: Duration,
}

impl SpawnScheduler {
    /// Creates a scheduler from its configuration.
    #[must_use]
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            spawn_interval: Duration::from_millis(config.interval_ms),
            max_population: config.max_population,
            accumulator: Duration::ZERO,
        }
    }

    /// Time banked toward the next spawn.
    #[must_use]
    pub const fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Advances the cadence by `dt` and pushes the spawners that fire.
    ///
    /// At most one spawn happens per elapsed interval and never more than the
    /// room left under the cap. Intervals that elapse while the population is
    /// full are forfeited. Without any active spawner no time is banked.
    pub fn advance(
        &mut self,
        dt: Duration,
        alive: usize,
        spawners: &[usize],
        rng: &mut dyn RngCore,
        out: &mut Vec<usize>,
    ) {
        if self.spawn_interval.is_zero() || spawners.is_empty() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let attempts = self.resolve_spawn_attempts();
        let room = self.max_population.saturating_sub(alive);

        for _ in 0..attempts.min(room) {
            let index = rng.gen_range(0..spawners.len());
            out.push(spawners[index]);
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_interval_never_fires() {
        let mut scheduler = SpawnScheduler::new(SpawnConfig::new(0, 10));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut out = Vec::new();
        scheduler.advance(Duration::from_secs(10), 0, &[0], &mut rng, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn leftover_time_carries_over() {
        let mut scheduler = SpawnScheduler::new(SpawnConfig::new(1_000, 10));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut out = Vec::new();
        scheduler.advance(Duration::from_millis(2_500), 0, &[0], &mut rng, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(scheduler.accumulator(), Duration::from_millis(500));
    }
}
