//! Behaviour constants shared by all agents.

use std::time::Duration;

use serde::Deserialize;

/// Constants shaping agent behaviour.
///
/// Distances are world units, speeds world units per second and every
/// `*_ms` field a duration in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    /// Health an agent spawns with.
    pub health: u32,
    /// Length of the entry animation during which no AI runs.
    pub spawn_ms: u64,
    /// Length of the death animation before the agent is removed.
    pub death_ms: u64,
    /// Length of the hurt feedback window opened by each hit.
    pub hurt_ms: u64,
    /// Mean of the normal distribution base speeds are drawn from.
    pub speed_mean: f32,
    /// Standard deviation of the base speed distribution.
    pub speed_deviation: f32,
    /// Lower bound applied to every drawn base speed.
    pub speed_min: f32,
    /// Probability that a new agent is a runner.
    pub runner_chance: f64,
    /// Factor applied to the base speed of runners.
    pub runner_multiplier: f32,
    /// Speed factor while overlapping an open barricade.
    pub slow_factor: f32,
    /// Duration of the slow effect, refreshed while the overlap lasts.
    pub slow_ms: u64,
    /// Distance to a targeted barricade at which the siege starts.
    pub siege_radius: f32,
    /// Delay between two panels torn off the same barricade.
    pub siege_cooldown_ms: u64,
    /// Distance to the target at which the agent stops and attacks.
    pub melee_range: f32,
    /// Delay between two lunges.
    pub attack_cooldown_ms: u64,
    /// Damage delivered by one lunge.
    pub attack_damage: u32,
    /// Length of the lunge tween toward the target and back.
    pub lunge_ms: u64,
    /// Peak displacement of the lunge tween.
    pub lunge_distance: f32,
    /// Distance within which a visible target is chased directly.
    pub aggro_radius: f32,
    /// Distance at which a way-point counts as reached.
    pub waypoint_radius: f32,
    /// Mean delay between two path requests.
    pub repath_ms: u64,
    /// Maximum random deviation applied to each re-plan delay.
    pub repath_jitter_ms: u64,
    /// Per-tick probability of an anti-stacking nudge.
    pub jitter_chance: f64,
    /// Length of an anti-stacking nudge.
    pub jitter_distance: f32,
}

impl AgentTuning {
    pub(crate) fn spawn_duration(&self) -> Duration {
        Duration::from_millis(self.spawn_ms)
    }

    pub(crate) fn death_duration(&self) -> Duration {
        Duration::from_millis(self.death_ms)
    }

    pub(crate) fn hurt_duration(&self) -> Duration {
        Duration::from_millis(self.hurt_ms)
    }

    pub(crate) fn slow_duration(&self) -> Duration {
        Duration::from_millis(self.slow_ms)
    }

    pub(crate) fn siege_cooldown(&self) -> Duration {
        Duration::from_millis(self.siege_cooldown_ms)
    }

    pub(crate) fn attack_cooldown(&self) -> Duration {
        Duration::from_millis(self.attack_cooldown_ms)
    }

    pub(crate) fn lunge_duration(&self) -> Duration {
        Duration::from_millis(self.lunge_ms)
    }
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            health: 100,
            spawn_ms: 1_000,
            death_ms: 1_500,
            hurt_ms: 200,
            speed_mean: 60.0,
            speed_deviation: 8.0,
            speed_min: 20.0,
            runner_chance: 0.1,
            runner_multiplier: 1.8,
            slow_factor: 0.5,
            slow_ms: 1_000,
            siege_radius: 40.0,
            siege_cooldown_ms: 700,
            melee_range: 24.0,
            attack_cooldown_ms: 1_000,
            attack_damage: 10,
            lunge_ms: 250,
            lunge_distance: 8.0,
            aggro_radius: 200.0,
            waypoint_radius: 15.0,
            repath_ms: 500,
            repath_jitter_ms: 100,
            jitter_chance: 0.02,
            jitter_distance: 2.0,
        }
    }
}
