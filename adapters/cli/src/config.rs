//! Scenario documents read from TOML.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use horde_system_agent::AgentTuning;
use horde_system_pathfinding::PathServiceConfig;
use horde_system_spawning::SpawnConfig;
use serde::Deserialize;

const DEFAULT_MAP: [&str; 11] = [
    "################",
    "#..............#",
    "#......P.......#",
    "#..............#",
    "######B##B######",
    "#S.............#",
    "#..............#",
    "#######bb#######",
    "#..............#",
    "#.............2#",
    "################",
];

/// Scenario played by a headless run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Map and obstacle setup.
    pub level: LevelConfig,
    /// Behaviour constants shared by every agent.
    pub agents: AgentTuning,
    /// Path service budget.
    pub paths: PathServiceConfig,
    /// Spawn cadence and population cap.
    pub spawning: SpawnConfig,
    /// Clock and seed of the run.
    pub simulation: SimulationConfig,
    /// The stationary defender agents hunt.
    pub target: TargetConfig,
    /// Doors opened at fixed ticks.
    pub doors: Vec<DoorOpening>,
}

impl ScenarioConfig {
    /// Reads a scenario from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from TOML text. Missing sections keep their defaults.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse scenario TOML")
    }
}

/// Map and obstacle setup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Text rows of the map, top row first.
    pub rows: Vec<String>,
    /// Edge length of a tile in world units.
    pub tile_size: f32,
    /// Panels every barricade starts with.
    pub panels: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_MAP.iter().map(|row| (*row).to_owned()).collect(),
            tile_size: 32.0,
            panels: 5,
        }
    }
}

/// Clock and seed of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed simulated step in milliseconds.
    pub tick_ms: u64,
    /// Number of steps to run unless the target falls first.
    pub ticks: u64,
    /// Seed of the random stream driving every draw.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            ticks: 2_400,
            seed: 0x5eed,
        }
    }
}

/// The stationary defender agents hunt.
///
/// The defender shoots the closest visible agent within `range`. A zero
/// `damage` leaves the horde unopposed.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Health of the defender.
    pub health: u32,
    /// Damage of one shot.
    pub damage: u32,
    /// Delay between two shots in milliseconds.
    pub cooldown_ms: u64,
    /// Reach of a shot in world units.
    pub range: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            health: 100,
            damage: 35,
            cooldown_ms: 400,
            range: 192.0,
        }
    }
}

/// Door opened by the driver at a fixed tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct DoorOpening {
    /// Index of the door in map order.
    pub door: u32,
    /// Tick at which the door opens.
    pub tick: u64,
}
