//! JSON summary written at the end of a run.

use std::collections::BTreeMap;

use serde::Serialize;

/// Summary of a finished headless run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RunReport {
    /// Ticks simulated before the run stopped.
    pub ticks_run: u64,
    /// Agents created over the run.
    pub spawned: u32,
    /// Agents killed by the defender.
    pub died: u32,
    /// Damage the defender received.
    pub damage_taken: u32,
    /// Health the defender ended with.
    pub target_health: u32,
    /// Whether the defender fell before the last tick.
    pub target_fell: bool,
    /// Barricades stripped of every panel.
    pub barricades_breached: u32,
    /// Zones unlocked by doors.
    pub zones_unlocked: Vec<u32>,
    /// Agents still present at the end, keyed by state label.
    pub alive_by_state: BTreeMap<String, usize>,
}

impl RunReport {
    /// Renders the report as indented JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
