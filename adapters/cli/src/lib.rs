#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that runs Horde scenarios without a renderer.
//!
//! A scenario is a TOML document naming the map, the agent tuning, the spawn
//! cadence and a stationary defender. [`Session`] advances every system on a
//! fixed step and [`RunReport`] summarises what happened.

mod config;
mod report;
mod session;

pub use config::{DoorOpening, LevelConfig, ScenarioConfig, SimulationConfig, TargetConfig};
pub use report::RunReport;
pub use session::Session;
