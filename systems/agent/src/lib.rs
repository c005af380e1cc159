#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent controllers for the Horde AI engine.
//!
//! Every agent runs a small state machine each tick. In priority order it
//! continues an active siege, starts one when it reaches its barricade, and
//! otherwise pursues the target by melee, direct chase or path following.
//! Path requests go through the shared path service and their answers are
//! routed back by [`AgentPopulation::deliver_paths`].

mod agent;
mod population;
mod tuning;

pub use agent::{Agent, TickContext};
pub use population::{AgentPopulation, AgentSnapshot};
pub use tuning::AgentTuning;
