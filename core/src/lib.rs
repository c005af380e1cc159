#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde AI engine.
//!
//! This crate defines the vocabulary that connects the level, the path
//! service, agent controllers and spawn coordinators. Systems mutate the
//! state they own and report everything other collaborators may care about
//! as [`Event`] values pushed into caller-provided buffers, so scoring,
//! audio or presentation layers observe the simulation without polling it.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Finite set of behaviours an agent controller can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Entry animation after creation; no AI logic runs.
    Spawn,
    /// Following a computed way-point list toward a barricade or the target.
    Pathing,
    /// Steering directly at a nearby, visible target.
    Chase,
    /// Within melee range of the target and lunging on a cooldown.
    Attack,
    /// Tearing panels off a barricade.
    AttackBarrier,
    /// Terminal state; the agent is removed after its exit animation.
    Dead,
}

impl AiState {
    /// Every state in declaration order.
    pub const ALL: [AiState; 6] = [
        AiState::Spawn,
        AiState::Pathing,
        AiState::Chase,
        AiState::Attack,
        AiState::AttackBarrier,
        AiState::Dead,
    ];

    /// Reports whether the state runs per-tick decision logic.
    #[must_use]
    pub const fn is_thinking(self) -> bool {
        !matches!(self, Self::Spawn | Self::Dead)
    }

    /// Stable lowercase label used by logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Pathing => "pathing",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::AttackBarrier => "attack_barrier",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for AiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Events broadcast by the level, agents and spawners while simulating.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a spawn coordinator created a new agent.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Zone whose spawn point produced the agent.
        zone: ZoneId,
        /// World position the agent was created at.
        position: Vec2,
    },
    /// Reports a transition of an agent's AI state.
    AgentStateChanged {
        /// Agent whose state changed.
        agent: AgentId,
        /// State before the transition.
        from: AiState,
        /// State after the transition.
        to: AiState,
    },
    /// Reports that an agent passed the perimeter for good.
    AgentBreached {
        /// Agent that breached.
        agent: AgentId,
        /// Whether the breach was forced because no barricade was reachable.
        forced: bool,
    },
    /// A lunge connected with the pursuit target.
    TargetDamaged {
        /// Agent that delivered the hit.
        agent: AgentId,
        /// Damage to apply to the target.
        amount: u32,
    },
    /// An agent reached zero health. Emitted exactly once per agent.
    AgentDied {
        /// Agent that died.
        agent: AgentId,
        /// World position at the moment of death.
        position: Vec2,
    },
    /// An agent tore a panel off a barricade.
    BarricadeStruck {
        /// Barricade that lost a panel.
        barricade: BarricadeId,
        /// Agent responsible for the strike.
        agent: AgentId,
        /// Panels remaining after the strike.
        panels_left: u32,
    },
    /// A barricade lost its last panel and its cell became walkable.
    BarricadeBreached {
        /// Barricade that opened.
        barricade: BarricadeId,
        /// World position of the barricade.
        position: Vec2,
    },
    /// A barricade regained a panel.
    BarricadeRepaired {
        /// Barricade that was repaired.
        barricade: BarricadeId,
        /// World position of the barricade.
        position: Vec2,
        /// Panels present after the repair.
        panels: u32,
    },
    /// A barricade was removed from the level entirely.
    BarricadeRemoved {
        /// Barricade that was removed.
        barricade: BarricadeId,
        /// World position the barricade occupied.
        position: Vec2,
    },
    /// A door opened and unlocked a zone.
    DoorOpened {
        /// Door that opened.
        door: DoorId,
        /// Zone unlocked by the door.
        zone: ZoneId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a barricade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarricadeId(u32);

impl BarricadeId {
    /// Creates a new barricade identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoorId(u32);

impl DoorId {
    /// Creates a new door identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawn zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Zone that starts active when a level loads.
    pub const PRIMARY: ZoneId = ZoneId(1);

    /// Creates a new zone identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Offsets the cell by the provided signed deltas.
    ///
    /// Returns `None` when the result would leave the non-negative quadrant.
    /// Upper bounds are the grid's concern.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellCoord::new(column, row))
    }

    /// Orthogonal neighbours in north, east, south, west order.
    ///
    /// Neighbours that would underflow are skipped.
    pub fn orthogonal_neighbors(self) -> impl Iterator<Item = CellCoord> {
        [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .into_iter()
            .filter_map(move |(columns, rows)| self.offset(columns, rows))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Snapshot of the entity agents pursue, supplied by the caller every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PursuitTarget {
    /// World position of the target.
    pub position: Vec2,
    /// Whether the target can currently be pursued.
    pub active: bool,
}

impl PursuitTarget {
    /// Creates an active target at the provided position.
    #[must_use]
    pub const fn active_at(position: Vec2) -> Self {
        Self {
            position,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AiState, CellCoord};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn orthogonal_neighbors_skip_underflow() {
        let corner: Vec<_> = CellCoord::new(0, 0).orthogonal_neighbors().collect();
        assert_eq!(corner, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);

        let interior: Vec<_> = CellCoord::new(2, 2).orthogonal_neighbors().collect();
        assert_eq!(
            interior,
            vec![
                CellCoord::new(2, 1),
                CellCoord::new(3, 2),
                CellCoord::new(2, 3),
                CellCoord::new(1, 2),
            ]
        );
    }

    #[test]
    fn only_spawn_and_dead_skip_thinking() {
        let idle: Vec<_> = AiState::ALL
            .into_iter()
            .filter(|state| !state.is_thinking())
            .collect();
        assert_eq!(idle, vec![AiState::Spawn, AiState::Dead]);
    }
}
