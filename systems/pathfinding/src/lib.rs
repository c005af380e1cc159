#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Incremental path service shared by every agent in a level.
//!
//! Requests are accepted immediately and answered later: each call to
//! [`PathService::calculate`] spends a fixed budget of node expansions on the
//! oldest pending searches, and finished searches are collected through
//! [`PathService::drain_completed`]. Searches always read the live
//! [`OccupancyGrid`], so walls, barricades and doors that change while a
//! search is in flight are honoured by the remaining expansions.

mod search;

use std::collections::VecDeque;

use glam::Vec2;
use horde_core::{AgentId, CellCoord};
use horde_world::OccupancyGrid;
use serde::Deserialize;
use thiserror::Error;

use search::{Progress, Search};

/// Tunable limits of the path service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathServiceConfig {
    /// Node expansions performed per [`PathService::calculate`] call.
    pub iterations_per_tick: u32,
}

impl Default for PathServiceConfig {
    fn default() -> Self {
        Self {
            iterations_per_tick: 1_000,
        }
    }
}

/// Handle identifying a single path request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathTicket(u64);

impl PathTicket {
    /// Creates a ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Reasons a path request completes without a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// Start or goal is blocked, or no walkable route connects them.
    #[error("no path exists between the requested cells")]
    NoPath,
    /// Start or goal lies outside the grid.
    #[error("requested coordinate lies outside the grid")]
    InvalidCoordinate,
}

/// Way-points leading from a start cell to a goal cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    cells: Vec<CellCoord>,
    waypoints: Vec<Vec2>,
    end_cell: CellCoord,
}

impl Path {
    fn from_cells(grid: &OccupancyGrid, cells: Vec<CellCoord>, end_cell: CellCoord) -> Self {
        let waypoints = cells.iter().map(|&cell| grid.cell_center(cell)).collect();
        Self {
            cells,
            waypoints,
            end_cell,
        }
    }

    /// Cells visited after the start cell, ending with the goal.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// World-space centres of [`Path::cells`].
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Cell the path ends on.
    #[must_use]
    pub const fn end_cell(&self) -> CellCoord {
        self.end_cell
    }

    /// Number of way-points in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the start already was the goal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Completed request handed back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct PathOutcome {
    /// Ticket returned when the request was issued.
    pub ticket: PathTicket,
    /// Agent that issued the request.
    pub requester: AgentId,
    /// The path, or the reason none was found.
    pub result: Result<Path, PathError>,
}

#[derive(Clone, Debug)]
struct Job {
    ticket: PathTicket,
    requester: AgentId,
    search: Search,
    fallbacks: VecDeque<CellCoord>,
}

/// Asynchronous A* service answering path requests in budgeted slices.
#[derive(Clone, Debug)]
pub struct PathService {
    config: PathServiceConfig,
    next_ticket: u64,
    pending: VecDeque<Job>,
    completed: Vec<PathOutcome>,
}

impl PathService {
    /// Creates an idle service.
    ///
    /// A zero expansion budget is raised to one so searches always progress.
    #[must_use]
    pub fn new(config: PathServiceConfig) -> Self {
        Self {
            config: PathServiceConfig {
                iterations_per_tick: config.iterations_per_tick.max(1),
            },
            next_ticket: 0,
            pending: VecDeque::new(),
            completed: Vec::new(),
        }
    }

    /// Configuration the service runs with.
    #[must_use]
    pub const fn config(&self) -> PathServiceConfig {
        self.config
    }

    /// Number of searches still waiting for budget.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Requests a path between two world positions.
    ///
    /// Out-of-range endpoints complete with [`PathError::InvalidCoordinate`]
    /// and blocked endpoints with [`PathError::NoPath`]; both are delivered
    /// through [`PathService::drain_completed`] like any other result.
    pub fn find_path(
        &mut self,
        grid: &OccupancyGrid,
        start: Vec2,
        goal: Vec2,
        requester: AgentId,
    ) -> PathTicket {
        let ticket = self.issue_ticket();
        let (Some(start_cell), Some(goal_cell)) = (grid.world_to_cell(start), grid.world_to_cell(goal))
        else {
            self.fail(ticket, requester, PathError::InvalidCoordinate);
            return ticket;
        };
        if !grid.is_walkable(start_cell) || !grid.is_walkable(goal_cell) {
            self.fail(ticket, requester, PathError::NoPath);
            return ticket;
        }

        self.pending.push_back(Job {
            ticket,
            requester,
            search: Search::new(grid, start_cell, goal_cell),
            fallbacks: VecDeque::new(),
        });
        ticket
    }

    /// Requests a path to any walkable orthogonal neighbour of `target`.
    ///
    /// Used to approach cells that are themselves blocked, such as a closed
    /// barricade. Neighbours are tried nearest to `start` first; equally
    /// distant neighbours keep north, east, south, west order.
    pub fn find_path_to_neighbor_of(
        &mut self,
        grid: &OccupancyGrid,
        start: Vec2,
        target: Vec2,
        requester: AgentId,
    ) -> PathTicket {
        let ticket = self.issue_ticket();
        let (Some(start_cell), Some(target_cell)) =
            (grid.world_to_cell(start), grid.world_to_cell(target))
        else {
            self.fail(ticket, requester, PathError::InvalidCoordinate);
            return ticket;
        };
        if !grid.is_walkable(start_cell) {
            self.fail(ticket, requester, PathError::NoPath);
            return ticket;
        }

        let mut candidates: Vec<(f32, CellCoord)> = target_cell
            .orthogonal_neighbors()
            .filter(|cell| grid.is_walkable(*cell))
            .map(|cell| (start.distance_squared(grid.cell_center(cell)), cell))
            .collect();
        candidates.sort_by(|left, right| left.0.total_cmp(&right.0));
        let mut fallbacks: VecDeque<CellCoord> =
            candidates.into_iter().map(|(_, cell)| cell).collect();

        let Some(first) = fallbacks.pop_front() else {
            self.fail(ticket, requester, PathError::NoPath);
            return ticket;
        };

        self.pending.push_back(Job {
            ticket,
            requester,
            search: Search::new(grid, start_cell, first),
            fallbacks,
        });
        ticket
    }

    /// Spends one tick's worth of expansions on pending searches, oldest first.
    pub fn calculate(&mut self, grid: &OccupancyGrid) {
        let mut budget = self.config.iterations_per_tick;
        while budget > 0 {
            let Some(job) = self.pending.front_mut() else {
                break;
            };

            match job.search.step(grid, &mut budget) {
                Progress::Pending => break,
                Progress::Found(cells) => {
                    let goal = job.search.goal();
                    let path = Path::from_cells(grid, cells, goal);
                    tracing::debug!(
                        ticket = job.ticket.get(),
                        requester = job.requester.get(),
                        waypoints = path.len(),
                        expansions = job.search.expansions(),
                        "path found"
                    );
                    let ticket = job.ticket;
                    let requester = job.requester;
                    let _ = self.pending.pop_front();
                    self.completed.push(PathOutcome {
                        ticket,
                        requester,
                        result: Ok(path),
                    });
                }
                Progress::Exhausted => {
                    let resized = job.search.dimensions() != grid.dimensions();
                    if let Some(next) = job.fallbacks.pop_front().filter(|_| !resized) {
                        let start = job.search.start();
                        job.search = Search::new(grid, start, next);
                        continue;
                    }
                    tracing::debug!(
                        ticket = job.ticket.get(),
                        requester = job.requester.get(),
                        expansions = job.search.expansions(),
                        "path search exhausted"
                    );
                    let ticket = job.ticket;
                    let requester = job.requester;
                    let _ = self.pending.pop_front();
                    self.fail(ticket, requester, PathError::NoPath);
                }
            }
        }
    }

    /// Moves every finished result into `out`, in completion order.
    pub fn drain_completed(&mut self, out: &mut Vec<PathOutcome>) {
        out.append(&mut self.completed);
    }

    /// Drops every pending and undelivered request.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.completed.clear();
    }

    fn issue_ticket(&mut self) -> PathTicket {
        let ticket = PathTicket::new(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        ticket
    }

    fn fail(&mut self, ticket: PathTicket, requester: AgentId, error: PathError) {
        self.completed.push(PathOutcome {
            ticket,
            requester,
            result: Err(error),
        });
    }
}

impl Default for PathService {
    fn default() -> Self {
        Self::new(PathServiceConfig::default())
    }
}
