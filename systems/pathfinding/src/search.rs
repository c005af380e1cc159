//! Resumable A* search over the live occupancy grid.

use std::{cmp::Reverse, collections::BinaryHeap};

use horde_core::CellCoord;
use horde_world::OccupancyGrid;

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;
const UNSET: u32 = u32::MAX;

/// Eight-way moves as `(columns, rows, cost)`, clockwise from north.
const DIRECTIONS: [(i32, i32, u32); 8] = [
    (0, -1, STRAIGHT_COST),
    (1, -1, DIAGONAL_COST),
    (1, 0, STRAIGHT_COST),
    (1, 1, DIAGONAL_COST),
    (0, 1, STRAIGHT_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, 0, STRAIGHT_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Outcome of spending budget on a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    /// Budget ran out before the search finished.
    Pending,
    /// Cells from the start (exclusive) to the goal (inclusive).
    Found(Vec<CellCoord>),
    /// Every reachable cell was expanded without reaching the goal.
    Exhausted,
}

/// Single A* search whose open set survives between budget slices.
#[derive(Clone, Debug)]
pub(crate) struct Search {
    start: CellCoord,
    goal: CellCoord,
    dimensions: (u32, u32),
    open: BinaryHeap<Reverse<(u32, u32, usize)>>,
    cost: Vec<u32>,
    parent: Vec<u32>,
    closed: Vec<bool>,
    expansions: u32,
}

impl Search {
    pub(crate) fn new(grid: &OccupancyGrid, start: CellCoord, goal: CellCoord) -> Self {
        let dimensions = grid.dimensions();
        let cells = usize::try_from(u64::from(dimensions.0) * u64::from(dimensions.1)).unwrap_or(0);
        let mut search = Self {
            start,
            goal,
            dimensions,
            open: BinaryHeap::new(),
            cost: vec![UNSET; cells],
            parent: vec![UNSET; cells],
            closed: vec![false; cells],
            expansions: 0,
        };

        if let Some(index) = search.index(start) {
            search.cost[index] = 0;
            let estimate = octile(start, goal);
            search.open.push(Reverse((estimate, estimate, index)));
        }

        search
    }

    pub(crate) const fn start(&self) -> CellCoord {
        self.start
    }

    pub(crate) const fn goal(&self) -> CellCoord {
        self.goal
    }

    pub(crate) const fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub(crate) const fn expansions(&self) -> u32 {
        self.expansions
    }

    /// Expands nodes until the goal is reached, the open set empties or the
    /// budget is spent. Each expanded node consumes one unit of budget.
    pub(crate) fn step(&mut self, grid: &OccupancyGrid, budget: &mut u32) -> Progress {
        if grid.dimensions() != self.dimensions {
            return Progress::Exhausted;
        }

        while *budget > 0 {
            let Some(Reverse((_, _, current))) = self.open.pop() else {
                return Progress::Exhausted;
            };
            if self.closed[current] {
                continue;
            }
            self.closed[current] = true;
            self.expansions = self.expansions.saturating_add(1);
            *budget -= 1;

            let cell = self.cell(current);
            if cell == self.goal {
                return Progress::Found(self.reconstruct(current));
            }
            self.expand(grid, cell, current);
        }

        if self.open.is_empty() {
            Progress::Exhausted
        } else {
            Progress::Pending
        }
    }

    fn expand(&mut self, grid: &OccupancyGrid, cell: CellCoord, current: usize) {
        let base = self.cost[current];
        for (columns, rows, step) in DIRECTIONS {
            let Some(neighbor) = cell.offset(columns, rows) else {
                continue;
            };
            if !grid.is_walkable(neighbor) {
                continue;
            }
            if columns != 0 && rows != 0 && !diagonal_is_clear(grid, cell, columns, rows) {
                continue;
            }
            let Some(index) = self.index(neighbor) else {
                continue;
            };
            if self.closed[index] {
                continue;
            }

            let tentative = base.saturating_add(step);
            if tentative < self.cost[index] {
                self.cost[index] = tentative;
                self.parent[index] = u32::try_from(current).unwrap_or(UNSET);
                let estimate = octile(neighbor, self.goal);
                self.open
                    .push(Reverse((tentative.saturating_add(estimate), estimate, index)));
            }
        }
    }

    fn reconstruct(&self, goal: usize) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let mut current = goal;
        while self.cell(current) != self.start {
            cells.push(self.cell(current));
            let parent = self.parent[current];
            if parent == UNSET {
                break;
            }
            let Ok(parent) = usize::try_from(parent) else {
                break;
            };
            current = parent;
        }
        cells.reverse();
        cells
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let (columns, rows) = self.dimensions;
        if cell.column() >= columns || cell.row() >= rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn cell(&self, index: usize) -> CellCoord {
        let width = usize::try_from(self.dimensions.0).unwrap_or(1).max(1);
        let column = u32::try_from(index % width).unwrap_or(u32::MAX);
        let row = u32::try_from(index / width).unwrap_or(u32::MAX);
        CellCoord::new(column, row)
    }
}

/// A diagonal move is legal only when both orthogonal shoulder cells are open.
fn diagonal_is_clear(grid: &OccupancyGrid, cell: CellCoord, columns: i32, rows: i32) -> bool {
    let horizontal = cell.offset(columns, 0);
    let vertical = cell.offset(0, rows);
    horizontal.is_some_and(|shoulder| grid.is_walkable(shoulder))
        && vertical.is_some_and(|shoulder| grid.is_walkable(shoulder))
}

/// Octile distance scaled to the integer move costs.
fn octile(from: CellCoord, to: CellCoord) -> u32 {
    let columns = from.column().abs_diff(to.column());
    let rows = from.row().abs_diff(to.row());
    let (short, long) = if columns < rows {
        (columns, rows)
    } else {
        (rows, columns)
    };
    DIAGONAL_COST * short + STRAIGHT_COST * (long - short)
}
