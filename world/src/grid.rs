//! Dense walkability grid shared by the path service and agent controllers.

use glam::Vec2;
use horde_core::CellCoord;

use crate::{geometry::LevelGeometry, LevelError};

/// Mutable boolean walkability map of the level.
///
/// Dimensions never change after construction; a rebuild produces a new
/// grid. Cells outside `[0, columns) x [0, rows)` always read as blocked.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    columns: u32,
    rows: u32,
    tile_size: f32,
    walkable: Vec<bool>,
}

impl OccupancyGrid {
    /// Rasterises static geometry and a snapshot of dynamic obstacles.
    ///
    /// Wall and water cells are blocked first, then the cell under every
    /// obstacle position. Obstacles outside the grid are ignored.
    pub fn build(geometry: &LevelGeometry, obstacles: &[Vec2]) -> Result<Self, LevelError> {
        geometry.validate()?;

        let columns = geometry.columns();
        let rows = geometry.rows();
        let mut walkable = Vec::with_capacity(cell_count(columns, rows));
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                walkable.push(!geometry.is_wall(cell) && !geometry.is_water(cell));
            }
        }

        let mut grid = Self {
            columns,
            rows,
            tile_size: geometry.tile_size(),
            walkable,
        };
        for &obstacle in obstacles {
            grid.set_walkable(obstacle, false);
        }

        Ok(grid)
    }

    /// Creates a grid in which every cell is walkable.
    #[must_use]
    pub fn open(columns: u32, rows: u32, tile_size: f32) -> Self {
        Self {
            columns,
            rows,
            tile_size,
            walkable: vec![true; cell_count(columns, rows)],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether agents may stand on the cell.
    ///
    /// Out-of-range cells are blocked.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.walkable.get(index).copied())
            .unwrap_or(false)
    }

    /// Sets the walkability of the cell containing the world position.
    ///
    /// Positions outside the grid are ignored. Repeated calls converge to the
    /// last value written.
    pub fn set_walkable(&mut self, world: Vec2, walkable: bool) {
        let Some(cell) = self.world_to_cell(world) else {
            return;
        };
        if let Some(slot) = self
            .index(cell)
            .and_then(|index| self.walkable.get_mut(index))
        {
            *slot = walkable;
        }
    }

    /// Converts a world position into the cell that contains it.
    #[must_use]
    pub fn world_to_cell(&self, world: Vec2) -> Option<CellCoord> {
        world_to_cell(world, self.tile_size, self.columns, self.rows)
    }

    /// World-space centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        cell_center(cell, self.tile_size)
    }

    /// Number of walkable cells, useful for diagnostics.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|walkable| **walkable).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

pub(crate) fn world_to_cell(world: Vec2, tile_size: f32, columns: u32, rows: u32) -> Option<CellCoord> {
    if !world.is_finite() || tile_size <= 0.0 {
        return None;
    }
    let scaled = world / tile_size;
    if scaled.x < 0.0 || scaled.y < 0.0 {
        return None;
    }
    let column = scaled.x.floor() as u32;
    let row = scaled.y.floor() as u32;
    if column >= columns || row >= rows {
        return None;
    }
    Some(CellCoord::new(column, row))
}

pub(crate) fn cell_center(cell: CellCoord, tile_size: f32) -> Vec2 {
    Vec2::new(
        (cell.column() as f32 + 0.5) * tile_size,
        (cell.row() as f32 + 0.5) * tile_size,
    )
}

pub(crate) fn cell_count(columns: u32, rows: u32) -> usize {
    let count = u64::from(columns) * u64::from(rows);
    usize::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_cells_are_blocked() {
        let grid = OccupancyGrid::open(3, 2, 10.0);

        assert!(grid.is_walkable(CellCoord::new(2, 1)));
        assert!(!grid.is_walkable(CellCoord::new(3, 0)));
        assert!(!grid.is_walkable(CellCoord::new(0, 2)));
    }

    #[test]
    fn world_positions_map_to_cells() {
        let grid = OccupancyGrid::open(4, 4, 32.0);

        assert_eq!(grid.world_to_cell(Vec2::new(0.0, 0.0)), Some(CellCoord::new(0, 0)));
        assert_eq!(grid.world_to_cell(Vec2::new(63.9, 32.0)), Some(CellCoord::new(1, 1)));
        assert_eq!(grid.world_to_cell(Vec2::new(-0.1, 5.0)), None);
        assert_eq!(grid.world_to_cell(Vec2::new(128.0, 5.0)), None);
        assert_eq!(grid.cell_center(CellCoord::new(1, 2)), Vec2::new(48.0, 80.0));
    }

    #[test]
    fn set_walkable_is_idempotent_and_last_write_wins() {
        let mut grid = OccupancyGrid::open(3, 3, 10.0);
        let point = Vec2::new(15.0, 15.0);
        let cell = CellCoord::new(1, 1);

        grid.set_walkable(point, true);
        grid.set_walkable(point, true);
        assert!(grid.is_walkable(cell));

        for walkable in [false, true, false, false, true, false] {
            grid.set_walkable(point, walkable);
        }
        assert!(!grid.is_walkable(cell));
        assert_eq!(grid.walkable_count(), 8);
    }

    #[test]
    fn set_walkable_ignores_positions_outside_grid() {
        let mut grid = OccupancyGrid::open(2, 2, 10.0);
        grid.set_walkable(Vec2::new(-5.0, 5.0), false);
        grid.set_walkable(Vec2::new(25.0, 5.0), false);

        assert_eq!(grid.walkable_count(), 4);
    }
}
