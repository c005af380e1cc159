//! Static level geometry and the text map format used to author it.

use horde_core::{CellCoord, ZoneId};

use crate::{grid::cell_count, LevelError};

/// Static tile layers of a level as handed over by the map loader.
///
/// The wall layer is mandatory; the water layer may be omitted, in which
/// case no floor cell is impassable.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGeometry {
    columns: u32,
    rows: u32,
    tile_size: f32,
    walls: Option<Vec<bool>>,
    water: Vec<bool>,
}

impl LevelGeometry {
    /// Creates geometry without any layers attached.
    #[must_use]
    pub fn new(columns: u32, rows: u32, tile_size: f32) -> Self {
        Self {
            columns,
            rows,
            tile_size,
            walls: None,
            water: Vec::new(),
        }
    }

    /// Creates geometry with an empty wall layer and no water.
    #[must_use]
    pub fn open(columns: u32, rows: u32, tile_size: f32) -> Self {
        Self::new(columns, rows, tile_size).with_wall_layer(vec![false; cell_count(columns, rows)])
    }

    /// Attaches a row-major wall layer; `true` marks a wall tile.
    #[must_use]
    pub fn with_wall_layer(mut self, walls: Vec<bool>) -> Self {
        self.walls = Some(walls);
        self
    }

    /// Attaches a row-major water layer; `true` marks an impassable floor tile.
    #[must_use]
    pub fn with_water_layer(mut self, water: Vec<bool>) -> Self {
        self.water = water;
        self
    }

    /// Marks a single cell as wall. Cells outside the grid are ignored.
    pub fn set_wall(&mut self, cell: CellCoord) {
        let index = self.index(cell);
        if let (Some(index), Some(walls)) = (index, self.walls.as_mut()) {
            if let Some(slot) = walls.get_mut(index) {
                *slot = true;
            }
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

    /// Side length of a single tile expressed in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Checks that the layers describe a complete grid.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(LevelError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(LevelError::InvalidTileSize(self.tile_size));
        }

        let expected = cell_count(self.columns, self.rows);
        let walls = self.walls.as_ref().ok_or(LevelError::MissingWallLayer)?;
        if walls.len() != expected {
            return Err(LevelError::LayerSizeMismatch {
                layer: "wall",
                expected,
                actual: walls.len(),
            });
        }
        if !self.water.is_empty() && self.water.len() != expected {
            return Err(LevelError::LayerSizeMismatch {
                layer: "water",
                expected,
                actual: self.water.len(),
            });
        }

        Ok(())
    }

    /// Reports whether the cell is a wall tile. Out-of-range cells count as walls.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        let Some(index) = self.index(cell) else {
            return true;
        };
        self.walls
            .as_ref()
            .and_then(|walls| walls.get(index).copied())
            .unwrap_or(true)
    }

    /// Reports whether the cell is an impassable water tile.
    #[must_use]
    pub fn is_water(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.water.get(index).copied())
            .unwrap_or(false)
    }

    /// Parses a text map into geometry plus the markers placed on it.
    ///
    /// | glyph | meaning |
    /// |-------|---------|
    /// | `.` or space | floor |
    /// | `#` | wall |
    /// | `~` | water |
    /// | `B` | barricade |
    /// | `O` | standing obstacle |
    /// | `P` | player start |
    /// | `S` | spawn point of the primary zone |
    /// | `1`..=`9` | spawn point of that zone |
    /// | `a`..=`i` | door cell unlocking zone 1..=9 |
    ///
    /// Markers stand on floor tiles.
    pub fn from_ascii<I, S>(rows: I, tile_size: f32) -> Result<(Self, LevelLayout), LevelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<Vec<char>> = rows
            .into_iter()
            .map(|row| row.as_ref().chars().collect())
            .collect();
        let width = lines.first().map_or(0, Vec::len);
        let mut walls = Vec::with_capacity(width * lines.len());
        let mut water = Vec::with_capacity(width * lines.len());
        let mut layout = LevelLayout::default();

        for (row_index, line) in lines.iter().enumerate() {
            if line.len() != width {
                return Err(LevelError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: line.len(),
                });
            }

            for (column_index, glyph) in line.iter().copied().enumerate() {
                let cell = CellCoord::new(to_u32(column_index), to_u32(row_index));
                walls.push(glyph == '#');
                water.push(glyph == '~');
                match glyph {
                    '.' | ' ' | '#' | '~' => {}
                    'B' => layout.barricades.push(cell),
                    'O' => layout.obstacles.push(cell),
                    'P' => layout.player = Some(cell),
                    'S' => layout.spawns.push(SpawnMarker {
                        cell,
                        zone: ZoneId::PRIMARY,
                    }),
                    '1'..='9' => layout.spawns.push(SpawnMarker {
                        cell,
                        zone: ZoneId::new(glyph as u32 - '0' as u32),
                    }),
                    'a'..='i' => layout.add_door_cell(ZoneId::new(glyph as u32 - 'a' as u32 + 1), cell),
                    _ => {
                        return Err(LevelError::UnknownGlyph {
                            glyph,
                            column: column_index,
                            row: row_index,
                        })
                    }
                }
            }
        }

        let geometry = Self::new(to_u32(width), to_u32(lines.len()), tile_size)
            .with_wall_layer(walls)
            .with_water_layer(water);
        geometry.validate()?;
        Ok((geometry, layout))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Markers placed on top of the static geometry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelLayout {
    /// Cells holding a barricade.
    pub barricades: Vec<CellCoord>,
    /// Cells holding a standing obstacle.
    pub obstacles: Vec<CellCoord>,
    /// Doors, each grouping every cell that unlocks the same zone.
    pub doors: Vec<DoorMarker>,
    /// Spawn points with the zone that owns them.
    pub spawns: Vec<SpawnMarker>,
    /// Player start cell, if the map defines one.
    pub player: Option<CellCoord>,
}

impl LevelLayout {
    fn add_door_cell(&mut self, zone: ZoneId, cell: CellCoord) {
        match self.doors.iter_mut().find(|door| door.zone == zone) {
            Some(door) => door.cells.push(cell),
            None => self.doors.push(DoorMarker {
                zone,
                cells: vec![cell],
            }),
        }
    }
}

/// Door placement read from a map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoorMarker {
    /// Zone unlocked when the door opens.
    pub zone: ZoneId,
    /// Cells blocked while the door is closed.
    pub cells: Vec<CellCoord>,
}

/// Spawn point placement read from a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnMarker {
    /// Cell agents appear on.
    pub cell: CellCoord,
    /// Zone gating the spawn point.
    pub zone: ZoneId,
}

pub(crate) fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_map_produces_layers_and_markers() {
        let (geometry, layout) =
            LevelGeometry::from_ascii(["#####", "#S.B#", "#~Pb#", "#####"], 16.0)
                .expect("map should parse");

        assert_eq!((geometry.columns(), geometry.rows()), (5, 4));
        assert!(geometry.is_wall(CellCoord::new(0, 0)));
        assert!(!geometry.is_wall(CellCoord::new(1, 1)));
        assert!(geometry.is_water(CellCoord::new(1, 2)));
        assert_eq!(layout.barricades, vec![CellCoord::new(3, 1)]);
        assert_eq!(layout.player, Some(CellCoord::new(2, 2)));
        assert_eq!(
            layout.spawns,
            vec![SpawnMarker {
                cell: CellCoord::new(1, 1),
                zone: ZoneId::PRIMARY,
            }]
        );
        assert_eq!(
            layout.doors,
            vec![DoorMarker {
                zone: ZoneId::new(2),
                cells: vec![CellCoord::new(3, 2)],
            }]
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = LevelGeometry::from_ascii(["###", "##"], 16.0).unwrap_err();
        assert_eq!(
            error,
            LevelError::RaggedRow {
                row: 1,
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        let error = LevelGeometry::from_ascii(["#?#"], 16.0).unwrap_err();
        assert_eq!(
            error,
            LevelError::UnknownGlyph {
                glyph: '?',
                column: 1,
                row: 0,
            }
        );
    }

    #[test]
    fn empty_map_is_rejected() {
        let rows: [&str; 0] = [];
        let error = LevelGeometry::from_ascii(rows, 16.0).unwrap_err();
        assert_eq!(error, LevelError::EmptyGrid { columns: 0, rows: 0 });
    }

    #[test]
    fn geometry_without_wall_layer_is_malformed() {
        let geometry = LevelGeometry::new(4, 4, 16.0);
        assert_eq!(geometry.validate(), Err(LevelError::MissingWallLayer));
    }

    #[test]
    fn mismatched_water_layer_is_malformed() {
        let geometry = LevelGeometry::open(2, 2, 16.0).with_water_layer(vec![false; 3]);
        assert_eq!(
            geometry.validate(),
            Err(LevelError::LayerSizeMismatch {
                layer: "water",
                expected: 4,
                actual: 3,
            })
        );
    }
}
