//! Fatal level construction diagnostics.

use thiserror::Error;

/// Reasons a level cannot be loaded.
///
/// Every variant aborts the level load; the simulation never runs against a
/// partially built grid.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The geometry did not provide a wall layer.
    #[error("level geometry is missing its wall layer")]
    MissingWallLayer,
    /// A tile layer does not cover the grid exactly.
    #[error("{layer} layer holds {actual} cells but the grid needs {expected}")]
    LayerSizeMismatch {
        /// Name of the offending layer.
        layer: &'static str,
        /// Number of cells required by the grid dimensions.
        expected: usize,
        /// Number of cells supplied by the layer.
        actual: usize,
    },
    /// The grid has no columns or no rows.
    #[error("level grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The tile size is not a positive finite number.
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
    /// A text map row has a different width than the first row.
    #[error("map row {row} is {actual} tiles wide, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A text map contains a glyph with no meaning.
    #[error("unknown map glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column of the glyph.
        column: usize,
        /// Zero-based row of the glyph.
        row: usize,
    },
}
