//! Error types for grid construction and addressing.

use std::fmt;

/// Errors arising from grid construction or cell addressing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// Attempted to construct a grid with zero cells.
    EmptyGrid,
    /// The cell count does not fit in a `u32`.
    TooLarge {
        /// The requested side length.
        size: usize,
    },
    /// A flat cell index is outside the grid.
    CellOutOfRange {
        /// The offending index.
        cell: usize,
        /// Number of cells on the grid.
        num_cells: usize,
    },
    /// A `(row, col)` coordinate is outside the grid.
    CoordOutOfBounds {
        /// Row of the offending coordinate.
        row: usize,
        /// Column of the offending coordinate.
        col: usize,
        /// Side length of the grid.
        size: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::TooLarge { size } => {
                write!(f, "grid side {size} gives more than u32::MAX cells")
            }
            Self::CellOutOfRange { cell, num_cells } => {
                write!(f, "cell {cell} out of range [0, {num_cells})")
            }
            Self::CoordOutOfBounds { row, col, size } => {
                write!(f, "coordinate ({row}, {col}) out of bounds [0, {size}) x [0, {size})")
            }
        }
    }
}

impl std::error::Error for GridError {}
