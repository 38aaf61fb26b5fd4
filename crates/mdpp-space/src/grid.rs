//! Square placement grid with row-major cell indexing.

use ndarray::{Array2, Array3, Axis};

use crate::error::GridError;

/// A square `size x size` placement grid.
///
/// Cells are numbered row-major: `[0,0], [0,1], ..., [size-1, size-1]`.
/// Normalized coordinates divide the row by the row count and the column
/// by the column count, so every coordinate lies in `[0, 1)`.
///
/// # Examples
///
/// ```
/// use mdpp_space::DecapGrid;
///
/// let grid = DecapGrid::new(3).unwrap();
/// assert_eq!(grid.cell_count(), 9);
/// assert_eq!(grid.index_of(1, 2).unwrap(), 5);
/// assert_eq!(grid.coord_of(5).unwrap(), (1, 2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecapGrid {
    size: usize,
}

impl DecapGrid {
    /// Create a grid with `size * size` cells.
    ///
    /// Returns `Err(GridError::EmptyGrid)` for `size == 0` and
    /// `Err(GridError::TooLarge)` if the cell count does not fit in `u32`.
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::EmptyGrid);
        }
        let cells = size
            .checked_mul(size)
            .ok_or(GridError::TooLarge { size })?;
        if u32::try_from(cells).is_err() {
            return Err(GridError::TooLarge { size });
        }
        Ok(Self { size })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of rows (equal to [`size`](Self::size)).
    pub fn rows(&self) -> usize {
        self.size
    }

    /// Number of columns (equal to [`size`](Self::size)).
    pub fn cols(&self) -> usize {
        self.size
    }

    /// Total number of cells, `N = size²`.
    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Flat index of `(row, col)`.
    pub fn index_of(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row >= self.size || col >= self.size {
            return Err(GridError::CoordOutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        Ok(row * self.size + col)
    }

    /// `(row, col)` of a flat index.
    pub fn coord_of(&self, cell: usize) -> Result<(usize, usize), GridError> {
        self.check_cell(cell)?;
        Ok((cell / self.size, cell % self.size))
    }

    /// Check that `cell` is a valid flat index.
    pub fn check_cell(&self, cell: usize) -> Result<(), GridError> {
        if cell >= self.cell_count() {
            return Err(GridError::CellOutOfRange {
                cell,
                num_cells: self.cell_count(),
            });
        }
        Ok(())
    }

    /// Normalized cell coordinates, shape `(N, 2)`, row-major.
    pub fn locs(&self) -> Array2<f32> {
        let rows = self.rows() as f32;
        let cols = self.cols() as f32;
        let n = self.cell_count();
        Array2::from_shape_fn((n, 2), |(cell, axis)| {
            let (r, c) = (cell / self.size, cell % self.size);
            if axis == 0 {
                r as f32 / rows
            } else {
                c as f32 / cols
            }
        })
    }

    /// [`locs`](Self::locs) repeated over a leading batch axis, shape `(B, N, 2)`.
    pub fn batched_locs(&self, batch_size: usize) -> Array3<f32> {
        let locs = self.locs().insert_axis(Axis(0));
        let shape = (batch_size, self.cell_count(), 2);
        locs.broadcast(shape)
            .map(|view| view.to_owned())
            .unwrap_or_else(|| Array3::zeros(shape))
    }

    /// Euclidean distance between two cells, in cell pitches.
    pub fn distance(&self, a: usize, b: usize) -> Result<f64, GridError> {
        let (ar, ac) = self.coord_of(a)?;
        let (br, bc) = self.coord_of(b)?;
        let dr = ar as f64 - br as f64;
        let dc = ac as f64 - bc as f64;
        Ok((dr * dr + dc * dc).sqrt())
    }
}
