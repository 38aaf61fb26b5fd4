//! Cell categories of a placement plot.

use std::fmt;

use ndarray::{Array2, ArrayView1};

use crate::error::RenderError;

/// What occupies a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Category {
    /// Free cell.
    #[default]
    Available,
    /// Blocked cell that is neither a probe nor a decap.
    Keepout,
    /// Probe point.
    Probe,
    /// Placed decap.
    Decap,
}

impl Category {
    /// One-character symbol used by the text plot.
    pub fn symbol(&self) -> char {
        match self {
            Self::Available => '.',
            Self::Keepout => '#',
            Self::Probe => 'P',
            Self::Decap => 'D',
        }
    }
}

/// `size x size` grid of cell categories, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGrid {
    cells: Array2<Category>,
}

impl CategoryGrid {
    /// Grid side length.
    pub fn size(&self) -> usize {
        self.cells.nrows()
    }

    /// Category of `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Category> {
        self.cells.get((row, col)).copied()
    }

    /// Category of a flat cell index, or `None` outside the grid.
    pub fn cell(&self, cell: usize) -> Option<Category> {
        let size = self.size();
        if size == 0 {
            return None;
        }
        self.get(cell / size, cell % size)
    }

    /// Number of cells in `category`.
    pub fn count(&self, category: Category) -> usize {
        self.cells.iter().filter(|&&c| c == category).count()
    }

    /// The underlying `(size, size)` array.
    pub fn as_array(&self) -> &Array2<Category> {
        &self.cells
    }
}

impl fmt::Display for CategoryGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.rows() {
            for c in row {
                write!(f, "{}", c.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Derive cell categories from a placement.
///
/// Blocked cells (`!action_mask`), probe cells, and decap cells are
/// tallied together; a cell tallied exactly once is a keepout cell, since
/// probes and decaps are themselves blocked. Layers are then painted in
/// order keepout, probe, decap, so later layers win.
///
/// ```
/// use mdpp_render::{categorize, Category};
/// use ndarray::array;
///
/// let mask = array![false, false, true, false];
/// let grid = categorize(2, &[3], &[0], mask.view()).unwrap();
/// assert_eq!(grid.cell(0), Some(Category::Probe));
/// assert_eq!(grid.cell(1), Some(Category::Keepout));
/// assert_eq!(grid.cell(2), Some(Category::Available));
/// assert_eq!(grid.cell(3), Some(Category::Decap));
/// assert_eq!(grid.to_string(), "P#\n.D\n");
/// ```
pub fn categorize(
    size: usize,
    decaps: &[usize],
    probe_cells: &[usize],
    action_mask: ArrayView1<'_, bool>,
) -> Result<CategoryGrid, RenderError> {
    let num_cells = size * size;
    if action_mask.len() != num_cells {
        return Err(RenderError::SizeMismatch {
            size,
            mask_len: action_mask.len(),
        });
    }
    if let Some(&cell) = decaps.iter().chain(probe_cells).find(|&&c| c >= num_cells) {
        return Err(RenderError::CellOutOfRange { cell, num_cells });
    }

    let mut tally = vec![0u32; num_cells];
    let blocked = action_mask
        .iter()
        .enumerate()
        .filter_map(|(cell, &legal)| (!legal).then_some(cell));
    for cell in blocked.chain(probe_cells.iter().copied()).chain(decaps.iter().copied()) {
        tally[cell] += 1;
    }

    let mut flat = vec![Category::Available; num_cells];
    for (cell, &n) in tally.iter().enumerate() {
        if n == 1 {
            flat[cell] = Category::Keepout;
        }
    }
    for &cell in probe_cells {
        flat[cell] = Category::Probe;
    }
    for &cell in decaps {
        flat[cell] = Category::Decap;
    }

    let cells = Array2::from_shape_vec((size, size), flat).map_err(|_| RenderError::SizeMismatch {
        size,
        mask_len: action_mask.len(),
    })?;
    Ok(CategoryGrid { cells })
}
