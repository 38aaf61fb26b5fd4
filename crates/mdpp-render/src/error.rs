//! Rendering error types.

use std::fmt;

/// Errors that can occur while building or saving a plot.
#[derive(Debug)]
pub enum RenderError {
    /// `size * size` does not match the action mask length.
    SizeMismatch {
        /// Grid side length.
        size: usize,
        /// Length of the action mask.
        mask_len: usize,
    },
    /// A probe or decap cell is outside the grid.
    CellOutOfRange {
        /// The offending cell.
        cell: usize,
        /// Number of grid cells.
        num_cells: usize,
    },
    /// A batch index is outside the batch.
    InstanceOutOfRange {
        /// The requested instance.
        instance: usize,
        /// Number of instances in the batch.
        batch_size: usize,
    },
    /// `cell_px` is zero or the image would not fit in `u32` pixels.
    InvalidScale {
        /// Requested cell size in pixels.
        cell_px: u32,
    },
    /// PNG encoding or file I/O failed.
    Image(image::ImageError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { size, mask_len } => write!(
                f,
                "grid {size}x{size} does not match action mask of length {mask_len}"
            ),
            Self::CellOutOfRange { cell, num_cells } => {
                write!(f, "cell {cell} out of range (grid has {num_cells} cells)")
            }
            Self::InstanceOutOfRange {
                instance,
                batch_size,
            } => write!(f, "instance {instance} out of range (batch has {batch_size})"),
            Self::InvalidScale { cell_px } => write!(f, "invalid cell size {cell_px}px"),
            Self::Image(e) => write!(f, "image: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}
