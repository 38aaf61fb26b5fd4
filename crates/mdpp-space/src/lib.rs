//! Grid geometry for decap placement.
//!
//! The placement board is a square `size x size` grid of cells addressed
//! by a flat index in row-major order: cell `k` sits at row `k / size`,
//! column `k % size`. [`DecapGrid`] converts between the two addressings
//! and produces the normalized `locs` coordinates fed to policies.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;

pub use error::GridError;
pub use grid::DecapGrid;
