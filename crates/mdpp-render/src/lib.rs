//! Plots of a finished (or in-progress) placement.
//!
//! Every cell falls in one of four categories: available, keepout, probe,
//! or decap. [`categorize`] derives them from the placement and the
//! current action mask; [`CategoryGrid`] prints as text and rasterizes to
//! a PNG.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod category;
pub mod error;
pub mod raster;

pub use category::{categorize, Category, CategoryGrid};
pub use error::RenderError;
