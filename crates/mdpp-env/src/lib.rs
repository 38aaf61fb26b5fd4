//! Batched multi-probe decap placement (mDPP) environment.
//!
//! An episode places up to `max_decaps` decoupling capacitors on a square
//! grid. Each instance carries a set of probe cells and a set of keepout
//! cells, neither of which may hold a decap. When the episode ends, the
//! simulator scores the placement from every probe and the scores collapse
//! into one reward per instance.
//!
//! - [`DppEnv`] is the base placement state machine: generation, reset,
//!   and masked stepping.
//! - [`MdppEnv`] composes it with multi-probe generation, the
//!   [`ProbeExclusion`] mask rule, and a
//!   [`RewardAggregator`](mdpp_reward::RewardAggregator).
//!
//! All arrays carry a leading batch axis; the `*_single` methods strip it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dpp;
pub mod error;
pub mod generator;
pub mod mask;
pub mod mdpp;
pub mod spec;

pub use config::{ConfigError, EnvConfig, SamplingMode};
pub use dpp::{DppEnv, PlacementEnv};
pub use error::EnvError;
pub use generator::{InstanceGenerator, MultiProbeGenerator, SingleProbeGenerator};
pub use mask::ProbeExclusion;
pub use mdpp::MdppEnv;
pub use spec::{Bounds, Dtype, EnvSpec, TensorSpec};
