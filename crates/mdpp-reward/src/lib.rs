//! Terminal reward computation for multi-probe decap placement.
//!
//! The reward of an instance is computed once per episode: the simulator
//! is queried for every probe of the instance with the full placement
//! sequence, and the per-probe scores collapse into one scalar through the
//! configured [`RewardType`](mdpp_core::RewardType).
//!
//! - [`RewardAggregator`] evaluates instances one after another.
//! - [`ParallelRewardAggregator`] spreads instances over a worker pool and
//!   requires a reentrant (`Sync`) simulator.
//! - [`PdnSimulator`] is a reference impedance simulator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aggregator;
pub mod parallel;
pub mod pdn;

pub use aggregator::{aggregate, ProbeScores, RewardAggregator, RewardBreakdown, RewardMetrics};
pub use parallel::ParallelRewardAggregator;
pub use pdn::{PdnError, PdnModel, PdnSimulator};
