//! Core types and traits for the mdpp decap placement environment.
//!
//! This is the leaf crate of the workspace. It defines the batched
//! containers every other crate passes around ([`InstanceBatch`],
//! [`PlacementState`]), the reward aggregation policy ([`RewardType`]),
//! the [`Simulator`] trait for the external scorer, and the error types
//! shared by the environment and reward crates.
//!
//! # Mask convention
//!
//! Every boolean `action_mask` in this workspace uses `true` to mean
//! "legal to select". Probe, keepout and already-placed cells are `false`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod instance;
pub mod reward_type;
pub mod simulator;
pub mod state;

pub use error::{RewardError, ShapeError, SimulatorError, StepError};
pub use instance::{probe_cells, Instance, InstanceBatch, ProbeCells};
pub use reward_type::{ParseRewardTypeError, RewardType};
pub use simulator::{FnSimulator, Simulator};
pub use state::PlacementState;
