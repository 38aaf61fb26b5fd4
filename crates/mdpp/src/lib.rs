//! mdpp: a batched multi-probe decap placement environment.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! mdpp sub-crates. For most users, adding `mdpp` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use mdpp::prelude::*;
//!
//! // Score a placement by how many decaps it holds.
//! let sim = FnSimulator::new("count", |_probe, placements: &[usize]| {
//!     Ok(placements.len() as f64)
//! });
//!
//! let config = EnvConfig {
//!     size: 5,
//!     max_decaps: 4,
//!     ..EnvConfig::default()
//! };
//! let mut env = MdppEnv::new(config, sim).unwrap();
//! let mut state = env.reset(None, 3).unwrap();
//! while !state.all_done() {
//!     let actions: ndarray::Array1<usize> = state
//!         .action_mask
//!         .rows()
//!         .into_iter()
//!         .map(|row| row.iter().position(|&legal| legal).unwrap_or(0))
//!         .collect();
//!     env.step(&mut state, actions.view()).unwrap();
//! }
//! let rewards = env.reward_from_state(&state).unwrap();
//! assert_eq!(rewards.len(), 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mdpp-core` | Instances, placement state, reward types, simulator trait |
//! | [`space`] | `mdpp-space` | Grid addressing and cell coordinates |
//! | [`env`] | `mdpp-env` | Config, generators, base and multi-probe environments |
//! | [`reward`] | `mdpp-reward` | Reward aggregation and the PDN simulator |
//! | [`render`] | `mdpp-render` | Category plots as text or PNG |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`mdpp-core`).
///
/// Contains [`types::Instance`], [`types::PlacementState`], the
/// [`types::Simulator`] trait, and the error types shared by every crate.
pub use mdpp_core as types;

/// Grid addressing (`mdpp-space`).
///
/// [`space::DecapGrid`] maps flat cell indices to `(row, col)` and builds the
/// normalized `locs` tensor.
pub use mdpp_space as space;

/// Environments (`mdpp-env`).
///
/// [`env::DppEnv`] for the base single-probe task, [`env::MdppEnv`] for the
/// multi-probe task, both driven through [`env::PlacementEnv`].
pub use mdpp_env as env;

/// Terminal reward (`mdpp-reward`).
///
/// [`reward::RewardAggregator`] and [`reward::ParallelRewardAggregator`]
/// query a simulator once per probe; [`reward::PdnSimulator`] is a built-in
/// impedance model.
pub use mdpp_reward as reward;

/// Placement plots (`mdpp-render`).
pub use mdpp_render as render;

/// Common imports for typical mdpp usage.
///
/// ```rust
/// use mdpp::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use mdpp_core::{
        probe_cells, FnSimulator, Instance, InstanceBatch, PlacementState, RewardType, Simulator,
    };

    // Errors
    pub use mdpp_core::{RewardError, SimulatorError, StepError};
    pub use mdpp_env::{ConfigError, EnvError};

    // Space
    pub use mdpp_space::DecapGrid;

    // Environment
    pub use mdpp_env::{DppEnv, EnvConfig, MdppEnv, PlacementEnv, SamplingMode};

    // Reward
    pub use mdpp_reward::{PdnModel, PdnSimulator, RewardAggregator, RewardBreakdown};

    // Render
    pub use mdpp_render::{Category, CategoryGrid};
}
