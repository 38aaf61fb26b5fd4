//! Benchmark profiles and utilities for the mdpp environment.
//!
//! - [`reference_config`]: 10x10 grid with the default episode settings
//! - [`stress_config`]: 32x32 grid with longer episodes
//! - [`random_legal_actions`]: a uniformly random legal agent

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use mdpp_core::PlacementState;
use mdpp_env::EnvConfig;
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Reference profile: 10x10 grid (100 cells), 20 decaps, 2-4 probes.
pub fn reference_config(seed: u64) -> EnvConfig {
    EnvConfig {
        seed,
        ..EnvConfig::default()
    }
}

/// Stress profile: 32x32 grid (1024 cells), 64 decaps, 4-15 probes.
pub fn stress_config(seed: u64) -> EnvConfig {
    EnvConfig {
        size: 32,
        max_decaps: 64,
        num_keepout_min: 10,
        num_keepout_max: 200,
        num_probes_min: 4,
        num_probes_max: 16,
        seed,
        ..EnvConfig::default()
    }
}

/// One uniformly random legal cell per instance.
///
/// Instances without a legal cell (always done) get action 0.
pub fn random_legal_actions(state: &PlacementState, rng: &mut ChaCha8Rng) -> Array1<usize> {
    state
        .action_mask
        .rows()
        .into_iter()
        .map(|row| {
            let legal: Vec<usize> = row
                .iter()
                .enumerate()
                .filter_map(|(cell, &ok)| ok.then_some(cell))
                .collect();
            legal.choose(rng).copied().unwrap_or(0)
        })
        .collect()
}
