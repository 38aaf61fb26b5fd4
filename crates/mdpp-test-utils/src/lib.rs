//! Test utilities and mock simulators for mdpp development.
//!
//! Provides deterministic [`Simulator`] implementations for exercising the
//! reward path without a physical model, and fixtures that build instances
//! from explicit probe and keepout cell lists.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{batch_of, instance_from_cells};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use mdpp_core::{Simulator, SimulatorError};

/// Scores each probe with a fixed value, ignoring placements.
///
/// Probes without an entry score `default`.
pub struct TableSimulator {
    scores: HashMap<usize, f64>,
    default: f64,
}

impl TableSimulator {
    pub fn new(default: f64) -> Self {
        Self {
            scores: HashMap::new(),
            default,
        }
    }

    /// Set the score of one probe.
    pub fn with_score(mut self, probe: usize, score: f64) -> Self {
        self.scores.insert(probe, score);
        self
    }
}

impl Simulator for TableSimulator {
    fn name(&self) -> &str {
        "table"
    }

    fn simulate(&self, probe: usize, _placements: &[usize]) -> Result<f64, SimulatorError> {
        Ok(self.scores.get(&probe).copied().unwrap_or(self.default))
    }
}

/// Score that depends on both the probe and every placement.
///
/// `score = Σ 1 / (1 + |probe - cell|)` over placed cells, so placements
/// near the probe index score higher and order does not matter.
pub struct ProximitySimulator;

impl Simulator for ProximitySimulator {
    fn name(&self) -> &str {
        "proximity"
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        Ok(placements
            .iter()
            .map(|&cell| 1.0 / (1.0 + cell.abs_diff(probe) as f64))
            .sum())
    }
}

/// Wraps a simulator and counts invocations.
pub struct CountingSimulator<S> {
    inner: S,
    calls: AtomicU64,
}

impl<S: Simulator> CountingSimulator<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `simulate` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<S: Simulator> Simulator for CountingSimulator<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.simulate(probe, placements)
    }
}

/// Fails whenever a particular probe is evaluated.
pub struct FailingSimulator {
    pub failing_probe: usize,
}

impl FailingSimulator {
    pub fn new(failing_probe: usize) -> Self {
        Self { failing_probe }
    }
}

impl Simulator for FailingSimulator {
    fn name(&self) -> &str {
        "failing"
    }

    fn simulate(&self, probe: usize, _placements: &[usize]) -> Result<f64, SimulatorError> {
        if probe == self.failing_probe {
            return Err(SimulatorError::Failed {
                reason: format!("probe {probe} is configured to fail"),
            });
        }
        Ok(1.0)
    }
}
