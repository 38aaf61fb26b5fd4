//! The external scorer the reward aggregator queries.

use std::sync::Arc;

use crate::error::SimulatorError;

/// A physical simulator scoring one probe against a placement sequence.
///
/// Implementations are treated as opaque and expensive: the environment
/// calls [`simulate`](Simulator::simulate) once per (instance, probe) pair
/// at episode end and never per step. Identical inputs are expected to
/// produce identical scores.
///
/// `Send` lets an environment move between threads. Evaluating several
/// instances concurrently additionally requires `Sync`, which an
/// implementation should only provide when it is reentrant.
pub trait Simulator: Send {
    /// Human-readable name, used in log events.
    fn name(&self) -> &str;

    /// Score the placement sequence `placements` as seen from `probe`.
    ///
    /// Higher is better.
    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError>;
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        (**self).simulate(probe, placements)
    }
}

impl<S: Simulator + Sync + ?Sized> Simulator for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        (**self).simulate(probe, placements)
    }
}

impl<S: Simulator + Sync + ?Sized> Simulator for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        (**self).simulate(probe, placements)
    }
}

/// Adapts a closure into a [`Simulator`].
///
/// ```
/// use mdpp_core::{FnSimulator, Simulator};
///
/// let sim = FnSimulator::new("count", |_probe, placements: &[usize]| {
///     Ok(placements.len() as f64)
/// });
/// assert_eq!(sim.simulate(0, &[3, 4]).unwrap(), 2.0);
/// ```
pub struct FnSimulator<F> {
    name: String,
    f: F,
}

impl<F> FnSimulator<F>
where
    F: Fn(usize, &[usize]) -> Result<f64, SimulatorError> + Send,
{
    /// Wrap `f` under the given name.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Simulator for FnSimulator<F>
where
    F: Fn(usize, &[usize]) -> Result<f64, SimulatorError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        (self.f)(probe, placements)
    }
}
