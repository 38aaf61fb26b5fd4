//! Serial multi-probe reward aggregation.

use std::time::Instant;

use mdpp_core::{probe_cells, RewardError, RewardType, Simulator};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace};

/// `(probe cell, score)` pairs of one instance, in ascending probe order.
pub type ProbeScores = SmallVec<[(usize, f64); 8]>;

/// Collapse per-probe scores with the given policy.
///
/// Returns `None` for an empty slice.
pub fn aggregate(scores: &[f64], reward_type: RewardType) -> Option<f64> {
    reward_type.aggregate(scores)
}

/// Counters for one reward evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardMetrics {
    /// Number of simulator invocations.
    pub simulator_calls: u64,
    /// Wall-clock time of the evaluation in microseconds.
    pub elapsed_us: u64,
}

/// Full result of a reward evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardBreakdown {
    /// Aggregated reward per instance, shape `(B,)`.
    pub rewards: Array1<f64>,
    /// Raw simulator scores per instance.
    pub per_probe: Vec<ProbeScores>,
    /// Evaluation counters.
    pub metrics: RewardMetrics,
}

/// Reward and raw scores of a single instance.
pub(crate) struct InstanceScore {
    pub(crate) reward: f64,
    pub(crate) per_probe: ProbeScores,
}

/// Score one instance: one simulator call per probe, then aggregate.
pub(crate) fn score_instance<S: Simulator + ?Sized>(
    simulator: &S,
    reward_type: RewardType,
    instance: usize,
    probe: ArrayView1<'_, bool>,
    placements: &[usize],
) -> Result<InstanceScore, RewardError> {
    let probes = probe_cells(probe);
    if probes.is_empty() {
        return Err(RewardError::NoProbes { instance });
    }
    let mut per_probe = ProbeScores::with_capacity(probes.len());
    let mut scores: SmallVec<[f64; 8]> = SmallVec::with_capacity(probes.len());
    for &p in &probes {
        let score = simulator
            .simulate(p, placements)
            .map_err(|source| RewardError::Simulator {
                instance,
                probe: p,
                source,
            })?;
        trace!(instance, probe = p, score, "probe scored");
        per_probe.push((p, score));
        scores.push(score);
    }
    let reward = reward_type
        .aggregate(&scores)
        .ok_or(RewardError::NoProbes { instance })?;
    Ok(InstanceScore { reward, per_probe })
}

/// Rows of a `(B, T)` action array as owned sequences.
pub(crate) fn action_rows(actions: ArrayView2<'_, usize>) -> Vec<Vec<usize>> {
    actions.rows().into_iter().map(|row| row.to_vec()).collect()
}

pub(crate) fn check_batch(probe: ArrayView2<'_, bool>, sequences: usize) -> Result<(), RewardError> {
    if probe.nrows() != sequences {
        return Err(RewardError::BatchMismatch {
            actions: sequences,
            batch_size: probe.nrows(),
        });
    }
    Ok(())
}

pub(crate) fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Evaluates terminal rewards one instance at a time.
///
/// The simulator is treated as opaque: instances are scored sequentially
/// in batch order and probes in ascending cell order. The first failing
/// simulator call aborts the evaluation.
///
/// # Examples
///
/// ```
/// use mdpp_core::{FnSimulator, RewardType};
/// use mdpp_reward::RewardAggregator;
/// use ndarray::array;
///
/// let sim = FnSimulator::new("by_probe", |probe, _: &[usize]| {
///     Ok(if probe == 0 { 0.4 } else { 0.9 })
/// });
/// let agg = RewardAggregator::new(sim, RewardType::MinMax);
/// let probe = array![true, true, false];
/// assert_eq!(agg.reward_single(probe.view(), &[2]).unwrap(), 0.4);
/// ```
pub struct RewardAggregator<S> {
    simulator: S,
    reward_type: RewardType,
}

impl<S: Simulator> RewardAggregator<S> {
    /// Create an aggregator scoring with `simulator`.
    pub fn new(simulator: S, reward_type: RewardType) -> Self {
        Self {
            simulator,
            reward_type,
        }
    }

    /// The aggregation policy.
    pub fn reward_type(&self) -> RewardType {
        self.reward_type
    }

    /// The wrapped simulator.
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Consume the aggregator, returning the simulator.
    pub fn into_simulator(self) -> S {
        self.simulator
    }

    /// Reward per instance for a `(B, N)` probe mask and `(B, T)` actions.
    pub fn reward(
        &self,
        probe: ArrayView2<'_, bool>,
        actions: ArrayView2<'_, usize>,
    ) -> Result<Array1<f64>, RewardError> {
        self.reward_sequences(probe, &action_rows(actions))
    }

    /// Reward of a single instance.
    ///
    /// Runs through the batched path with a batch axis of size 1, so the
    /// result equals element 0 of the batched call.
    pub fn reward_single(
        &self,
        probe: ArrayView1<'_, bool>,
        actions: &[usize],
    ) -> Result<f64, RewardError> {
        let rewards = self.reward_sequences(probe.insert_axis(Axis(0)), &[actions])?;
        rewards
            .first()
            .copied()
            .ok_or(RewardError::BatchMismatch {
                actions: 1,
                batch_size: 0,
            })
    }

    /// Reward per instance for placement sequences of varying length.
    pub fn reward_sequences<T: AsRef<[usize]>>(
        &self,
        probe: ArrayView2<'_, bool>,
        sequences: &[T],
    ) -> Result<Array1<f64>, RewardError> {
        Ok(self.evaluate(probe, sequences)?.rewards)
    }

    /// Rewards together with raw per-probe scores and counters.
    pub fn evaluate<T: AsRef<[usize]>>(
        &self,
        probe: ArrayView2<'_, bool>,
        sequences: &[T],
    ) -> Result<RewardBreakdown, RewardError> {
        check_batch(probe, sequences.len())?;
        let span = debug_span!(
            "reward",
            simulator = self.simulator.name(),
            batch = sequences.len(),
            reward_type = %self.reward_type,
        );
        let _enter = span.enter();

        let start = Instant::now();
        let mut rewards = Array1::zeros(sequences.len());
        let mut per_probe = Vec::with_capacity(sequences.len());
        let mut calls = 0u64;
        for (b, seq) in sequences.iter().enumerate() {
            let scored = score_instance(
                &self.simulator,
                self.reward_type,
                b,
                probe.row(b),
                seq.as_ref(),
            )?;
            calls += scored.per_probe.len() as u64;
            rewards[b] = scored.reward;
            per_probe.push(scored.per_probe);
        }
        let metrics = RewardMetrics {
            simulator_calls: calls,
            elapsed_us: elapsed_us(start),
        };
        debug!(calls, elapsed_us = metrics.elapsed_us, "reward evaluated");
        Ok(RewardBreakdown {
            rewards,
            per_probe,
            metrics,
        })
    }
}
