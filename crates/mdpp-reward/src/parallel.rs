//! Worker-pool reward aggregation for reentrant simulators.
//!
//! Instance indices are pushed onto a crossbeam task channel and drained
//! by scoped worker threads, each scoring whole instances. Results come
//! back tagged with their instance index and are reassembled in batch
//! order, so the output is identical to [`RewardAggregator`].

use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use mdpp_core::{RewardError, RewardType, Simulator};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use tracing::{debug, debug_span};

use crate::aggregator::{
    action_rows, check_batch, elapsed_us, score_instance, InstanceScore, RewardAggregator,
    RewardBreakdown, RewardMetrics,
};

/// Evaluates terminal rewards across a pool of worker threads.
///
/// The simulator must be `Sync`: several workers call it at once.
pub struct ParallelRewardAggregator<S> {
    simulator: S,
    reward_type: RewardType,
    workers: usize,
}

impl<S: Simulator + Sync> ParallelRewardAggregator<S> {
    /// Create an aggregator with up to `workers` threads.
    ///
    /// The effective worker count per call is clamped to `[1, batch]`.
    pub fn new(simulator: S, reward_type: RewardType, workers: usize) -> Self {
        Self {
            simulator,
            reward_type,
            workers,
        }
    }

    /// Parallelize an existing serial aggregator.
    pub fn from_serial(serial: RewardAggregator<S>, workers: usize) -> Self {
        let reward_type = serial.reward_type();
        Self::new(serial.into_simulator(), reward_type, workers)
    }

    /// The aggregation policy.
    pub fn reward_type(&self) -> RewardType {
        self.reward_type
    }

    /// Configured upper bound on worker threads.
    pub fn workers(&self) -> usize {
        self.workers
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
    pub fn reward_sequences<T: AsRef<[usize]> + Sync>(
        &self,
        probe: ArrayView2<'_, bool>,
        sequences: &[T],
    ) -> Result<Array1<f64>, RewardError> {
        Ok(self.evaluate(probe, sequences)?.rewards)
    }

    /// Rewards together with raw per-probe scores and counters.
    ///
    /// When several instances fail, the error of the lowest instance index
    /// is returned, matching the serial aggregator.
    pub fn evaluate<T: AsRef<[usize]> + Sync>(
        &self,
        probe: ArrayView2<'_, bool>,
        sequences: &[T],
    ) -> Result<RewardBreakdown, RewardError> {
        check_batch(probe, sequences.len())?;
        let batch = sequences.len();
        let workers = self.workers.clamp(1, batch.max(1));
        let span = debug_span!(
            "reward",
            simulator = self.simulator.name(),
            batch,
            workers,
            reward_type = %self.reward_type,
        );
        let _enter = span.enter();
        let start = Instant::now();

        let (task_tx, task_rx) = crossbeam_channel::bounded::<usize>(batch.max(1));
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        for b in 0..batch {
            // Capacity equals the batch size, so this never blocks.
            let _ = task_tx.send(b);
        }
        drop(task_tx);

        let mut slots: Vec<Option<Result<InstanceScore, RewardError>>> =
            (0..batch).map(|_| None).collect();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let task_rx = task_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        self.worker_loop(task_rx, result_tx, probe, sequences);
                    })
                })
                .collect();
            drop(result_tx);
            for (b, result) in result_rx.iter() {
                slots[b] = Some(result);
            }
            for handle in handles {
                // A panicked worker leaves its instance slot empty.
                let _ = handle.join();
            }
        });

        let mut rewards = Array1::zeros(batch);
        let mut per_probe = Vec::with_capacity(batch);
        let mut calls = 0u64;
        for (b, slot) in slots.into_iter().enumerate() {
            let scored = slot.ok_or(RewardError::WorkerFailed { instance: b })??;
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

    fn worker_loop<T: AsRef<[usize]>>(
        &self,
        task_rx: Receiver<usize>,
        result_tx: Sender<(usize, Result<InstanceScore, RewardError>)>,
        probe: ArrayView2<'_, bool>,
        sequences: &[T],
    ) {
        while let Ok(b) = task_rx.recv() {
            let result = score_instance(
                &self.simulator,
                self.reward_type,
                b,
                probe.row(b),
                sequences[b].as_ref(),
            );
            if result_tx.send((b, result)).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpp_core::{FnSimulator, SimulatorError};
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    fn weighted_sim() -> impl Simulator + Sync {
        FnSimulator::new("weighted", |probe, placements: &[usize]| {
            let spread: usize = placements.iter().map(|&c| c.abs_diff(probe)).sum();
            Ok(1.0 / (1.0 + spread as f64))
        })
    }

    #[test]
    fn matches_serial_on_fixed_batch() {
        let probe = array![
            [true, false, false, true],
            [false, true, false, false],
            [true, true, true, false]
        ];
        let actions = array![[1usize, 2], [0, 3], [3, 0]];
        let serial = RewardAggregator::new(weighted_sim(), RewardType::MeanSum);
        let parallel = ParallelRewardAggregator::new(weighted_sim(), RewardType::MeanSum, 2);
        assert_eq!(
            serial.reward(probe.view(), actions.view()).unwrap(),
            parallel.reward(probe.view(), actions.view()).unwrap()
        );
    }

    #[test]
    fn worker_count_is_clamped() {
        let agg = ParallelRewardAggregator::new(weighted_sim(), RewardType::MinMax, 0);
        let probe = array![[true, false]];
        let r = agg.reward_single(probe.row(0), &[1]).unwrap();
        assert_eq!(r, 0.5);

        let many = ParallelRewardAggregator::new(weighted_sim(), RewardType::MinMax, 64);
        let out = many.evaluate(probe.view(), &[vec![1]]).unwrap();
        assert_eq!(out.metrics.simulator_calls, 1);
    }

    #[test]
    fn empty_batch_yields_empty_rewards() {
        let agg = ParallelRewardAggregator::new(weighted_sim(), RewardType::MinMax, 4);
        let probe = Array2::<bool>::from_elem((0, 4), false);
        let out = agg.reward_sequences(probe.view(), &Vec::<Vec<usize>>::new());
        assert_eq!(out.unwrap().len(), 0);
    }

    #[test]
    fn lowest_failing_instance_is_reported() {
        let sim = FnSimulator::new("fails_on_probe_1", |probe, _: &[usize]| {
            if probe == 1 {
                Err(SimulatorError::Failed {
                    reason: "bad probe".into(),
                })
            } else {
                Ok(0.0)
            }
        });
        let agg = ParallelRewardAggregator::new(sim, RewardType::MinMax, 3);
        let probe = array![[true, false], [false, true], [false, true]];
        let err = agg
            .reward_sequences(probe.view(), &[vec![1], vec![0], vec![0]])
            .unwrap_err();
        assert!(matches!(err, RewardError::Simulator { instance: 1, probe: 1, .. }));
    }

    #[test]
    fn from_serial_keeps_policy() {
        let serial = RewardAggregator::new(weighted_sim(), RewardType::MeanSum);
        let parallel = ParallelRewardAggregator::from_serial(serial, 3);
        assert_eq!(parallel.reward_type(), RewardType::MeanSum);
        assert_eq!(parallel.workers(), 3);
    }

    proptest! {
        #[test]
        fn parallel_equals_serial(
            rows in prop::collection::vec(
                (prop::collection::vec(any::<bool>(), 6), prop::collection::vec(0usize..6, 0..5)),
                1..8,
            ),
            workers in 1usize..6,
        ) {
            let batch = rows.len();
            // Force at least one probe per instance.
            let probe = Array2::from_shape_fn((batch, 6), |(b, c)| c == b % 6 || rows[b].0[c]);
            let seqs: Vec<Vec<usize>> = rows.iter().map(|(_, s)| s.clone()).collect();
            let serial = RewardAggregator::new(weighted_sim(), RewardType::MinMax);
            let parallel = ParallelRewardAggregator::new(weighted_sim(), RewardType::MinMax, workers);
            let a = serial.evaluate(probe.view(), &seqs).unwrap();
            let b = parallel.evaluate(probe.view(), &seqs).unwrap();
            prop_assert_eq!(a.rewards, b.rewards);
            prop_assert_eq!(a.per_probe, b.per_probe);
            prop_assert_eq!(a.metrics.simulator_calls, b.metrics.simulator_calls);
        }
    }
}
