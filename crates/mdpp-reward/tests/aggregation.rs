//! Aggregation behaviour against the shared mock simulators.

use mdpp_core::{RewardError, RewardType};
use mdpp_reward::{ParallelRewardAggregator, PdnModel, PdnSimulator, RewardAggregator};
use mdpp_test_utils::{
    batch_of, instance_from_cells, CountingSimulator, FailingSimulator, ProximitySimulator,
    TableSimulator,
};
use ndarray::array;
use proptest::prelude::*;

#[test]
fn simulator_called_once_per_probe_per_instance() {
    let batch = batch_of(&[
        instance_from_cells(3, &[0, 4], &[]),
        instance_from_cells(3, &[1, 2, 8], &[5]),
    ]);
    let counting = CountingSimulator::new(ProximitySimulator);
    let agg = RewardAggregator::new(&counting, RewardType::MinMax);
    let actions = array![[3usize, 6], [0, 7]];
    agg.reward(batch.probe.view(), actions.view()).unwrap();
    assert_eq!(counting.calls(), 5);
}

#[test]
fn three_by_three_two_probe_example() {
    let inst = instance_from_cells(3, &[2, 6], &[]);
    let sim = TableSimulator::new(0.0).with_score(2, 0.4).with_score(6, 0.9);

    let minmax = RewardAggregator::new(&sim, RewardType::MinMax);
    assert_eq!(minmax.reward_single(inst.probe.view(), &[0, 4]).unwrap(), 0.4);

    let meansum = RewardAggregator::new(&sim, RewardType::MeanSum);
    let r = meansum.reward_single(inst.probe.view(), &[0, 4]).unwrap();
    assert!((r - 0.65).abs() < 1e-12);
}

#[test]
fn failure_is_not_retried() {
    let counting = CountingSimulator::new(FailingSimulator::new(4));
    let agg = RewardAggregator::new(&counting, RewardType::MeanSum);
    let inst = instance_from_cells(3, &[0, 4, 8], &[]);
    let err = agg.reward_single(inst.probe.view(), &[1]).unwrap_err();
    assert!(matches!(err, RewardError::Simulator { instance: 0, probe: 4, .. }));
    // probe 0 succeeded, probe 4 failed, probe 8 never ran
    assert_eq!(counting.calls(), 2);
}

#[test]
fn pdn_rewards_through_both_aggregators() {
    let model = PdnModel::synthetic(4, 6).unwrap();
    let batch = batch_of(&[
        instance_from_cells(4, &[0, 15], &[5]),
        instance_from_cells(4, &[3, 12], &[]),
    ]);
    let actions = array![[1usize, 14], [7, 8]];
    let serial = RewardAggregator::new(PdnSimulator::new(model.clone()), RewardType::MinMax);
    let parallel =
        ParallelRewardAggregator::new(PdnSimulator::new(model), RewardType::MinMax, 2);
    let a = serial.reward(batch.probe.view(), actions.view()).unwrap();
    let b = parallel.reward(batch.probe.view(), actions.view()).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|r| r.is_finite()));
}

proptest! {
    #[test]
    fn minmax_is_bounded_by_meansum(
        probes in prop::collection::btree_set(0usize..16, 1..6),
        placements in prop::collection::btree_set(0usize..16, 0..6),
    ) {
        let probes: Vec<usize> = probes.into_iter().collect();
        let placements: Vec<usize> = placements.into_iter().collect();
        let inst = instance_from_cells(4, &probes, &[]);
        let min = RewardAggregator::new(ProximitySimulator, RewardType::MinMax)
            .reward_single(inst.probe.view(), &placements)
            .unwrap();
        let mean = RewardAggregator::new(ProximitySimulator, RewardType::MeanSum)
            .reward_single(inst.probe.view(), &placements)
            .unwrap();
        prop_assert!(min <= mean + 1e-12);
    }
}
