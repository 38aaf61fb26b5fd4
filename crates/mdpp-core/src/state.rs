//! Batched episode state of the placement state machine.

use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, Zip};

use crate::instance::{Instance, InstanceBatch};

/// Mutable per-episode state for a batch of `B` instances.
///
/// Produced by an environment's `reset` and advanced in place by `step`.
/// `locs` and `probe` never change after reset; `action_mask` only ever
/// loses `true` bits.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementState {
    /// Normalized cell coordinates, shape `(B, N, 2)`.
    pub locs: Array3<f32>,
    /// Probe cells, shape `(B, N)`.
    pub probe: Array2<bool>,
    /// Cells blocked at reset time that are not probes, shape `(B, N)`.
    pub keepout: Array2<bool>,
    /// Selectable cells, shape `(B, N)`.
    pub action_mask: Array2<bool>,
    /// First placed cell of each instance (0 before the first step).
    pub first_node: Array1<usize>,
    /// Most recently placed cell of each instance (0 before the first step).
    pub current_node: Array1<usize>,
    /// Number of placements made so far, shape `(B,)`.
    pub i: Array1<usize>,
    /// Placement history, shape `(B, max_decaps)`. Only the first `i[b]`
    /// entries of row `b` are meaningful.
    pub decaps: Array2<usize>,
    /// Whether each instance has reached a terminal state.
    pub done: Array1<bool>,
}

impl PlacementState {
    /// Build the initial state for `batch` with room for `max_decaps`
    /// placements per instance.
    ///
    /// `keepout` is `!action_mask & !probe`, so it does not depend on
    /// whether the input already cleared probe bits from the mask.
    pub fn initial(batch: InstanceBatch, max_decaps: usize) -> Self {
        let b = batch.batch_size();
        let keepout = Zip::from(&batch.action_mask)
            .and(&batch.probe)
            .map_collect(|&legal, &probe| !legal && !probe);
        Self {
            locs: batch.locs,
            probe: batch.probe,
            keepout,
            action_mask: batch.action_mask,
            first_node: Array1::zeros(b),
            current_node: Array1::zeros(b),
            i: Array1::zeros(b),
            decaps: Array2::zeros((b, max_decaps)),
            done: Array1::from_elem(b, false),
        }
    }

    /// Number of instances.
    pub fn batch_size(&self) -> usize {
        self.probe.nrows()
    }

    /// Number of grid cells per instance.
    pub fn num_cells(&self) -> usize {
        self.probe.ncols()
    }

    /// Placement capacity per instance.
    pub fn max_decaps(&self) -> usize {
        self.decaps.ncols()
    }

    /// Cells placed so far by instance `b`, in placement order.
    ///
    /// # Panics
    ///
    /// Panics if `b >= batch_size()`.
    pub fn placements(&self, b: usize) -> ArrayView1<'_, usize> {
        self.decaps.row(b).split_at(Axis(0), self.i[b]).0
    }

    /// Placement histories of every instance.
    pub fn placement_sequences(&self) -> Vec<Vec<usize>> {
        (0..self.batch_size())
            .map(|b| self.placements(b).to_vec())
            .collect()
    }

    /// Number of cells still selectable by instance `b`.
    pub fn num_legal(&self, b: usize) -> usize {
        self.action_mask.row(b).iter().filter(|&&legal| legal).count()
    }

    /// `true` once every instance is terminal.
    pub fn all_done(&self) -> bool {
        self.done.iter().all(|&d| d)
    }

    /// Snapshot of the instance view (`locs`, `probe`, current mask).
    pub fn instances(&self) -> InstanceBatch {
        InstanceBatch {
            locs: self.locs.clone(),
            probe: self.probe.clone(),
            action_mask: self.action_mask.clone(),
        }
    }

    /// Snapshot of instance `b`, or `None` if out of range.
    pub fn instance(&self, b: usize) -> Option<Instance> {
        if b >= self.batch_size() {
            return None;
        }
        Some(Instance {
            locs: self.locs.index_axis(Axis(0), b).to_owned(),
            probe: self.probe.row(b).to_owned(),
            action_mask: self.action_mask.row(b).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_instance_batch() -> InstanceBatch {
        InstanceBatch {
            locs: Array3::zeros((2, 4, 2)),
            probe: array![[true, false, false, false], [false, false, false, true]],
            action_mask: array![[false, true, false, true], [true, true, true, false]],
        }
    }

    #[test]
    fn initial_state_derives_keepout_from_mask() {
        let state = PlacementState::initial(two_instance_batch(), 3);
        assert_eq!(state.batch_size(), 2);
        assert_eq!(state.num_cells(), 4);
        assert_eq!(state.max_decaps(), 3);
        assert_eq!(
            state.keepout,
            array![[false, false, true, false], [false, false, false, false]]
        );
        assert_eq!(state.i, array![0usize, 0]);
        assert!(!state.all_done());
        assert_eq!(state.num_legal(0), 2);
        assert_eq!(state.num_legal(1), 3);
    }

    #[test]
    fn keepout_ignores_how_probe_bits_are_encoded() {
        let mut cleared = two_instance_batch();
        let mut kept = two_instance_batch();
        cleared.action_mask[[1, 3]] = false;
        kept.action_mask[[1, 3]] = true;
        let a = PlacementState::initial(cleared, 2);
        let b = PlacementState::initial(kept, 2);
        assert_eq!(a.keepout, b.keepout);
        assert!(!a.keepout[[1, 3]]);
        assert!(!a.keepout[[0, 0]]);
    }

    #[test]
    fn placements_view_tracks_counter() {
        let mut state = PlacementState::initial(two_instance_batch(), 3);
        state.decaps[[1, 0]] = 2;
        state.decaps[[1, 1]] = 0;
        state.i[1] = 2;
        assert_eq!(state.placements(0).len(), 0);
        assert_eq!(state.placements(1).to_vec(), vec![2, 0]);
        assert_eq!(state.placement_sequences(), vec![vec![], vec![2, 0]]);
    }

    #[test]
    fn instance_snapshot_matches_rows() {
        let state = PlacementState::initial(two_instance_batch(), 1);
        let inst = state.instance(1).unwrap();
        assert_eq!(inst.probe_cells().as_slice(), &[3]);
        assert!(state.instance(2).is_none());
        assert_eq!(state.instances().batch_size(), 2);
    }
}
