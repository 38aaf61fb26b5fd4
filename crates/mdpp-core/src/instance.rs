//! Problem instances, single and batched.
//!
//! An [`InstanceBatch`] holds `B` instances as arrays with a leading batch
//! axis. An [`Instance`] is the same data without that axis. Conversions
//! between the two only insert or remove the axis, so a single instance
//! always flows through the batched code paths unchanged.

use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use smallvec::SmallVec;

use crate::error::ShapeError;

/// Probe cell indices of one instance, in ascending order.
pub type ProbeCells = SmallVec<[usize; 8]>;

/// Collect the indices of the `true` cells of a probe mask.
pub fn probe_cells(probe: ArrayView1<'_, bool>) -> ProbeCells {
    probe
        .iter()
        .enumerate()
        .filter_map(|(cell, &is_probe)| is_probe.then_some(cell))
        .collect()
}

/// One decap placement problem over an `N`-cell grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    /// Normalized cell coordinates, shape `(N, 2)`.
    pub locs: Array2<f32>,
    /// Probe cells, shape `(N,)`.
    pub probe: Array1<bool>,
    /// Selectable cells, shape `(N,)`. Keepout cells are already `false`.
    pub action_mask: Array1<bool>,
}

impl Instance {
    /// Number of grid cells.
    pub fn num_cells(&self) -> usize {
        self.probe.len()
    }

    /// Indices of the probe cells.
    pub fn probe_cells(&self) -> ProbeCells {
        probe_cells(self.probe.view())
    }

    /// Wrap this instance in a batch of size 1.
    pub fn into_batch(self) -> InstanceBatch {
        InstanceBatch {
            locs: self.locs.insert_axis(Axis(0)),
            probe: self.probe.insert_axis(Axis(0)),
            action_mask: self.action_mask.insert_axis(Axis(0)),
        }
    }
}

/// A batch of `B` problem instances sharing one grid.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceBatch {
    /// Normalized cell coordinates, shape `(B, N, 2)`.
    pub locs: Array3<f32>,
    /// Probe cells, shape `(B, N)`.
    pub probe: Array2<bool>,
    /// Selectable cells, shape `(B, N)`.
    pub action_mask: Array2<bool>,
}

impl InstanceBatch {
    /// Number of instances.
    pub fn batch_size(&self) -> usize {
        self.probe.nrows()
    }

    /// Number of grid cells per instance.
    pub fn num_cells(&self) -> usize {
        self.probe.ncols()
    }

    /// Copy out instance `b`, or `None` if out of range.
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

    /// Strip the batch axis of a size-1 batch.
    ///
    /// Returns the batch unchanged in `Err` if it holds more or fewer than
    /// one instance.
    pub fn into_single(self) -> Result<Instance, Self> {
        if self.batch_size() != 1 {
            return Err(self);
        }
        Ok(Instance {
            locs: self.locs.index_axis_move(Axis(0), 0),
            probe: self.probe.index_axis_move(Axis(0), 0),
            action_mask: self.action_mask.index_axis_move(Axis(0), 0),
        })
    }

    /// Check that every array matches a grid of `num_cells` cells.
    pub fn check_shape(&self, num_cells: usize) -> Result<(), ShapeError> {
        let b = self.batch_size();
        let expect = |field: &'static str, expected: Vec<usize>, actual: &[usize]| {
            if expected.as_slice() == actual {
                Ok(())
            } else {
                Err(ShapeError {
                    field,
                    expected,
                    actual: actual.to_vec(),
                })
            }
        };
        expect("locs", vec![b, num_cells, 2], self.locs.shape())?;
        expect("probe", vec![b, num_cells], self.probe.shape())?;
        expect("action_mask", vec![b, num_cells], self.action_mask.shape())?;
        Ok(())
    }
}
