//! Instance fixtures built from explicit cell lists.

use mdpp_core::{Instance, InstanceBatch};
use mdpp_space::DecapGrid;
use ndarray::{Array1, Array2, Array3, Axis};

/// A `size x size` instance with the given probe and keepout cells.
///
/// The action mask is `true` everywhere except on probe and keepout cells.
///
/// # Panics
///
/// Panics if `size` is zero or a cell is outside the grid.
pub fn instance_from_cells(size: usize, probes: &[usize], keepout: &[usize]) -> Instance {
    let grid = DecapGrid::new(size).expect("fixture grid size must be valid");
    let n = grid.cell_count();
    let mut probe = Array1::from_elem(n, false);
    let mut action_mask = Array1::from_elem(n, true);
    for &p in probes {
        probe[p] = true;
        action_mask[p] = false;
    }
    for &k in keepout {
        action_mask[k] = false;
    }
    Instance {
        locs: grid.locs(),
        probe,
        action_mask,
    }
}

/// Stack instances of equal size into a batch.
///
/// # Panics
///
/// Panics if `instances` is empty or the instances differ in size.
pub fn batch_of(instances: &[Instance]) -> InstanceBatch {
    let n = instances[0].num_cells();
    let b = instances.len();
    let mut locs = Array3::zeros((b, n, 2));
    let mut probe = Array2::from_elem((b, n), false);
    let mut action_mask = Array2::from_elem((b, n), false);
    for (i, inst) in instances.iter().enumerate() {
        locs.index_axis_mut(Axis(0), i).assign(&inst.locs);
        probe.row_mut(i).assign(&inst.probe);
        action_mask.row_mut(i).assign(&inst.action_mask);
    }
    InstanceBatch {
        locs,
        probe,
        action_mask,
    }
}
