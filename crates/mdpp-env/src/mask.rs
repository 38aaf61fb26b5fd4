//! Probe exclusion on top of the base legality mask.
//!
//! Mask convention: `true` means the cell may still be selected. A cell is
//! selectable under the multi-probe rules iff the base rules allow it AND
//! it is not a probe cell, i.e. `mask & !probe`.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2, Zip};

/// Forces probe cells out of an action mask.
///
/// Applying the exclusion is idempotent and only ever clears bits, so it
/// can be re-applied after every transition of the base state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeExclusion;

impl ProbeExclusion {
    /// Clear every mask bit whose cell is a probe, in place.
    ///
    /// `mask` and `probe` must have the same `(B, N)` shape.
    pub fn apply(&self, mask: ArrayViewMut2<'_, bool>, probe: ArrayView2<'_, bool>) {
        Zip::from(mask).and(probe).for_each(|legal, &is_probe| {
            *legal = *legal && !is_probe;
        });
    }

    /// Whether `cell` is selectable given a base mask row and probe row.
    pub fn is_selectable(
        &self,
        mask: ArrayView1<'_, bool>,
        probe: ArrayView1<'_, bool>,
        cell: usize,
    ) -> bool {
        matches!((mask.get(cell), probe.get(cell)), (Some(&true), Some(&false)))
    }
}
