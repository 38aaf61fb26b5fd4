//! Shape, dtype, and bounds metadata for environment tensors.
//!
//! Shapes are per instance; a batched tensor prepends the batch axis.

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Lower bound of the normalized cell coordinates.
pub const MIN_LOC: f64 = 0.0;
/// Upper bound of the normalized cell coordinates.
pub const MAX_LOC: f64 = 1.0;

/// Element type of a tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// Boolean mask.
    Bool,
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
}

/// Value range of a tensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    /// No declared range.
    Unbounded,
    /// Closed interval `[low, high]`.
    Continuous {
        /// Inclusive lower bound.
        low: f64,
        /// Inclusive upper bound.
        high: f64,
    },
    /// Integers in `[0, n)`.
    Discrete {
        /// Number of admissible values.
        n: usize,
    },
}

/// Declared shape, dtype, and bounds of one tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorSpec {
    /// Per-instance shape.
    pub shape: SmallVec<[usize; 4]>,
    /// Element type.
    pub dtype: Dtype,
    /// Value range.
    pub bounds: Bounds,
}

impl TensorSpec {
    /// Create a spec.
    pub fn new(shape: &[usize], dtype: Dtype, bounds: Bounds) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            dtype,
            bounds,
        }
    }

    /// Number of elements per instance.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether `index` is an admissible value of this tensor.
    pub fn contains_index(&self, index: i64) -> bool {
        match self.bounds {
            Bounds::Unbounded => true,
            Bounds::Continuous { low, high } => (low..=high).contains(&(index as f64)),
            Bounds::Discrete { n } => usize::try_from(index).is_ok_and(|i| i < n),
        }
    }
}

/// Schema of every tensor the environment produces or consumes.
///
/// # Examples
///
/// ```
/// use mdpp_env::{Dtype, EnvSpec};
///
/// let spec = EnvSpec::for_cells(100);
/// assert_eq!(spec.observation["locs"].shape.as_slice(), &[100, 2]);
/// assert_eq!(spec.observation["probe"].dtype, Dtype::Bool);
/// assert!(spec.action.contains_index(99));
/// assert!(!spec.action.contains_index(100));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EnvSpec {
    /// Observation tensors, in declaration order.
    pub observation: IndexMap<&'static str, TensorSpec>,
    /// Selected cell index.
    pub action: TensorSpec,
    /// Terminal reward.
    pub reward: TensorSpec,
    /// Episode termination flag.
    pub done: TensorSpec,
}

impl EnvSpec {
    /// Schema for a grid of `num_cells` cells.
    pub fn for_cells(num_cells: usize) -> Self {
        let mut observation = IndexMap::new();
        observation.insert(
            "locs",
            TensorSpec::new(
                &[num_cells, 2],
                Dtype::F32,
                Bounds::Continuous {
                    low: MIN_LOC,
                    high: MAX_LOC,
                },
            ),
        );
        observation.insert(
            "probe",
            TensorSpec::new(&[num_cells], Dtype::Bool, Bounds::Unbounded),
        );
        observation.insert(
            "action_mask",
            TensorSpec::new(&[num_cells], Dtype::Bool, Bounds::Unbounded),
        );
        for key in ["first_node", "current_node", "i"] {
            observation.insert(key, TensorSpec::new(&[1], Dtype::I64, Bounds::Unbounded));
        }
        Self {
            observation,
            action: TensorSpec::new(&[1], Dtype::I64, Bounds::Discrete { n: num_cells }),
            reward: TensorSpec::new(&[1], Dtype::F32, Bounds::Unbounded),
            done: TensorSpec::new(&[1], Dtype::Bool, Bounds::Unbounded),
        }
    }

    /// Names of the observation tensors, in declaration order.
    pub fn observation_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.observation.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_order_is_stable() {
        let spec = EnvSpec::for_cells(9);
        let keys: Vec<_> = spec.observation_keys().collect();
        assert_eq!(
            keys,
            ["locs", "probe", "action_mask", "first_node", "current_node", "i"]
        );
    }

    #[test]
    fn action_bounds_cover_the_grid() {
        let spec = EnvSpec::for_cells(9);
        assert_eq!(spec.action.bounds, Bounds::Discrete { n: 9 });
        assert!(spec.action.contains_index(0));
        assert!(spec.action.contains_index(8));
        assert!(!spec.action.contains_index(9));
        assert!(!spec.action.contains_index(-1));
    }

    #[test]
    fn locs_are_unit_bounded() {
        let spec = EnvSpec::for_cells(4);
        let locs = &spec.observation["locs"];
        assert_eq!(locs.numel(), 8);
        assert_eq!(locs.dtype, Dtype::F32);
        assert!(locs.contains_index(1));
        assert!(!locs.contains_index(2));
    }

    #[test]
    fn scalars_are_single_element() {
        let spec = EnvSpec::for_cells(4);
        for t in [&spec.reward, &spec.done, &spec.observation["i"]] {
            assert_eq!(t.numel(), 1);
        }
        assert_eq!(spec.done.dtype, Dtype::Bool);
    }
}
