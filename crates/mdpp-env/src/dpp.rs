//! Base placement state machine.
//!
//! [`DppEnv`] owns the RNG stream and an [`InstanceGenerator`], builds the
//! initial [`PlacementState`] on reset, and advances it on step. Steps are
//! atomic: every action of the batch is validated before any instance is
//! mutated.

use mdpp_core::{Instance, InstanceBatch, PlacementState, StepError};
use mdpp_space::DecapGrid;
use ndarray::{aview1, Array2, ArrayView1, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::{ConfigError, EnvConfig};
use crate::error::EnvError;
use crate::generator::{InstanceGenerator, SingleProbeGenerator};

// ── PlacementEnv ──────────────────────────────────────────────────

/// The batched reset/step interface shared by placement environments.
pub trait PlacementEnv {
    /// The validated configuration.
    fn config(&self) -> &EnvConfig;

    /// Start a new episode.
    ///
    /// With `init == None` a fresh batch of `batch_size` instances is
    /// drawn. Otherwise the supplied batch is used as-is (after a shape
    /// check) and `batch_size` is ignored.
    fn reset(
        &mut self,
        init: Option<InstanceBatch>,
        batch_size: usize,
    ) -> Result<PlacementState, EnvError>;

    /// Place one decap per live instance.
    ///
    /// `actions` has one cell index per instance. Actions for instances
    /// that are already done are ignored. On error the state is unchanged.
    fn step(
        &self,
        state: &mut PlacementState,
        actions: ArrayView1<'_, usize>,
    ) -> Result<(), StepError>;

    /// Cells each instance may select next, shape `(B, N)`.
    fn legality_mask(&self, state: &PlacementState) -> Array2<bool>;

    /// [`reset`](Self::reset) for a single instance (batch of 1).
    fn reset_single(&mut self, init: Option<Instance>) -> Result<PlacementState, EnvError> {
        self.reset(init.map(Instance::into_batch), 1)
    }

    /// [`step`](Self::step) for a batch of 1.
    fn step_single(&self, state: &mut PlacementState, action: usize) -> Result<(), StepError> {
        self.step(state, aview1(&[action]))
    }
}

// ── DppEnv ────────────────────────────────────────────────────────

/// Decap placement environment over a square grid.
///
/// The generator decides how instances look; the default draws a single
/// probe per instance.
///
/// # Examples
///
/// ```
/// use mdpp_env::{DppEnv, EnvConfig, PlacementEnv};
/// use ndarray::Array1;
///
/// let mut env = DppEnv::new(EnvConfig { size: 4, max_decaps: 2, ..EnvConfig::default() })?;
/// let mut state = env.reset(None, 3)?;
/// while !state.all_done() {
///     // First legal cell of every instance (0 for finished ones).
///     let actions: Array1<usize> = state
///         .action_mask
///         .rows()
///         .into_iter()
///         .map(|row| row.iter().position(|&legal| legal).unwrap_or(0))
///         .collect();
///     env.step(&mut state, actions.view())?;
/// }
/// assert!(state.i.iter().all(|&i| i <= 2));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DppEnv<G = SingleProbeGenerator> {
    config: EnvConfig,
    grid: DecapGrid,
    generator: G,
    rng: ChaCha8Rng,
}

impl DppEnv<SingleProbeGenerator> {
    /// Single-probe environment.
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        Self::with_generator(config)
    }
}

impl<G: InstanceGenerator> DppEnv<G> {
    /// Environment drawing instances from `G`.
    pub fn with_generator(config: EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid()?;
        let generator = G::from_config(&config)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            grid,
            generator,
            rng,
        })
    }

    /// The placement grid.
    pub fn grid(&self) -> DecapGrid {
        self.grid
    }

    /// The instance generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Restart the instance stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draw a batch of instances.
    pub fn generate(&mut self, batch_size: usize) -> InstanceBatch {
        self.generator.generate(&mut self.rng, batch_size)
    }

    /// Draw one instance without a batch axis.
    pub fn generate_single(&mut self) -> Instance {
        let batch = self.generate(1);
        Instance {
            locs: batch.locs.index_axis_move(Axis(0), 0),
            probe: batch.probe.index_axis_move(Axis(0), 0),
            action_mask: batch.action_mask.index_axis_move(Axis(0), 0),
        }
    }

    /// Initial state for `batch`, after checking it matches the grid.
    pub fn initial_state(&self, batch: InstanceBatch) -> Result<PlacementState, EnvError> {
        batch.check_shape(self.grid.cell_count())?;
        let mut state = PlacementState::initial(batch, self.config.max_decaps);
        self.update_done(&mut state);
        Ok(state)
    }

    /// Mark instances terminal once they are full or have no legal cell.
    pub fn update_done(&self, state: &mut PlacementState) {
        let max_decaps = state.max_decaps();
        for b in 0..state.batch_size() {
            if state.done[b] {
                continue;
            }
            if state.i[b] >= max_decaps {
                state.done[b] = true;
            } else if state.num_legal(b) == 0 {
                warn!(
                    instance = b,
                    placed = state.i[b],
                    max_decaps,
                    "no legal cell left; ending episode early"
                );
                state.done[b] = true;
            }
        }
    }

    fn validate_actions(
        &self,
        state: &PlacementState,
        actions: ArrayView1<'_, usize>,
    ) -> Result<(), StepError> {
        if actions.len() != state.batch_size() {
            return Err(StepError::BatchMismatch {
                actions: actions.len(),
                batch_size: state.batch_size(),
            });
        }
        let num_cells = state.num_cells();
        for (instance, &cell) in actions.iter().enumerate() {
            if state.done[instance] {
                continue;
            }
            if cell >= num_cells {
                return Err(StepError::CellOutOfRange {
                    instance,
                    cell,
                    num_cells,
                });
            }
            if !state.action_mask[[instance, cell]] {
                return Err(StepError::IllegalAction { instance, cell });
            }
        }
        Ok(())
    }
}

impl<G: InstanceGenerator> PlacementEnv for DppEnv<G> {
    fn config(&self) -> &EnvConfig {
        &self.config
    }

    fn reset(
        &mut self,
        init: Option<InstanceBatch>,
        batch_size: usize,
    ) -> Result<PlacementState, EnvError> {
        let supplied = init.is_some();
        let batch = match init {
            Some(batch) => batch,
            None => self.generate(batch_size),
        };
        debug!(
            batch_size = batch.batch_size(),
            supplied,
            cells = self.grid.cell_count(),
            "reset"
        );
        self.initial_state(batch)
    }

    fn step(
        &self,
        state: &mut PlacementState,
        actions: ArrayView1<'_, usize>,
    ) -> Result<(), StepError> {
        self.validate_actions(state, actions)?;
        for (b, &cell) in actions.iter().enumerate() {
            if state.done[b] {
                continue;
            }
            let i = state.i[b];
            state.decaps[[b, i]] = cell;
            if i == 0 {
                state.first_node[b] = cell;
            }
            state.current_node[b] = cell;
            state.action_mask[[b, cell]] = false;
            state.i[b] = i + 1;
        }
        self.update_done(state);
        Ok(())
    }

    fn legality_mask(&self, state: &PlacementState) -> Array2<bool> {
        state.action_mask.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn small_env(max_decaps: usize) -> DppEnv {
        DppEnv::new(EnvConfig {
            size: 3,
            max_decaps,
            num_keepout_min: 0,
            num_keepout_max: 1,
            ..EnvConfig::default()
        })
        .unwrap()
    }

    fn fixed_batch() -> InstanceBatch {
        let grid = DecapGrid::new(3).unwrap();
        let mut probe = Array2::from_elem((2, 9), false);
        probe[[0, 4]] = true;
        probe[[1, 0]] = true;
        let mut action_mask = probe.mapv(|p| !p);
        action_mask[[1, 8]] = false;
        InstanceBatch {
            locs: grid.batched_locs(2),
            probe,
            action_mask,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = EnvConfig {
            max_decaps: 0,
            ..EnvConfig::default()
        };
        assert!(matches!(DppEnv::new(cfg), Err(ConfigError::NoDecaps)));
    }

    #[test]
    fn reset_builds_fresh_progress() {
        let mut env = small_env(2);
        let state = env.reset(Some(fixed_batch()), 0).unwrap();
        assert_eq!(state.batch_size(), 2);
        assert_eq!(state.i, array![0usize, 0]);
        assert_eq!(state.first_node, array![0usize, 0]);
        assert!(state.keepout[[1, 8]]);
        assert!(!state.keepout[[1, 0]]);
        assert!(!state.keepout[[1, 3]]);
        assert!(!state.keepout[[0, 4]]);
        assert!(!state.all_done());
    }

    #[test]
    fn step_records_placements() {
        let mut env = small_env(3);
        let mut state = env.reset(Some(fixed_batch()), 0).unwrap();
        env.step(&mut state, array![1usize, 2].view()).unwrap();
        env.step(&mut state, array![0usize, 5].view()).unwrap();
        assert_eq!(state.placements(0).to_vec(), vec![1, 0]);
        assert_eq!(state.placements(1).to_vec(), vec![2, 5]);
        assert_eq!(state.first_node, array![1usize, 2]);
        assert_eq!(state.current_node, array![0usize, 5]);
        assert!(!state.action_mask[[0, 1]]);
        assert!(!state.action_mask[[1, 5]]);
    }

    #[test]
    fn illegal_action_leaves_state_untouched() {
        let mut env = small_env(3);
        let mut state = env.reset(Some(fixed_batch()), 0).unwrap();
        let before = state.clone();
        // Instance 0 is fine; instance 1 selects its keepout cell.
        let err = env.step(&mut state, array![1usize, 8].view()).unwrap_err();
        assert_eq!(err, StepError::IllegalAction { instance: 1, cell: 8 });
        assert_eq!(state, before);

        let err = env.step(&mut state, array![9usize, 1].view()).unwrap_err();
        assert!(matches!(err, StepError::CellOutOfRange { instance: 0, .. }));
        let err = env.step(&mut state, array![1usize].view()).unwrap_err();
        assert!(matches!(err, StepError::BatchMismatch { actions: 1, batch_size: 2 }));
        assert_eq!(state, before);
    }

    #[test]
    fn episode_ends_after_max_decaps_and_ignores_later_actions() {
        let mut env = small_env(1);
        let mut state = env.reset(Some(fixed_batch()), 0).unwrap();
        env.step(&mut state, array![3usize, 3].view()).unwrap();
        assert!(state.all_done());
        let snapshot = state.clone();
        // Cell 3 is no longer legal, but done instances ignore actions.
        env.step(&mut state, array![3usize, 3].view()).unwrap();
        assert_eq!(state, snapshot);
    }

    #[test]
    fn running_out_of_cells_ends_episode_early() {
        let mut env = DppEnv::new(EnvConfig {
            size: 2,
            max_decaps: 10,
            num_probes_min: 1,
            num_probes_max: 2,
            num_keepout_min: 0,
            num_keepout_max: 1,
            ..EnvConfig::default()
        })
        .unwrap();
        let mut state = env.reset(None, 1).unwrap();
        while !state.all_done() {
            let cell = state
                .action_mask
                .row(0)
                .iter()
                .position(|&l| l)
                .unwrap();
            env.step_single(&mut state, cell).unwrap();
        }
        // One probe leaves three cells.
        assert_eq!(state.i[0], 3);
    }

    #[test]
    fn instance_without_legal_cells_is_done_at_reset() {
        let env = small_env(2);
        let batch = Instance {
            locs: DecapGrid::new(3).unwrap().locs(),
            probe: Array1::from_elem(9, false),
            action_mask: Array1::from_elem(9, false),
        }
        .into_batch();
        let state = env.initial_state(batch).unwrap();
        assert!(state.all_done());
    }

    #[test]
    fn reset_rejects_mismatched_shapes() {
        let mut env = small_env(2);
        let mut batch = fixed_batch();
        batch.probe = Array2::from_elem((2, 4), false);
        assert!(matches!(
            env.reset(Some(batch), 0),
            Err(EnvError::Shape(_))
        ));
    }

    #[test]
    fn reseeding_replays_the_stream() {
        let mut env = small_env(2);
        let a = env.generate(4);
        env.reseed(0);
        let b = env.generate(4);
        assert_eq!(a, b);
        let single = env.generate_single();
        assert_eq!(single.num_cells(), 9);
    }
}
