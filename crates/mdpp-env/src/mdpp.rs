//! Multi-probe decap placement environment.

use mdpp_core::{
    probe_cells, Instance, InstanceBatch, PlacementState, RewardError, RewardType, Simulator,
    StepError,
};
use mdpp_render::{categorize, CategoryGrid, RenderError};
use mdpp_reward::{RewardAggregator, RewardBreakdown};
use mdpp_space::DecapGrid;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::config::{ConfigError, EnvConfig};
use crate::dpp::{DppEnv, PlacementEnv};
use crate::error::EnvError;
use crate::generator::MultiProbeGenerator;
use crate::mask::ProbeExclusion;
use crate::spec::EnvSpec;

/// Decap placement with several probe points per instance.
///
/// Transitions are those of the base [`DppEnv`]; after every reset and
/// step, probe cells are forced out of the action mask. The terminal
/// reward queries `S` once per probe and aggregates with the configured
/// [`RewardType`].
///
/// # Examples
///
/// ```
/// use mdpp_core::FnSimulator;
/// use mdpp_env::{EnvConfig, MdppEnv, PlacementEnv};
///
/// let sim = FnSimulator::new("count", |_probe, placements: &[usize]| {
///     Ok(placements.len() as f64)
/// });
/// let cfg = EnvConfig { size: 4, max_decaps: 3, ..EnvConfig::default() };
/// let mut env = MdppEnv::new(cfg, sim)?;
/// let mut state = env.reset_single(None)?;
/// while !state.all_done() {
///     let cell = state.action_mask.row(0).iter().position(|&l| l).unwrap_or(0);
///     env.step_single(&mut state, cell)?;
/// }
/// let reward = env.reward_from_state(&state)?;
/// assert_eq!(reward[0], state.i[0] as f64);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MdppEnv<S> {
    base: DppEnv<MultiProbeGenerator>,
    exclusion: ProbeExclusion,
    aggregator: RewardAggregator<S>,
}

impl<S: Simulator> MdppEnv<S> {
    /// Validate `config` and build the environment around `simulator`.
    pub fn new(config: EnvConfig, simulator: S) -> Result<Self, ConfigError> {
        let reward_type = config.reward_type;
        let base = DppEnv::with_generator(config)?;
        Ok(Self {
            base,
            exclusion: ProbeExclusion,
            aggregator: RewardAggregator::new(simulator, reward_type),
        })
    }

    /// The underlying base environment.
    pub fn base(&self) -> &DppEnv<MultiProbeGenerator> {
        &self.base
    }

    /// The placement grid.
    pub fn grid(&self) -> DecapGrid {
        self.base.grid()
    }

    /// The multi-probe aggregation policy.
    pub fn reward_type(&self) -> RewardType {
        self.aggregator.reward_type()
    }

    /// The reward aggregator.
    pub fn aggregator(&self) -> &RewardAggregator<S> {
        &self.aggregator
    }

    /// Restart the instance stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.base.reseed(seed);
    }

    /// Draw a batch of instances.
    pub fn generate(&mut self, batch_size: usize) -> InstanceBatch {
        self.base.generate(batch_size)
    }

    /// Draw one instance without a batch axis.
    pub fn generate_single(&mut self) -> Instance {
        self.base.generate_single()
    }

    /// Reward per instance for explicit `(B, T)` action sequences.
    ///
    /// Probe cells are taken from `state`.
    pub fn get_reward(
        &self,
        state: &PlacementState,
        actions: ArrayView2<'_, usize>,
    ) -> Result<Array1<f64>, RewardError> {
        self.aggregator.reward(state.probe.view(), actions)
    }

    /// Reward of one unbatched instance.
    pub fn get_reward_single(
        &self,
        instance: &Instance,
        actions: &[usize],
    ) -> Result<f64, RewardError> {
        self.aggregator.reward_single(instance.probe.view(), actions)
    }

    /// Reward per instance for the placements recorded in `state`.
    pub fn reward_from_state(&self, state: &PlacementState) -> Result<Array1<f64>, RewardError> {
        Ok(self.evaluate(state)?.rewards)
    }

    /// Rewards of `state` with per-probe scores and counters.
    pub fn evaluate(&self, state: &PlacementState) -> Result<RewardBreakdown, RewardError> {
        self.aggregator
            .evaluate(state.probe.view(), &state.placement_sequences())
    }

    /// Tensor schema of this environment.
    pub fn spec(&self) -> EnvSpec {
        EnvSpec::for_cells(self.grid().cell_count())
    }

    /// Category plot of instance `b`.
    pub fn render(&self, state: &PlacementState, b: usize) -> Result<CategoryGrid, RenderError> {
        if b >= state.batch_size() {
            return Err(RenderError::InstanceOutOfRange {
                instance: b,
                batch_size: state.batch_size(),
            });
        }
        let decaps = state.placements(b).to_vec();
        let probes = probe_cells(state.probe.row(b));
        categorize(self.grid().size(), &decaps, &probes, state.action_mask.row(b))
    }

    fn exclude_probes(&self, state: &mut PlacementState) {
        self.exclusion
            .apply(state.action_mask.view_mut(), state.probe.view());
    }
}

impl<S: Simulator> PlacementEnv for MdppEnv<S> {
    fn config(&self) -> &EnvConfig {
        self.base.config()
    }

    fn reset(
        &mut self,
        init: Option<InstanceBatch>,
        batch_size: usize,
    ) -> Result<PlacementState, EnvError> {
        let mut state = self.base.reset(init, batch_size)?;
        self.exclude_probes(&mut state);
        self.base.update_done(&mut state);
        Ok(state)
    }

    fn step(
        &self,
        state: &mut PlacementState,
        actions: ArrayView1<'_, usize>,
    ) -> Result<(), StepError> {
        self.base.step(state, actions)?;
        self.exclude_probes(state);
        Ok(())
    }

    fn legality_mask(&self, state: &PlacementState) -> Array2<bool> {
        let mut mask = self.base.legality_mask(state);
        self.exclusion.apply(mask.view_mut(), state.probe.view());
        mask
    }
}
