//! Random instance generation.
//!
//! A generator draws a batch of instances from the environment's RNG
//! stream. Every draw is a prefix of a random permutation of candidate
//! cells, with counts taken from half-open `[min, max)` ranges.

use std::ops::Range;

use mdpp_core::InstanceBatch;
use mdpp_space::DecapGrid;
use ndarray::{Array2, ArrayViewMut1};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::{ConfigError, EnvConfig, SamplingMode};

/// Source of problem instances for an environment.
pub trait InstanceGenerator: Send {
    /// Build the generator described by `config`, validating it first.
    fn from_config(config: &EnvConfig) -> Result<Self, ConfigError>
    where
        Self: Sized;

    /// Human-readable name, used in log events.
    fn name(&self) -> &str;

    /// Grid the instances are drawn on.
    fn grid(&self) -> DecapGrid;

    /// Draw `batch_size` instances.
    fn generate(&self, rng: &mut ChaCha8Rng, batch_size: usize) -> InstanceBatch;
}

/// Block `count` keepout cells in one mask row.
///
/// `Disjoint` draws from cells still selectable; `Legacy` draws from the
/// whole grid, so already blocked cells may be picked again.
fn block_keepout(
    rng: &mut ChaCha8Rng,
    mut mask: ArrayViewMut1<'_, bool>,
    count: usize,
    sampling: SamplingMode,
) {
    let mut candidates: Vec<usize> = match sampling {
        SamplingMode::Disjoint => mask
            .iter()
            .enumerate()
            .filter_map(|(cell, &legal)| legal.then_some(cell))
            .collect(),
        SamplingMode::Legacy => (0..mask.len()).collect(),
    };
    candidates.shuffle(rng);
    for &cell in candidates.iter().take(count) {
        mask[cell] = false;
    }
}

fn empty_batch(grid: DecapGrid, batch_size: usize) -> (Array2<bool>, Array2<bool>) {
    let n = grid.cell_count();
    (
        Array2::from_elem((batch_size, n), false),
        Array2::from_elem((batch_size, n), true),
    )
}

// ── Single probe ──────────────────────────────────────────────────

/// One uniformly drawn probe per instance plus keepout cells.
#[derive(Clone, Debug)]
pub struct SingleProbeGenerator {
    grid: DecapGrid,
    keepout: Range<usize>,
    sampling: SamplingMode,
}

impl InstanceGenerator for SingleProbeGenerator {
    fn from_config(config: &EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: config.grid()?,
            keepout: config.num_keepout_min..config.num_keepout_max,
            sampling: config.sampling,
        })
    }

    fn name(&self) -> &str {
        "single_probe"
    }

    fn grid(&self) -> DecapGrid {
        self.grid
    }

    fn generate(&self, rng: &mut ChaCha8Rng, batch_size: usize) -> InstanceBatch {
        let n = self.grid.cell_count();
        let (mut probe, mut action_mask) = empty_batch(self.grid, batch_size);
        for b in 0..batch_size {
            let p = rng.gen_range(0..n);
            probe[[b, p]] = true;
            action_mask[[b, p]] = false;
            let count = rng.gen_range(self.keepout.clone());
            block_keepout(rng, action_mask.row_mut(b), count, self.sampling);
        }
        debug!(generator = self.name(), batch_size, cells = n, "generated instances");
        InstanceBatch {
            locs: self.grid.batched_locs(batch_size),
            probe,
            action_mask,
        }
    }
}

// ── Multi probe ───────────────────────────────────────────────────

/// A random number of probes per instance plus keepout cells.
///
/// For each instance:
/// 1. (`Legacy` only) draw one seed cell and block it;
/// 2. draw `k ~ U[num_probes_min, num_probes_max)` and mark the first `k`
///    cells of a random permutation as probes, blocking them;
/// 3. draw `m ~ U[num_keepout_min, num_keepout_max)` keepout cells.
#[derive(Clone, Debug)]
pub struct MultiProbeGenerator {
    grid: DecapGrid,
    probes: Range<usize>,
    keepout: Range<usize>,
    sampling: SamplingMode,
}

impl MultiProbeGenerator {
    /// Range of the per-instance probe count.
    pub fn probe_range(&self) -> Range<usize> {
        self.probes.clone()
    }

    /// Range of the per-instance keepout count.
    pub fn keepout_range(&self) -> Range<usize> {
        self.keepout.clone()
    }
}

impl InstanceGenerator for MultiProbeGenerator {
    fn from_config(config: &EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: config.grid()?,
            probes: config.num_probes_min..config.num_probes_max,
            keepout: config.num_keepout_min..config.num_keepout_max,
            sampling: config.sampling,
        })
    }

    fn name(&self) -> &str {
        "multi_probe"
    }

    fn grid(&self) -> DecapGrid {
        self.grid
    }

    fn generate(&self, rng: &mut ChaCha8Rng, batch_size: usize) -> InstanceBatch {
        let n = self.grid.cell_count();
        let (mut probe, mut action_mask) = empty_batch(self.grid, batch_size);
        let mut cells: Vec<usize> = (0..n).collect();
        for b in 0..batch_size {
            if self.sampling == SamplingMode::Legacy {
                let seed = rng.gen_range(0..n);
                action_mask[[b, seed]] = false;
            }
            let k = rng.gen_range(self.probes.clone()).min(n);
            cells.shuffle(rng);
            for &cell in &cells[..k] {
                probe[[b, cell]] = true;
                action_mask[[b, cell]] = false;
            }
            let count = rng.gen_range(self.keepout.clone());
            block_keepout(rng, action_mask.row_mut(b), count, self.sampling);
        }
        debug!(generator = self.name(), batch_size, cells = n, "generated instances");
        InstanceBatch {
            locs: self.grid.batched_locs(batch_size),
            probe,
            action_mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpp_core::probe_cells;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn config(size: usize, probes: Range<usize>, keepout: Range<usize>) -> EnvConfig {
        EnvConfig {
            size,
            num_probes_min: probes.start,
            num_probes_max: probes.end,
            num_keepout_min: keepout.start,
            num_keepout_max: keepout.end,
            ..EnvConfig::default()
        }
    }

    fn keepout_count(batch: &InstanceBatch, b: usize) -> usize {
        batch
            .action_mask
            .row(b)
            .iter()
            .zip(batch.probe.row(b))
            .filter(|(&legal, &p)| !legal && !p)
            .count()
    }

    #[test]
    fn invalid_config_is_rejected_before_drawing() {
        let empty_keepout = config(4, 1..3, 2..2);
        assert!(matches!(
            SingleProbeGenerator::from_config(&empty_keepout),
            Err(ConfigError::EmptyRange { name: "num_keepout", .. })
        ));
        let empty_probes = config(4, 3..3, 0..1);
        assert!(matches!(
            MultiProbeGenerator::from_config(&empty_probes),
            Err(ConfigError::EmptyRange { name: "num_probes", .. })
        ));
    }

    #[test]
    fn single_probe_has_exactly_one_probe() {
        let gen = SingleProbeGenerator::from_config(&EnvConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let batch = gen.generate(&mut rng, 16);
        assert_eq!(batch.locs.shape(), &[16, 100, 2]);
        for b in 0..16 {
            let probes = probe_cells(batch.probe.row(b));
            assert_eq!(probes.len(), 1);
            assert!(!batch.action_mask[[b, probes[0]]]);
        }
    }

    #[test]
    fn three_by_three_gets_exactly_two_probes() {
        let gen = MultiProbeGenerator::from_config(&config(3, 2..3, 1..4)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let batch = gen.generate(&mut rng, 32);
        for b in 0..32 {
            assert_eq!(probe_cells(batch.probe.row(b)).len(), 2);
        }
    }

    #[test]
    fn zero_keepout_range_blocks_only_probes() {
        let gen = MultiProbeGenerator::from_config(&config(4, 1..4, 0..1)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let batch = gen.generate(&mut rng, 8);
        let not_probe = batch.probe.mapv(|p| !p);
        assert_eq!(batch.action_mask, not_probe);
    }

    #[test]
    fn same_seed_same_batch() {
        let gen = MultiProbeGenerator::from_config(&EnvConfig::default()).unwrap();
        let a = gen.generate(&mut ChaCha8Rng::seed_from_u64(42), 4);
        let b = gen.generate(&mut ChaCha8Rng::seed_from_u64(42), 4);
        let c = gen.generate(&mut ChaCha8Rng::seed_from_u64(43), 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn legacy_blocks_a_seed_cell_outside_the_probe_set() {
        let cfg = EnvConfig {
            sampling: SamplingMode::Legacy,
            ..config(5, 1..2, 0..1)
        };
        let gen = MultiProbeGenerator::from_config(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let batch = gen.generate(&mut rng, 64);
        for b in 0..64 {
            let blocked = batch.action_mask.row(b).iter().filter(|&&l| !l).count();
            // One probe plus the seed cell, unless the two coincide.
            assert!((1..=2).contains(&blocked));
        }
        assert!((0..64).any(|b| keepout_count(&batch, b) == 1));
    }

    proptest! {
        #[test]
        fn probe_count_within_range(
            size in 2usize..8,
            lo in 1usize..3,
            span in 1usize..3,
            seed in any::<u64>(),
        ) {
            let cfg = config(size, lo..lo + span, 0..3);
            let gen = MultiProbeGenerator::from_config(&cfg).unwrap();
            let batch = gen.generate(&mut ChaCha8Rng::seed_from_u64(seed), 6);
            for b in 0..6 {
                let k = probe_cells(batch.probe.row(b)).len();
                prop_assert!(k >= lo && k < lo + span, "k = {}", k);
            }
        }

        #[test]
        fn disjoint_keepout_never_overlaps_probes(
            size in 2usize..10,
            keep_lo in 0usize..20,
            keep_span in 1usize..30,
            seed in any::<u64>(),
        ) {
            let cfg = config(size, 1..3, keep_lo..keep_lo + keep_span);
            let gen = MultiProbeGenerator::from_config(&cfg).unwrap();
            let batch = gen.generate(&mut ChaCha8Rng::seed_from_u64(seed), 4);
            let n = size * size;
            for b in 0..4 {
                let probes = probe_cells(batch.probe.row(b)).len();
                let keepout = keepout_count(&batch, b);
                // Every blocked cell is a probe or a keepout, never both.
                let blocked = batch.action_mask.row(b).iter().filter(|&&l| !l).count();
                prop_assert_eq!(blocked, probes + keepout);
                prop_assert!(keepout >= keep_lo.min(n - probes));
                prop_assert!(keepout < keep_lo + keep_span);
                for c in 0..n {
                    if batch.probe[[b, c]] {
                        prop_assert!(!batch.action_mask[[b, c]]);
                    }
                }
            }
        }
    }
}
