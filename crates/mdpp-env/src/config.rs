//! Environment configuration, validation, and error types.
//!
//! [`EnvConfig`] is plain data with public fields. Every environment
//! constructor calls [`validate()`](EnvConfig::validate) before building
//! anything, so a constructed environment always holds a valid config.

use std::error::Error;
use std::fmt;

use mdpp_core::{ParseRewardTypeError, RewardType};
use mdpp_space::{DecapGrid, GridError};

// ── SamplingMode ──────────────────────────────────────────────────

/// How probe and keepout cells are drawn for a new instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SamplingMode {
    /// Keepout cells are drawn from the cells left after probe selection,
    /// so probe and keepout sets never overlap and the keepout count is
    /// exactly `min(num_keepout, available)`.
    #[default]
    Disjoint,
    /// Draw structure of the single-probe environment: an extra seed
    /// probe cell is blocked first, then keepout cells are taken from a
    /// permutation of the whole grid and may coincide with probes.
    Legacy,
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`EnvConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `size` is zero.
    EmptyGrid,
    /// `size * size` does not fit in a `u32`.
    TooManyCells {
        /// The configured side length.
        size: usize,
    },
    /// A half-open `[min, max)` range is empty.
    EmptyRange {
        /// Which range.
        name: &'static str,
        /// Inclusive lower bound.
        min: usize,
        /// Exclusive upper bound.
        max: usize,
    },
    /// `num_probes_min` is zero, so an instance could have no probes.
    NoProbes,
    /// The largest probe set does not fit on the grid.
    ProbesExceedGrid {
        /// Largest probe count that can be drawn.
        num_probes: usize,
        /// Number of grid cells.
        num_cells: usize,
    },
    /// `max_decaps` is zero.
    NoDecaps,
    /// The reward type name is not recognised.
    UnknownRewardType(ParseRewardTypeError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid size must be at least 1"),
            Self::TooManyCells { size } => {
                write!(f, "grid size {size} gives more than u32::MAX cells")
            }
            Self::EmptyRange { name, min, max } => {
                write!(f, "{name} range [{min}, {max}) is empty")
            }
            Self::NoProbes => write!(f, "num_probes_min must be at least 1"),
            Self::ProbesExceedGrid {
                num_probes,
                num_cells,
            } => write!(
                f,
                "up to {num_probes} probes requested but the grid has {num_cells} cells"
            ),
            Self::NoDecaps => write!(f, "max_decaps must be at least 1"),
            Self::UnknownRewardType(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownRewardType(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseRewardTypeError> for ConfigError {
    fn from(e: ParseRewardTypeError) -> Self {
        Self::UnknownRewardType(e)
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::TooLarge { size } => Self::TooManyCells { size },
            _ => Self::EmptyGrid,
        }
    }
}

// ── EnvConfig ─────────────────────────────────────────────────────

/// Complete configuration of a placement environment.
///
/// Ranges are half-open: an instance gets `k` probes with
/// `num_probes_min <= k < num_probes_max`.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvConfig {
    /// Grid side length; the grid has `size * size` cells. Default: 10.
    pub size: usize,
    /// Placements per episode. Default: 20.
    pub max_decaps: usize,
    /// Inclusive lower bound on keepout cells per instance. Default: 1.
    pub num_keepout_min: usize,
    /// Exclusive upper bound on keepout cells per instance. Default: 50.
    pub num_keepout_max: usize,
    /// Inclusive lower bound on probes per instance. Default: 2.
    pub num_probes_min: usize,
    /// Exclusive upper bound on probes per instance. Default: 5.
    pub num_probes_max: usize,
    /// Multi-probe aggregation policy. Default: `MinMax`.
    pub reward_type: RewardType,
    /// Probe/keepout draw structure. Default: `Disjoint`.
    pub sampling: SamplingMode,
    /// Seed of the environment's instance stream. Default: 0.
    pub seed: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            size: 10,
            max_decaps: 20,
            num_keepout_min: 1,
            num_keepout_max: 50,
            num_probes_min: 2,
            num_probes_max: 5,
            reward_type: RewardType::MinMax,
            sampling: SamplingMode::Disjoint,
            seed: 0,
        }
    }
}

impl EnvConfig {
    /// Set the reward type from its configuration name.
    ///
    /// ```
    /// use mdpp_env::{ConfigError, EnvConfig};
    ///
    /// assert!(EnvConfig::default().with_reward_type("meansum").is_ok());
    /// assert!(matches!(
    ///     EnvConfig::default().with_reward_type("average"),
    ///     Err(ConfigError::UnknownRewardType(_))
    /// ));
    /// ```
    pub fn with_reward_type(mut self, name: &str) -> Result<Self, ConfigError> {
        self.reward_type = name.parse()?;
        Ok(self)
    }

    /// Number of grid cells, `size * size`.
    pub fn num_cells(&self) -> usize {
        self.size.saturating_mul(self.size)
    }

    /// The grid described by `size`.
    pub fn grid(&self) -> Result<DecapGrid, ConfigError> {
        Ok(DecapGrid::new(self.size)?)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Grid must be non-empty and addressable with u32.
        let grid = self.grid()?;
        // 2. At least one probe per instance.
        if self.num_probes_min == 0 {
            return Err(ConfigError::NoProbes);
        }
        // 3. Both ranges must contain at least one value.
        if self.num_probes_min >= self.num_probes_max {
            return Err(ConfigError::EmptyRange {
                name: "num_probes",
                min: self.num_probes_min,
                max: self.num_probes_max,
            });
        }
        if self.num_keepout_min >= self.num_keepout_max {
            return Err(ConfigError::EmptyRange {
                name: "num_keepout",
                min: self.num_keepout_min,
                max: self.num_keepout_max,
            });
        }
        // 4. The largest probe set must fit on the grid.
        let largest = self.num_probes_max - 1;
        if largest > grid.cell_count() {
            return Err(ConfigError::ProbesExceedGrid {
                num_probes: largest,
                num_cells: grid.cell_count(),
            });
        }
        // 5. At least one placement per episode.
        if self.max_decaps == 0 {
            return Err(ConfigError::NoDecaps);
        }
        Ok(())
    }
}
