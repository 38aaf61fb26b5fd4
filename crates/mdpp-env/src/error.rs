//! Top-level environment error.

use std::error::Error;
use std::fmt;

use mdpp_core::{RewardError, ShapeError, StepError};

use crate::config::ConfigError;

/// Any failure surfaced by an environment operation.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// A caller-supplied initial batch does not match the grid.
    Shape(ShapeError),
    /// A transition was rejected.
    Step(StepError),
    /// Reward evaluation failed.
    Reward(RewardError),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Shape(e) => write!(f, "initial state: {e}"),
            Self::Step(e) => write!(f, "step: {e}"),
            Self::Reward(e) => write!(f, "reward: {e}"),
        }
    }
}

impl Error for EnvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Shape(e) => Some(e),
            Self::Step(e) => Some(e),
            Self::Reward(e) => Some(e),
        }
    }
}

impl From<ConfigError> for EnvError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ShapeError> for EnvError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<StepError> for EnvError {
    fn from(e: StepError) -> Self {
        Self::Step(e)
    }
}

impl From<RewardError> for EnvError {
    fn from(e: RewardError) -> Self {
        Self::Reward(e)
    }
}
