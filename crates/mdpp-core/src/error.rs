//! Error types shared across the mdpp workspace.
//!
//! Organized by subsystem: the external simulator, the placement state
//! machine, reward aggregation, and batch shape validation.

use std::error::Error;
use std::fmt;

/// Errors reported by a [`Simulator`](crate::Simulator) implementation.
#[derive(Clone, Debug, PartialEq)]
pub enum SimulatorError {
    /// A probe or placement index is outside the grid.
    CellOutOfRange {
        /// The offending cell index.
        cell: usize,
        /// Number of cells on the grid.
        num_cells: usize,
    },
    /// The same cell appears more than once in a placement sequence.
    DuplicatePlacement {
        /// The repeated cell index.
        cell: usize,
    },
    /// A decap was placed on a keepout cell.
    PlacementOnKeepout {
        /// The offending cell index.
        cell: usize,
    },
    /// The impedance system could not be solved at a frequency point.
    Singular {
        /// Index into the simulator's frequency table.
        frequency_index: usize,
    },
    /// Any other simulator failure.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellOutOfRange { cell, num_cells } => {
                write!(f, "cell {cell} out of range (grid has {num_cells} cells)")
            }
            Self::DuplicatePlacement { cell } => {
                write!(f, "cell {cell} appears more than once in the placement sequence")
            }
            Self::PlacementOnKeepout { cell } => {
                write!(f, "decap placed on keepout cell {cell}")
            }
            Self::Singular { frequency_index } => {
                write!(f, "impedance system is singular at frequency index {frequency_index}")
            }
            Self::Failed { reason } => write!(f, "simulation failed: {reason}"),
        }
    }
}

impl Error for SimulatorError {}

/// Errors from the placement state machine during `step()`.
///
/// A step either advances every live instance or returns one of these
/// and leaves the state untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
    /// The action vector length does not match the batch size.
    BatchMismatch {
        /// Number of actions supplied.
        actions: usize,
        /// Batch size of the state.
        batch_size: usize,
    },
    /// An action selects a cell outside the grid.
    CellOutOfRange {
        /// Index of the instance within the batch.
        instance: usize,
        /// The selected cell.
        cell: usize,
        /// Number of cells on the grid.
        num_cells: usize,
    },
    /// An action selects a cell whose mask bit is `false`.
    IllegalAction {
        /// Index of the instance within the batch.
        instance: usize,
        /// The selected cell.
        cell: usize,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchMismatch {
                actions,
                batch_size,
            } => write!(f, "got {actions} actions for a batch of {batch_size}"),
            Self::CellOutOfRange {
                instance,
                cell,
                num_cells,
            } => write!(
                f,
                "instance {instance}: cell {cell} out of range (grid has {num_cells} cells)"
            ),
            Self::IllegalAction { instance, cell } => {
                write!(f, "instance {instance}: cell {cell} is not selectable")
            }
        }
    }
}

impl Error for StepError {}

/// Errors from multi-probe reward aggregation.
#[derive(Clone, Debug, PartialEq)]
pub enum RewardError {
    /// The number of action sequences does not match the batch size.
    BatchMismatch {
        /// Number of action sequences supplied.
        actions: usize,
        /// Batch size of the probe mask.
        batch_size: usize,
    },
    /// An instance has no probe cells, so there is nothing to aggregate.
    NoProbes {
        /// Index of the instance within the batch.
        instance: usize,
    },
    /// The simulator failed for one (instance, probe) pair.
    Simulator {
        /// Index of the instance within the batch.
        instance: usize,
        /// Probe cell that was being evaluated.
        probe: usize,
        /// The underlying simulator error.
        source: SimulatorError,
    },
    /// A reward worker thread died before reporting its result.
    WorkerFailed {
        /// Index of the instance whose result never arrived.
        instance: usize,
    },
}

impl fmt::Display for RewardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchMismatch {
                actions,
                batch_size,
            } => write!(
                f,
                "got {actions} action sequences for a batch of {batch_size}"
            ),
            Self::NoProbes { instance } => write!(f, "instance {instance} has no probe cells"),
            Self::Simulator {
                instance,
                probe,
                source,
            } => write!(f, "instance {instance}, probe {probe}: {source}"),
            Self::WorkerFailed { instance } => {
                write!(f, "reward worker exited before scoring instance {instance}")
            }
        }
    }
}

impl Error for RewardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Simulator { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An array in a caller-supplied batch has the wrong shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeError {
    /// Name of the offending array (`"locs"`, `"probe"`, ...).
    pub field: &'static str,
    /// Shape the consumer expected.
    pub expected: Vec<usize>,
    /// Shape that was supplied.
    pub actual: Vec<usize>,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected shape {:?}, got {:?}",
            self.field, self.expected, self.actual
        )
    }
}

impl Error for ShapeError {}
