//! Reference power-delivery-network simulator.
//!
//! The board is described by a per-frequency `N x N` impedance matrix `Z`
//! and the impedance of one decoupling capacitor. Placing decaps at cells
//! `d1..dk` shorts those ports through the decap impedance; the impedance
//! seen at probe `p` becomes
//!
//! ```text
//! z_final = Zaa - Zap (Zpp + diag|Zdecap|)⁻¹ Zpa
//! ```
//!
//! where `a = p` and the `p` block spans the decap cells. The score sums
//! the impedance reduction over frequency, weighted by `1e9 / f / 10`.

use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;

use mdpp_core::{Simulator, SimulatorError};
use nalgebra::{Complex, DMatrix};
use tracing::trace;

// ── Error type ──────────────────────────────────────────────────

/// Errors from building a [`PdnModel`].
#[derive(Clone, Debug, PartialEq)]
pub enum PdnError {
    /// The grid has zero cells.
    EmptyGrid,
    /// The `N x N` impedance matrix of a `size x size` grid does not fit
    /// in `usize`.
    TooLarge {
        /// Requested side length.
        size: usize,
    },
    /// No frequency points were supplied.
    NoFrequencies,
    /// A frequency is zero, negative, or not finite.
    InvalidFrequency {
        /// Index into the frequency table.
        index: usize,
        /// The rejected value.
        value: f64,
    },
    /// A per-frequency table has the wrong length.
    LengthMismatch {
        /// Which table.
        what: &'static str,
        /// Number of frequency points.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// An impedance matrix is not `N x N`.
    MatrixShape {
        /// Frequency index of the offending matrix.
        index: usize,
        /// Expected side length `N`.
        expected: usize,
        /// Rows supplied.
        rows: usize,
        /// Columns supplied.
        cols: usize,
    },
    /// A keepout cell is outside the grid.
    KeepoutOutOfRange {
        /// The offending cell.
        cell: usize,
        /// Number of cells on the grid.
        num_cells: usize,
    },
}

impl fmt::Display for PdnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "PDN grid has zero cells"),
            Self::TooLarge { size } => {
                write!(f, "PDN grid of side {size} is too large to model")
            }
            Self::NoFrequencies => write!(f, "PDN model needs at least one frequency point"),
            Self::InvalidFrequency { index, value } => {
                write!(f, "frequency {index} must be finite and positive, got {value}")
            }
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} entries, expected {expected}"),
            Self::MatrixShape {
                index,
                expected,
                rows,
                cols,
            } => write!(
                f,
                "impedance matrix {index} is {rows}x{cols}, expected {expected}x{expected}"
            ),
            Self::KeepoutOutOfRange { cell, num_cells } => {
                write!(f, "keepout cell {cell} out of range (grid has {num_cells} cells)")
            }
        }
    }
}

impl std::error::Error for PdnError {}

// ── Model ───────────────────────────────────────────────────────

/// Cell count `N` of a `size x size` grid whose `N x N` matrices fit.
fn checked_cells(size: usize) -> Result<usize, PdnError> {
    let n = size
        .checked_mul(size)
        .filter(|n| n.checked_mul(*n).is_some())
        .ok_or(PdnError::TooLarge { size })?;
    if n == 0 {
        return Err(PdnError::EmptyGrid);
    }
    Ok(n)
}

/// Frequency-domain impedance description of a board and its decap.
#[derive(Clone, Debug, PartialEq)]
pub struct PdnModel {
    size: usize,
    freqs: Vec<f64>,
    z: Vec<DMatrix<Complex<f64>>>,
    decap: Vec<Complex<f64>>,
}

impl PdnModel {
    /// Build a model for a `size x size` grid.
    ///
    /// `z[f]` is the `N x N` port impedance matrix at `freqs[f]` and
    /// `decap[f]` the decap impedance at the same frequency.
    pub fn new(
        size: usize,
        freqs: Vec<f64>,
        z: Vec<DMatrix<Complex<f64>>>,
        decap: Vec<Complex<f64>>,
    ) -> Result<Self, PdnError> {
        let n = checked_cells(size)?;
        if freqs.is_empty() {
            return Err(PdnError::NoFrequencies);
        }
        if let Some((index, &value)) = freqs
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f <= 0.0)
        {
            return Err(PdnError::InvalidFrequency { index, value });
        }
        if z.len() != freqs.len() {
            return Err(PdnError::LengthMismatch {
                what: "impedance table",
                expected: freqs.len(),
                actual: z.len(),
            });
        }
        if decap.len() != freqs.len() {
            return Err(PdnError::LengthMismatch {
                what: "decap table",
                expected: freqs.len(),
                actual: decap.len(),
            });
        }
        if let Some((index, m)) = z
            .iter()
            .enumerate()
            .find(|(_, m)| m.nrows() != n || m.ncols() != n)
        {
            return Err(PdnError::MatrixShape {
                index,
                expected: n,
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        Ok(Self {
            size,
            freqs,
            z,
            decap,
        })
    }

    /// Deterministic model for demos and tests.
    ///
    /// Port coupling decays exponentially with cell distance,
    /// `Z_ij = (R + jωL) exp(-d_ij / 2)`, and the decap is a series RLC
    /// (ESR 5 mΩ, ESL 0.1 nH, 1 µF). Frequencies are log-spaced from
    /// 1 MHz to 1 GHz.
    pub fn synthetic(size: usize, num_freq: usize) -> Result<Self, PdnError> {
        const R: f64 = 0.01;
        const L: f64 = 1e-10;
        const DECAY: f64 = 2.0;
        const ESR: f64 = 0.005;
        const ESL: f64 = 1e-10;
        const CAP: f64 = 1e-6;

        let n = checked_cells(size)?;
        let freqs: Vec<f64> = match num_freq {
            0 => Vec::new(),
            1 => vec![1e6],
            k => (0..k)
                .map(|i| 10f64.powf(6.0 + 3.0 * i as f64 / (k - 1) as f64))
                .collect(),
        };
        let coupling = DMatrix::from_fn(n, n, |i, j| {
            let (ri, ci) = ((i / size) as f64, (i % size) as f64);
            let (rj, cj) = ((j / size) as f64, (j % size) as f64);
            let d = ((ri - rj).powi(2) + (ci - cj).powi(2)).sqrt();
            (-d / DECAY).exp()
        });
        let z = freqs
            .iter()
            .map(|&f| {
                let w = 2.0 * PI * f;
                let port = Complex::new(R, w * L);
                coupling.map(|k| port * k)
            })
            .collect();
        let decap = freqs
            .iter()
            .map(|&f| {
                let w = 2.0 * PI * f;
                Complex::new(ESR, w * ESL - 1.0 / (w * CAP))
            })
            .collect();
        Self::new(size, freqs, z, decap)
    }

    /// Grid side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of grid cells.
    pub fn num_cells(&self) -> usize {
        self.size * self.size
    }

    /// Frequency points in Hz.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }
}

// ── Simulator ───────────────────────────────────────────────────

/// [`Simulator`] over a [`PdnModel`], with an optional keepout list.
#[derive(Clone, Debug)]
pub struct PdnSimulator {
    model: PdnModel,
    keepout: HashSet<usize>,
}

impl PdnSimulator {
    /// Simulator without keepout restrictions.
    pub fn new(model: PdnModel) -> Self {
        Self {
            model,
            keepout: HashSet::new(),
        }
    }

    /// Reject placements on any of `cells`.
    pub fn with_keepout(
        mut self,
        cells: impl IntoIterator<Item = usize>,
    ) -> Result<Self, PdnError> {
        let num_cells = self.model.num_cells();
        for cell in cells {
            if cell >= num_cells {
                return Err(PdnError::KeepoutOutOfRange { cell, num_cells });
            }
            self.keepout.insert(cell);
        }
        Ok(self)
    }

    /// The underlying model.
    pub fn model(&self) -> &PdnModel {
        &self.model
    }

    fn check_inputs(&self, probe: usize, placements: &[usize]) -> Result<(), SimulatorError> {
        let num_cells = self.model.num_cells();
        if probe >= num_cells {
            return Err(SimulatorError::CellOutOfRange {
                cell: probe,
                num_cells,
            });
        }
        let mut seen = HashSet::with_capacity(placements.len());
        for &cell in placements {
            if cell >= num_cells {
                return Err(SimulatorError::CellOutOfRange { cell, num_cells });
            }
            if !seen.insert(cell) {
                return Err(SimulatorError::DuplicatePlacement { cell });
            }
            if self.keepout.contains(&cell) {
                return Err(SimulatorError::PlacementOnKeepout { cell });
            }
        }
        Ok(())
    }

    /// Magnitude of the probe impedance with decaps at `placements`.
    fn final_impedance(
        &self,
        f: usize,
        probe: usize,
        placements: &[usize],
    ) -> Result<f64, SimulatorError> {
        let z = &self.model.z[f];
        let k = placements.len();
        let shunt = Complex::new(self.model.decap[f].norm(), 0.0);
        let zpp = DMatrix::from_fn(k, k, |r, c| {
            let v = z[(placements[r], placements[c])];
            if r == c {
                v + shunt
            } else {
                v
            }
        });
        let zpa = DMatrix::from_fn(k, 1, |r, _| z[(placements[r], probe)]);
        let zap = DMatrix::from_fn(1, k, |_, c| z[(probe, placements[c])]);
        let solved = zpp
            .lu()
            .solve(&zpa)
            .ok_or(SimulatorError::Singular { frequency_index: f })?;
        let correction = (zap * solved)[(0, 0)];
        Ok((z[(probe, probe)] - correction).norm())
    }
}

impl Simulator for PdnSimulator {
    fn name(&self) -> &str {
        "pdn"
    }

    fn simulate(&self, probe: usize, placements: &[usize]) -> Result<f64, SimulatorError> {
        self.check_inputs(probe, placements)?;
        if placements.is_empty() {
            return Ok(0.0);
        }
        let mut score = 0.0;
        for (f, &freq) in self.model.freqs.iter().enumerate() {
            let initial = self.model.z[f][(probe, probe)].norm();
            let finals = self.final_impedance(f, probe, placements)?;
            score += (initial - finals) * 1e9 / freq / 10.0;
        }
        trace!(probe, decaps = placements.len(), score, "pdn simulated");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(size: usize) -> PdnSimulator {
        PdnSimulator::new(PdnModel::synthetic(size, 8).unwrap())
    }

    #[test]
    fn synthetic_model_shapes() {
        let model = PdnModel::synthetic(4, 5).unwrap();
        assert_eq!(model.num_cells(), 16);
        assert_eq!(model.freqs().len(), 5);
        assert!((model.freqs()[0] - 1e6).abs() < 1e-3);
        assert!((model.freqs()[4] - 1e9).abs() < 1.0);
    }

    #[test]
    fn model_validation() {
        assert_eq!(PdnModel::synthetic(0, 3), Err(PdnError::EmptyGrid));
        assert_eq!(PdnModel::synthetic(2, 0), Err(PdnError::NoFrequencies));
        assert_eq!(
            PdnModel::synthetic(usize::MAX, 3),
            Err(PdnError::TooLarge { size: usize::MAX })
        );
        assert_eq!(
            PdnModel::synthetic(1 << 20, 3),
            Err(PdnError::TooLarge { size: 1 << 20 })
        );
        let bad = PdnModel::new(
            2,
            vec![1e6],
            vec![DMatrix::zeros(3, 3)],
            vec![Complex::new(0.0, 0.0)],
        );
        assert!(matches!(bad, Err(PdnError::MatrixShape { expected: 4, .. })));
        let neg = PdnModel::new(2, vec![-1.0], vec![DMatrix::zeros(4, 4)], vec![]);
        assert!(matches!(neg, Err(PdnError::InvalidFrequency { index: 0, .. })));
    }

    #[test]
    fn empty_sequence_scores_zero() {
        assert_eq!(sim(3).simulate(4, &[]).unwrap(), 0.0);
    }

    #[test]
    fn a_single_decap_lowers_probe_impedance() {
        let s = sim(4);
        let near = s.simulate(5, &[6]).unwrap();
        assert!(near > 0.0, "score = {near}");
    }

    #[test]
    fn closer_decap_scores_higher() {
        let s = sim(5);
        let near = s.simulate(0, &[1]).unwrap();
        let far = s.simulate(0, &[24]).unwrap();
        assert!(near > far, "near {near} <= far {far}");
    }

    #[test]
    fn simulation_is_deterministic() {
        let s = sim(4);
        let a = s.simulate(3, &[0, 9, 14]).unwrap();
        let b = s.simulate(3, &[0, 9, 14]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_placements_are_rejected() {
        let s = sim(3).with_keepout([8]).unwrap();
        assert_eq!(
            s.simulate(9, &[0]),
            Err(SimulatorError::CellOutOfRange { cell: 9, num_cells: 9 })
        );
        assert_eq!(
            s.simulate(0, &[1, 2, 1]),
            Err(SimulatorError::DuplicatePlacement { cell: 1 })
        );
        assert_eq!(
            s.simulate(0, &[8]),
            Err(SimulatorError::PlacementOnKeepout { cell: 8 })
        );
        assert!(sim(3).with_keepout([9]).is_err());
    }
}
