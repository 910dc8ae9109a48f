//! # Partition-Function Builder
//!
//! Turns the sampled density of states into the log statistical weight of
//! every `(E, V)` shape class:
//!
//! ```text
//! ln z(E,V) = ln g(E,V)              number of subgraphs
//!           + V mu                   translational entropy
//!           - (V - 1) ln qcoord      rotational entropy lost on association
//!           - s_dih(E,V)             dihedral entropy lost on bridge elimination
//!           + E (eps + d_eps(E,V))   association energy
//! ```
//!
//! The monomer `(E = 0, V = 1)` is special-cased to `ln(V_G) + mu`, where
//! `V_G = rows - cols + 2` is the vertex count of the target as read from a
//! sampler file (rows `0..=E_G`, genus columns `0..=j_G` plus the padding
//! column). Shapes the sampler never observed get `ln z = -inf`.

use ndarray::Array2;

use crate::dihedral::TargetSet;
use crate::{CellState, GridIndex, GtsaError, Histogram};

// =============================================================================
// ENERGY CORRECTION
// =============================================================================

/// Per-cell shift of the bond energy, `d_eps(E, V)`.
///
/// With zero variance every bond has the same energy and the correction is
/// zero. With constant variance the correction comes from the mean energies
/// measured by the sampler, shifted to vanish at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCorrection {
    cells: Array2<f64>,
}

impl EnergyCorrection {
    /// Uniform bond energies.
    #[must_use]
    pub fn zero(shape: (usize, usize)) -> Self {
        Self {
            cells: Array2::zeros(shape),
        }
    }

    /// Mean-energy correction relative to the target reference cell.
    pub fn constant_variance(distribution: &Histogram, targets: &TargetSet) -> Result<Self, GtsaError> {
        let offset = distribution.at(targets.reference())?;
        let mut shifted = distribution.clone();
        shifted.shift(offset);
        Ok(Self {
            cells: shifted.into_cells(),
        })
    }

    /// Use an arbitrary correction grid.
    #[must_use]
    pub fn from_array(cells: Array2<f64>) -> Self {
        Self { cells }
    }

    /// Correction values.
    #[must_use]
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }
}

// =============================================================================
// LOG-WEIGHT GRID
// =============================================================================

/// `ln z(E, V)` per `(E, j)` cell, `-inf` for impossible shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct LogWeights {
    cells: Array2<f64>,
}

impl LogWeights {
    /// Wrap a precomputed grid.
    #[must_use]
    pub fn from_array(cells: Array2<f64>) -> Self {
        Self { cells }
    }

    /// Raw grid.
    #[must_use]
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    /// Grid shape as `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Log-weight at a storage index, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, idx: GridIndex) -> Option<f64> {
        self.cells.get([idx.edges, idx.genus]).copied()
    }

    /// Every finite cell with its vertex count, in row-major order.
    pub fn finite_cells(&self) -> impl Iterator<Item = (GridIndex, usize, f64)> + '_ {
        self.cells.indexed_iter().filter_map(|((i, j), &w)| {
            let idx = GridIndex::new(i, j);
            match idx.vertices() {
                Some(v) if w.is_finite() => Some((idx, v, w)),
                _ => None,
            }
        })
    }

    /// Largest vertex count over finite cells.
    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.finite_cells().map(|(_, v, _)| v).max()
    }

    /// Total on-pathway partition function, `sum exp(ln z)` over finite cells.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.finite_cells().map(|(_, _, w)| w.exp()).sum()
    }
}

// =============================================================================
// PARTITION FUNCTION
// =============================================================================

/// The energy-independent inputs of the model, validated once and reused
/// across an energy sweep.
#[derive(Debug, Clone, Copy)]
pub struct PartitionFunction<'a> {
    dos: &'a Histogram,
    dihedrals: &'a Histogram,
    correction: &'a EnergyCorrection,
    ln_qcoord: f64,
    ln_placements: f64,
}

impl<'a> PartitionFunction<'a> {
    /// Check shapes and the rotation constant.
    pub fn new(
        dos: &'a Histogram,
        dihedrals: &'a Histogram,
        correction: &'a EnergyCorrection,
        qcoord: f64,
    ) -> Result<Self, GtsaError> {
        dihedrals.expect_shape("dihedral grid", dos.shape())?;
        if correction.cells.dim() != dos.shape() {
            return Err(GtsaError::ShapeMismatch {
                name: "energy correction grid",
                expected: dos.shape(),
                found: correction.cells.dim(),
            });
        }
        if !(qcoord > 0.0 && qcoord.is_finite()) {
            return Err(GtsaError::InvalidParameter(format!(
                "qcoord must be positive, got {}",
                qcoord
            )));
        }
        let (rows, cols) = dos.shape();
        let placements = (rows + 2).checked_sub(cols).filter(|&v| v > 0).ok_or_else(|| {
            GtsaError::InvalidParameter(format!(
                "a {}x{} grid leaves no vertices for the monomer",
                rows, cols
            ))
        })?;
        Ok(Self {
            dos,
            dihedrals,
            correction,
            ln_qcoord: qcoord.ln(),
            ln_placements: (placements as f64).ln(),
        })
    }

    /// Log-weights at chemical potential `mu = ln(rho)` and mean bond energy
    /// `epsilon`.
    #[must_use]
    pub fn log_weights(&self, mu: f64, epsilon: f64) -> LogWeights {
        let dos = self.dos.cells();
        let dih = self.dihedrals.cells();
        let corr = self.correction.cells();

        let cells = Array2::from_shape_fn(self.dos.shape(), |(i, j)| {
            let idx = GridIndex::new(i, j);
            if idx.is_monomer() {
                return self.ln_placements + mu;
            }
            match (CellState::from_raw(dos[[i, j]]), idx.vertices()) {
                (CellState::Observed(ln_count), Some(v)) => {
                    let e = i as f64;
                    let v = v as f64;
                    ln_count + v * mu - (v - 1.0) * self.ln_qcoord - dih[[i, j]]
                        + e * (epsilon + corr[[i, j]])
                }
                _ => f64::NEG_INFINITY,
            }
        });
        LogWeights { cells }
    }
}

/// One-shot form of [`PartitionFunction::log_weights`].
pub fn log_weights(
    dos: &Histogram,
    dihedrals: &Histogram,
    mu: f64,
    epsilon: f64,
    correction: &EnergyCorrection,
    qcoord: f64,
) -> Result<LogWeights, GtsaError> {
    Ok(PartitionFunction::new(dos, dihedrals, correction, qcoord)?.log_weights(mu, epsilon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn triangle_dos() -> Histogram {
        // Triangle target: E <= 3, genus <= 1
        Histogram::from_array(array![
            [0.0, -1.0],
            [3.0_f64.ln(), -1.0],
            [3.0_f64.ln(), -1.0],
            [-1.0, 0.0],
        ])
    }

    #[test]
    fn monomer_counts_target_vertices() {
        // 4x2: rows - cols + 2 = 4
        let dos = triangle_dos();
        let dih = Histogram::zeros(4, 2);
        let corr = EnergyCorrection::zero((4, 2));
        let lnz = log_weights(&dos, &dih, 0.5, -2.0, &corr, 4.0).expect("weights");
        assert_eq!(lnz.cells()[[0, 0]], 4.0_f64.ln() + 0.5);

        // Padded triangle, 4x3: three vertices
        let mut cells = Array2::from_elem((4, 3), -1.0);
        cells.slice_mut(ndarray::s![.., ..2]).assign(triangle_dos().cells());
        let padded = Histogram::from_array(cells);
        let dih = Histogram::zeros(4, 3);
        let corr = EnergyCorrection::zero((4, 3));
        let lnz = log_weights(&padded, &dih, 0.5, -2.0, &corr, 4.0).expect("weights");
        assert_eq!(lnz.cells()[[0, 0]], 3.0_f64.ln() + 0.5);
    }

    #[test]
    fn grid_without_monomer_vertices_rejected() {
        let dos = Histogram::zeros(2, 4);
        let dih = Histogram::zeros(2, 4);
        let corr = EnergyCorrection::zero((2, 4));
        assert!(matches!(
            log_weights(&dos, &dih, 0.0, 0.0, &corr, 4.0),
            Err(GtsaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn connected_cell_formula() {
        let dos = triangle_dos();
        let mut dih = Histogram::zeros(4, 2);
        dih.set(3, 3, 1.5).expect("set");
        let corr = EnergyCorrection::zero((4, 2));
        let mu = -1.0;
        let eps = 2.0;
        let lnz = log_weights(&dos, &dih, mu, eps, &corr, 4.0).expect("weights");

        // E = 2, V = 3: a path of two bonds
        let expected = 3.0_f64.ln() + 3.0 * mu - 2.0 * 4.0_f64.ln() + 2.0 * eps;
        assert_eq!(lnz.cells()[[2, 0]], expected);

        // E = 3, V = 3: the closed triangle
        let expected = 3.0 * mu - 2.0 * 4.0_f64.ln() - 1.5 + 3.0 * eps;
        assert_eq!(lnz.cells()[[3, 1]], expected);
    }

    #[test]
    fn unobserved_cells_are_impossible() {
        let dos = triangle_dos();
        let dih = Histogram::zeros(4, 2);
        let corr = EnergyCorrection::zero((4, 2));
        let lnz = log_weights(&dos, &dih, 0.0, 0.0, &corr, 4.0).expect("weights");
        assert_eq!(lnz.cells()[[1, 1]], f64::NEG_INFINITY);
        assert_eq!(lnz.cells()[[3, 0]], f64::NEG_INFINITY);
        assert_eq!(lnz.finite_cells().count(), 4);
        assert_eq!(lnz.max_size(), Some(3));
    }

    #[test]
    fn correction_adds_per_bond() {
        let dos = triangle_dos();
        let dih = Histogram::zeros(4, 2);
        let mut shift = Array2::zeros((4, 2));
        shift[[2, 0]] = 0.25;
        let corr = EnergyCorrection::from_array(shift);
        let base = log_weights(&dos, &dih, 0.0, 1.0, &EnergyCorrection::zero((4, 2)), 4.0)
            .expect("weights");
        let shifted = log_weights(&dos, &dih, 0.0, 1.0, &corr, 4.0).expect("weights");
        let delta = shifted.cells()[[2, 0]] - base.cells()[[2, 0]];
        assert!((delta - 2.0 * 0.25).abs() < 1e-12);
        assert_eq!(shifted.cells()[[1, 0]], base.cells()[[1, 0]]);
    }

    #[test]
    fn constant_variance_zero_at_target() {
        let mut dist = Histogram::zeros(4, 2);
        dist.set(3, 3, 0.8).expect("set");
        dist.set(2, 3, 0.3).expect("set");
        let targets = TargetSet::new(vec![GridIndex::new(3, 1)]).expect("targets");
        let corr = EnergyCorrection::constant_variance(&dist, &targets).expect("corr");
        assert_eq!(corr.cells()[[3, 1]], 0.0);
        assert_eq!(corr.cells()[[2, 0]], 0.3 - 0.8);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let dos = triangle_dos();
        let dih = Histogram::zeros(3, 2);
        let corr = EnergyCorrection::zero((4, 2));
        assert!(matches!(
            log_weights(&dos, &dih, 0.0, 0.0, &corr, 4.0),
            Err(GtsaError::ShapeMismatch { .. })
        ));
        let dih = Histogram::zeros(4, 2);
        let corr = EnergyCorrection::zero((4, 3));
        assert!(matches!(
            log_weights(&dos, &dih, 0.0, 0.0, &corr, 4.0),
            Err(GtsaError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn invalid_qcoord_rejected() {
        let dos = triangle_dos();
        let dih = Histogram::zeros(4, 2);
        let corr = EnergyCorrection::zero((4, 2));
        assert!(matches!(
            log_weights(&dos, &dih, 0.0, 0.0, &corr, 0.0),
            Err(GtsaError::InvalidParameter(_))
        ));
    }
}
