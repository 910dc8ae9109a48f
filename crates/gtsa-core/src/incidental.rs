//! # Incidental Binding
//!
//! Off-pathway (non-specific) association between two partial assemblies
//! through their dangling edges.
//!
//! Two subgraphs with `n1` and `n2` adjacent dangling edges can form `k`
//! simultaneous incidental bonds in `C(n1,k) C(n2,k) k!` ways. Each bond
//! contributes energy weight `w`; closing the extra bonds costs a dihedral
//! factor `qdih^2` per bond beyond the first and a single rotational factor
//! `qcoord`.
//!
//! The bivalent incidental partition function `Zin(V1, V2)` sums this weight
//! over every pair of finite cells. The pair loop is `O(cells^2)`; rows of
//! `Zin` are filled in parallel, each row owned by one worker, and summed in
//! the same cell order as a sequential loop.

use ndarray::Array2;
use rayon::prelude::*;

use crate::{GtsaError, Histogram, LogWeights};

// =============================================================================
// PARAMETERS
// =============================================================================

/// Parameters of the incidental-binding model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentalParams {
    /// Dimensionless number density.
    pub rho: f64,
    /// Mean dimensionless incidental bond weight.
    pub w: f64,
    /// Dihedral-angle connective constant.
    pub qdih: f64,
    /// Monomer rotation constant.
    pub qcoord: f64,
    /// Fraction of dangling edges able to bind.
    pub active_fraction: f64,
    /// Upper bound on simultaneous bonds, `None` for no bound.
    pub max_bonds: Option<usize>,
}

impl IncidentalParams {
    /// Parameters with every dangling edge active and no bond limit.
    #[must_use]
    pub fn new(rho: f64, w: f64, qdih: f64, qcoord: f64) -> Self {
        Self {
            rho,
            w,
            qdih,
            qcoord,
            active_fraction: 1.0,
            max_bonds: None,
        }
    }

    /// Restrict binding to a fraction of dangling edges.
    #[must_use]
    pub fn with_active_fraction(mut self, active_fraction: f64) -> Self {
        self.active_fraction = active_fraction;
        self
    }

    /// Bound the number of simultaneous bonds.
    #[must_use]
    pub fn with_max_bonds(mut self, max_bonds: usize) -> Self {
        self.max_bonds = Some(max_bonds);
        self
    }

    fn validate(&self) -> Result<(), GtsaError> {
        if !(self.qdih > 0.0 && self.qcoord > 0.0) {
            return Err(GtsaError::InvalidParameter(format!(
                "qdih and qcoord must be positive, got {} and {}",
                self.qdih, self.qcoord
            )));
        }
        if !(0.0..=1.0).contains(&self.active_fraction) {
            return Err(GtsaError::InvalidParameter(format!(
                "active fraction must lie in [0, 1], got {}",
                self.active_fraction
            )));
        }
        Ok(())
    }

    /// Multivalent weight for subgraphs with `n1` and `n2` dangling edges.
    #[must_use]
    pub fn multivalent_weight(&self, n1: f64, n2: f64) -> f64 {
        multivalent_weight(
            n1,
            n2,
            self.w,
            self.qdih,
            self.qcoord,
            self.active_fraction,
            self.max_bonds,
        )
    }
}

// =============================================================================
// MULTIVALENT WEIGHT
// =============================================================================

/// Combinatorial weight of `k = 1..=min(n1', n2', max_bonds)` incidental
/// bonds between two subgraphs, with `n' = floor(n * active_fraction)`:
///
/// ```text
/// Q = sum_k P(n1',k) P(n2',k) / k! * k w / (qdih^(2k-1) qcoord)
/// ```
#[must_use]
pub fn multivalent_weight(
    n1: f64,
    n2: f64,
    w: f64,
    qdih: f64,
    qcoord: f64,
    active_fraction: f64,
    max_bonds: Option<usize>,
) -> f64 {
    let n1 = active_sites(n1, active_fraction);
    let n2 = active_sites(n2, active_fraction);
    let kmax = match max_bonds {
        Some(limit) => n1.min(n2).min(limit),
        None => n1.min(n2),
    };

    let mut q = 0.0;
    for k in 1..=kmax {
        let mut prod = 1.0;
        for r in (n1 - k + 1)..=n1 {
            prod *= r as f64;
        }
        for r in 1..=k {
            prod /= r as f64;
        }
        for r in (n2 - k + 1)..=n2 {
            prod *= r as f64;
        }
        let k = k as f64;
        q += (prod * k * w) / (qdih.powf(2.0 * k - 1.0) * qcoord);
    }
    q
}

fn active_sites(n: f64, active_fraction: f64) -> usize {
    let active = (n * active_fraction).floor();
    if active.is_finite() && active > 0.0 {
        active as usize
    } else {
        0
    }
}

// =============================================================================
// INCIDENTAL MATRIX
// =============================================================================

/// A finite cell able to bind incidentally.
#[derive(Debug, Clone, Copy)]
struct BindingCell {
    edges: usize,
    genus: usize,
    size: usize,
    ln_weight: f64,
    adjacent: f64,
}

/// Bivalent incidental partition function `Zin(V1, V2)`.
///
/// Every ordered pair of finite cells with positive adjacency contributes
/// `Q(adj1, adj2) * rho * exp(ln z1 + ln z2)`; pairing a cell with itself
/// contributes half.
pub fn incidental_matrix(
    lnz: &LogWeights,
    adjacency: &Histogram,
    params: &IncidentalParams,
) -> Result<Array2<f64>, GtsaError> {
    params.validate()?;
    adjacency.expect_shape("adjacency grid", lnz.shape())?;

    let adj = adjacency.cells();
    let cells: Vec<BindingCell> = lnz
        .finite_cells()
        .filter(|(idx, _, _)| adj[[idx.edges, idx.genus]] > 0.0)
        .map(|(idx, size, ln_weight)| BindingCell {
            edges: idx.edges,
            genus: idx.genus,
            size,
            ln_weight,
            adjacent: adj[[idx.edges, idx.genus]],
        })
        .collect();

    let (rows, cols) = lnz.shape();
    let largest = cells.iter().map(|c| c.size).max().unwrap_or(0);
    let n = (rows + 3).saturating_sub(cols).max(largest + 1);

    let mut by_size: Vec<Vec<BindingCell>> = vec![Vec::new(); n];
    for cell in &cells {
        by_size[cell.size].push(*cell);
    }

    let rows_out: Vec<Vec<f64>> = by_size
        .par_iter()
        .map(|outer| {
            let mut row = vec![0.0; n];
            for c1 in outer {
                for c2 in &cells {
                    let q = params.multivalent_weight(c1.adjacent, c2.adjacent);
                    let term = q * params.rho * (c1.ln_weight + c2.ln_weight).exp();
                    if c1.edges == c2.edges && c1.genus == c2.genus {
                        row[c2.size] += term / 2.0;
                    } else {
                        row[c2.size] += term;
                    }
                }
            }
            row
        })
        .collect();

    Array2::from_shape_vec((n, n), rows_out.concat())
        .map_err(|e| GtsaError::InvalidParameter(e.to_string()))
}

/// Ratio of the on-pathway partition function to the incidental one.
///
/// Values much larger than 1 mean assembly strongly favours the specific
/// pathway.
#[must_use]
pub fn on_off_pathway_ratio(lnz: &LogWeights, incidental: &Array2<f64>) -> f64 {
    let on_pathway = lnz.total_weight();
    let off_pathway: f64 = incidental.iter().sum();
    on_pathway / off_pathway
}
