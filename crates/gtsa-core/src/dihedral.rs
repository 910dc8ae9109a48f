//! # Dihedral Entropy and Target Cells
//!
//! The dihedral-entropy grid written by the sampler carries the two
//! connectivity constants as metadata (`qcoord`, `qdih`). Its maximum marks the
//! fully assembled target: every cell within tolerance of the maximum is a
//! degenerate target microstate.

use std::io::BufRead;

use serde::Serialize;

use crate::formats::{Metadata, read_histogram_with_metadata};
use crate::{GridIndex, GtsaError, Histogram, primitives};

// =============================================================================
// DIHEDRAL DATA
// =============================================================================

/// Dihedral-entropy-loss grid plus the connectivity constants stored with it.
#[derive(Debug, Clone)]
pub struct DihedralData {
    /// Entropy lost to dihedral restriction, per `(E, j)` cell.
    pub grid: Histogram,
    /// Monomer rotation constant.
    pub qcoord: f64,
    /// Dihedral-angle connective constant.
    pub qdih: f64,
    /// All tags found in the file.
    pub meta: Metadata,
}

impl DihedralData {
    /// Bundle a grid with its metadata, extracting `qcoord` and `qdih`.
    pub fn new(grid: Histogram, meta: Metadata) -> Result<Self, GtsaError> {
        let qcoord = positive_tag(&meta, primitives::TAG_QCOORD)?;
        let qdih = positive_tag(&meta, primitives::TAG_QDIH)?;
        Ok(Self {
            grid,
            qcoord,
            qdih,
            meta,
        })
    }

    /// Read a dihedral-entropy file.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, GtsaError> {
        let (grid, meta) = read_histogram_with_metadata(reader)?;
        Self::new(grid, meta)
    }

    /// Cells of the fully assembled target, at the default tolerance.
    pub fn targets(&self) -> Result<TargetSet, GtsaError> {
        TargetSet::from_dihedrals(&self.grid, primitives::TARGET_TOLERANCE)
    }
}

fn positive_tag(meta: &Metadata, tag: &str) -> Result<f64, GtsaError> {
    let value = meta.scalar(tag)?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GtsaError::InvalidTag {
            tag: tag.to_string(),
            value: value.to_string(),
        })
    }
}

// =============================================================================
// TARGET SET
// =============================================================================

/// Storage indices of the fully assembled target's degenerate microstates,
/// in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSet {
    cells: Vec<GridIndex>,
}

impl TargetSet {
    /// Collect every cell with `|dih - max(dih)| < tolerance`.
    pub fn from_dihedrals(dihedrals: &Histogram, tolerance: f64) -> Result<Self, GtsaError> {
        let max = dihedrals.max_value().ok_or(GtsaError::EmptyTargetSet)?;
        let cells = dihedrals
            .cells()
            .indexed_iter()
            .filter(|(_, v)| (**v - max).abs() < tolerance)
            .map(|((i, j), _)| GridIndex::new(i, j))
            .collect();
        Self::new(cells)
    }

    /// Use an explicit list of target cells.
    pub fn new(cells: Vec<GridIndex>) -> Result<Self, GtsaError> {
        if cells.is_empty() {
            return Err(GtsaError::EmptyTargetSet);
        }
        Ok(Self { cells })
    }

    /// Target cells.
    #[must_use]
    pub fn cells(&self) -> &[GridIndex] {
        &self.cells
    }

    /// The largest target index (by edges, then genus). Energy corrections
    /// are measured relative to this cell.
    #[must_use]
    pub fn reference(&self) -> GridIndex {
        // Non-empty by construction
        self.cells.iter().copied().max().unwrap_or(GridIndex::new(0, 0))
    }

    /// Number of target cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
