//! # Histogram Grid
//!
//! The `(E, V)` histogram that carries the density of states and every
//! auxiliary per-shape quantity (dihedral entropy loss, adjacent edges,
//! energy corrections).
//!
//! Cells are stored by `(E, j)` with `j = E - V + 1`. Accessors taking
//! `(E, V)` derive `j` and reject negative genus or out-of-range cells;
//! nothing is clamped or wrapped.
//!
//! A histogram read from text remembers which cells were explicitly listed.
//! Unlisted cells read as `0.0`, which is indistinguishable from a genuine
//! zero unless the caller checks [`Histogram::missing_cells`].

use ndarray::Array2;
use serde::Serialize;

use crate::{CellState, GridIndex, GtsaError, primitives};

// =============================================================================
// HISTOGRAM
// =============================================================================

/// A rectangular `(E, j)` grid of `f64` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Cell values, rows = edge count, columns = genus.
    cells: Array2<f64>,
    /// `true` for cells that were explicitly set (always true unless read
    /// from an incomplete file).
    listed: Array2<bool>,
}

impl Histogram {
    /// Create a zero-filled grid with `rows` edge counts and `cols` genera.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a grid with every cell set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            cells: Array2::from_elem((rows, cols), value),
            listed: Array2::from_elem((rows, cols), true),
        }
    }

    /// Create the zero-filled grid spanning every connected subgraph of a
    /// target structure with `max_edges` edges and `max_vertices` vertices.
    ///
    /// Shape is `(E_max + 1, E_max - V_max + 2)`.
    pub fn for_structure(max_edges: usize, max_vertices: usize) -> Result<Self, GtsaError> {
        let top = GridIndex::from_ev(max_edges, max_vertices)?;
        Ok(Self::zeros(max_edges + 1, top.genus + 1))
    }

    /// Wrap an existing array. All cells count as listed.
    #[must_use]
    pub fn from_array(cells: Array2<f64>) -> Self {
        let listed = Array2::from_elem(cells.dim(), true);
        Self { cells, listed }
    }

    /// Build from explicitly listed cells; all other cells are `0.0` and
    /// reported by [`Histogram::missing_cells`].
    pub(crate) fn from_listed(rows: usize, cols: usize, entries: &[(GridIndex, f64)]) -> Self {
        let mut cells = Array2::zeros((rows, cols));
        let mut listed = Array2::from_elem((rows, cols), false);
        for &(idx, value) in entries {
            cells[[idx.edges, idx.genus]] = value;
            listed[[idx.edges, idx.genus]] = true;
        }
        Self { cells, listed }
    }

    /// Grid shape as `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Number of rows (edge counts `0..rows`).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of columns (genera `0..cols`).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Raw cell storage.
    #[must_use]
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    /// Consume the histogram, returning its cells.
    #[must_use]
    pub fn into_cells(self) -> Array2<f64> {
        self.cells
    }

    /// Map `(E, V)` onto a checked storage index.
    pub fn index(&self, edges: usize, vertices: usize) -> Result<GridIndex, GtsaError> {
        let idx = GridIndex::from_ev(edges, vertices)?;
        self.check(idx)?;
        Ok(idx)
    }

    /// Bounds-check a storage index.
    pub fn check(&self, idx: GridIndex) -> Result<(), GtsaError> {
        let (rows, cols) = self.shape();
        if idx.edges >= rows || idx.genus >= cols {
            return Err(GtsaError::IndexOutOfRange {
                edges: idx.edges,
                genus: idx.genus,
                rows,
                cols,
            });
        }
        Ok(())
    }

    /// Value of the cell holding subgraphs with `edges` edges and `vertices`
    /// vertices.
    pub fn get(&self, edges: usize, vertices: usize) -> Result<f64, GtsaError> {
        let idx = self.index(edges, vertices)?;
        Ok(self.cells[[idx.edges, idx.genus]])
    }

    /// Add `weight` to the `(E, V)` cell.
    pub fn increment(&mut self, edges: usize, vertices: usize, weight: f64) -> Result<(), GtsaError> {
        let idx = self.index(edges, vertices)?;
        self.cells[[idx.edges, idx.genus]] += weight;
        self.listed[[idx.edges, idx.genus]] = true;
        Ok(())
    }

    /// Overwrite the `(E, V)` cell.
    pub fn set(&mut self, edges: usize, vertices: usize, value: f64) -> Result<(), GtsaError> {
        let idx = self.index(edges, vertices)?;
        self.cells[[idx.edges, idx.genus]] = value;
        self.listed[[idx.edges, idx.genus]] = true;
        Ok(())
    }

    /// Value at a storage index.
    pub fn at(&self, idx: GridIndex) -> Result<f64, GtsaError> {
        self.check(idx)?;
        Ok(self.cells[[idx.edges, idx.genus]])
    }

    /// Density-of-states interpretation of the `(E, V)` cell.
    pub fn state(&self, edges: usize, vertices: usize) -> Result<CellState, GtsaError> {
        self.get(edges, vertices).map(CellState::from_raw)
    }

    /// Whether the cell was explicitly set.
    #[must_use]
    pub fn is_listed(&self, idx: GridIndex) -> bool {
        self.listed
            .get([idx.edges, idx.genus])
            .copied()
            .unwrap_or(false)
    }

    /// Cells that were never listed in the source file, in row-major order.
    #[must_use]
    pub fn missing_cells(&self) -> Vec<GridIndex> {
        self.listed
            .indexed_iter()
            .filter(|(_, listed)| !**listed)
            .map(|((i, j), _)| GridIndex::new(i, j))
            .collect()
    }

    /// Largest cell value, or `None` for an empty grid.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.cells.iter().copied().reduce(f64::max)
    }

    /// Whether every cell of the last column holds the unobserved sentinel.
    #[must_use]
    pub fn last_column_unobserved(&self) -> bool {
        match self.cols().checked_sub(1) {
            Some(last) => self
                .cells
                .column(last)
                .iter()
                .all(|&v| v == primitives::UNOBSERVED),
            None => false,
        }
    }

    /// Subtract `offset` from every cell.
    pub fn shift(&mut self, offset: f64) {
        self.cells.mapv_inplace(|v| v - offset);
    }

    /// Require this grid to have the given shape.
    pub fn expect_shape(&self, name: &'static str, expected: (usize, usize)) -> Result<(), GtsaError> {
        if self.shape() != expected {
            return Err(GtsaError::ShapeMismatch {
                name,
                expected,
                found: self.shape(),
            });
        }
        Ok(())
    }

    /// Cell-wise `other - self` summary, used to compare two sampling runs.
    pub fn difference(&self, other: &Self) -> Result<HistogramDiff, GtsaError> {
        other.expect_shape("second histogram", self.shape())?;
        let diff = &other.cells - &self.cells;
        let count = diff.len();
        if count == 0 {
            return Err(GtsaError::EmptyHistogram);
        }
        let n = count as f64;
        let mean = diff.iter().sum::<f64>() / n;
        let variance = diff.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
        let max_abs = diff.iter().map(|d| d.abs()).fold(0.0, f64::max);
        Ok(HistogramDiff {
            mean,
            stddev: variance.sqrt(),
            max_abs,
        })
    }
}

// =============================================================================
// DIFFERENCE STATISTICS
// =============================================================================

/// Summary of the cell-wise difference between two histograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramDiff {
    /// Mean difference.
    pub mean: f64,
    /// Population standard deviation of the difference.
    pub stddev: f64,
    /// Largest absolute difference.
    pub max_abs: f64,
}

// =============================================================================
// TESTS
// =============================================================================
