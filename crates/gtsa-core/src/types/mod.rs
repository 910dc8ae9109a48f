//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the thermodynamics engine:
//! - Grid coordinates (`GridIndex`) and the `(E, V)` -> `(E, j)` mapping
//! - The tagged density-of-states cell (`CellState`)
//! - Error types (`GtsaError`)
//!
//! ## Coordinate Convention
//!
//! Every grid in gtsa is stored by row `E` (edge count) and column `j`
//! (genus, `j = E - V + 1`). Public accessors take the physical pair `(E, V)`
//! and derive `j`; a negative genus means the pair describes a disconnected
//! subgraph and is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitives;

// =============================================================================
// GRID COORDINATES
// =============================================================================

/// Storage position of a cell: row `edges` (E) and column `genus` (j).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    /// Number of edges in the subgraph (row).
    pub edges: usize,
    /// Number of independent cycles, `E - V + 1` (column).
    pub genus: usize,
}

impl GridIndex {
    /// Create an index from storage coordinates.
    #[must_use]
    pub const fn new(edges: usize, genus: usize) -> Self {
        Self { edges, genus }
    }

    /// Derive the storage index of a subgraph with `edges` edges and
    /// `vertices` vertices.
    ///
    /// Fails with `GtsaError::NegativeGenus` when `E - V + 1 < 0`.
    pub fn from_ev(edges: usize, vertices: usize) -> Result<Self, GtsaError> {
        let genus = (edges + 1)
            .checked_sub(vertices)
            .ok_or(GtsaError::NegativeGenus { edges, vertices })?;
        Ok(Self { edges, genus })
    }

    /// Number of vertices `V = E - j + 1` of the subgraphs stored in this cell.
    ///
    /// Returns `None` for cells with `j > E + 1`, which no subgraph can occupy.
    #[must_use]
    pub const fn vertices(self) -> Option<usize> {
        (self.edges + 1).checked_sub(self.genus)
    }

    /// Whether this is the single-unit cell `(E = 0, V = 1)`.
    #[must_use]
    pub const fn is_monomer(self) -> bool {
        self.edges == 0 && self.genus == 0
    }
}

impl From<(usize, usize)> for GridIndex {
    fn from((edges, genus): (usize, usize)) -> Self {
        Self::new(edges, genus)
    }
}

// =============================================================================
// DENSITY-OF-STATES CELL
// =============================================================================

/// Interpretation of a raw density-of-states value.
///
/// Histogram files mark shapes the sampler never observed with
/// [`primitives::UNOBSERVED`] (`-1`). Any negative value is treated the same
/// way; `0` is a valid log-count (exactly one shape).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CellState {
    /// Natural log of the number of distinct subgraphs of this shape.
    Observed(f64),
    /// No subgraph of this shape exists or was sampled.
    Unobserved,
}

impl CellState {
    /// Classify a raw grid value.
    #[must_use]
    pub fn from_raw(value: f64) -> Self {
        if value >= 0.0 {
            Self::Observed(value)
        } else {
            Self::Unobserved
        }
    }

    /// The log-count, if this shape was observed.
    #[must_use]
    pub const fn ln_count(self) -> Option<f64> {
        match self {
            Self::Observed(value) => Some(value),
            Self::Unobserved => None,
        }
    }

    /// Raw value as written to histogram files.
    #[must_use]
    pub const fn to_raw(self) -> f64 {
        match self {
            Self::Observed(value) => value,
            Self::Unobserved => primitives::UNOBSERVED,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in gtsa.
///
/// - No silent failures: indexing never clamps or wraps
/// - Use `Result<T, GtsaError>` for fallible operations
/// - A missing nucleation barrier is a result (`Barrier::Downhill`), not an error
#[derive(Debug, Error)]
pub enum GtsaError {
    /// `E - V + 1 < 0`: the coordinate pair describes a disconnected graph.
    #[error("The graph is disconnected: E={edges}, V={vertices} gives a negative genus")]
    NegativeGenus { edges: usize, vertices: usize },

    /// The derived cell lies outside the grid.
    #[error("Cell (E={edges}, j={genus}) is outside a {rows}x{cols} grid")]
    IndexOutOfRange {
        edges: usize,
        genus: usize,
        rows: usize,
        cols: usize,
    },

    /// A histogram line could not be parsed.
    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// A histogram file leaves cells unlisted (rejected in strict mode).
    #[error("Histogram does not list {count} cell(s), first at (E={edges}, j={genus})")]
    MissingCells {
        count: usize,
        edges: usize,
        genus: usize,
    },

    /// A histogram stream contained no data lines.
    #[error("Histogram contains no data lines")]
    EmptyHistogram,

    /// A required metadata tag is absent.
    #[error("Missing metadata tag: {0}")]
    MissingTag(String),

    /// A metadata tag is present but its value is not usable.
    #[error("Invalid value for metadata tag '{tag}': {value}")]
    InvalidTag { tag: String, value: String },

    /// Two grids that must share a shape do not.
    #[error("Shape mismatch: {name} is {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// No target cells were supplied or found.
    #[error("Target index set is empty")]
    EmptyTargetSet,

    /// An energy sweep with an unusable range or step.
    #[error("Invalid energy sweep: {0}")]
    InvalidSweep(String),

    /// A model parameter outside its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing or inconsistent run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for GtsaError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
