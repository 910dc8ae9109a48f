//! # gtsa-core
//!
//! The equilibrium thermodynamics engine for gtsa - THE MODEL.
//!
//! Given the subgraph density of states of a target structure (sampled
//! externally), this crate builds the grand-canonical log-weights of every
//! `(E, V)` shape class and derives the observables:
//!
//! ```text
//! Histogram + Metadata ──► PartitionFunction ──► LogWeights ─┬─► FreeEnergyProfile ──► Barrier
//!                                                            ├─► assembly_yield
//!                  adjacency Histogram ──────────────────────┴─► incidental_matrix ──► on/off ratio
//! ```
//!
//! ## Architectural Constraints
//!
//! - Pure functions of their inputs; no sampling, no graph traversal
//! - No file system access: formats read `BufRead` and write `Write`
//! - Indexing never clamps or wraps; invalid coordinates are errors
//! - `-inf` log-weights mark impossible shapes and vanish under `exp`

// =============================================================================
// MODULES
// =============================================================================

pub mod assembly_yield;
pub mod barrier;
pub mod dihedral;
pub mod formats;
pub mod histogram;
pub mod incidental;
pub mod partition;
pub mod primitives;
pub mod profile;
pub mod sweep;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CellState, GridIndex, GtsaError};

// =============================================================================
// RE-EXPORTS: Model
// =============================================================================

pub use assembly_yield::{assembly_yield, target_log_weight};
pub use barrier::{Barrier, nucleation_barrier};
pub use dihedral::{DihedralData, TargetSet};
pub use histogram::{Histogram, HistogramDiff};
pub use incidental::{IncidentalParams, incidental_matrix, multivalent_weight, on_off_pathway_ratio};
pub use partition::{EnergyCorrection, LogWeights, PartitionFunction, log_weights};
pub use profile::{FreeEnergyProfile, free_energy_profile};
pub use sweep::{EnergySweep, SweepPoint};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    Metadata, histogram_to_string, parse_histogram, read_histogram, read_histogram_with_metadata,
    write_histogram,
};
