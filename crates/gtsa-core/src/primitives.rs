//! # Model Primitives
//!
//! Fixed constants of the thermodynamic model and of the histogram file format.
//!
//! These values are shared by the external sampler and every downstream tool;
//! changing one changes the meaning of existing data files.

/// Raw cell value marking a shape with no observed subgraphs.
///
/// Distinct from `0.0`, which is the log-count of exactly one subgraph.
pub const UNOBSERVED: f64 = -1.0;

/// Absolute tolerance when matching dihedral-entropy cells against the
/// grid maximum to find the fully assembled target.
pub const TARGET_TOLERANCE: f64 = 1.0e-5;

/// Metadata tag holding the rotational connectivity constant.
pub const TAG_QCOORD: &str = "qcoord";

/// Metadata tag holding the dihedral connectivity constant.
pub const TAG_QDIH: &str = "qdih";

/// Prefix of comment and metadata lines in histogram files.
pub const COMMENT_PREFIX: char = '#';

/// Slack added to `(Emax - Emin) / dE` before truncating to a step count,
/// so that an `Emax` reached exactly up to rounding is still included.
pub const SWEEP_STEP_SLACK: f64 = 1.0e-9;

/// Largest number of points an energy sweep may hold.
pub const MAX_SWEEP_POINTS: usize = 10_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unobserved_is_minus_one() {
        assert_eq!(UNOBSERVED, -1.0);
    }

    #[test]
    fn metadata_tags() {
        assert_eq!(TAG_QCOORD, "qcoord");
        assert_eq!(TAG_QDIH, "qdih");
    }
}
