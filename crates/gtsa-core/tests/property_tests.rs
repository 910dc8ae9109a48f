//! # Property-Based Tests
//!
//! Invariants of the grid, the text format and the partition function,
//! checked with proptest.

use gtsa_core::{
    Barrier, EnergyCorrection, GridIndex, GtsaError, Histogram, IncidentalParams, LogWeights,
    incidental_matrix, log_weights, nucleation_barrier, read_histogram, write_histogram,
};
use ndarray::Array2;
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// A grid shape with at least two rows and one column, and no more columns
/// than a connected target can fill (`cols <= rows + 1`).
fn shape() -> impl Strategy<Value = (usize, usize)> {
    (2usize..8).prop_flat_map(|rows| (Just(rows), 1usize..=(rows + 1).min(4)))
}

/// Raw density-of-states values: log-counts or the unobserved sentinel.
fn dos_value() -> impl Strategy<Value = f64> {
    prop_oneof![3 => 0.0f64..20.0, 1 => Just(-1.0)]
}

fn dos_grid() -> impl Strategy<Value = Histogram> {
    shape().prop_flat_map(|(rows, cols)| {
        vec(dos_value(), rows * cols).prop_map(move |values| {
            Histogram::from_array(
                Array2::from_shape_vec((rows, cols), values).expect("shape matches length"),
            )
        })
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Negative genus always fails; valid cells accumulate every increment.
    #[test]
    fn indexing_invariant(
        edges in 0usize..8,
        vertices in 0usize..10,
        weights in vec(-5.0f64..5.0, 1..6)
    ) {
        let mut h = Histogram::zeros(8, 8);
        if edges + 1 < vertices {
            prop_assert!(
                matches!(h.get(edges, vertices), Err(GtsaError::NegativeGenus { .. })),
                "negative genus must fail"
            );
            prop_assert!(h.increment(edges, vertices, 1.0).is_err());
        } else {
            let mut expected = 0.0;
            for w in &weights {
                h.increment(edges, vertices, *w).expect("increment");
                expected += w;
            }
            prop_assert_eq!(h.get(edges, vertices).expect("get"), expected);
        }
    }

    /// Writing and reading back reproduces every cell of the original grid.
    #[test]
    fn text_roundtrip(h in dos_grid(), padded in any::<bool>()) {
        let mut out = Vec::new();
        write_histogram(&h, &mut out, padded).expect("write");
        let back = read_histogram(out.as_slice()).expect("read");

        prop_assert_eq!(back.rows(), h.rows());
        prop_assert!(back.cols() == h.cols() || back.cols() == h.cols() + 1);
        for ((i, j), v) in h.cells().indexed_iter() {
            prop_assert_eq!(back.at(GridIndex::new(i, j)).expect("at"), *v);
        }
        prop_assert!(back.missing_cells().is_empty());
    }

    /// Raising mu shifts every finite log-weight by exactly V * dmu and leaves
    /// the impossible cells impossible.
    #[test]
    fn chemical_potential_is_linear(
        dos in dos_grid(),
        mu in -5.0f64..5.0,
        dmu in 0.01f64..3.0,
        epsilon in -3.0f64..3.0
    ) {
        let dih = Histogram::zeros(dos.rows(), dos.cols());
        let corr = EnergyCorrection::zero(dos.shape());
        let low = log_weights(&dos, &dih, mu, epsilon, &corr, 4.0).expect("low");
        let high = log_weights(&dos, &dih, mu + dmu, epsilon, &corr, 4.0).expect("high");

        for ((i, j), a) in low.cells().indexed_iter() {
            let b = high.cells()[[i, j]];
            prop_assert_eq!(a.is_finite(), b.is_finite());
            if let (true, Some(v)) = (a.is_finite(), GridIndex::new(i, j).vertices()) {
                if v > 0 {
                    prop_assert!(b > *a);
                    let tolerance = 1e-9 * (1.0 + a.abs() + b.abs());
                    prop_assert!(((b - a) - v as f64 * dmu).abs() < tolerance);
                }
            }
        }
    }

    /// A strictly decreasing profile past F(1) has no barrier.
    #[test]
    fn downhill_profiles_have_no_barrier(steps in vec(0.01f64..5.0, 1..20)) {
        let mut profile = vec![0.0, 0.0];
        for s in &steps {
            let last = profile[profile.len() - 1];
            profile.push(last - s);
        }
        prop_assert_eq!(nucleation_barrier(&profile).expect("barrier"), Barrier::Downhill);
    }

    /// A single interior maximum is reported at its position and height.
    #[test]
    fn single_peak_is_found(
        rise in vec(0.01f64..3.0, 1..8),
        fall in vec(0.01f64..3.0, 1..8)
    ) {
        let mut profile = vec![0.0, 0.0];
        for r in &rise {
            let last = profile[profile.len() - 1];
            profile.push(last + r);
        }
        let top = profile.len() - 1;
        let height = profile[top];
        for f in &fall {
            let last = profile[profile.len() - 1];
            profile.push(last - f);
        }
        prop_assert_eq!(
            nucleation_barrier(&profile).expect("barrier"),
            Barrier::Peak { size: top, height }
        );
    }

    /// Zin is symmetric in (V1, V2) up to rounding.
    #[test]
    fn incidental_matrix_is_symmetric(
        weights in vec(-3.0f64..1.0, 6),
        adjacent in vec(0.0f64..4.0, 6)
    ) {
        let lnz = LogWeights::from_array(
            Array2::from_shape_vec((3, 2), weights).expect("shape"),
        );
        let adjacency = Histogram::from_array(
            Array2::from_shape_vec((3, 2), adjacent).expect("shape"),
        );
        let params = IncidentalParams::new(0.05, 2.0, 3.0, 4.0);
        let zin = incidental_matrix(&lnz, &adjacency, &params).expect("zin");
        let (n, _) = zin.dim();
        for a in 0..n {
            for b in 0..n {
                let (x, y) = (zin[[a, b]], zin[[b, a]]);
                prop_assert!((x - y).abs() <= 1e-12 * (1.0 + x.abs() + y.abs()));
            }
        }
    }
}
