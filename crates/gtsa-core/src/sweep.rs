//! # Energy Sweep
//!
//! Evaluates an observable over a grid of mean bond energies
//! `epsilon_k = Emin + k dE`, `k = 0..=n`. The step count `n` is fixed up front
//! from the range, so accumulated rounding never adds or drops a point.
//!
//! Points are independent and evaluated in parallel; results come back in
//! ascending `k`.

use rayon::prelude::*;
use serde::Serialize;

use crate::{GtsaError, primitives};

/// An inclusive, evenly spaced range of bond energies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySweep {
    min: f64,
    max: f64,
    step: f64,
    points: usize,
}

/// One evaluated sweep point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint<T> {
    /// Mean bond energy.
    pub epsilon: f64,
    /// Observable at this energy.
    pub value: T,
}

impl EnergySweep {
    /// Validate a sweep range.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, GtsaError> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(GtsaError::InvalidSweep(format!(
                "range [{}, {}] is not finite",
                min, max
            )));
        }
        if !(step > 0.0 && step.is_finite()) {
            return Err(GtsaError::InvalidSweep(format!(
                "step must be positive, got {}",
                step
            )));
        }
        if max < min {
            return Err(GtsaError::InvalidSweep(format!(
                "Emax {} is below Emin {}",
                max, min
            )));
        }
        let steps = ((max - min) / step + primitives::SWEEP_STEP_SLACK).floor();
        if !(steps.is_finite() && steps < primitives::MAX_SWEEP_POINTS as f64) {
            return Err(GtsaError::InvalidSweep(format!(
                "[{}, {}] in steps of {} exceeds {} points",
                min,
                max,
                step,
                primitives::MAX_SWEEP_POINTS
            )));
        }
        Ok(Self {
            min,
            max,
            step,
            points: steps as usize + 1,
        })
    }

    /// A single-point sweep.
    #[must_use]
    pub fn single(epsilon: f64) -> Self {
        Self {
            min: epsilon,
            max: epsilon,
            step: 1.0,
            points: 1,
        }
    }

    /// First energy.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Last requested energy (included when reachable in whole steps).
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Spacing.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points
    }

    /// Always `false`: a sweep holds at least `Emin`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Energy of point `k`.
    #[must_use]
    pub fn energy(&self, k: usize) -> f64 {
        self.min + k as f64 * self.step
    }

    /// All energies in order.
    pub fn energies(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|k| self.energy(k))
    }

    /// Evaluate `f` at every energy in parallel. The first error aborts the
    /// sweep.
    pub fn run<T, F>(&self, f: F) -> Result<Vec<SweepPoint<T>>, GtsaError>
    where
        T: Send,
        F: Fn(f64) -> Result<T, GtsaError> + Sync,
    {
        (0..self.len())
            .into_par_iter()
            .map(|k| {
                let epsilon = self.energy(k);
                f(epsilon).map(|value| SweepPoint { epsilon, value })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_point_count() {
        let sweep = EnergySweep::new(0.0, 1.0, 0.1).expect("sweep");
        assert_eq!(sweep.len(), 11);
        let last = sweep.energies().last().expect("last");
        assert!((last - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_step_not_included() {
        let sweep = EnergySweep::new(0.0, 1.0, 0.3).expect("sweep");
        assert_eq!(sweep.len(), 4);
    }

    #[test]
    fn degenerate_range_has_one_point() {
        let sweep = EnergySweep::new(2.0, 2.0, 0.5).expect("sweep");
        assert_eq!(sweep.energies().collect::<Vec<_>>(), vec![2.0]);
        assert_eq!(EnergySweep::single(-3.0).len(), 1);
    }

    #[test]
    fn invalid_sweeps_rejected() {
        assert!(matches!(
            EnergySweep::new(0.0, 1.0, 0.0),
            Err(GtsaError::InvalidSweep(_))
        ));
        assert!(matches!(
            EnergySweep::new(1.0, 0.0, 0.1),
            Err(GtsaError::InvalidSweep(_))
        ));
        assert!(matches!(
            EnergySweep::new(f64::NAN, 0.0, 0.1),
            Err(GtsaError::InvalidSweep(_))
        ));
    }

    #[test]
    fn oversized_sweep_rejected() {
        assert!(matches!(
            EnergySweep::new(0.0, 1e30, 1e-10),
            Err(GtsaError::InvalidSweep(_))
        ));
        assert!(matches!(
            EnergySweep::new(-f64::MAX, f64::MAX, 1.0),
            Err(GtsaError::InvalidSweep(_))
        ));
        let widest = EnergySweep::new(0.0, 9_999_999.0, 1.0).expect("sweep");
        assert_eq!(widest.len(), primitives::MAX_SWEEP_POINTS);
        assert_eq!(widest.max(), 9_999_999.0);
    }

    #[test]
    fn run_preserves_order() {
        let sweep = EnergySweep::new(0.0, 4.0, 1.0).expect("sweep");
        let points = sweep.run(|e| Ok(e * 2.0)).expect("run");
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(points[3].epsilon, 3.0);
    }

    #[test]
    fn run_propagates_errors() {
        let sweep = EnergySweep::new(0.0, 2.0, 1.0).expect("sweep");
        let result: Result<Vec<SweepPoint<f64>>, _> = sweep.run(|e| {
            if e > 1.5 {
                Err(GtsaError::InvalidParameter("too hot".to_string()))
            } else {
                Ok(e)
            }
        });
        assert!(result.is_err());
    }
}
