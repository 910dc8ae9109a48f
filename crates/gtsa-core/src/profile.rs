//! # Free-Energy Profile
//!
//! Marginalizes the log-weight grid over shape to a free energy per assembly
//! size, `F(V) = -ln sum_E z(E, V)`.

use serde::Serialize;

use crate::LogWeights;

/// Free energy indexed by vertex count `V`.
///
/// Index `0` is unused. Entries `1..=max_size` hold `-ln Z(V)`; trailing
/// entries past the largest populated size stay `0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeEnergyProfile {
    values: Vec<f64>,
    max_size: usize,
}

impl FreeEnergyProfile {
    /// Accumulate `Z(V)` over every finite cell and take `-ln`.
    #[must_use]
    pub fn from_log_weights(lnz: &LogWeights) -> Self {
        let (rows, cols) = lnz.shape();
        let max_size = lnz.max_size().unwrap_or(0);
        // rows - cols + 3 leaves one trailing entry past the target size
        let len = (rows + 3).saturating_sub(cols).max(max_size + 1);

        let mut values = vec![0.0; len];
        for (_, v, w) in lnz.finite_cells() {
            values[v] += w.exp();
        }
        for z in values.iter_mut().take(max_size + 1).skip(1) {
            *z = -z.ln();
        }
        Self { values, max_size }
    }

    /// Wrap precomputed values (index 0 unused).
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        let max_size = values.len().saturating_sub(1);
        Self { values, max_size }
    }

    /// All entries, including the unused index 0.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `F(V)`, or `None` past the end of the profile.
    #[must_use]
    pub fn get(&self, size: usize) -> Option<f64> {
        self.values.get(size).copied()
    }

    /// Largest size with a populated entry.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of entries, including index 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the profile has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(V, F(V))` for `V >= 1`.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values.iter().copied().enumerate().skip(1)
    }
}

/// Shorthand for [`FreeEnergyProfile::from_log_weights`].
#[must_use]
pub fn free_energy_profile(lnz: &LogWeights) -> FreeEnergyProfile {
    FreeEnergyProfile::from_log_weights(lnz)
}
