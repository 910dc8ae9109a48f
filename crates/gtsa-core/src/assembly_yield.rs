//! # Yield Estimator
//!
//! Equilibrium fraction of material in the fully assembled target:
//!
//! ```text
//! yield = Z_target / sum_{E,V} z(E,V) = 1 / sum exp(ln z(E,V) - ln Z_target)
//! ```
//!
//! Degenerate target cells are summed into `Z_target`.

use crate::{GtsaError, LogWeights, TargetSet};

/// `ln Z_target` over the target cells.
///
/// Falls back to a max-shifted sum when the direct sum underflows.
pub fn target_log_weight(lnz: &LogWeights, targets: &TargetSet) -> Result<f64, GtsaError> {
    let weights = targets
        .cells()
        .iter()
        .map(|&idx| {
            lnz.get(idx).ok_or(GtsaError::IndexOutOfRange {
                edges: idx.edges,
                genus: idx.genus,
                rows: lnz.shape().0,
                cols: lnz.shape().1,
            })
        })
        .collect::<Result<Vec<f64>, GtsaError>>()?;

    let direct = weights.iter().map(|w| w.exp()).sum::<f64>().ln();
    if direct.is_finite() {
        return Ok(direct);
    }

    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(GtsaError::InvalidParameter(
            "every target cell has zero statistical weight".to_string(),
        ));
    }
    Ok(max + weights.iter().map(|w| (w - max).exp()).sum::<f64>().ln())
}

/// Equilibrium yield of the target structure.
pub fn assembly_yield(lnz: &LogWeights, targets: &TargetSet) -> Result<f64, GtsaError> {
    let ln_target = target_log_weight(lnz, targets)?;
    let total: f64 = lnz
        .finite_cells()
        .map(|(_, _, w)| (w - ln_target).exp())
        .sum();
    Ok(1.0 / total)
}
