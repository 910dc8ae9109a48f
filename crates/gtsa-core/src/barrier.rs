//! # Nucleation Barrier
//!
//! Locates the rate-limiting free-energy barrier on a profile `F(V)`, measured
//! against the monomer reference `F(1)`.
//!
//! A profile may have an initial downhill region (pre-nucleation clusters), a
//! barrier (post-critical growth cost) and a final product well. The policy
//! below decides which feature is the nucleation barrier:
//!
//! 1. Group `V >= 2` into maximal runs with `F(V) < F(1)` ("minima runs").
//! 2. No run: the barrier is the global maximum of `F(1..)` above `F(1)`.
//! 3. One run that does not start at `V = 2`: rule 2 on the prefix before it.
//! 4. One run and the last entry is above `F(1)`: the barrier is the maximum
//!    after the run, measured from the lowest point before the run's end.
//! 5. One run otherwise: no barrier ([`Barrier::Downhill`]).
//! 6. Several runs: the maximum between the end of the first run and the start
//!    of the second, measured from the lowest point before the first run ends.

use serde::Serialize;

use crate::GtsaError;

/// Outcome of the barrier search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Barrier {
    /// A computable barrier at assembly size `size` with height `height`.
    Peak { size: usize, height: f64 },
    /// Assembly is downhill everywhere past the first minimum.
    Downhill,
}

impl Barrier {
    /// Map [`Barrier::Downhill`] to a zero barrier at size 0.
    #[must_use]
    pub fn or_zero(self) -> (usize, f64) {
        match self {
            Self::Peak { size, height } => (size, height),
            Self::Downhill => (0, 0.0),
        }
    }

    /// Whether a barrier was found.
    #[must_use]
    pub fn is_peak(self) -> bool {
        matches!(self, Self::Peak { .. })
    }
}

/// Inclusive index range of a minima run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MinimaRun {
    first: usize,
    last: usize,
}

/// Find the nucleation barrier of a profile indexed by `V` (index 0 unused).
pub fn nucleation_barrier(profile: &[f64]) -> Result<Barrier, GtsaError> {
    if profile.len() < 2 {
        return Err(GtsaError::InvalidParameter(format!(
            "free-energy profile needs entries for V = 0 and V = 1, got {}",
            profile.len()
        )));
    }
    let reference = profile[1];
    let runs = minima_runs(profile, reference);

    let barrier = match runs.as_slice() {
        [] => peak_above_reference(profile),
        [only] if only.first > 2 => peak_above_reference(&profile[..only.first]),
        [only] if profile[profile.len() - 1] > reference => {
            peak_after(profile, only.last, profile.len(), only.last)
        }
        [_] => Barrier::Downhill,
        [first, second, ..] => peak_after(profile, first.last, second.first + 1, first.last),
    };
    Ok(barrier)
}

fn minima_runs(profile: &[f64], reference: f64) -> Vec<MinimaRun> {
    let mut runs: Vec<MinimaRun> = Vec::new();
    let mut open = false;
    for (v, &f) in profile.iter().enumerate().skip(2) {
        if f < reference {
            match runs.last_mut() {
                Some(run) if open => run.last = v,
                _ => runs.push(MinimaRun { first: v, last: v }),
            }
            open = true;
        } else {
            open = false;
        }
    }
    runs
}

/// Rules 2 and 3: highest point of `f[1..]` above `f[1]`.
fn peak_above_reference(f: &[f64]) -> Barrier {
    let (offset, max) = first_max(&f[1..]);
    Barrier::Peak {
        size: offset + 1,
        height: max - f[1],
    }
}

/// Rules 4 and 6: highest point of `f[start..end]` above the lowest point of
/// `f[1..floor_end]`.
fn peak_after(f: &[f64], start: usize, end: usize, floor_end: usize) -> Barrier {
    let (offset, max) = first_max(&f[start..end]);
    let floor = f[1..floor_end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    Barrier::Peak {
        size: offset + start,
        height: max - floor,
    }
}

/// First index of the maximum, and the maximum. `values` is never empty here.
fn first_max(values: &[f64]) -> (usize, f64) {
    let mut best = (0, values.first().copied().unwrap_or(f64::NEG_INFINITY));
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}
