use std::fmt;

use super::Cents;

/// Allocate an amount across weighted shares using the largest remainder
/// method. Each share is proportional to its weight's fraction of the total
/// weight, and the shares always sum back to `amount` exactly.
///
/// The method floors every exact share, then hands the leftover cents to the
/// entries with the largest fractional remainders. Ties go to the earlier
/// index, so the result is reproducible across runs and platforms.
///
/// Example: allocating 100 cents over weights [5000, 3000, 2000] yields
/// [50, 30, 20].
pub fn allocate_proportionally(
    amount: Cents,
    weights: &[Cents],
) -> Result<Vec<Cents>, AllocationError> {
    if weights.is_empty() {
        return Err(AllocationError::EmptyWeights);
    }

    let total: Cents = weights.iter().sum();
    if total == 0 {
        return Err(AllocationError::ZeroWeightTotal);
    }

    // Exact real-valued shares, floored to a base allocation
    let exact: Vec<f64> = weights
        .iter()
        .map(|&w| w as f64 / total as f64 * amount as f64)
        .collect();
    let mut shares: Vec<Cents> = exact.iter().map(|e| e.floor() as Cents).collect();

    let distributed: Cents = shares.iter().sum();
    let leftover = (amount - distributed).max(0);

    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let remainder_a = exact[a] - shares[a] as f64;
        let remainder_b = exact[b] - shares[b] as f64;
        remainder_b.total_cmp(&remainder_a).then(a.cmp(&b))
    });

    for &i in by_remainder.iter().take(leftover as usize) {
        shares[i] += 1;
    }

    Ok(shares)
}

/// Errors raised by the allocation primitives on malformed calls.
/// These are caller bugs, not runtime conditions: the aggregator guards
/// against every one of them before delegating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    /// An equal split was requested over zero people.
    NoShares,
    /// A proportional allocation was requested with no weights at all.
    EmptyWeights,
    /// A proportional allocation was requested with weights summing to zero.
    ZeroWeightTotal,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::NoShares => {
                write!(f, "cannot split among zero people")
            }
            AllocationError::EmptyWeights => {
                write!(f, "cannot allocate across an empty set of weights")
            }
            AllocationError::ZeroWeightTotal => {
                write!(f, "cannot allocate proportionally when all weights are zero")
            }
        }
    }
}

impl std::error::Error for AllocationError {}
