//! Rescale statistics so datasets of different sizes can be compared.
//!
//! NOTE: `total_time` is divided by the sum of `contrib_time`, not by the
//! sum of `total_time`, so normalized total times sum to Σtotal / Σcontrib
//! rather than 1.0. This is kept as observed in existing normalized files
//! and is probably a mistake; switching to Σtotal_time would change every
//! normalized total time.

use super::stats::FuncStats;
use crate::utils::error::NormalizeError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A [`FuncStats`] with its times and count expressed as fractions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStats {
    pub name: String,
    pub total_time: f64,
    pub contrib_time: f64,
    pub depths: Vec<u32>,
    pub call_count: f64,
    pub callers: BTreeSet<String>,
    pub callees: BTreeSet<String>,
}

impl fmt::Display for NormalizedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, total time: {:.6}, contrib time: {:.6}, depths: {:?}, call count: {:.6}, callers: {:?}, callees: {:?}",
            self.name,
            self.total_time,
            self.contrib_time,
            self.depths,
            self.call_count,
            self.callers,
            self.callees
        )
    }
}

/// Normalize a collection of records
///
/// **Public** - main entry point for normalization
///
/// # Returns
/// One normalized record per input record, in input order
///
/// # Errors
/// * `NormalizeError::Degenerate` - Σcontrib_time or Σcall_count is zero
///   (always the case for an empty collection)
pub fn normalize(stats: &[FuncStats]) -> Result<Vec<NormalizedStats>, NormalizeError> {
    // Widened so large persisted records cannot overflow the sums
    let contrib_sum: i128 = stats.iter().map(|s| i128::from(s.contrib_time)).sum();
    let count_sum: u128 = stats.iter().map(|s| u128::from(s.call_count)).sum();

    if contrib_sum == 0 {
        return Err(NormalizeError::Degenerate {
            field: "contrib_time",
        });
    }
    if count_sum == 0 {
        return Err(NormalizeError::Degenerate {
            field: "call_count",
        });
    }

    let time_divisor = contrib_sum as f64;
    let count_divisor = count_sum as f64;

    Ok(stats
        .iter()
        .map(|s| NormalizedStats {
            name: s.name.clone(),
            total_time: s.total_time as f64 / time_divisor,
            contrib_time: s.contrib_time as f64 / time_divisor,
            depths: s.depths.clone(),
            call_count: s.call_count as f64 / count_divisor,
            callers: s.callers.clone(),
            callees: s.callees.clone(),
        })
        .collect())
}
