//! Per-function timing statistics.
//!
//! A [`FuncStats`] starts life describing a single call and grows by
//! merging with other records of the same function. Merging adds the
//! times and counts, concatenates the observed depths and unions the
//! caller/callee sets, so records can be folded in any grouping or order.

use crate::utils::error::TraceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Aggregated statistics for one function name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuncStats {
    /// Function identifier; the merge key
    pub name: String,

    /// Sum of elapsed time over every aggregated call
    pub total_time: u64,

    /// Sum of time spent in the function itself, excluding callees.
    /// Negative totals point at inconsistent child timings.
    pub contrib_time: i64,

    /// Every depth the function was observed at, duplicates included
    pub depths: Vec<u32>,

    /// Number of aggregated calls
    pub call_count: u64,

    /// Distinct immediate callers
    pub callers: BTreeSet<String>,

    /// Distinct immediate callees
    pub callees: BTreeSet<String>,
}

impl FuncStats {
    /// Statistics for a single call
    ///
    /// **Public** - used by `RunTree::stats`
    ///
    /// # Arguments
    /// * `name` - Function name
    /// * `total_time` - Elapsed time of the call
    /// * `child_times` - Elapsed times of its direct children
    /// * `depth` - Depth of the call
    /// * `caller` - Name of the parent call, `None` for the root
    /// * `callees` - Names of the direct children
    ///
    /// # Errors
    /// * `TraceError::TimeOverflow` - a time does not fit a signed 64-bit value
    pub fn for_call<'a>(
        name: &str,
        total_time: u64,
        child_times: impl IntoIterator<Item = u64>,
        depth: u32,
        caller: Option<&str>,
        callees: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, TraceError> {
        let overflow = || TraceError::TimeOverflow {
            function: name.to_string(),
        };

        let mut child_total: i64 = 0;
        for time in child_times {
            let time = i64::try_from(time).map_err(|_| overflow())?;
            child_total = child_total.checked_add(time).ok_or_else(overflow)?;
        }
        let contrib_time = i64::try_from(total_time)
            .ok()
            .and_then(|total| total.checked_sub(child_total))
            .ok_or_else(overflow)?;

        Ok(Self {
            name: name.to_string(),
            total_time,
            contrib_time,
            depths: vec![depth],
            call_count: 1,
            callers: caller.into_iter().map(str::to_string).collect(),
            callees: callees.into_iter().map(str::to_string).collect(),
        })
    }

    /// Combine two records of the same function
    ///
    /// # Errors
    /// * `TraceError::TimeOverflow` - a summed time or count leaves its range
    ///
    /// # Panics
    /// If the names differ. Callers group by name before merging, so a
    /// mismatch is a programming error.
    pub fn merge(mut self, other: FuncStats) -> Result<FuncStats, TraceError> {
        self.absorb(other)?;
        Ok(self)
    }

    /// In-place form of [`FuncStats::merge`]; `self` is untouched on error
    pub fn absorb(&mut self, other: FuncStats) -> Result<(), TraceError> {
        assert_eq!(
            self.name, other.name,
            "cannot merge statistics of different functions"
        );

        let sums = (
            self.total_time.checked_add(other.total_time),
            self.contrib_time.checked_add(other.contrib_time),
            self.call_count.checked_add(other.call_count),
        );
        let (Some(total_time), Some(contrib_time), Some(call_count)) = sums else {
            return Err(TraceError::TimeOverflow {
                function: self.name.clone(),
            });
        };

        self.total_time = total_time;
        self.contrib_time = contrib_time;
        self.call_count = call_count;
        self.depths.extend(other.depths);
        self.callers.extend(other.callers);
        self.callees.extend(other.callees);
        Ok(())
    }

    /// Mean of the observed depths (0.0 when none were recorded)
    pub fn mean_depth(&self) -> f64 {
        if self.depths.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.depths.iter().map(|&d| d as u64).sum();
        sum as f64 / self.depths.len() as f64
    }
}

impl fmt::Display for FuncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, total time: {}, contrib time: {}, depths: {:?}, call count: {}, callers: {:?}, callees: {:?}",
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

/// Look up records by function name
///
/// **Public** - renderers walk caller/callee names through this index
pub fn index_by_name(stats: &[FuncStats]) -> HashMap<&str, &FuncStats> {
    stats.iter().map(|s| (s.name.as_str(), s)).collect()
}

/// The traced top-level function: the first record observed at depth 0
pub fn find_root(stats: &[FuncStats]) -> Option<&FuncStats> {
    stats.iter().find(|s| s.depths.contains(&0))
}
