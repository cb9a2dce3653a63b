//! Output value types consumed by reporters and annotation exporters
//!
//! Every change point carries its index, time, before/after summary
//! statistics and p-value, so a reporter can render a table without
//! recomputing anything.

mod render;

pub use render::{render_json, render_regressions};

use serde::Serialize;
use std::collections::BTreeMap;

/// Summary statistics of one contiguous run of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentStats {
    pub len: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator, 0 for a single point)
    pub std_dev: f64,
    /// Standard error of the mean
    pub stderr: f64,
}

impl SegmentStats {
    pub fn from_values(values: &[f64]) -> Self {
        let len = values.len();
        if len == 0 {
            return Self {
                len,
                mean: 0.0,
                std_dev: 0.0,
                stderr: 0.0,
            };
        }

        let n = len as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if len > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Self {
            len,
            mean,
            std_dev,
            stderr: std_dev / n.sqrt(),
        }
    }

    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

/// Before/after comparison across a change point or between two segments
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparativeStats {
    pub before: SegmentStats,
    pub after: SegmentStats,
    /// Permutation p-value of the split when it was accepted
    ///
    /// Pruning by `min_magnitude` merges segments and refreshes `before` and
    /// `after`, but this value still comes from the test on the range that
    /// was split originally; it is not re-estimated for the merged range.
    pub p_value: f64,
}

impl ComparativeStats {
    /// (after - before) / |before|, signed
    ///
    /// A zero baseline with a non-zero change yields a signed infinity.
    pub fn relative_change(&self) -> f64 {
        relative_change(self.before.mean, self.after.mean)
    }

    /// after / before - 1
    pub fn forward_rel_change(&self) -> f64 {
        ratio_change(self.after.mean, self.before.mean)
    }

    /// before / after - 1
    pub fn backward_rel_change(&self) -> f64 {
        ratio_change(self.before.mean, self.after.mean)
    }

    pub fn forward_change_percent(&self) -> f64 {
        self.forward_rel_change() * 100.0
    }

    pub fn backward_change_percent(&self) -> f64 {
        self.backward_rel_change() * 100.0
    }

    /// Size of the shift regardless of direction
    pub fn magnitude(&self) -> f64 {
        self.relative_change().abs()
    }
}

pub(crate) fn relative_change(before: f64, after: f64) -> f64 {
    let diff = after - before;
    if diff == 0.0 {
        0.0
    } else if before == 0.0 {
        f64::INFINITY.copysign(diff)
    } else {
        diff / before.abs()
    }
}

fn ratio_change(numerator: f64, denominator: f64) -> f64 {
    if numerator == denominator {
        0.0
    } else if denominator == 0.0 {
        f64::INFINITY.copysign(numerator)
    } else {
        numerator / denominator - 1.0
    }
}

/// A persistent shift in one metric's mean
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePoint {
    pub metric: String,
    /// First observation of the new regime
    pub index: usize,
    pub time: i64,
    pub stats: ComparativeStats,
}

impl ChangePoint {
    pub fn p_value(&self) -> f64 {
        self.stats.p_value
    }

    pub fn relative_change(&self) -> f64 {
        self.stats.relative_change()
    }

    pub fn forward_change_percent(&self) -> f64 {
        self.stats.forward_change_percent()
    }

    pub fn backward_change_percent(&self) -> f64 {
        self.stats.backward_change_percent()
    }

    pub fn magnitude(&self) -> f64 {
        self.stats.magnitude()
    }
}

/// Maximal run `[start, end)` of one metric with no change point inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub stats: SegmentStats,
}

impl Segment {
    pub(crate) fn over(values: &[f64], start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            stats: SegmentStats::from_values(&values[start..end]),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Change points of several metrics sharing the same index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePointGroup {
    pub index: usize,
    pub time: i64,
    pub prev_time: i64,
    pub attributes: BTreeMap<String, String>,
    pub prev_attributes: BTreeMap<String, String>,
    pub changes: Vec<ChangePoint>,
}
