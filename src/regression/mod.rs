// Statistical Regression Detection with Hypothesis Testing
//
// Compares a target window of a series against a baseline window. Both windows
// are widened to the stable segments produced by change-point detection, so
// the comparison never mixes data from different regimes.
//
// Key Innovation: No magic percentage thresholds. A change counts only when
// Welch's t-test finds it significant at the configured level, and the
// metric's direction decides whether it is a regression or an improvement.
//
// Implementation:
// - Uses aprender (crates.io) for Welch's t-test
// - Uses trueno (crates.io) for SIMD-optimized vector statistics
// - Uses aprender's DescriptiveStats for quantiles and median calculation

mod comparator;
mod selector;
mod statistics;
mod verdict;

pub use comparator::RegressionComparator;
pub use selector::{BaselineSelector, TargetSelector};
pub use statistics::{compare_distributions, median, StatisticalTest};
pub use verdict::{RegressionReport, RegressionResult, Verdict};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::report::ChangePoint;
use crate::series::TimeSeries;
use std::collections::BTreeMap;

/// Compare every metric of `series` at the given significance level
///
/// `change_points` holds the detector output per metric; metrics missing from
/// it are compared as a single segment. All other settings use defaults.
pub fn compare(
    series: &TimeSeries,
    change_points: &BTreeMap<String, Vec<ChangePoint>>,
    baseline: &BaselineSelector,
    target: TargetSelector,
    significance: f64,
) -> Result<RegressionReport> {
    let config = AnalysisConfig::default().with_significance(significance);
    RegressionComparator::new(config)?.compare(series, change_points, baseline, target)
}
