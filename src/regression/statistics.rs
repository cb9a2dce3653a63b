// Two-sample statistics for regression comparison using aprender
//
// This module wraps aprender's hypothesis testing and trueno's vector primitives
// to compare a baseline segment against a target segment.
//
// Scientific Foundation:
// - Welch's t-test variant handles unequal variances between segments
// - Two-sided p-values from the t-distribution with Welch-Satterthwaite df
// - Uses aprender::stats::DescriptiveStats for the median
//
// aprender and trueno operate on f32. Both segments are centred on the baseline
// mean in f64 before narrowing, so large-magnitude metrics (nanosecond
// latencies, byte counts) keep their spread. Welch's t is shift-invariant.

use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

/// Result of Welch's t-test between a baseline and a target segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticalTest {
    /// t-statistic value
    pub statistic: f64,

    /// Two-tailed p-value - probability that the difference is due to chance
    pub pvalue: f64,

    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,

    /// Median of baseline segment
    pub baseline_median: f64,

    /// Median of target segment
    pub target_median: f64,
}

/// Compare two segments using Welch's independent t-test
///
/// Both segments need at least 2 values and the test is only meaningful
/// when at least one of them has non-zero variance; callers resolve the
/// zero-variance case before calling this.
///
/// # Example
/// ```
/// use perfshift::regression::compare_distributions;
///
/// let baseline = vec![10.0, 12.0, 11.0, 13.0, 10.0];
/// let target = vec![25.0, 27.0, 26.0, 28.0, 25.0];
///
/// let result = compare_distributions(&baseline, &target).unwrap();
/// assert!(result.pvalue < 0.05); // Significant difference
/// ```
pub fn compare_distributions(baseline: &[f64], target: &[f64]) -> Result<StatisticalTest> {
    if baseline.is_empty() || target.is_empty() {
        anyhow::bail!("Cannot compare empty segments");
    }

    if baseline.len() < 2 || target.len() < 2 {
        anyhow::bail!("Need at least 2 samples per segment for t-test");
    }

    let shift = baseline.iter().sum::<f64>() / baseline.len() as f64;
    let baseline = narrow(baseline, shift);
    let target = narrow(target, shift);

    // Welch's variant: unequal variances
    let ttest_result = aprender::stats::hypothesis::ttest_ind(&baseline, &target, false)
        .context("Failed to compute t-test")?;

    let baseline_median = median(&Vector::from_slice(&baseline))?;
    let target_median = median(&Vector::from_slice(&target))?;

    Ok(StatisticalTest {
        statistic: f64::from(ttest_result.statistic),
        pvalue: f64::from(ttest_result.pvalue).clamp(0.0, 1.0),
        df: f64::from(ttest_result.df),
        baseline_median: f64::from(baseline_median) + shift,
        target_median: f64::from(target_median) + shift,
    })
}

/// Calculate median using aprender's DescriptiveStats
///
/// Uses aprender's quantile(0.5) which implements the R-7 method with
/// QuickSelect for O(n) performance (Floyd & Rivest 1975).
pub fn median(vector: &Vector<f32>) -> Result<f32> {
    let stats = DescriptiveStats::new(vector);
    stats
        .quantile(0.5)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))
}

/// Residuals around `shift`, narrowed to f32
fn narrow(values: &[f64], shift: f64) -> Vec<f32> {
    values.iter().map(|&v| (v - shift) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_length() {
        let vec = Vector::from_slice(&[1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(median(&vec).unwrap(), 5.0);
    }

    #[test]
    fn test_median_even_length() {
        let vec = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(median(&vec).unwrap(), 2.5);
    }

    #[test]
    fn test_compare_distributions_significant_difference() {
        let baseline = vec![10.0, 12.0, 11.0, 13.0, 10.0];
        let target = vec![25.0, 27.0, 26.0, 28.0, 25.0];

        let result = compare_distributions(&baseline, &target).unwrap();

        assert!(
            result.pvalue < 0.05,
            "p-value {} should be < 0.05",
            result.pvalue
        );
        assert!(result.target_median > result.baseline_median);
        assert!(result.statistic < 0.0);
    }

    #[test]
    fn test_compare_distributions_no_difference() {
        let baseline = vec![10.0, 12.0, 11.0, 13.0, 10.0];
        let target = vec![11.0, 13.0, 10.0, 12.0, 11.0];

        let result = compare_distributions(&baseline, &target).unwrap();

        assert!(
            result.pvalue >= 0.05,
            "p-value {} should be >= 0.05",
            result.pvalue
        );
    }

    /// Nanosecond-scale values: neighbours collapse if narrowed uncentred
    #[test]
    fn test_compare_distributions_large_magnitude() {
        let baseline: Vec<f64> = (0..10).map(|i| 1e9 + f64::from(i % 5)).collect();
        let target: Vec<f64> = (0..10).map(|i| 1e9 + 20.0 + f64::from(i % 5)).collect();

        let result = compare_distributions(&baseline, &target).unwrap();

        assert!(result.pvalue < 0.001, "p-value {} should be near 0", result.pvalue);
        assert!(result.statistic < -20.0, "t = {}", result.statistic);
        assert_eq!(result.baseline_median, 1e9 + 2.0);
        assert_eq!(result.target_median, 1e9 + 22.0);
    }

    #[test]
    fn test_compare_distributions_empty_baseline() {
        let baseline: Vec<f64> = vec![];
        let target = vec![10.0, 12.0];

        assert!(compare_distributions(&baseline, &target).is_err());
    }

    #[test]
    fn test_compare_distributions_insufficient_samples() {
        let baseline = vec![10.0];
        let target = vec![12.0, 13.0];

        assert!(compare_distributions(&baseline, &target).is_err());
    }
}
