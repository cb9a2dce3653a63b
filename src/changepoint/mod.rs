// Change-point detection with an E-divisive style bisection
//
// This module locates persistent shifts in the mean of a single metric.
// Candidate splits are ranked by a distribution-free mean-shift divergence and
// accepted only when a permutation test says the divergence is unlikely under
// "no change". Thresholds therefore adapt to the noise of each segment.
//
// Determinism: the permutation generator is ChaCha8 seeded per metric from the
// configured base seed and an FNV-1a hash of the metric name, so output does
// not depend on metric order or on which worker thread ran the metric.

mod detector;
mod divergence;

pub use detector::ChangePointDetector;

use crate::config::{AnalysisConfig, DEFAULT_SEED};
use crate::error::Result;
use crate::report::ChangePoint;
use std::hash::Hasher;

/// Detect change points in a single series of values
///
/// Uses the default permutation count and `DEFAULT_SEED`. Returned change
/// points have an empty metric name and `time == index`.
///
/// # Example
/// ```
/// let values = [10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 9.0, 9.0, 9.0];
/// let change_points = perfshift::changepoint::detect(&values, 0.05, 2).unwrap();
/// assert_eq!(change_points[0].index, 5);
/// ```
pub fn detect(values: &[f64], significance: f64, min_segment_size: usize) -> Result<Vec<ChangePoint>> {
    let config = AnalysisConfig {
        significance,
        min_segment_size,
        seed: Some(DEFAULT_SEED),
        ..AnalysisConfig::default()
    };
    ChangePointDetector::new(config)?.detect(values)
}

/// Generator seed for one metric derived from the run's base seed
pub fn metric_seed(base_seed: u64, metric: &str) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(metric.as_bytes());
    base_seed ^ hasher.finish()
}
