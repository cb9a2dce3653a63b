// Recursive bisection with a permutation significance test
//
// Each pending range is split at the point of maximal mean-shift divergence.
// The split is kept only if shuffling the range rarely produces an equally
// large divergence; accepted splits push both halves back onto the work list.
// The permutation test calibrates itself to the noise of the range being
// split, so no fixed threshold on the data is needed.

use crate::changepoint::divergence::{best_split, max_divergence};
use crate::config::AnalysisConfig;
use crate::error::{InputError, Result};
use crate::report::{ChangePoint, ComparativeStats, SegmentStats};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Split accepted by the permutation test
#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    index: usize,
    p_value: f64,
}

/// Change-point detector for a single metric
///
/// Direction-agnostic: whether a shift is good or bad is decided later,
/// when verdicts are labeled.
///
/// # Example
/// ```
/// use perfshift::{AnalysisConfig, ChangePointDetector};
///
/// let config = AnalysisConfig::default().with_min_segment_size(2);
/// let detector = ChangePointDetector::new(config).unwrap();
///
/// let values = [10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 9.0, 9.0, 9.0];
/// let change_points = detector.detect(&values).unwrap();
/// assert_eq!(change_points.len(), 1);
/// assert_eq!(change_points[0].index, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ChangePointDetector {
    config: AnalysisConfig,
}

impl ChangePointDetector {
    /// Create a detector, rejecting invalid configuration up front
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Detect change points in an anonymous series indexed by position
    ///
    /// Returned change points have an empty metric name and `time == index`.
    /// The generator is seeded from the configured base seed.
    pub fn detect(&self, values: &[f64]) -> Result<Vec<ChangePoint>> {
        let times: Vec<i64> = (0..values.len() as i64).collect();
        self.detect_metric("", &times, values, self.config.resolve_seed())
    }

    /// Detect change points in one named metric column
    ///
    /// `times` must be aligned with `values`. Identical inputs and seed give
    /// identical output.
    pub fn detect_metric(
        &self,
        metric: &str,
        times: &[i64],
        values: &[f64],
        seed: u64,
    ) -> Result<Vec<ChangePoint>> {
        if times.len() != values.len() {
            return Err(InputError::LengthMismatch {
                column: metric.to_string(),
                expected: times.len(),
                actual: values.len(),
            }
            .into());
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(InputError::NonFiniteValue {
                metric: metric.to_string(),
                index,
                value,
            }
            .into());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let splits = self.find_splits(values, &mut rng);
        let stats = self.prune_small_changes(values, splits);

        Ok(stats
            .into_iter()
            .map(|(split, stats)| ChangePoint {
                metric: metric.to_string(),
                index: split.index,
                time: times[split.index],
                stats,
            })
            .collect())
    }

    /// Work-list bisection; returns accepted splits ordered by index
    fn find_splits<R: Rng + ?Sized>(&self, values: &[f64], rng: &mut R) -> Vec<Split> {
        let min = self.config.min_segment_size;
        let mut accepted = Vec::new();
        let mut pending = vec![(0, values.len())];
        let mut scratch = Vec::with_capacity(values.len());

        while let Some((start, end)) = pending.pop() {
            let range = &values[start..end];
            if is_constant(range) {
                continue;
            }
            let Some(best) = best_split(range, min) else {
                continue;
            };
            if best.statistic.is_nan() || best.statistic <= 0.0 {
                continue;
            }

            let p_value = self.permutation_p_value(range, best.statistic, rng, &mut scratch);
            let index = start + best.offset;

            if p_value <= self.config.significance {
                debug!(start, end, index, p_value, "accepted split");
                accepted.push(Split { index, p_value });
                // pop the left half first so generator draws follow index order
                pending.push((index, end));
                pending.push((start, index));
            } else {
                debug!(start, end, index, p_value, "rejected split");
            }
        }

        accepted.sort_by_key(|s| s.index);
        accepted
    }

    /// Fraction of shuffles whose best divergence is >= the observed one
    ///
    /// Stops early once the fraction already exceeds the significance level;
    /// the value returned then is a lower bound, which still rejects.
    fn permutation_p_value<R: Rng + ?Sized>(
        &self,
        range: &[f64],
        observed: f64,
        rng: &mut R,
        scratch: &mut Vec<f64>,
    ) -> f64 {
        let trials = self.config.permutations;
        scratch.clear();
        scratch.extend_from_slice(range);

        let mut exceeded = 0usize;
        for _ in 0..trials {
            scratch.shuffle(rng);
            if max_divergence(scratch, self.config.min_segment_size) >= observed {
                exceeded += 1;
                if exceeded as f64 / trials as f64 > self.config.significance {
                    break;
                }
            }
        }

        exceeded as f64 / trials as f64
    }

    /// Attach final-segment statistics, dropping changes below `min_magnitude`
    ///
    /// Removes the weakest offending change point one at a time, since each
    /// removal merges two segments and changes its neighbours' statistics.
    fn prune_small_changes(
        &self,
        values: &[f64],
        mut splits: Vec<Split>,
    ) -> Vec<(Split, ComparativeStats)> {
        loop {
            let stats = segment_stats(values, &splits);
            if self.config.min_magnitude <= 0.0 {
                return stats;
            }

            let weakest = stats
                .iter()
                .enumerate()
                .filter(|(_, (_, s))| s.magnitude() < self.config.min_magnitude)
                .min_by(|(_, (_, a)), (_, (_, b))| a.magnitude().total_cmp(&b.magnitude()))
                .map(|(position, _)| position);

            match weakest {
                Some(position) => {
                    let removed = splits.remove(position);
                    debug!(
                        index = removed.index,
                        min_magnitude = self.config.min_magnitude,
                        "dropped change below minimum magnitude"
                    );
                }
                None => return stats,
            }
        }
    }
}

/// Before/after statistics of each split over its neighbouring splits
fn segment_stats(values: &[f64], splits: &[Split]) -> Vec<(Split, ComparativeStats)> {
    splits
        .iter()
        .enumerate()
        .map(|(k, split)| {
            let start = if k == 0 { 0 } else { splits[k - 1].index };
            let end = splits.get(k + 1).map_or(values.len(), |s| s.index);
            let stats = ComparativeStats {
                before: SegmentStats::from_values(&values[start..split.index]),
                after: SegmentStats::from_values(&values[split.index..end]),
                p_value: split.p_value,
            };
            (*split, stats)
        })
        .collect()
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
