// Baseline-vs-target comparison over stable segments
//
// The baseline and target windows are widened to the segments (runs between
// a metric's own change points) that contain them, then compared with Welch's
// t-test. Degenerate statistics resolve to deterministic verdicts instead of
// errors.

use crate::analysis::{stable_range, AnalyzedSeries};
use crate::config::AnalysisConfig;
use crate::error::{InputError, Result};
use crate::regression::selector::{BaselineSelector, TargetSelector};
use crate::regression::statistics::compare_distributions;
use crate::regression::verdict::{RegressionReport, RegressionResult, Verdict};
use crate::report::{relative_change, ChangePoint, Segment};
use crate::series::{Direction, TimeSeries};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Decides per metric whether recent data regressed against a baseline
///
/// # Example
/// ```
/// use perfshift::{
///     AnalysisConfig, BaselineSelector, Direction, MultiMetricAnalyzer,
///     RegressionComparator, TargetSelector, TimeSeries, Verdict,
/// };
///
/// let series = TimeSeries::builder("bench")
///     .metric(
///         "throughput",
///         Direction::HigherIsBetter,
///         vec![10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 9.0, 9.0, 9.0],
///     )
///     .build()
///     .unwrap();
///
/// let config = AnalysisConfig::default().with_min_segment_size(2);
/// let analyzed = MultiMetricAnalyzer::new(config.clone()).unwrap().analyze(series).unwrap();
/// let report = RegressionComparator::new(config)
///     .unwrap()
///     .compare_analyzed(&analyzed, &BaselineSelector::Start, TargetSelector::Tail)
///     .unwrap();
///
/// assert_eq!(report.results[0].verdict, Verdict::Regressed);
/// ```
#[derive(Debug, Clone)]
pub struct RegressionComparator {
    config: AnalysisConfig,
}

impl RegressionComparator {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compare using the change points stored in `analyzed`
    pub fn compare_analyzed(
        &self,
        analyzed: &AnalyzedSeries,
        baseline: &BaselineSelector,
        target: TargetSelector,
    ) -> Result<RegressionReport> {
        self.compare(
            analyzed.series(),
            analyzed.all_change_points(),
            baseline,
            target,
        )
    }

    /// Compare every metric of `series` using externally supplied change points
    ///
    /// Metrics absent from `change_points` are treated as having none. Change
    /// points must be strictly increasing and lie inside the series.
    /// Series shorter than twice the minimum segment size yield `NoChange`
    /// for every metric, whatever the selectors.
    pub fn compare(
        &self,
        series: &TimeSeries,
        change_points: &BTreeMap<String, Vec<ChangePoint>>,
        baseline: &BaselineSelector,
        target: TargetSelector,
    ) -> Result<RegressionReport> {
        let len = series.len();
        if len == 0 || len < self.config.min_analyzable_len() {
            debug!(series = series.name(), len, "series too short to compare");
            return self.too_short(series);
        }

        target.validate(len)?;
        let baseline_index = baseline.resolve(series)?;
        debug!(series = series.name(), baseline_index, ?target, "comparing");

        let mut results = Vec::new();
        for name in series.metric_names() {
            let values = series.values(name)?;
            let direction = series.metric(name)?.direction;
            let cps = change_points.get(name).map_or(&[][..], Vec::as_slice);
            if let Some(cp) = cps.iter().find(|cp| cp.index == 0 || cp.index >= len) {
                return Err(InputError::IndexOutOfRange {
                    index: cp.index,
                    len,
                }
                .into());
            }
            if let Some(w) = cps.windows(2).find(|w| w[0].index >= w[1].index) {
                return Err(InputError::UnorderedChangePoints {
                    metric: name.to_string(),
                    previous: w[0].index,
                    index: w[1].index,
                }
                .into());
            }

            let (begin, end) = stable_range(cps, len, baseline_index);
            let (baseline_segment, target_segment) = match target {
                TargetSelector::Tail => {
                    let (start, stop) = stable_range(cps, len, len - 1);
                    (
                        Segment::over(values, begin, end),
                        Segment::over(values, start, stop),
                    )
                }
                TargetSelector::At(index) => {
                    let (start, stop) = stable_range(cps, len, index);
                    (
                        Segment::over(values, begin, end),
                        Segment::over(values, start, stop),
                    )
                }
                TargetSelector::Last(n) => {
                    let start = len - n.min(len);
                    // baseline must not overlap the target window
                    let end = end.min(start).max(begin);
                    (
                        Segment::over(values, begin, end),
                        Segment::over(values, start, len),
                    )
                }
            };

            results.push(self.compare_segments(
                name,
                direction,
                (values, baseline_segment),
                (values, target_segment),
            ));
        }

        Ok(RegressionReport {
            name: series.name().to_string(),
            baseline_index: Some(baseline_index),
            significance: self.config.significance,
            results,
        })
    }

    /// Compare the stable range around a point of one run against another run
    ///
    /// `None` selects the most recent point. Only metrics present in both
    /// series are compared; the target series supplies the direction.
    pub fn compare_runs(
        &self,
        baseline: &AnalyzedSeries,
        baseline_index: Option<usize>,
        target: &AnalyzedSeries,
        target_index: Option<usize>,
    ) -> Result<RegressionReport> {
        let baseline_index = resolve_run_index(baseline, baseline_index)?;
        let target_index = resolve_run_index(target, target_index)?;

        let mut results = Vec::new();
        for name in target.series().metric_names() {
            if !baseline.series().has_metric(name) {
                continue;
            }

            let direction = target.series().metric(name)?.direction;
            let baseline_values = baseline.series().values(name)?;
            let target_values = target.series().values(name)?;
            let (b_start, b_end) = baseline.stable_range(name, baseline_index)?;
            let (t_start, t_end) = target.stable_range(name, target_index)?;

            results.push(self.compare_segments(
                name,
                direction,
                (baseline_values, Segment::over(baseline_values, b_start, b_end)),
                (target_values, Segment::over(target_values, t_start, t_end)),
            ));
        }

        Ok(RegressionReport {
            name: format!("{} vs {}", baseline.name(), target.name()),
            baseline_index: Some(baseline_index),
            significance: self.config.significance,
            results,
        })
    }

    fn compare_segments(
        &self,
        metric: &str,
        direction: Direction,
        (baseline_values, baseline): (&[f64], Segment),
        (target_values, target): (&[f64], Segment),
    ) -> RegressionResult {
        let same_segment = std::ptr::eq(baseline_values, target_values)
            && baseline.start == target.start
            && baseline.end == target.end;

        let mut welch = None;
        let p_value = if same_segment || baseline.is_empty() || target.is_empty() {
            debug!(metric, "nothing to compare");
            1.0
        } else if baseline.stats.mean == target.stats.mean {
            1.0
        } else if baseline.stats.std_dev == 0.0 {
            // t undefined: decide by sign alone, with certainty
            debug!(metric, "zero-variance baseline");
            0.0
        } else {
            match compare_distributions(
                &baseline_values[baseline.start..baseline.end],
                &target_values[target.start..target.end],
            ) {
                Ok(test) => {
                    welch = Some(test);
                    test.pvalue
                }
                Err(e) => {
                    warn!("Failed to compare segments for {}: {}", metric, e);
                    1.0
                }
            }
        };

        let (relative, verdict) = if same_segment || baseline.is_empty() || target.is_empty() {
            (0.0, Verdict::NoChange)
        } else {
            (
                relative_change(baseline.stats.mean, target.stats.mean),
                Verdict::classify(
                    direction,
                    baseline.stats.mean,
                    target.stats.mean,
                    p_value,
                    self.config.significance,
                ),
            )
        };

        debug!(metric, p_value, relative, ?verdict, "segments compared");
        RegressionResult {
            metric: metric.to_string(),
            direction,
            baseline_segment: baseline,
            target_segment: target,
            p_value,
            relative_change: relative,
            verdict,
            welch,
        }
    }

    fn too_short(&self, series: &TimeSeries) -> Result<RegressionReport> {
        let mut results = Vec::new();
        for name in series.metric_names() {
            let values = series.values(name)?;
            let whole = Segment::over(values, 0, values.len());
            results.push(RegressionResult {
                metric: name.to_string(),
                direction: series.metric(name)?.direction,
                baseline_segment: whole,
                target_segment: whole,
                p_value: 1.0,
                relative_change: 0.0,
                verdict: Verdict::NoChange,
                welch: None,
            });
        }

        Ok(RegressionReport {
            name: series.name().to_string(),
            baseline_index: None,
            significance: self.config.significance,
            results,
        })
    }
}

fn resolve_run_index(analyzed: &AnalyzedSeries, index: Option<usize>) -> Result<usize> {
    let len = analyzed.len();
    match index {
        Some(index) if index < len => Ok(index),
        None if len > 0 => Ok(len - 1),
        other => Err(InputError::IndexOutOfRange {
            index: other.unwrap_or(0),
            len,
        }
        .into()),
    }
}
