//! Multi-metric change-point analysis
//!
//! Runs the detector independently over every metric of a `TimeSeries` and
//! keeps the results next to the series so segments, stable ranges and
//! per-time groupings can be derived on demand.

use crate::changepoint::{metric_seed, ChangePointDetector};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, InputError, Result};
use crate::report::{ChangePoint, ChangePointGroup, Segment};
use crate::series::TimeSeries;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Orchestrates the detector across all metrics of a series
///
/// Metrics share no mutable state, so with `parallel` enabled they are
/// spread over scoped worker threads. Each metric draws from its own
/// generator (see [`metric_seed`]), so the output matches a sequential run.
#[derive(Debug, Clone)]
pub struct MultiMetricAnalyzer {
    detector: ChangePointDetector,
}

impl MultiMetricAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            detector: ChangePointDetector::new(config)?,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.detector.config()
    }

    /// Compute change points for every metric of `series`
    pub fn analyze(&self, series: TimeSeries) -> Result<AnalyzedSeries> {
        let base_seed = self.config().resolve_seed();
        let names: Vec<&str> = series.metric_names().collect();
        info!(
            series = series.name(),
            metrics = names.len(),
            points = series.len(),
            "computing change points"
        );

        let results = if self.config().parallel && names.len() > 1 {
            self.detect_parallel(&series, &names, base_seed)?
        } else {
            names
                .iter()
                .map(|name| self.detect_one(&series, name, base_seed))
                .collect()
        };

        let mut change_points = BTreeMap::new();
        for (name, result) in names.iter().zip(results) {
            let found = result?;
            debug!(metric = *name, count = found.len(), "metric analyzed");
            change_points.insert(name.to_string(), found);
        }

        Ok(AnalyzedSeries {
            series,
            config: self.config().clone(),
            change_points,
        })
    }

    fn detect_one(
        &self,
        series: &TimeSeries,
        metric: &str,
        base_seed: u64,
    ) -> Result<Vec<ChangePoint>> {
        let values = series.values(metric)?;
        self.detector
            .detect_metric(metric, series.times(), values, metric_seed(base_seed, metric))
    }

    /// Strided fan-out over a bounded number of scoped threads
    fn detect_parallel(
        &self,
        series: &TimeSeries,
        names: &[&str],
        base_seed: u64,
    ) -> Result<Vec<Result<Vec<ChangePoint>>>> {
        let workers = std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .min(names.len());

        let outcome = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move |_| {
                        names
                            .iter()
                            .enumerate()
                            .skip(worker)
                            .step_by(workers)
                            .map(|(position, name)| {
                                (position, self.detect_one(series, name, base_seed))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        })
        .map_err(|_| AnalysisError::Worker("detection scope panicked".to_string()))?;

        let mut ordered: Vec<Option<Result<Vec<ChangePoint>>>> = vec![None; names.len()];
        for joined in outcome {
            let batch = joined
                .map_err(|_| AnalysisError::Worker("detection worker panicked".to_string()))?;
            for (position, result) in batch {
                ordered[position] = Some(result);
            }
        }

        ordered
            .into_iter()
            .zip(names)
            .map(|(result, name)| {
                result.ok_or_else(|| {
                    AnalysisError::Worker(format!("metric '{}' was not analyzed", name))
                })
            })
            .collect()
    }
}

/// Compute change points for every metric, keyed by metric name
///
/// Uses the default permutation count and seed.
pub fn analyze(
    series: &TimeSeries,
    significance: f64,
    min_segment_size: usize,
) -> Result<BTreeMap<String, Vec<ChangePoint>>> {
    let config = AnalysisConfig::default()
        .with_significance(significance)
        .with_min_segment_size(min_segment_size);
    let analyzed = MultiMetricAnalyzer::new(config)?.analyze(series.clone())?;
    Ok(analyzed.change_points)
}

/// Range around `index` bounded by the enclosing change points of one metric
///
/// `change_points` must be ordered by index, as the detector returns them.
pub fn stable_range(change_points: &[ChangePoint], len: usize, index: usize) -> (usize, usize) {
    let after = change_points.partition_point(|cp| cp.index <= index);
    let begin = after.checked_sub(1).map_or(0, |k| change_points[k].index);
    let end = change_points.get(after).map_or(len, |cp| cp.index);
    (begin, end)
}

/// A series together with the change points found in each metric
#[derive(Debug, Clone)]
pub struct AnalyzedSeries {
    series: TimeSeries,
    config: AnalysisConfig,
    change_points: BTreeMap<String, Vec<ChangePoint>>,
}

impl AnalyzedSeries {
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        self.series.name()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn all_change_points(&self) -> &BTreeMap<String, Vec<ChangePoint>> {
        &self.change_points
    }

    pub fn change_points(&self, metric: &str) -> Result<&[ChangePoint]> {
        self.change_points
            .get(metric)
            .map(Vec::as_slice)
            .ok_or_else(|| InputError::UnknownMetric(metric.to_string()).into())
    }

    /// Range `[begin, end)` around `index` containing no change point of `metric`
    ///
    /// `begin` is the nearest change point at or before `index` (or 0), `end`
    /// the nearest change point after it (or the series length).
    pub fn stable_range(&self, metric: &str, index: usize) -> Result<(usize, usize)> {
        Ok(stable_range(self.change_points(metric)?, self.len(), index))
    }

    /// Segment of `metric` containing `index`
    pub fn segment_at(&self, metric: &str, index: usize) -> Result<Segment> {
        if index >= self.len() {
            return Err(InputError::IndexOutOfRange {
                index,
                len: self.len(),
            }
            .into());
        }
        let (begin, end) = self.stable_range(metric, index)?;
        Ok(Segment::over(self.series.values(metric)?, begin, end))
    }

    /// All segments of `metric`, in order, covering the whole series
    pub fn segments(&self, metric: &str) -> Result<Vec<Segment>> {
        let values = self.series.values(metric)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let mut bounds = vec![0];
        bounds.extend(self.change_points(metric)?.iter().map(|cp| cp.index));
        bounds.push(values.len());

        Ok(bounds
            .windows(2)
            .map(|w| Segment::over(values, w[0], w[1]))
            .collect())
    }

    /// Change points of all metrics grouped by the index they occur at
    pub fn change_points_by_time(&self) -> Vec<ChangePointGroup> {
        let mut changes: Vec<&ChangePoint> = self
            .series
            .metric_names()
            .filter_map(|name| self.change_points.get(name))
            .flatten()
            .collect();
        // stable: metrics keep insertion order within a group
        changes.sort_by_key(|cp| cp.index);

        let times = self.series.times();
        let mut groups: Vec<ChangePointGroup> = Vec::new();
        for cp in changes {
            match groups.last_mut() {
                Some(group) if group.index == cp.index => group.changes.push(cp.clone()),
                _ => groups.push(ChangePointGroup {
                    index: cp.index,
                    time: times[cp.index],
                    prev_time: times[cp.index - 1],
                    attributes: self.series.attributes_at(cp.index),
                    prev_attributes: self.series.attributes_at(cp.index - 1),
                    changes: vec![cp.clone()],
                }),
            }
        }
        groups
    }
}
