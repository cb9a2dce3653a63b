//! Ordered performance measurements for one test
//!
//! A `TimeSeries` holds one time axis and any number of positionally aligned
//! metric columns and attribute columns. It is validated once on construction
//! and immutable afterwards.

use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which way a metric moves when performance gets better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    /// Throughput-like metrics
    #[default]
    HigherIsBetter,
    /// Latency-like metrics
    LowerIsBetter,
}

impl Direction {
    /// +1 for `HigherIsBetter`, -1 for `LowerIsBetter`
    pub fn sign(self) -> f64 {
        match self {
            Direction::HigherIsBetter => 1.0,
            Direction::LowerIsBetter => -1.0,
        }
    }

    /// True if moving from `before` to `after` makes performance worse
    pub fn is_worse(self, before: f64, after: f64) -> bool {
        self.sign() * (after - before) < 0.0
    }
}

/// Metric metadata used only for labeling verdicts and rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub direction: Direction,
    /// Display multiplier applied by reporters
    pub scale: f64,
    pub unit: String,
}

impl Metric {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            scale: 1.0,
            unit: String::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::new(Direction::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MetricColumn {
    name: String,
    metric: Metric,
    values: Vec<f64>,
}

/// Immutable, validated series of measurements
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    branch: Option<String>,
    times: Vec<i64>,
    metrics: Vec<MetricColumn>,
    attributes: BTreeMap<String, Vec<String>>,
}

impl TimeSeries {
    pub fn builder(name: impl Into<String>) -> TimeSeriesBuilder {
        TimeSeriesBuilder::new(name)
    }

    /// Test name this series belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// Metric names in insertion order
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn metric(&self, name: &str) -> Result<&Metric> {
        self.column(name)
            .map(|c| &c.metric)
            .ok_or_else(|| InputError::UnknownMetric(name.to_string()).into())
    }

    pub fn values(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| InputError::UnknownMetric(name.to_string()).into())
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn attribute_values(&self, name: &str) -> Result<&[String]> {
        self.attributes
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| InputError::UnknownAttribute(name.to_string()).into())
    }

    /// All attribute values at one position
    pub fn attributes_at(&self, index: usize) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(k, v)| v.get(index).map(|value| (k.clone(), value.clone())))
            .collect()
    }

    /// First index whose time is at or after `time`
    pub fn find_first_not_earlier_than(&self, time: i64) -> Option<usize> {
        // times are non-decreasing
        let index = self.times.partition_point(|&t| t < time);
        (index < self.times.len()).then_some(index)
    }

    /// Indexes of all points whose attribute `name` equals `value`
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Vec<usize> {
        self.attributes
            .get(name)
            .map(|column| {
                column
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.as_str() == value)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn column(&self, name: &str) -> Option<&MetricColumn> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Builder that validates columns before producing a `TimeSeries`
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    name: String,
    branch: Option<String>,
    times: Option<Vec<i64>>,
    metrics: Vec<(String, Metric, Result<Vec<f64>>)>,
    attributes: Vec<(String, Vec<String>)>,
}

impl TimeSeriesBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branch: None,
            times: None,
            metrics: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Timestamps (e.g. unix seconds); omitted means ordinal index
    pub fn times(mut self, times: Vec<i64>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn metric(self, name: impl Into<String>, direction: Direction, values: Vec<f64>) -> Self {
        self.metric_with_info(name, Metric::new(direction), values)
    }

    pub fn metric_with_info(
        mut self,
        name: impl Into<String>,
        metric: Metric,
        values: Vec<f64>,
    ) -> Self {
        self.metrics.push((name.into(), metric, Ok(values)));
        self
    }

    /// Metric column with missing observations, filled by `fill_missing`
    pub fn metric_with_gaps(
        mut self,
        name: impl Into<String>,
        direction: Direction,
        values: Vec<Option<f64>>,
    ) -> Self {
        let name = name.into();
        let filled: Result<Vec<f64>> = fill_missing(&values)
            .ok_or_else(|| InputError::EmptyColumn(name.clone()).into());
        self.metrics.push((name, Metric::new(direction), filled));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.push((name.into(), values));
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let len = match (&self.times, self.metrics.first()) {
            (Some(times), _) => times.len(),
            (None, Some((_, _, Ok(values)))) => values.len(),
            (None, Some((name, _, Err(_)))) => {
                return Err(InputError::EmptyColumn(name.clone()).into())
            }
            (None, None) => self.attributes.first().map_or(0, |(_, v)| v.len()),
        };
        let times = self.times.unwrap_or_else(|| (0..len as i64).collect());

        for (index, pair) in times.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(InputError::UnorderedTimes {
                    index: index + 1,
                    previous: pair[0],
                    time: pair[1],
                }
                .into());
            }
        }

        let mut metrics: Vec<MetricColumn> = Vec::with_capacity(self.metrics.len());
        for (name, metric, values) in self.metrics {
            let values = values?;
            if metrics.iter().any(|m| m.name == name) {
                return Err(InputError::DuplicateColumn(name).into());
            }
            check_len(&name, len, values.len())?;
            if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite())
            {
                return Err(InputError::NonFiniteValue {
                    metric: name,
                    index,
                    value,
                }
                .into());
            }
            metrics.push(MetricColumn {
                name,
                metric,
                values,
            });
        }

        let mut attributes = BTreeMap::new();
        for (name, values) in self.attributes {
            check_len(&name, len, values.len())?;
            if attributes.insert(name.clone(), values).is_some() {
                return Err(InputError::DuplicateColumn(name).into());
            }
        }

        Ok(TimeSeries {
            name: self.name,
            branch: self.branch,
            times,
            metrics,
            attributes,
        })
    }
}

fn check_len(column: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(InputError::LengthMismatch {
            column: column.to_string(),
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Forward-fill gaps with the previous observation
///
/// Leading gaps take the first observed value. Returns `None` when the
/// column has no observation at all.
pub fn fill_missing(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().next().copied()?;
    let mut last = first;
    Some(
        values
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    last = *v;
                }
                last
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn sample() -> TimeSeries {
        TimeSeries::builder("cassandra-write")
            .times(vec![100, 200, 200, 300])
            .metric("throughput", Direction::HigherIsBetter, vec![1.0, 2.0, 3.0, 4.0])
            .metric("p99", Direction::LowerIsBetter, vec![9.0, 8.0, 7.0, 6.0])
            .attribute(
                "commit",
                vec!["a1".into(), "b2".into(), "c3".into(), "b2".into()],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_keeps_metric_order() {
        let series = sample();
        let names: Vec<_> = series.metric_names().collect();
        assert_eq!(names, vec!["throughput", "p99"]);
        assert_eq!(series.len(), 4);
        assert_eq!(
            series.metric("p99").unwrap().direction,
            Direction::LowerIsBetter
        );
    }

    #[test]
    fn test_ordinal_times_when_missing() {
        let series = TimeSeries::builder("t")
            .metric("m", Direction::HigherIsBetter, vec![1.0, 1.0, 1.0])
            .build()
            .unwrap();
        assert_eq!(series.times(), &[0, 1, 2]);
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = TimeSeries::builder("empty")
            .metric("m", Direction::HigherIsBetter, vec![])
            .build()
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_rejects_nan() {
        let err = TimeSeries::builder("t")
            .metric("m", Direction::HigherIsBetter, vec![1.0, f64::NAN])
            .build()
            .unwrap_err();
        match err {
            AnalysisError::Input(InputError::NonFiniteValue { metric, index, .. }) => {
                assert_eq!(metric, "m");
                assert_eq!(index, 1);
            }
            other => panic!("Expected NonFiniteValue, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_infinity() {
        let result = TimeSeries::builder("t")
            .metric("m", Direction::HigherIsBetter, vec![f64::INFINITY, 1.0])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = TimeSeries::builder("t")
            .times(vec![1, 2, 3])
            .metric("m", Direction::HigherIsBetter, vec![1.0, 2.0])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_short_attribute() {
        let result = TimeSeries::builder("t")
            .metric("m", Direction::HigherIsBetter, vec![1.0, 2.0])
            .attribute("commit", vec!["a".into()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unordered_times() {
        let err = TimeSeries::builder("t")
            .times(vec![10, 5])
            .metric("m", Direction::HigherIsBetter, vec![1.0, 2.0])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::UnorderedTimes { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_metric() {
        let result = TimeSeries::builder("t")
            .metric("m", Direction::HigherIsBetter, vec![1.0])
            .metric("m", Direction::LowerIsBetter, vec![1.0])
            .build();
        assert!(matches!(
            result,
            Err(AnalysisError::Input(InputError::DuplicateColumn(_)))
        ));
    }

    #[test]
    fn test_find_first_not_earlier_than() {
        let series = sample();
        assert_eq!(series.find_first_not_earlier_than(0), Some(0));
        assert_eq!(series.find_first_not_earlier_than(150), Some(1));
        assert_eq!(series.find_first_not_earlier_than(200), Some(1));
        assert_eq!(series.find_first_not_earlier_than(300), Some(3));
        assert_eq!(series.find_first_not_earlier_than(301), None);
    }

    #[test]
    fn test_find_by_attribute() {
        let series = sample();
        assert_eq!(series.find_by_attribute("commit", "b2"), vec![1, 3]);
        assert!(series.find_by_attribute("commit", "zz").is_empty());
        assert!(series.find_by_attribute("version", "b2").is_empty());
    }

    #[test]
    fn test_attributes_at() {
        let series = sample();
        let attrs = series.attributes_at(2);
        assert_eq!(attrs.get("commit").map(String::as_str), Some("c3"));
    }

    #[test]
    fn test_fill_missing() {
        let filled = fill_missing(&[None, Some(2.0), None, Some(4.0), None]).unwrap();
        assert_eq!(filled, vec![2.0, 2.0, 2.0, 4.0, 4.0]);
        assert!(fill_missing(&[None, None]).is_none());
        assert_eq!(fill_missing(&[]), None);
    }

    #[test]
    fn test_metric_with_gaps() {
        let series = TimeSeries::builder("t")
            .metric_with_gaps("m", Direction::LowerIsBetter, vec![Some(1.0), None, Some(3.0)])
            .build()
            .unwrap();
        assert_eq!(series.values("m").unwrap(), &[1.0, 1.0, 3.0]);

        let err = TimeSeries::builder("t")
            .metric_with_gaps("m", Direction::LowerIsBetter, vec![None, None])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::EmptyColumn(_))
        ));
    }

    #[test]
    fn test_direction_is_worse() {
        assert!(Direction::HigherIsBetter.is_worse(10.0, 9.0));
        assert!(!Direction::HigherIsBetter.is_worse(9.0, 10.0));
        assert!(Direction::LowerIsBetter.is_worse(9.0, 10.0));
        assert!(!Direction::LowerIsBetter.is_worse(10.0, 10.0));
    }
}
