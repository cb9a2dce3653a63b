//! Perfshift - change-point detection and regression comparison for benchmark series
//!
//! This library finds persistent shifts in the mean of performance metrics
//! recorded over successive runs, using an E-divisive style bisection with a
//! permutation significance test, and decides whether recent data regressed
//! against a baseline with Welch's t-test over the resulting stable segments.
//!
//! # Example
//! ```
//! use perfshift::{AnalysisConfig, ChangePointDetector};
//!
//! let detector = ChangePointDetector::new(AnalysisConfig::default().with_min_segment_size(2)).unwrap();
//! let change_points = detector
//!     .detect(&[10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 9.0, 9.0, 9.0, 9.0])
//!     .unwrap();
//!
//! assert_eq!(change_points.len(), 1);
//! assert_eq!(change_points[0].index, 5);
//! ```

pub mod analysis;
pub mod changepoint;
pub mod config;
pub mod error;
pub mod regression;
pub mod report;
pub mod series;

pub use analysis::{AnalyzedSeries, MultiMetricAnalyzer};
pub use changepoint::ChangePointDetector;
pub use config::{AnalysisConfig, DEFAULT_SEED};
pub use error::{AnalysisError, InputError, Result};
pub use regression::{
    BaselineSelector, RegressionComparator, RegressionReport, RegressionResult, TargetSelector,
    Verdict,
};
pub use report::{ChangePoint, ChangePointGroup, ComparativeStats, Segment, SegmentStats};
pub use series::{Direction, Metric, TimeSeries, TimeSeriesBuilder};
