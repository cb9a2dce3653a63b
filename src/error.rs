//! Error taxonomy for the analysis engine
//!
//! Structural problems with the input (non-finite values, ragged columns,
//! unordered timestamps) and invalid configuration are raised immediately.
//! Statistical edge cases (too little data, zero variance) are never errors;
//! they resolve to empty or `NoChange` results with well-defined semantics.

use thiserror::Error;

/// Caller or loader bugs detected in a `TimeSeries` or a selector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("non-finite value {value} in metric '{metric}' at index {index}")]
    NonFiniteValue {
        metric: String,
        index: usize,
        value: f64,
    },

    #[error("column '{column}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("timestamps out of order: time[{index}]={time} precedes previous {previous}")]
    UnorderedTimes {
        index: usize,
        previous: i64,
        time: i64,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{0}' has no observed values")]
    EmptyColumn(String),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("no data point matches {0}")]
    NoMatchingPoint(String),

    #[error("index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("change points of '{metric}' not strictly increasing: {index} follows {previous}")]
    UnorderedChangePoints {
        metric: String,
        previous: usize,
        index: usize,
    },
}

/// Errors returned by the public analysis API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("detection worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
