// Baseline and target window selection
//
// Selectors are resolved once to plain indexes before any segment lookup,
// which keeps the resolution policy out of the comparison logic.

use crate::error::{AnalysisError, InputError, Result};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};

/// Where the baseline of a comparison is taken from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BaselineSelector {
    /// First point of the series
    #[default]
    Start,
    /// Explicit position
    Index(usize),
    /// First point at or after a timestamp
    NotEarlierThan(i64),
    /// First point whose attribute (e.g. commit or version) has the given value
    Attribute { name: String, value: String },
}

impl BaselineSelector {
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        BaselineSelector::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Resolve to an index into a non-empty `series`
    pub fn resolve(&self, series: &TimeSeries) -> Result<usize> {
        let len = series.len();
        match self {
            BaselineSelector::Start if len > 0 => Ok(0),
            BaselineSelector::Start => Err(InputError::IndexOutOfRange { index: 0, len }.into()),
            BaselineSelector::Index(index) if *index < len => Ok(*index),
            BaselineSelector::Index(index) => Err(InputError::IndexOutOfRange {
                index: *index,
                len,
            }
            .into()),
            BaselineSelector::NotEarlierThan(time) => series
                .find_first_not_earlier_than(*time)
                .ok_or_else(|| InputError::NoMatchingPoint(format!("time >= {}", time)).into()),
            BaselineSelector::Attribute { name, value } => {
                series.attribute_values(name)?;
                series
                    .find_by_attribute(name, value)
                    .first()
                    .copied()
                    .ok_or_else(|| {
                        InputError::NoMatchingPoint(format!("{} = {}", name, value)).into()
                    })
            }
        }
    }
}

/// Which recent data is compared against the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetSelector {
    /// Segment containing the last point of the series
    #[default]
    Tail,
    /// Segment containing a given position
    At(usize),
    /// Exactly the final N points, bypassing segment boundaries
    Last(usize),
}

impl TargetSelector {
    pub(crate) fn validate(&self, len: usize) -> Result<()> {
        match *self {
            TargetSelector::Last(n) if n < 2 => Err(AnalysisError::Configuration(format!(
                "last-N target needs at least 2 points, got {}",
                n
            ))),
            TargetSelector::At(index) if index >= len => {
                Err(InputError::IndexOutOfRange { index, len }.into())
            }
            _ => Ok(()),
        }
    }
}
