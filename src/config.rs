// Configuration for change-point detection and regression comparison
//
// Key Innovation: No fixed thresholds on the data itself. The permutation test
// judges each candidate split against the noise of its own segment.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Seed used when none is configured explicitly
pub const DEFAULT_SEED: u64 = 0x5eed_0f_c4a9;

/// Configuration shared by detection, multi-metric analysis and comparison
///
/// # Example
/// ```
/// use perfshift::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.significance, 0.05); // 95% confidence
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum p-value for a split (or a comparison) to count as significant
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: stricter, fewer spurious change points
    /// - 0.10: looser, catches small shifts earlier
    ///
    /// Must lie strictly between 0 and 1.
    pub significance: f64,

    /// Minimum number of points on each side of a split
    ///
    /// Guards against single outliers being reported as regime changes and
    /// bounds the cost of each permutation test. A range shorter than twice
    /// this value is never split.
    ///
    /// Default: 3
    pub min_segment_size: usize,

    /// Number of random permutations per significance test
    ///
    /// The smallest non-zero p-value that can be observed is `1 / permutations`.
    ///
    /// Default: 1000
    pub permutations: usize,

    /// Base seed for the permutation generator
    ///
    /// `Some(seed)` (the default, `DEFAULT_SEED`) makes every run on the same
    /// input return identical results. `None` draws a fresh seed from system
    /// entropy for each analysis.
    pub seed: Option<u64>,

    /// Minimum |relative change| for a change point to be reported
    ///
    /// Default: 0.0 (report every significant shift)
    pub min_magnitude: f64,

    /// Run per-metric detection on worker threads
    ///
    /// Results are identical to sequential execution.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,      // 95% confidence (standard in science)
            min_segment_size: 3,     // Smallest segment with a usable variance
            permutations: 1000,      // p-value resolution of 0.001
            seed: Some(DEFAULT_SEED),
            min_magnitude: 0.0,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a strict configuration (fewer false positives, more false negatives)
    pub fn strict() -> Self {
        Self {
            significance: 0.01, // 99% confidence
            min_segment_size: 5,
            permutations: 2000,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (more false positives, fewer false negatives)
    pub fn permissive() -> Self {
        Self {
            significance: 0.10, // 90% confidence
            min_segment_size: 2,
            permutations: 500,
            ..Self::default()
        }
    }

    /// Copy of this configuration with a different significance level
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    /// Copy of this configuration with a different minimum segment size
    pub fn with_min_segment_size(mut self, min_segment_size: usize) -> Self {
        self.min_segment_size = min_segment_size;
        self
    }

    /// Copy of this configuration with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Smallest series length that can contain a change point
    pub fn min_analyzable_len(&self) -> usize {
        self.min_segment_size.saturating_mul(2)
    }

    /// Base seed for this run, drawing from entropy when none is configured
    pub(crate) fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.significance.is_nan() || self.significance <= 0.0 || self.significance >= 1.0 {
            return Err(AnalysisError::Configuration(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }

        if self.min_segment_size == 0 {
            return Err(AnalysisError::Configuration(
                "min_segment_size must be positive, got 0".to_string(),
            ));
        }

        if self.permutations == 0 {
            return Err(AnalysisError::Configuration(
                "permutations must be positive, got 0".to_string(),
            ));
        }

        if !self.min_magnitude.is_finite() || self.min_magnitude < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "min_magnitude must be a non-negative number, got {}",
                self.min_magnitude
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.significance, 0.05);
        assert_eq!(config.min_segment_size, 3);
        assert_eq!(config.permutations, 1000);
        assert_eq!(config.seed, Some(DEFAULT_SEED));
        assert_eq!(config.min_magnitude, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = AnalysisConfig::strict();
        assert_eq!(config.significance, 0.01);
        assert_eq!(config.min_segment_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = AnalysisConfig::permissive();
        assert_eq!(config.significance, 0.10);
        assert_eq!(config.min_segment_size, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_significance() {
        for bad in [0.0, 1.0, 1.5, -0.1, f64::NAN] {
            let config = AnalysisConfig::default().with_significance(bad);
            assert!(
                matches!(config.validate(), Err(AnalysisError::Configuration(_))),
                "significance {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_min_segment_size() {
        let config = AnalysisConfig::default().with_min_segment_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_permutations() {
        let mut config = AnalysisConfig::default();
        config.permutations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_magnitude() {
        let mut config = AnalysisConfig::default();
        config.min_magnitude = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_analyzable_len() {
        assert_eq!(AnalysisConfig::default().min_analyzable_len(), 6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str("significance = 0.01\nparallel = false\n")
            .expect("partial config should deserialize");
        assert_eq!(config.significance, 0.01);
        assert!(!config.parallel);
        assert_eq!(config.min_segment_size, 3);
        assert_eq!(config.seed, Some(DEFAULT_SEED));
    }

    #[test]
    fn test_json_roundtrip_keeps_seed() {
        let config = AnalysisConfig::strict().with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
