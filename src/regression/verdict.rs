// Regression verdicts per metric
//
// A verdict depends only on significance, the sign of the change and the
// metric's direction. Magnitude alone never decides it.

use crate::regression::statistics::StatisticalTest;
use crate::report::Segment;
use crate::series::Direction;
use serde::Serialize;

/// Outcome of comparing a target segment against a baseline segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    /// Statistically significant change for the worse
    Regressed,
    /// Statistically significant change for the better
    Improved,
    /// Not significant, or nothing to compare
    NoChange,
}

impl Verdict {
    /// Label a comparison from its p-value and direction of change
    pub fn classify(
        direction: Direction,
        baseline_mean: f64,
        target_mean: f64,
        p_value: f64,
        significance: f64,
    ) -> Self {
        // NaN p-value: not significant
        if p_value.is_nan() || p_value > significance || baseline_mean == target_mean {
            Verdict::NoChange
        } else if direction.is_worse(baseline_mean, target_mean) {
            Verdict::Regressed
        } else {
            Verdict::Improved
        }
    }
}

/// Comparison of one metric between baseline and target segments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub metric: String,
    pub direction: Direction,
    pub baseline_segment: Segment,
    pub target_segment: Segment,
    pub p_value: f64,
    /// (target_mean - baseline_mean) / |baseline_mean|
    pub relative_change: f64,
    pub verdict: Verdict,
    /// Welch's t-test details, when the segments went through the test
    pub welch: Option<StatisticalTest>,
}

impl RegressionResult {
    pub fn is_regression(&self) -> bool {
        self.verdict == Verdict::Regressed
    }

    pub fn change_percent(&self) -> f64 {
        self.relative_change * 100.0
    }
}

/// Per-metric results of one comparison request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    /// Name of the analyzed test
    pub name: String,
    /// Resolved baseline position (`None` when the series was too short to compare)
    pub baseline_index: Option<usize>,
    pub significance: f64,
    pub results: Vec<RegressionResult>,
}

impl RegressionReport {
    pub fn result(&self, metric: &str) -> Option<&RegressionResult> {
        self.results.iter().find(|r| r.metric == metric)
    }

    pub fn regressions(&self) -> impl Iterator<Item = &RegressionResult> {
        self.results.iter().filter(|r| r.verdict == Verdict::Regressed)
    }

    pub fn improvements(&self) -> impl Iterator<Item = &RegressionResult> {
        self.results.iter().filter(|r| r.verdict == Verdict::Improved)
    }

    pub fn has_regressions(&self) -> bool {
        self.regressions().next().is_some()
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        let regressed: Vec<&str> = self.regressions().map(|r| r.metric.as_str()).collect();
        if regressed.is_empty() {
            report.push_str(&format!("✅ NO REGRESSION DETECTED in {}\n\n", self.name));
        } else {
            report.push_str(&format!(
                "❌ REGRESSION DETECTED in {} ({} metrics)\n\n",
                self.name,
                regressed.len()
            ));
            report.push_str(&format!("Regressed metrics: {}\n", regressed.join(", ")));
        }

        report.push_str(&format!(
            "Significance level: {} ({}% confidence)\n",
            self.significance,
            (1.0 - self.significance) * 100.0
        ));
        match self.baseline_index {
            Some(index) => report.push_str(&format!("Baseline index: {}\n", index)),
            None => report.push_str("Baseline index: n/a (series too short)\n"),
        }

        if !self.results.is_empty() {
            report.push_str("\n📊 Comparisons:\n");
            for r in &self.results {
                report.push_str(&format!(
                    "  {} {:?} (p={:.4}, baseline_mean={:.3} [{}..{}), target_mean={:.3} [{}..{}), {:+.1}%)\n",
                    r.metric,
                    r.verdict,
                    r.p_value,
                    r.baseline_segment.stats.mean,
                    r.baseline_segment.start,
                    r.baseline_segment.end,
                    r.target_segment.stats.mean,
                    r.target_segment.start,
                    r.target_segment.end,
                    r.change_percent()
                ));
                if let Some(test) = &r.welch {
                    report.push_str(&format!(
                        "    t={:.3} df={:.1} baseline_median={:.3} target_median={:.3}\n",
                        test.statistic, test.df, test.baseline_median, test.target_median
                    ));
                }
            }
        }

        report
    }
}
