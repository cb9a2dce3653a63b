//! Text and JSON renderings of an analyzed series

use crate::analysis::AnalyzedSeries;
use serde_json::{json, Value};

/// List every change-point time at which at least one metric got worse
///
/// Returns a single "No regressions found" line when nothing regressed.
pub fn render_regressions(analyzed: &AnalyzedSeries) -> String {
    let mut output = Vec::new();

    for group in analyzed.change_points_by_time() {
        let lines: Vec<String> = group
            .changes
            .iter()
            .filter(|cp| {
                analyzed
                    .series()
                    .metric(&cp.metric)
                    .map(|m| m.direction.is_worse(cp.stats.before.mean, cp.stats.after.mean))
                    .unwrap_or(false)
            })
            .map(|cp| {
                format!(
                    "    {:16}: {:>10.3} --> {:>10.3} ({:+6.1}%)",
                    cp.metric,
                    cp.stats.before.mean,
                    cp.stats.after.mean,
                    cp.forward_change_percent()
                )
            })
            .collect();

        if !lines.is_empty() {
            output.push(group.time.to_string());
            output.extend(lines);
        }
    }

    if output.is_empty() {
        format!("No regressions found in {}.", analyzed.name())
    } else {
        format!("Regressions in {}:\n{}", analyzed.name(), output.join("\n"))
    }
}

/// Change-point groups keyed by series name, for machine consumers
pub fn render_json(analyzed: &AnalyzedSeries) -> String {
    let groups: Vec<Value> = analyzed
        .change_points_by_time()
        .iter()
        .map(|group| {
            let changes: Vec<Value> = group
                .changes
                .iter()
                .map(|cp| {
                    json!({
                        "metric": cp.metric,
                        "forward_change_percent": cp.forward_change_percent(),
                    })
                })
                .collect();
            json!({ "time": group.time, "changes": changes })
        })
        .collect();

    let mut root = serde_json::Map::new();
    root.insert(analyzed.name().to_string(), Value::Array(groups));
    Value::Object(root).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MultiMetricAnalyzer;
    use crate::config::AnalysisConfig;
    use crate::series::{Direction, TimeSeries};

    fn analyzed(direction: Direction) -> AnalyzedSeries {
        let series = TimeSeries::builder("nightly")
            .times((0..12).map(|i| 1_700_000_000 + i * 3600).collect())
            .metric(
                "throughput",
                direction,
                [vec![10.0; 6], vec![8.0; 6]].concat(),
            )
            .metric("flat", Direction::HigherIsBetter, vec![1.0; 12])
            .build()
            .unwrap();
        MultiMetricAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(series)
            .unwrap()
    }

    #[test]
    fn test_render_regressions_lists_worse_metrics() {
        let text = render_regressions(&analyzed(Direction::HigherIsBetter));
        assert!(text.starts_with("Regressions in nightly:"));
        assert!(text.contains(&(1_700_000_000 + 6 * 3600).to_string()));
        assert!(text.contains("throughput"));
        assert!(text.contains("-20.0%"));
        assert!(!text.contains("flat"));
    }

    #[test]
    fn test_render_regressions_skips_improvements() {
        let text = render_regressions(&analyzed(Direction::LowerIsBetter));
        assert_eq!(text, "No regressions found in nightly.");
    }

    #[test]
    fn test_render_json_groups() {
        let json = render_json(&analyzed(Direction::HigherIsBetter));
        let value: Value = serde_json::from_str(&json).unwrap();
        let groups = value["nightly"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["time"], 1_700_000_000 + 6 * 3600);
        assert_eq!(groups[0]["changes"][0]["metric"], "throughput");
        let pct = groups[0]["changes"][0]["forward_change_percent"].as_f64().unwrap();
        assert!((pct + 20.0).abs() < 1e-9);
    }
}
