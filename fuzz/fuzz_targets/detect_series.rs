#![no_main]

use libfuzzer_sys::fuzz_target;
use perfshift::{
    AnalysisConfig, BaselineSelector, Direction, MultiMetricAnalyzer, RegressionComparator,
    TargetSelector, TimeSeries,
};

fuzz_target!(|data: &[u8]| {
    // First byte picks the minimum segment size, the rest are f64 samples
    let Some((&min, rest)) = data.split_first() else {
        return;
    };
    let values: Vec<f64> = rest
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();

    let config = AnalysisConfig {
        permutations: 50,
        min_segment_size: usize::from(min % 8) + 1,
        parallel: false,
        ..AnalysisConfig::default()
    };

    // Non-finite samples must be rejected with an error, never a panic
    let Ok(series) = TimeSeries::builder("fuzz")
        .metric("m", Direction::LowerIsBetter, values)
        .build()
    else {
        return;
    };
    let Ok(analyzed) = MultiMetricAnalyzer::new(config.clone()).and_then(|a| a.analyze(series))
    else {
        return;
    };
    if let Ok(comparator) = RegressionComparator::new(config) {
        let _ = comparator.compare_analyzed(&analyzed, &BaselineSelector::Start, TargetSelector::Tail);
        let _ = comparator.compare_analyzed(&analyzed, &BaselineSelector::Start, TargetSelector::Last(2));
    }
});
