/// Change-Point Detection Benchmarks
///
/// Measures detection cost as series length and permutation count grow,
/// and the speedup of parallel multi-metric analysis.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use perfshift::{AnalysisConfig, ChangePointDetector, Direction, MultiMetricAnalyzer, TimeSeries};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Noisy series with a level shift every `len / 3` points
fn history(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|i| {
            let level = 100.0 + 10.0 * ((3 * i / len.max(1)) as f64);
            level + rng.gen_range(-2.0..2.0)
        })
        .collect()
}

/// Benchmark: Single metric, growing history
fn bench_series_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("series_length");
    group.measurement_time(Duration::from_secs(5));

    let detector = ChangePointDetector::new(AnalysisConfig::default()).unwrap();
    for len in [30, 90, 365, 1000].iter() {
        let values = history(*len, 1);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &values, |b, values| {
            b.iter(|| detector.detect(black_box(values)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark: Permutation count drives the significance test cost
fn bench_permutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("permutations");
    group.measurement_time(Duration::from_secs(5));

    let values = history(200, 2);
    for permutations in [100, 500, 1000, 5000].iter() {
        let detector = ChangePointDetector::new(AnalysisConfig {
            permutations: *permutations,
            ..AnalysisConfig::default()
        })
        .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(permutations),
            &values,
            |b, values| {
                b.iter(|| detector.detect(black_box(values)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark: Sequential vs parallel analysis of a 16-metric suite
fn bench_multi_metric(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_metric");
    group.measurement_time(Duration::from_secs(10));

    let mut builder = TimeSeries::builder("suite");
    for m in 0..16 {
        builder = builder.metric(format!("metric_{}", m), Direction::HigherIsBetter, history(180, m));
    }
    let series = builder.build().unwrap();

    for parallel in [false, true] {
        let analyzer = MultiMetricAnalyzer::new(AnalysisConfig {
            parallel,
            ..AnalysisConfig::default()
        })
        .unwrap();
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| analyzer.analyze(black_box(series.clone())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_series_length,
    bench_permutations,
    bench_multi_metric
);

criterion_main!(benches);
