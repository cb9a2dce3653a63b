// Integration Test Utilities
//
// Shared fixtures and tracing setup for the scenario suites

#![allow(dead_code)]

use perfshift::{Direction, TimeSeries};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness (set RUST_LOG=perfshift=debug to see them)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Concatenate constant levels into one noise-free series
pub fn step(levels: &[(f64, usize)]) -> Vec<f64> {
    levels
        .iter()
        .flat_map(|&(level, len)| std::iter::repeat(level).take(len))
        .collect()
}

/// Step function with uniform noise of the given amplitude
pub fn noisy_step(levels: &[(f64, usize)], amplitude: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    step(levels)
        .into_iter()
        .map(|v| v + rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Nightly benchmark history with hourly timestamps and a commit attribute
pub fn nightly(name: &str, metrics: &[(&str, Direction, Vec<f64>)]) -> TimeSeries {
    let len = metrics.first().map_or(0, |(_, _, v)| v.len());
    let mut builder = TimeSeries::builder(name)
        .branch("main")
        .times((0..len as i64).map(|i| 1_700_000_000 + i * 3600).collect())
        .attribute("commit", (0..len).map(|i| format!("c{:04}", i)).collect());
    for (metric, direction, values) in metrics {
        builder = builder.metric(*metric, *direction, values.clone());
    }
    builder.build().expect("fixture series must be valid")
}
