//! Criterion benchmarks for hydroskill-match: nearest and interpolated alignment.

use chrono::{DateTime, TimeDelta, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hydroskill_match::{MatchConfig, MatchPolicy, ModelResult, Observation, Position, TimeSeries};

fn make_series(n: usize, step_secs: i64, offset_secs: i64) -> TimeSeries {
    let times: Vec<DateTime<Utc>> = (0..n as i64)
        .map(|i| DateTime::from_timestamp(offset_secs + i * step_secs, 0).unwrap())
        .collect();
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.05).sin() + 1.5).collect();
    TimeSeries::new(times, values).unwrap()
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");

    for &n_obs in &[1_000usize, 50_000] {
        let obs = Observation::point("station", make_series(n_obs, 600, 0), Position::new(0.0, 0.0))
            .unwrap();
        let models: Vec<ModelResult> = (0..3)
            .map(|k| ModelResult::new(format!("m{k}"), make_series(n_obs * 2, 300, 60)).unwrap())
            .collect();

        for policy in [MatchPolicy::Nearest, MatchPolicy::Interpolate] {
            let config = MatchConfig::new()
                .with_policy(policy)
                .with_tolerance(TimeDelta::seconds(120));
            let id = BenchmarkId::new(policy.to_string(), n_obs);
            group.bench_with_input(id, &(obs.clone(), models.clone()), |b, (obs, models)| {
                b.iter(|| config.align(obs, models));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_align);
criterion_main!(benches);
