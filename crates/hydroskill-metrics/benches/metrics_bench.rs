//! Criterion benchmarks for hydroskill-metrics: each default metric over long series.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hydroskill_metrics::{DEFAULT_METRICS, Metric};

fn make_pair(n: usize) -> (Vec<f64>, Vec<f64>) {
    let obs: Vec<f64> = (0..n).map(|i| (i as f64 * 0.01).sin() + 2.0).collect();
    let model: Vec<f64> = (0..n).map(|i| (i as f64 * 0.01 + 0.1).sin() + 2.05).collect();
    (obs, model)
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metric");

    for &len in &[1_000usize, 100_000] {
        let (obs, model) = make_pair(len);
        for metric in DEFAULT_METRICS {
            let id = BenchmarkId::new(metric.name(), len);
            group.bench_with_input(id, &(&obs, &model), |bencher, (obs, model)| {
                bencher.iter(|| metric.compute(obs, model));
            });
        }
    }

    group.finish();
}

fn bench_kge(c: &mut Criterion) {
    let (obs, model) = make_pair(100_000);
    c.bench_function("kge_100k", |b| {
        b.iter(|| Metric::Kge.compute(&obs, &model));
    });
}

criterion_group!(benches, bench_metrics, bench_kge);
criterion_main!(benches);
