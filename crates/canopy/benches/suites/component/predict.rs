//! Component benchmarks: end-to-end prediction throughput.
//!
//! Run with: `cargo bench --bench predict`

#[path = "../../common/mod.rs"]
mod common;

use common::criterion_config::default_criterion;
use common::inputs::repeated_inputs;

use canopy::testing;
use canopy::{Model, PredictOptions};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn fixture_models() -> [(&'static str, Model); 3] {
    [
        ("linear_regression", testing::linear_regression_model()),
        ("tree_binary", testing::tree_binary_model()),
        ("tree_multiclass", testing::tree_multiclass_model()),
    ]
}

fn bench_batch_sizes(c: &mut Criterion) {
    let options = PredictOptions::default();
    let mut group = c.benchmark_group("component/predict/batch_size");

    for (label, model) in fixture_models() {
        for batch_size in [1usize, 100, 10_000] {
            let inputs = repeated_inputs(batch_size);
            group.throughput(Throughput::Elements(batch_size as u64));
            group.bench_with_input(BenchmarkId::new(label, batch_size), &inputs, |b, inputs| {
                b.iter(|| black_box(model.predict(black_box(inputs), &options)))
            });
        }
    }

    group.finish();
}

fn bench_contributions(c: &mut Criterion) {
    let options = PredictOptions::builder()
        .compute_feature_contributions(true)
        .build()
        .expect("valid options");
    let inputs = repeated_inputs(1_000);
    let mut group = c.benchmark_group("component/predict/contributions");
    group.throughput(Throughput::Elements(inputs.len() as u64));

    for (label, model) in fixture_models() {
        group.bench_function(label, |b| {
            b.iter(|| black_box(model.predict(black_box(&inputs), &options)))
        });
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let model = testing::tree_multiclass_model();
    let options = PredictOptions::default();
    let inputs = repeated_inputs(10_000);
    let mut group = c.benchmark_group("component/predict/threads");
    group.throughput(Throughput::Elements(inputs.len() as u64));

    for n_threads in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(n_threads), &n_threads, |b, &n| {
            b.iter(|| black_box(model.predict_with_threads(black_box(&inputs), &options, n)))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_batch_sizes, bench_contributions, bench_threads
}
criterion_main!(benches);
