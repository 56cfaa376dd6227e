//! Component benchmarks: artifact decoding.
//!
//! Run with: `cargo bench --bench decode`

#[path = "../../common/mod.rs"]
mod common;

use common::criterion_config::default_criterion;

use canopy::io::ModelInfo;
use canopy::testing;
use canopy::{Model, ReadOptions};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("component/decode");
    let unchecked = ReadOptions::builder().verify_checksum(false).build();

    for model in testing::all_models() {
        let bytes = model.to_bytes().expect("fixture encodes");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("checked", model.id()), &bytes, |b, bytes| {
            b.iter(|| black_box(Model::from_bytes(black_box(bytes))))
        });
        group.bench_with_input(BenchmarkId::new("unchecked", model.id()), &bytes, |b, bytes| {
            b.iter(|| black_box(Model::from_bytes_with(black_box(bytes), &unchecked)))
        });
    }

    group.finish();
}

fn bench_inspect(c: &mut Criterion) {
    let bytes = testing::tree_multiclass_model()
        .to_bytes()
        .expect("fixture encodes");
    c.bench_function("component/decode/inspect", |b| {
        b.iter(|| black_box(ModelInfo::inspect(black_box(&bytes))))
    });
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_decode, bench_inspect
}
criterion_main!(benches);
