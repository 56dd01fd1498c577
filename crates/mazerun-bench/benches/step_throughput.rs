//! Criterion benchmarks for batch stepping.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mazerun_bench::{reference_profile, stress_profile, RandomDriver};
use mazerun_engine::Manager;
use std::hint::black_box;

fn bench_step_64(c: &mut Criterion) {
    let mut mgr = Manager::new(reference_profile()).unwrap();
    let mut group = c.benchmark_group("step_64");
    group.throughput(Throughput::Elements(u64::from(mgr.num_worlds())));
    group.bench_function("idle", |b| {
        b.iter(|| mgr.step().unwrap());
    });
    let mut driver = RandomDriver::new(42);
    group.bench_function("random_actions", |b| {
        b.iter(|| {
            driver.drive(&mut mgr);
            mgr.step().unwrap();
        });
    });
    group.finish();
}

fn bench_step_1024(c: &mut Criterion) {
    let mut mgr = Manager::new(stress_profile()).unwrap();
    let mut driver = RandomDriver::new(42);
    let mut group = c.benchmark_group("step_1024");
    group.throughput(Throughput::Elements(u64::from(mgr.num_worlds())));
    group.sample_size(20);
    group.bench_function("random_actions", |b| {
        b.iter(|| {
            driver.drive(&mut mgr);
            mgr.step().unwrap();
        });
    });
    group.finish();
}

fn bench_construct(c: &mut Criterion) {
    c.bench_function("construct_64", |b| {
        b.iter(|| black_box(Manager::new(reference_profile()).unwrap()));
    });
}

#[cfg(feature = "gpu")]
fn bench_gpu_step(c: &mut Criterion) {
    let mut mgr = match Manager::new(mazerun_bench::gpu_profile(4096)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("skipping GPU benchmark: {e}");
            return;
        }
    };
    let mut group = c.benchmark_group("gpu_step_4096");
    group.throughput(Throughput::Elements(u64::from(mgr.num_worlds())));
    group.bench_function("idle", |b| {
        b.iter(|| mgr.step().unwrap());
    });
    group.finish();
}

#[cfg(not(feature = "gpu"))]
criterion_group!(benches, bench_step_64, bench_step_1024, bench_construct);
#[cfg(feature = "gpu")]
criterion_group!(
    benches,
    bench_step_64,
    bench_step_1024,
    bench_construct,
    bench_gpu_step
);
criterion_main!(benches);
