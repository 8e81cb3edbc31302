//! End-to-end migration benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kvmigrate_bench::utils::populated_source;
use kvmigrate_core::transfer;
use kvmigrate_storage::{FileBackend, InMemoryBackend};
use tempfile::TempDir;

const KEYS: usize = 10_000;

/// Benchmark an in-memory to in-memory migration at several worker counts.
fn bench_inmemory_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_migration");
    group.throughput(Throughput::Elements(KEYS as u64));

    let source = populated_source(KEYS, 16, 128);

    for workers in [1usize, 4].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(workers), workers, |b, &workers| {
            b.iter(|| {
                let destination = InMemoryBackend::new();
                let report = transfer(&source, &destination, 1_000, workers).unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

/// Benchmark the effect of queue size on a single-worker migration.
fn bench_queue_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_size");
    group.throughput(Throughput::Elements(KEYS as u64));

    let source = populated_source(KEYS, 16, 128);

    for queue_size in [1usize, 100, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(queue_size),
            queue_size,
            |b, &queue_size| {
                b.iter(|| {
                    let destination = InMemoryBackend::new();
                    let report = transfer(&source, &destination, queue_size, 1).unwrap();
                    black_box(report);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark migrating into a file backend.
fn bench_file_destination(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_destination");
    // Use smaller sample size for file operations
    group.sample_size(10);

    let keys = 1_000;
    group.throughput(Throughput::Elements(keys as u64));
    let source = populated_source(keys, 8, 256);

    for workers in [1usize, 4].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(workers), workers, |b, &workers| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let destination = FileBackend::open(temp_dir.path()).unwrap();
                let report = transfer(&source, &destination, 100, workers).unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_inmemory_migration,
    bench_queue_size,
    bench_file_destination
);
criterion_main!(benches);
