//! Benchmarks for point ingestion and final processing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use displacement_stream::analysis::{repair_dropouts, resample};
use displacement_stream::backend::{decode_record, ingest_stream, SharedCollection};
use displacement_stream::types::Bounds;
use displacement_stream::Point;
use std::io::Cursor;

fn trajectory(size: usize) -> Vec<Point> {
    (0..size)
        .map(|i| {
            let t = i as f64 * 0.01;
            // Every 50th sample is a dropout
            if i % 50 == 25 {
                Point::new(0.0, 0.0)
            } else {
                Point::new(t.cos() * 10.0, t.sin() * 5.0)
            }
        })
        .collect()
}

fn bench_collection_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_append");
    group.throughput(Throughput::Elements(1));

    group.bench_function("append", |b| {
        let collection = SharedCollection::new();
        let mut i = 0u64;
        b.iter(|| {
            collection.append(black_box(Point::new(i as f64, -(i as f64))));
            i = i.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_collection_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_snapshot");

    for size in [1000, 10_000, 100_000].iter() {
        let collection = SharedCollection::new();
        for p in trajectory(*size) {
            collection.append(p);
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("snapshot", size), &collection, |b, coll| {
            b.iter(|| black_box(coll.snapshot()));
        });
        group.bench_with_input(BenchmarkId::new("tail", size), &collection, |b, coll| {
            b.iter(|| black_box(coll.snapshot_from(size - 100)));
        });
    }

    group.finish();
}

fn bench_record_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decoding");

    group.bench_function("whitespace", |b| {
        b.iter(|| black_box(decode_record(black_box(b"12.5 -3.25\n"))));
    });
    group.bench_function("comma", |b| {
        b.iter(|| black_box(decode_record(black_box(b"0.000123,-98765.4321\r\n"))));
    });

    let size = 10_000;
    let stream: String = trajectory(size)
        .iter()
        .map(|p| format!("{} {}\n", p.x, p.y))
        .collect();
    group.throughput(Throughput::Elements(size as u64));
    group.bench_function("ingest_stream", |b| {
        b.iter(|| {
            let collection = SharedCollection::new();
            black_box(ingest_stream(Cursor::new(stream.as_bytes()), &collection))
        });
    });

    group.finish();
}

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");

    for size in [1000, 10_000, 50_000].iter() {
        let points = trajectory(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("repair_dropouts", size), &points, |b, p| {
            b.iter(|| black_box(repair_dropouts(p)));
        });

        for k in [1, 4, 16] {
            group.bench_with_input(
                BenchmarkId::new(format!("resample_k{}", k), size),
                &points,
                |b, p| {
                    b.iter(|| black_box(resample(p, k)));
                },
            );
        }
    }

    group.finish();
}

fn bench_bounds(c: &mut Criterion) {
    let points = trajectory(100_000);
    c.bench_function("bounds_100k", |b| {
        b.iter(|| black_box(Bounds::of(&points)));
    });
}

criterion_group!(
    benches,
    bench_collection_append,
    bench_collection_snapshot,
    bench_record_decoding,
    bench_interpolation,
    bench_bounds,
);

criterion_main!(benches);
