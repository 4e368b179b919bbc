//! Aggregation throughput
//!
//! Report construction cost for the iteration counts the suite actually
//! uses, with and without the per-iteration breakdown, plus JSON
//! serialization of the finished report.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use runtime_bench_metrics::{
    build_report, Environment, FixedProbe, Measure, MemorySnapshot, ReportOptions, RunMetadata,
    Sample, SnapshotPair, Statistics,
};

fn samples(n: usize) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            let heap = rng.gen_range(1_000_000u64..8_000_000);
            Sample {
                duration_nanos: rng.gen_range(50_000..5_000_000),
                memory: SnapshotPair::new(
                    MemorySnapshot {
                        heap_used: Measure::Known(heap),
                        ..MemorySnapshot::default()
                    },
                    MemorySnapshot {
                        heap_used: Measure::Known(heap + rng.gen_range(0..4_096)),
                        ..MemorySnapshot::default()
                    },
                ),
            }
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    for n in [100usize, 1_000, 10_000] {
        let durations: Vec<u64> = samples(n).iter().map(|s| s.duration_nanos).collect();
        group.bench_with_input(BenchmarkId::new("from_durations", n), &durations, |b, d| {
            b.iter(|| Statistics::from_durations(black_box(d)))
        });
    }
    group.finish();
}

fn bench_build_report(c: &mut Criterion) {
    let probe = FixedProbe(Environment::unknown());
    let detailed = ReportOptions::default();
    let summary_only = ReportOptions {
        detailed_metrics: false,
        ..ReportOptions::default()
    };

    let mut group = c.benchmark_group("build_report");
    for n in [100usize, 1_000, 10_000] {
        let s = samples(n);
        for (label, options) in [("detailed", &detailed), ("summary", &summary_only)] {
            group.bench_with_input(BenchmarkId::new(label, n), &s, |b, s| {
                b.iter(|| {
                    build_report(
                        RunMetadata::new("node", "v20", "bench"),
                        black_box(s),
                        SnapshotPair::default(),
                        SnapshotPair::default(),
                        &probe,
                        options,
                    )
                })
            });
        }
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let report = build_report(
        RunMetadata::new("node", "v20", "bench"),
        &samples(1_000),
        SnapshotPair::default(),
        SnapshotPair::default(),
        &FixedProbe(Environment::unknown()),
        &ReportOptions::default(),
    )
    .expect("non-empty samples");

    c.bench_function("serialize_report_1000", |b| {
        b.iter(|| serde_json::to_vec_pretty(black_box(&report)))
    });
}

criterion_group!(benches, bench_statistics, bench_build_report, bench_serialize);
criterion_main!(benches);
