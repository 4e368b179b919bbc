use std::collections::BTreeMap;

use serde::Serialize;

use crate::measure::Measure;
use crate::schema::BenchmarkReport;
use crate::snapshot::MemorySnapshot;

const NANOS_PER_MS: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSummary {
    pub runtime: String,
    pub version: String,
    pub iterations: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub std_dev_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub coefficient_of_variation: Measure<f64>,
    pub memory_heuristic_bytes: f64,
    /// Detailed iterations whose `heapUsed` shrank.
    pub gc_likely_iterations: usize,
    /// 1 is the fastest mean within the experiment.
    pub rank: usize,
    /// Unknown when the fastest mean is zero.
    pub relative_to_fastest: Measure<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub experiment: String,
    pub runtimes: Vec<RuntimeSummary>,
}

/// `(rss + heapTotal + 2 * heapUsed) / 4`, unknown fields counted as zero.
pub fn memory_heuristic(snapshot: &MemorySnapshot) -> f64 {
    let rss = snapshot.rss.unwrap_or(0) as f64;
    let heap_total = snapshot.heap_total.unwrap_or(0) as f64;
    let heap_used = snapshot.heap_used.unwrap_or(0) as f64;
    (rss + heap_total + 2.0 * heap_used) / 4.0
}

pub fn summarize_report(report: &BenchmarkReport) -> RuntimeSummary {
    let stats = &report.statistics;
    let memory = &report.metrics.memory_usage;

    let coefficient_of_variation = if stats.mean > 0.0 {
        Measure::Known(stats.std_dev / stats.mean * 100.0)
    } else {
        Measure::Unknown
    };

    let gc_likely_iterations = report
        .detailed_iteration_metrics
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|it| it.memory.diff.heap_used.known().is_some_and(|d| d < 0))
        .count();

    RuntimeSummary {
        runtime: report.runtime.clone(),
        version: report.version.clone(),
        iterations: report.metrics.execution_times.len(),
        mean_ms: stats.mean / NANOS_PER_MS,
        median_ms: stats.median as f64 / NANOS_PER_MS,
        std_dev_ms: stats.std_dev / NANOS_PER_MS,
        p95_ms: stats.p95 as f64 / NANOS_PER_MS,
        p99_ms: stats.p99 as f64 / NANOS_PER_MS,
        coefficient_of_variation,
        memory_heuristic_bytes: (memory_heuristic(&memory.before) + memory_heuristic(&memory.after))
            / 2.0,
        gc_likely_iterations,
        rank: 0,
        relative_to_fastest: Measure::Unknown,
    }
}

/// Group reports by experiment and rank runtimes by mean time.
///
/// When a runtime has several reports for one experiment the latest wins.
pub fn summarize(reports: &[BenchmarkReport]) -> Vec<ExperimentSummary> {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, &BenchmarkReport>> = BTreeMap::new();
    for report in reports {
        let slot = grouped
            .entry(report.experiment.as_str())
            .or_default()
            .entry(report.runtime.as_str())
            .or_insert(report);
        if report.timestamp > slot.timestamp {
            *slot = report;
        }
    }

    grouped
        .into_iter()
        .map(|(experiment, by_runtime)| {
            let mut runtimes: Vec<RuntimeSummary> =
                by_runtime.values().map(|r| summarize_report(r)).collect();
            runtimes.sort_by(|a, b| a.mean_ms.total_cmp(&b.mean_ms));

            let fastest = runtimes.first().map_or(0.0, |r| r.mean_ms);
            for (i, r) in runtimes.iter_mut().enumerate() {
                r.rank = i + 1;
                r.relative_to_fastest = if fastest > 0.0 {
                    Measure::Known(r.mean_ms / fastest)
                } else {
                    Measure::Unknown
                };
            }

            ExperimentSummary {
                experiment: experiment.to_string(),
                runtimes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{build_report, ReportOptions, RunMetadata, Sample};
    use crate::environment::FixedProbe;
    use crate::schema::Environment;
    use crate::snapshot::SnapshotPair;
    use chrono::{TimeZone, Utc};

    fn heap_used(v: u64) -> MemorySnapshot {
        MemorySnapshot {
            heap_used: Measure::Known(v),
            ..MemorySnapshot::default()
        }
    }

    fn report(runtime: &str, experiment: &str, durations: &[u64], hour: u32) -> BenchmarkReport {
        let samples: Vec<Sample> = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| Sample {
                duration_nanos: d,
                // every other iteration frees memory
                memory: if i % 2 == 0 {
                    SnapshotPair::new(heap_used(1_000), heap_used(1_400))
                } else {
                    SnapshotPair::new(heap_used(1_400), heap_used(900))
                },
            })
            .collect();
        let memory = SnapshotPair::new(
            MemorySnapshot {
                rss: Measure::Known(4_000),
                heap_total: Measure::Known(2_000),
                heap_used: Measure::Known(1_000),
                external: Measure::Unknown,
            },
            MemorySnapshot {
                rss: Measure::Known(8_000),
                heap_total: Measure::Unknown,
                heap_used: Measure::Known(3_000),
                external: Measure::Unknown,
            },
        );
        build_report(
            RunMetadata::new(runtime, "1", experiment)
                .with_timestamp(Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()),
            &samples,
            memory,
            SnapshotPair::default(),
            &FixedProbe(Environment::unknown()),
            &ReportOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn heuristic_weights_heap_used_twice() {
        let s = MemorySnapshot {
            rss: Measure::Known(400),
            heap_total: Measure::Known(200),
            heap_used: Measure::Known(100),
            external: Measure::Known(999),
        };
        assert_eq!(memory_heuristic(&s), 200.0);
        assert_eq!(memory_heuristic(&MemorySnapshot::default()), 0.0);
    }

    #[test]
    fn per_report_summary() {
        let s = summarize_report(&report("node", "fib", &[1_000_000, 3_000_000, 2_000_000, 2_000_000], 1));
        assert_eq!(s.iterations, 4);
        assert_eq!(s.mean_ms, 2.0);
        assert_eq!(s.median_ms, 2.0);
        assert_eq!(s.gc_likely_iterations, 2);
        // before: (4000 + 2000 + 2000) / 4 = 2000, after: (8000 + 0 + 6000) / 4 = 3500
        assert_eq!(s.memory_heuristic_bytes, 2_750.0);
        let cv = s.coefficient_of_variation.known().unwrap();
        assert!((cv - (s.std_dev_ms / s.mean_ms * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_mean_has_unknown_variation() {
        let s = summarize_report(&report("bun", "noop", &[0, 0], 1));
        assert_eq!(s.coefficient_of_variation, Measure::Unknown);
    }

    #[test]
    fn ranks_runtimes_within_each_experiment() {
        let reports = vec![
            report("node", "fib", &[300], 1),
            report("bun", "fib", &[100], 1),
            report("deno", "fib", &[200], 1),
            report("deno", "sort", &[50], 1),
        ];
        let summary = summarize(&reports);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].experiment, "fib");
        let names: Vec<&str> = summary[0].runtimes.iter().map(|r| r.runtime.as_str()).collect();
        assert_eq!(names, vec!["bun", "deno", "node"]);
        assert_eq!(summary[0].runtimes[0].rank, 1);
        let slowest = summary[0].runtimes[2].relative_to_fastest.known().unwrap();
        assert!((slowest - 3.0).abs() < 1e-9);
        assert_eq!(summary[1].runtimes[0].rank, 1);
        assert_eq!(summary[1].runtimes[0].relative_to_fastest, Measure::Known(1.0));
    }

    #[test]
    fn zero_fastest_mean_leaves_ratio_unknown() {
        let reports = vec![
            report("bun", "noop", &[0, 0], 1),
            report("node", "noop", &[0, 0], 1),
            report("deno", "noop", &[40], 1),
        ];
        let summary = summarize(&reports);
        let runtimes = &summary[0].runtimes;

        assert_eq!(runtimes.len(), 3);
        assert_eq!(runtimes[2].runtime, "deno");
        for r in runtimes {
            assert_eq!(r.relative_to_fastest, Measure::Unknown);
        }
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json[0]["runtimes"][0]["relativeToFastest"], "unknown");
    }

    #[test]
    fn latest_report_per_runtime_wins() {
        let reports = vec![
            report("node", "fib", &[900], 5),
            report("node", "fib", &[100], 2),
        ];
        let summary = summarize(&reports);
        assert_eq!(summary[0].runtimes.len(), 1);
        assert_eq!(summary[0].runtimes[0].mean_ms, 900.0 / NANOS_PER_MS);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = summarize(&[report("node", "fib", &[100, 200], 1)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json[0]["runtimes"][0]["gcLikelyIterations"], 1);
        assert!(json[0]["runtimes"][0]["relativeToFastest"].is_number());
    }
}
