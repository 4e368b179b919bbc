use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::EnvironmentProbe;
use crate::error::{ReportError, Result};
use crate::schema::{BenchmarkReport, Environment, IterationMetrics, Metrics, Statistics};
use crate::snapshot::{CpuSnapshot, MemorySnapshot, SnapshotPair};

/// One measured iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "executionTime")]
    pub duration_nanos: u64,
    #[serde(default)]
    pub memory: SnapshotPair<MemorySnapshot>,
}

impl Sample {
    pub fn timing_only(duration_nanos: u64) -> Self {
        Self {
            duration_nanos,
            memory: SnapshotPair::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub runtime_name: String,
    pub runtime_version: String,
    /// Reports are matched on this label.
    pub experiment_label: String,
    pub timestamp: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(
        runtime_name: impl Into<String>,
        runtime_version: impl Into<String>,
        experiment_label: impl Into<String>,
    ) -> Self {
        Self {
            runtime_name: runtime_name.into(),
            runtime_version: runtime_version.into(),
            experiment_label: experiment_label.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportOptions {
    /// Emit `detailedIterationMetrics`.
    pub detailed_metrics: bool,
    /// Consult the environment probe; otherwise the environment is unknown.
    pub include_environment: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            detailed_metrics: true,
            include_environment: true,
        }
    }
}

/// Build a report from `samples` in execution order.
///
/// `memory` and `cpu` are the whole-run pairs: the snapshot taken before the
/// first iteration and the one taken after the last.
pub fn build_report(
    metadata: RunMetadata,
    samples: &[Sample],
    memory: SnapshotPair<MemorySnapshot>,
    cpu: SnapshotPair<CpuSnapshot>,
    probe: &dyn EnvironmentProbe,
    options: &ReportOptions,
) -> Result<BenchmarkReport> {
    if samples.is_empty() {
        return Err(ReportError::invalid(format!(
            "no samples recorded for {} / {}",
            metadata.runtime_name, metadata.experiment_label
        )));
    }

    let execution_times: Vec<u64> = samples.iter().map(|s| s.duration_nanos).collect();
    let statistics = Statistics::from_durations(&execution_times)?;

    let environment = if options.include_environment {
        probe.environment()
    } else {
        Environment::unknown()
    };

    let detailed_iteration_metrics = options.detailed_metrics.then(|| {
        samples
            .iter()
            .map(|s| IterationMetrics {
                execution_time: s.duration_nanos,
                memory: s.memory.usage(),
            })
            .collect::<Vec<_>>()
    });

    debug!(
        runtime = %metadata.runtime_name,
        experiment = %metadata.experiment_label,
        iterations = execution_times.len(),
        mean_ns = statistics.mean,
        "built benchmark report"
    );

    Ok(BenchmarkReport {
        runtime: metadata.runtime_name,
        version: metadata.runtime_version,
        experiment: metadata.experiment_label,
        timestamp: metadata.timestamp,
        environment,
        metrics: Metrics {
            average_execution_time: statistics.mean,
            execution_times,
            memory_usage: memory.usage(),
            cpu_usage: cpu.usage(),
        },
        statistics,
        detailed_iteration_metrics,
    })
}

/// Build a report from bare durations; per-iteration memory is unknown.
pub fn build_report_from_durations(
    metadata: RunMetadata,
    durations: &[u64],
    memory: SnapshotPair<MemorySnapshot>,
    cpu: SnapshotPair<CpuSnapshot>,
    probe: &dyn EnvironmentProbe,
    options: &ReportOptions,
) -> Result<BenchmarkReport> {
    let samples: Vec<Sample> = durations.iter().copied().map(Sample::timing_only).collect();
    build_report(metadata, &samples, memory, cpu, probe, options)
}

/// Whole-run memory pair spanning `samples`: the first iteration's
/// before-snapshot and the last iteration's after-snapshot.
pub fn spanning_memory(samples: &[Sample]) -> SnapshotPair<MemorySnapshot> {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => SnapshotPair::new(first.memory.before, last.memory.after),
        _ => SnapshotPair::default(),
    }
}
