use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::ReportOptions;
use crate::aggregate::Sample;
use crate::measure::Measure;
use crate::snapshot::{CpuDiff, CpuSnapshot, MemoryDiff, MemorySnapshot, SnapshotPair};

/// Host facts recorded alongside every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub platform: String,
    pub is_docker: bool,
    #[serde(default)]
    pub cpu_count: Measure<u64>,
    /// Bytes.
    #[serde(default)]
    pub total_memory: Measure<u64>,
}

impl Environment {
    pub fn unknown() -> Self {
        Self {
            platform: "unknown".to_string(),
            is_docker: false,
            cpu_count: Measure::Unknown,
            total_memory: Measure::Unknown,
        }
    }
}

/// Before/after snapshots of one resource plus their difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage<S, D> {
    pub before: S,
    pub after: S,
    pub diff: D,
}

pub type MemoryUsage = ResourceUsage<MemorySnapshot, MemoryDiff>;
pub type CpuUsage = ResourceUsage<CpuSnapshot, CpuDiff>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Nanoseconds, in execution order.
    pub execution_times: Vec<u64>,
    pub average_execution_time: f64,
    pub memory_usage: MemoryUsage,
    pub cpu_usage: CpuUsage,
}

/// Summary statistics over `Metrics::execution_times`, in nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub mean: f64,
    pub median: u64,
    pub std_dev: f64,
    pub p95: u64,
    pub p99: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationMetrics {
    pub execution_time: u64,
    pub memory: MemoryUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub runtime: String,
    pub version: String,
    pub experiment: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub environment: Environment,
    pub metrics: Metrics,
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_iteration_metrics: Option<Vec<IterationMetrics>>,
}

/// Input file accepted by the `report` command.
///
/// Either `samples` (with per-iteration memory) or bare `executionTimes`
/// must be given. Whole-run snapshot pairs are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSetFile {
    pub runtime: String,
    pub version: String,
    pub experiment: String,
    #[serde(default)]
    pub execution_times: Vec<u64>,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub memory_usage: Option<SnapshotPair<MemorySnapshot>>,
    #[serde(default)]
    pub cpu_usage: Option<SnapshotPair<CpuSnapshot>>,
    #[serde(default)]
    pub options: Option<ReportOptions>,
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`, the shape the analysis scripts parse.
pub mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
