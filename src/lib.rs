//! Metrics aggregation and the JSON report model shared by every runtime
//! in the benchmark suite.
//!
//! Raw per-iteration samples go in, one immutable [`BenchmarkReport`] comes
//! out:
//!
//! ```no_run
//! use runtime_bench_metrics::{
//!     build_report_from_durations, write_report, ReportOptions, RunMetadata, SnapshotPair,
//!     SystemProbe,
//! };
//!
//! let report = build_report_from_durations(
//!     RunMetadata::new("node", "v20.11.0", "fibonacci_recursive_n30"),
//!     &[100, 200, 300, 400, 500],
//!     SnapshotPair::default(),
//!     SnapshotPair::default(),
//!     &SystemProbe,
//!     &ReportOptions::default(),
//! )?;
//! write_report(&report, "results/node_fib.json".as_ref())?;
//! # Ok::<(), runtime_bench_metrics::ReportError>(())
//! ```

pub mod aggregate;
pub mod environment;
pub mod error;
pub mod harness;
pub mod measure;
pub mod results;
pub mod schema;
pub mod snapshot;
pub mod stats;
pub mod summary;
pub mod writer;

pub use aggregate::{build_report, build_report_from_durations, ReportOptions, RunMetadata, Sample};
pub use environment::{EnvironmentProbe, FixedProbe, SystemProbe};
pub use error::{ReportError, Result};
pub use measure::Measure;
pub use schema::{BenchmarkReport, Environment, Statistics};
pub use snapshot::{CpuSnapshot, MemorySnapshot, ResourceSnapshotSource, SnapshotPair};
pub use writer::write_report;
