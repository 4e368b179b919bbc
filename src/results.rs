use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::aggregate::{build_report, spanning_memory, ReportOptions, RunMetadata, Sample};
use crate::environment::EnvironmentProbe;
use crate::error::{ReportError, Result};
use crate::schema::{BenchmarkReport, SampleSetFile};

/// Which reports to keep when scanning a results directory.
#[derive(Clone, Debug, Default)]
pub struct ReportFilter {
    pub experiment: Option<String>,
    pub runtime: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, report: &BenchmarkReport) -> bool {
        let experiment_ok = self
            .experiment
            .as_deref()
            .map_or(true, |e| report.experiment.contains(e));
        let runtime_ok = self
            .runtime
            .as_deref()
            .map_or(true, |r| report.runtime == r);
        experiment_ok && runtime_ok
    }
}

pub fn read_report(path: &Path) -> Result<BenchmarkReport> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::read(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

pub fn read_sample_set(path: &Path) -> Result<SampleSetFile> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::read(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

/// Load every `.json` report directly inside `dir`, sorted by experiment,
/// runtime, then timestamp. Files that are not reports are skipped.
pub fn load_reports(dir: &Path, filter: &ReportFilter) -> Result<Vec<BenchmarkReport>> {
    load_reports_with_depth(dir, filter, 1)
}

pub fn load_reports_with_depth(
    dir: &Path,
    filter: &ReportFilter,
    max_depth: usize,
) -> Result<Vec<BenchmarkReport>> {
    if !dir.is_dir() {
        return Err(ReportError::read(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();

    debug!(dir = %dir.display(), candidates = paths.len(), "scanning results");

    let mut reports: Vec<BenchmarkReport> = paths
        .par_iter()
        .filter_map(|path| match read_report(path) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file that is not a report");
                None
            }
        })
        .filter(|r| filter.matches(r))
        .collect();

    reports.sort_by(|a, b| {
        (&a.experiment, &a.runtime, a.timestamp).cmp(&(&b.experiment, &b.runtime, b.timestamp))
    });
    Ok(reports)
}

impl SampleSetFile {
    /// `options` overrides whatever the file carries.
    pub fn into_report(
        self,
        probe: &dyn EnvironmentProbe,
        options: Option<ReportOptions>,
    ) -> Result<BenchmarkReport> {
        let samples: Vec<Sample> = match (self.samples.is_empty(), self.execution_times.is_empty()) {
            (false, false) => {
                return Err(ReportError::invalid(
                    "sample set has both `samples` and `executionTimes`",
                ))
            }
            (false, true) => self.samples,
            (true, _) => self
                .execution_times
                .iter()
                .copied()
                .map(Sample::timing_only)
                .collect(),
        };

        let memory = self.memory_usage.unwrap_or_else(|| spanning_memory(&samples));
        let cpu = self.cpu_usage.unwrap_or_default();
        let options = options.or(self.options).unwrap_or_default();
        let metadata = RunMetadata::new(self.runtime, self.version, self.experiment);

        build_report(metadata, &samples, memory, cpu, probe, &options)
    }
}
