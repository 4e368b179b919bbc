use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::schema::BenchmarkReport;

pub fn write_report(report: &BenchmarkReport, path: &Path) -> Result<()> {
    write_json(report, path)?;
    info!(path = %path.display(), runtime = %report.runtime, experiment = %report.experiment, "wrote report");
    Ok(())
}

/// Write `value` as pretty JSON via a temp file renamed over `path`.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| ReportError::write(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ReportError::write(path, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.write_all(b"\n"))
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ReportError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| ReportError::write(path, e.error))?;
    Ok(())
}

/// `<runtime>_<experiment>_<unix millis>.json` inside `dir`.
pub fn report_path(dir: &Path, report: &BenchmarkReport) -> PathBuf {
    let name = format!(
        "{}_{}_{}.json",
        sanitize(&report.runtime),
        sanitize(&report.experiment),
        report.timestamp.timestamp_millis()
    );
    dir.join(name)
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
