use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use runtime_bench_metrics::harness::{sample_with_config, BenchConfig, Profile};
use runtime_bench_metrics::results::{self, ReportFilter};
use runtime_bench_metrics::snapshot::ProcessSource;
use runtime_bench_metrics::summary;
use runtime_bench_metrics::writer::{report_path, write_json, write_report};
use runtime_bench_metrics::{
    BenchmarkReport, EnvironmentProbe, ReportOptions, ResourceSnapshotSource, RunMetadata,
    SystemProbe,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a sample-set file into a benchmark report.
    Report {
        /// JSON file with `runtime`, `version`, `experiment` and either
        /// `executionTimes` or `samples`.
        #[arg(long, value_name = "FILE")]
        samples: PathBuf,

        /// Leave out `detailedIterationMetrics`.
        #[arg(long, default_value_t = false)]
        no_detailed: bool,

        /// Do not probe the host; the environment block is reported as unknown.
        #[arg(long, default_value_t = false)]
        no_environment: bool,
    },

    /// Compare runtimes across the reports in a results directory.
    Summarize {
        #[arg(long, value_name = "DIR")]
        results_dir: PathBuf,

        /// Keep experiments whose label contains this text.
        #[arg(long)]
        experiment: Option<String>,

        /// Keep only this runtime.
        #[arg(long)]
        runtime: Option<String>,

        /// How deep to look for report files below the directory.
        #[arg(long, default_value_t = 1)]
        depth: usize,
    },

    /// Print the detected environment and a snapshot of this process.
    Probe,

    /// Measure the sampling harness itself on an empty body.
    Overhead,
}

#[derive(Parser, Debug)]
#[command(name = "runtime-bench-metrics")]
#[command(about = "Benchmark report aggregation for JavaScript runtimes (JSON output)")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Quick, global = true)]
    profile: ProfileArg,

    /// Where to write the command's JSON output. It is always printed to stdout too.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Directory for reports named `<runtime>_<experiment>_<millis>.json`.
    /// Only `report` and `overhead` produce reports; ignored when `--out` is given.
    #[arg(long, global = true, value_name = "DIR")]
    results_dir_out: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

/// Persist the report if a destination was asked for. A failed write is
/// logged and does not fail the run.
fn persist(report: &BenchmarkReport, args: &Args) {
    let path = match (&args.out, &args.results_dir_out) {
        (Some(out), _) => out.clone(),
        (None, Some(dir)) => report_path(dir, report),
        (None, None) => return,
    };
    if let Err(err) = write_report(report, &path) {
        warn!(error = %err, "report not persisted");
    }
}

/// Write non-report output to `--out`, if given.
fn persist_json<T: serde::Serialize>(value: &T, args: &Args) {
    if args.results_dir_out.is_some() {
        warn!("--results-dir-out only applies to `report` and `overhead`");
    }
    if let Some(out) = &args.out {
        if let Err(err) = write_json(value, out) {
            warn!(error = %err, "output not persisted");
        }
    }
}

fn emit<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runtime_bench_metrics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let cfg = BenchConfig {
        profile: args.profile.into(),
    };

    match &args.cmd {
        Command::Report {
            samples,
            no_detailed,
            no_environment,
        } => {
            let set = results::read_sample_set(samples)
                .with_context(|| format!("loading sample set {}", samples.display()))?;

            // Flags only override what the file asks for when given.
            let mut options = set.options.unwrap_or_default();
            if *no_detailed {
                options.detailed_metrics = false;
            }
            if *no_environment {
                options.include_environment = false;
            }

            let report = set
                .into_report(&SystemProbe, Some(options))
                .context("building report")?;
            persist(&report, &args);
            emit(&report)?;
        }
        Command::Summarize {
            results_dir,
            experiment,
            runtime,
            depth,
        } => {
            let filter = ReportFilter {
                experiment: experiment.clone(),
                runtime: runtime.clone(),
            };
            let reports = results::load_reports_with_depth(results_dir, &filter, *depth)
                .with_context(|| format!("loading reports from {}", results_dir.display()))?;
            if reports.is_empty() {
                warn!(dir = %results_dir.display(), "no matching reports");
            }
            let comparison = summary::summarize(&reports);
            persist_json(&comparison, &args);
            emit(&comparison)?;
        }
        Command::Probe => {
            let mut source = ProcessSource::new();
            let host = json!({
                "environment": SystemProbe.environment(),
                "memory": source.memory(),
                "cpu": source.cpu(),
            });
            persist_json(&host, &args);
            emit(&host)?;
        }
        Command::Overhead => {
            let mut source = ProcessSource::new();
            let set = sample_with_config(&cfg, &mut source, || ());
            let metadata = RunMetadata::new(
                "native",
                env!("CARGO_PKG_VERSION"),
                format!("harness_overhead_{}", cfg.profile.as_str()),
            );
            let report = set
                .into_report(metadata, &SystemProbe, &ReportOptions::default())
                .context("building overhead report")?;
            persist(&report, &args);
            emit(&report)?;
        }
    }

    Ok(())
}
