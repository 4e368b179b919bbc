use std::hint::black_box;
use std::time::Instant;

use crate::aggregate::{build_report, ReportOptions, RunMetadata, Sample};
use crate::environment::EnvironmentProbe;
use crate::error::Result;
use crate::schema::BenchmarkReport;
use crate::snapshot::{CpuSnapshot, MemorySnapshot, ResourceSnapshotSource, SnapshotPair};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub profile: Profile,
}

impl BenchConfig {
    pub fn warmup_iters(&self) -> u64 {
        match self.profile {
            Profile::Quick => 32,
            Profile::Full => 200,
        }
    }

    pub fn iters(&self) -> u64 {
        match self.profile {
            Profile::Quick => 300,
            Profile::Full => 3_000,
        }
    }
}

/// Everything one sampling run produced, ready for aggregation.
#[derive(Clone, Debug)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
    pub memory: SnapshotPair<MemorySnapshot>,
    pub cpu: SnapshotPair<CpuSnapshot>,
}

impl SampleSet {
    pub fn durations(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.duration_nanos).collect()
    }

    pub fn into_report(
        self,
        metadata: RunMetadata,
        probe: &dyn EnvironmentProbe,
        options: &ReportOptions,
    ) -> Result<BenchmarkReport> {
        build_report(metadata, &self.samples, self.memory, self.cpu, probe, options)
    }
}

/// Time `iters` sequential calls of `f` after `warmup_iters` unmeasured ones.
///
/// Each measured call is bracketed by memory snapshots from `source`. The
/// whole-run memory and CPU pairs are taken just before the first measured
/// call and just after the last.
pub fn sample_fn<T>(
    iters: u64,
    warmup_iters: u64,
    source: &mut dyn ResourceSnapshotSource,
    mut f: impl FnMut() -> T,
) -> SampleSet {
    for _ in 0..warmup_iters {
        black_box(f());
    }

    let run_memory_before = source.memory();
    let run_cpu_before = source.cpu();

    let mut samples = Vec::with_capacity(iters as usize);
    for _ in 0..iters {
        let memory_before = source.memory();
        let start = Instant::now();
        black_box(f());
        let elapsed = start.elapsed();
        let memory_after = source.memory();

        samples.push(Sample {
            duration_nanos: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            memory: SnapshotPair::new(memory_before, memory_after),
        });
    }

    let run_cpu_after = source.cpu();
    let run_memory_after = source.memory();

    SampleSet {
        samples,
        memory: SnapshotPair::new(run_memory_before, run_memory_after),
        cpu: SnapshotPair::new(run_cpu_before, run_cpu_after),
    }
}

/// [`sample_fn`] with the iteration counts of `cfg`.
pub fn sample_with_config<T>(
    cfg: &BenchConfig,
    source: &mut dyn ResourceSnapshotSource,
    f: impl FnMut() -> T,
) -> SampleSet {
    sample_fn(cfg.iters(), cfg.warmup_iters(), source, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedProbe;
    use crate::measure::Measure;
    use crate::schema::Environment;

    /// Heap grows by 10 bytes on every read; CPU ticks by 5us.
    #[derive(Default)]
    struct CountingSource {
        reads: u64,
        cpu_reads: u64,
    }

    impl ResourceSnapshotSource for CountingSource {
        fn memory(&mut self) -> MemorySnapshot {
            self.reads += 1;
            MemorySnapshot {
                heap_used: Measure::Known(self.reads * 10),
                ..MemorySnapshot::default()
            }
        }

        fn cpu(&mut self) -> CpuSnapshot {
            self.cpu_reads += 1;
            CpuSnapshot {
                user: Measure::Known(self.cpu_reads * 5),
                system: Measure::Unknown,
            }
        }
    }

    #[test]
    fn warmup_calls_are_not_recorded() {
        let mut calls = 0u64;
        let mut source = CountingSource::default();
        let set = sample_fn(7, 3, &mut source, || {
            calls += 1;
            calls
        });

        assert_eq!(calls, 10);
        assert_eq!(set.samples.len(), 7);
        assert_eq!(set.durations().len(), 7);
    }

    #[test]
    fn snapshots_bracket_each_iteration() {
        let mut source = CountingSource::default();
        let set = sample_fn(3, 0, &mut source, || ());

        // read 1 is the run-level before; each iteration reads twice.
        assert_eq!(set.memory.before.heap_used, Measure::Known(10));
        assert_eq!(set.samples[0].memory.before.heap_used, Measure::Known(20));
        assert_eq!(set.samples[0].memory.after.heap_used, Measure::Known(30));
        assert_eq!(set.samples[2].memory.after.heap_used, Measure::Known(70));
        assert_eq!(set.memory.after.heap_used, Measure::Known(80));

        assert_eq!(set.cpu.usage().diff.user, Measure::Known(5));
        assert_eq!(set.cpu.usage().diff.system, Measure::Unknown);
    }

    #[test]
    fn sample_set_builds_a_report() {
        let mut source = CountingSource::default();
        let set = sample_fn(20, 2, &mut source, || (0..100u64).sum::<u64>());
        let report = set
            .into_report(
                RunMetadata::new("native", "1.0", "sum_0_100"),
                &FixedProbe(Environment::unknown()),
                &ReportOptions::default(),
            )
            .unwrap();

        assert_eq!(report.metrics.execution_times.len(), 20);
        assert_eq!(report.detailed_iteration_metrics.unwrap().len(), 20);
        assert_eq!(
            report.statistics.mean.to_bits(),
            report.metrics.average_execution_time.to_bits()
        );
    }

    #[test]
    fn zero_iterations_cannot_be_reported() {
        let mut source = CountingSource::default();
        let set = sample_fn(0, 0, &mut source, || ());
        assert!(set.samples.is_empty());
        assert!(set
            .into_report(
                RunMetadata::new("native", "1.0", "noop"),
                &FixedProbe(Environment::unknown()),
                &ReportOptions::default(),
            )
            .is_err());
    }

    #[test]
    fn profile_counts() {
        let quick = BenchConfig {
            profile: Profile::Quick,
        };
        let full = BenchConfig {
            profile: Profile::Full,
        };
        assert!(quick.iters() < full.iters());
        assert!(quick.warmup_iters() < full.warmup_iters());
        assert_eq!(full.profile.as_str(), "full");
    }
}
