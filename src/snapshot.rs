use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::measure::{delta, Measure};
use crate::schema::ResourceUsage;

/// Memory counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    #[serde(default)]
    pub rss: Measure<u64>,
    #[serde(default)]
    pub heap_total: Measure<u64>,
    #[serde(default)]
    pub heap_used: Measure<u64>,
    #[serde(default)]
    pub external: Measure<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDiff {
    #[serde(default)]
    pub rss: Measure<i64>,
    #[serde(default)]
    pub heap_total: Measure<i64>,
    #[serde(default)]
    pub heap_used: Measure<i64>,
    #[serde(default)]
    pub external: Measure<i64>,
}

/// Process CPU time in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    #[serde(default)]
    pub user: Measure<u64>,
    #[serde(default)]
    pub system: Measure<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuDiff {
    #[serde(default)]
    pub user: Measure<i64>,
    #[serde(default)]
    pub system: Measure<i64>,
}

pub trait Snapshot: Copy {
    type Diff;

    fn diff(&self, after: &Self) -> Self::Diff;
}

impl Snapshot for MemorySnapshot {
    type Diff = MemoryDiff;

    fn diff(&self, after: &Self) -> MemoryDiff {
        MemoryDiff {
            rss: delta(self.rss, after.rss),
            heap_total: delta(self.heap_total, after.heap_total),
            heap_used: delta(self.heap_used, after.heap_used),
            external: delta(self.external, after.external),
        }
    }
}

impl Snapshot for CpuSnapshot {
    type Diff = CpuDiff;

    fn diff(&self, after: &Self) -> CpuDiff {
        CpuDiff {
            user: delta(self.user, after.user),
            system: delta(self.system, after.system),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPair<T> {
    #[serde(default)]
    pub before: T,
    #[serde(default)]
    pub after: T,
}

impl<T: Snapshot> SnapshotPair<T> {
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }

    pub fn usage(&self) -> ResourceUsage<T, T::Diff> {
        ResourceUsage {
            before: self.before,
            after: self.after,
            diff: self.before.diff(&self.after),
        }
    }
}

pub trait ResourceSnapshotSource {
    fn memory(&mut self) -> MemorySnapshot;

    fn cpu(&mut self) -> CpuSnapshot;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSource;

impl ResourceSnapshotSource for UnavailableSource {
    fn memory(&mut self) -> MemorySnapshot {
        MemorySnapshot::default()
    }

    fn cpu(&mut self) -> CpuSnapshot {
        CpuSnapshot::default()
    }
}

/// RSS and CPU time of this process. Heap and external stay unknown.
pub struct ProcessSource {
    pid: Pid,
    system: System,
}

impl Default for ProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()),
        );
        Self { pid, system }
    }
}

impl ResourceSnapshotSource for ProcessSource {
    fn memory(&mut self) -> MemorySnapshot {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );

        MemorySnapshot {
            rss: self.system.process(self.pid).map(|p| p.memory()).into(),
            ..MemorySnapshot::default()
        }
    }

    fn cpu(&mut self) -> CpuSnapshot {
        rusage_cpu().unwrap_or_default()
    }
}

#[cfg(unix)]
fn rusage_cpu() -> Option<CpuSnapshot> {
    // SAFETY: rusage is a plain-old-data struct; zeroing all bytes is a valid initial state.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage(RUSAGE_SELF, &mut usage) only writes into the struct we own.
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return None;
    }

    let micros = |tv: libc::timeval| -> u64 {
        (tv.tv_sec as u64)
            .saturating_mul(1_000_000)
            .saturating_add(tv.tv_usec as u64)
    };

    Some(CpuSnapshot {
        user: Measure::Known(micros(usage.ru_utime)),
        system: Measure::Known(micros(usage.ru_stime)),
    })
}

#[cfg(not(unix))]
fn rusage_cpu() -> Option<CpuSnapshot> {
    None
}
