use std::path::Path;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::measure::Measure;
use crate::schema::Environment;

pub trait EnvironmentProbe {
    fn environment(&self) -> Environment;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl EnvironmentProbe for SystemProbe {
    fn environment(&self) -> Environment {
        Environment {
            platform: std::env::consts::OS.to_string(),
            is_docker: detect_docker(),
            cpu_count: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get() as u64)
                .into(),
            total_memory: detect_total_memory(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixedProbe(pub Environment);

impl EnvironmentProbe for FixedProbe {
    fn environment(&self) -> Environment {
        self.0.clone()
    }
}

fn detect_total_memory() -> Measure<u64> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
    );
    match system.total_memory() {
        0 => Measure::Unknown,
        bytes => Measure::Known(bytes),
    }
}

fn detect_docker() -> bool {
    if Path::new("/.dockerenv").exists() {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(cgroup) = std::fs::read_to_string("/proc/1/cgroup") {
            return cgroup_mentions_container(&cgroup);
        }
    }

    false
}

fn cgroup_mentions_container(cgroup: &str) -> bool {
    cgroup
        .lines()
        .any(|line| line.contains("docker") || line.contains("containerd") || line.contains("kubepods"))
}
