use crate::collectors::HostSample;
use crate::snapshot::{bytes_to_mb, percent, DiskEntry, LoadAverage, UptimeParts};
use std::collections::HashSet;
use sysinfo::{CpuExt, DiskExt, System, SystemExt};
use tracing::debug;

pub fn collect_host(system: &mut System) -> HostSample {
    system.refresh_cpu();
    system.refresh_memory();
    system.refresh_disks_list();
    system.refresh_disks();

    let cpu_used_percent = f64::from(system.global_cpu_info().cpu_usage()).clamp(0.0, 100.0);
    let cpu_cores = system.cpus().len() as u32;
    let cpu_info = system
        .cpus()
        .first()
        .map(|c| strip_cpu_frequency(c.brand()))
        .unwrap_or_default();

    let mem_total = system.total_memory();
    let mem_used = system.used_memory().min(mem_total);

    let mut seen = HashSet::new();
    let disks: Vec<DiskEntry> = system
        .disks()
        .iter()
        .filter(|d| d.total_space() > 0)
        .filter(|d| seen.insert(d.mount_point().to_path_buf()))
        .map(|d| {
            let total = d.total_space();
            let used = total.saturating_sub(d.available_space());
            DiskEntry {
                name: d.mount_point().to_string_lossy().to_string(),
                total_mb: bytes_to_mb(total),
                used_mb: bytes_to_mb(used),
                used_percent: percent(used as f64, total as f64),
            }
        })
        .collect();

    debug!(
        cpu = cpu_used_percent,
        cores = cpu_cores,
        disks = disks.len(),
        "host sample collected"
    );

    HostSample {
        cpu_used_percent,
        cpu_cores,
        cpu_info,
        cpu_load: load_average(system),
        mem_all_mb: bytes_to_mb(mem_total),
        mem_used_mb: bytes_to_mb(mem_used),
        mem_used_percent: percent(mem_used as f64, mem_total as f64),
        disks,
        uptime: UptimeParts::from_secs(system.uptime()),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

#[cfg(not(target_os = "windows"))]
fn load_average(system: &System) -> Option<LoadAverage> {
    let load = system.load_average();
    Some(LoadAverage {
        one: load.one,
        five: load.five,
        fifteen: load.fifteen,
    })
}

#[cfg(target_os = "windows")]
fn load_average(_system: &System) -> Option<LoadAverage> {
    None
}

/// "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz" -> "Intel(R) Core(TM) i7-8700K CPU"
fn strip_cpu_frequency(brand: &str) -> String {
    let trimmed = brand.trim();
    match trimmed.rfind(" @ ") {
        Some(idx) if trimmed[idx..].trim_end().ends_with("Hz") => trimmed[..idx].trim_end().to_string(),
        _ => trimmed.to_string(),
    }
}
