pub mod system;

use crate::snapshot::{DiskEntry, LoadAverage, UptimeParts};

/// Host-side part of a dashboard snapshot, as read from the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSample {
    pub cpu_used_percent: f64,
    pub cpu_cores: u32,
    pub cpu_info: String,
    pub cpu_load: Option<LoadAverage>,
    pub mem_all_mb: u64,
    pub mem_used_mb: u64,
    pub mem_used_percent: f64,
    pub disks: Vec<DiskEntry>,
    pub uptime: UptimeParts,
    pub os: String,
    pub arch: String,
}
