use serde::{Deserialize, Serialize};

const MB: u64 = 1024 * 1024;

/// Everything the dashboard shows, captured at one point in time.
///
/// Sizes are in MB, percentages in `0..=100`, counters are plain totals.
/// Callers are expected to hand over consistent values; the renderer does not
/// clamp or reject them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_used_percent: f64,
    pub cpu_cores: u32,
    pub cpu_info: String,
    #[serde(default)]
    pub cpu_load: Option<LoadAverage>,
    pub mem_all_mb: u64,
    pub mem_used_mb: u64,
    pub mem_used_percent: f64,
    #[serde(default)]
    pub disks: Vec<DiskEntry>,
    pub uptime: UptimeParts,
    pub bot_uptime: UptimeParts,
    pub os: String,
    pub arch: String,
    pub backend: String,
    pub sent_total: u64,
    pub received_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskEntry {
    pub name: String,
    pub total_mb: u64,
    pub used_mb: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl UptimeParts {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / MB
}

pub fn percent(used: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        (used / total) * 100.0
    }
}
