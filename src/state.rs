use crate::collectors::HostSample;
use crate::snapshot::{SystemSnapshot, UptimeParts};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Default)]
pub struct State {
    pub started_at_unix: i64,
    pub last_collect_timestamp_seconds: i64,
    pub host: Option<HostSample>,
    pub received_total: u64,
    pub sent_total: u64,
}

impl State {
    pub fn new(now_unix: i64) -> Self {
        Self {
            started_at_unix: now_unix,
            ..Self::default()
        }
    }

    pub fn update_collected(&mut self, now_unix: i64, host: HostSample) {
        self.last_collect_timestamp_seconds = now_unix;
        self.host = Some(host);
    }

    pub fn record_received(&mut self) {
        self.received_total = self.received_total.saturating_add(1);
    }

    pub fn record_sent(&mut self) {
        self.sent_total = self.sent_total.saturating_add(1);
    }

    pub fn bot_uptime_seconds(&self, now_unix: i64) -> u64 {
        now_unix.saturating_sub(self.started_at_unix).max(0) as u64
    }

    /// Full dashboard input, or `None` until the first host sample arrives.
    pub fn snapshot(&self, backend: &str, now_unix: i64) -> Option<SystemSnapshot> {
        let host = self.host.as_ref()?;
        Some(compose_snapshot(
            host,
            backend,
            UptimeParts::from_secs(self.bot_uptime_seconds(now_unix)),
            self.sent_total,
            self.received_total,
        ))
    }
}

pub fn compose_snapshot(
    host: &HostSample,
    backend: &str,
    bot_uptime: UptimeParts,
    sent_total: u64,
    received_total: u64,
) -> SystemSnapshot {
    SystemSnapshot {
        cpu_used_percent: host.cpu_used_percent,
        cpu_cores: host.cpu_cores,
        cpu_info: host.cpu_info.clone(),
        cpu_load: host.cpu_load,
        mem_all_mb: host.mem_all_mb,
        mem_used_mb: host.mem_used_mb,
        mem_used_percent: host.mem_used_percent,
        disks: host.disks.clone(),
        uptime: host.uptime,
        bot_uptime,
        os: host.os.clone(),
        arch: host.arch.clone(),
        backend: backend.to_string(),
        sent_total,
        received_total,
    }
}

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
