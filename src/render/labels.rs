use super::palette::MetricKind;
use crate::snapshot::{SystemSnapshot, UptimeParts};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardLabels {
    pub title: String,
    pub backend: String,
    pub received: String,
    pub sent: String,
    pub system_uptime: String,
    pub bot_uptime: String,
    pub cpu: MeterLabels,
    pub memory: MeterLabels,
    pub disks: Vec<MeterLabels>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterLabels {
    pub kind: MetricKind,
    pub percent: f64,
    pub title: String,
    pub detail: Option<String>,
    pub caption: String,
}

impl DashboardLabels {
    pub fn from_snapshot(snapshot: &SystemSnapshot, bot_name: &str) -> Self {
        Self {
            title: format!("● {bot_name} on {} {}", snapshot.os, snapshot.arch),
            backend: format!("● {}", snapshot.backend),
            received: format!("● Recv: {}", snapshot.received_total),
            sent: format!("● Sent: {}", snapshot.sent_total),
            system_uptime: format!("System up {}", format_uptime(&snapshot.uptime)),
            bot_uptime: format!("Bot up {}", format_uptime(&snapshot.bot_uptime)),
            cpu: cpu_labels(snapshot),
            memory: MeterLabels {
                kind: MetricKind::Memory,
                percent: snapshot.mem_used_percent,
                title: format!("Memory {:.0}%", snapshot.mem_used_percent),
                detail: None,
                caption: format!(
                    "{} / {} used",
                    format_mb(snapshot.mem_used_mb),
                    format_mb(snapshot.mem_all_mb)
                ),
            },
            disks: snapshot
                .disks
                .iter()
                .map(|d| MeterLabels {
                    kind: MetricKind::Disk,
                    percent: d.used_percent,
                    title: format!("{} {}", d.name, format_mb(d.total_mb)),
                    detail: None,
                    caption: format!(
                        "{} / {} used ({:.0}%)",
                        format_mb(d.used_mb),
                        format_mb(d.total_mb),
                        d.used_percent
                    ),
                })
                .collect(),
        }
    }
}

fn cpu_labels(snapshot: &SystemSnapshot) -> MeterLabels {
    let cores = if snapshot.cpu_cores == 1 {
        "1 Core".to_string()
    } else {
        format!("{} Cores", snapshot.cpu_cores)
    };
    let caption = match snapshot.cpu_load {
        Some(load) => format!(
            "{cores} | Load {:.2} / {:.2} / {:.2}",
            load.one, load.five, load.fifteen
        ),
        None => cores,
    };
    let model = snapshot.cpu_info.trim();

    MeterLabels {
        kind: MetricKind::Cpu,
        percent: snapshot.cpu_used_percent,
        title: format!("CPU {:.0}%", snapshot.cpu_used_percent),
        detail: (!model.is_empty()).then(|| model.to_string()),
        caption,
    }
}

pub fn format_uptime(uptime: &UptimeParts) -> String {
    let unit = if uptime.days == 1 { "Day" } else { "Days" };
    format!(
        "{} {unit} {:02}:{:02}:{:02}",
        uptime.days, uptime.hours, uptime.minutes, uptime.seconds
    )
}

pub fn format_mb(mb: u64) -> String {
    if mb < 1024 {
        format!("{mb} MB")
    } else {
        format!("{:.1} GB", mb as f64 / 1024.0)
    }
}
