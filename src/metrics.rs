use crate::state::{now_unix, State};
use prometheus::core::Collector;
use prometheus::{
    opts, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub statuscard_renders_total: CounterVec,
    pub statuscard_render_errors_total: CounterVec,
    pub statuscard_render_duration_seconds: Histogram,
    pub statuscard_last_render_height_pixels: Gauge,
    pub statuscard_cpu_usage_percent: Gauge,
    pub statuscard_memory_usage_percent: Gauge,
    pub statuscard_disk_count: Gauge,
    pub statuscard_messages_received_total: Gauge,
    pub statuscard_messages_sent_total: Gauge,
    pub statuscard_last_collect_timestamp_seconds: Gauge,
    pub statuscard_uptime_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let statuscard_renders_total = CounterVec::new(
            opts!("statuscard_renders_total", "Dashboards rendered, by requesting surface"),
            &["surface"],
        )?;
        let statuscard_render_errors_total = CounterVec::new(
            opts!(
                "statuscard_render_errors_total",
                "Dashboard renders that failed, by requesting surface"
            ),
            &["surface"],
        )?;
        let statuscard_render_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "statuscard_render_duration_seconds",
                "Time spent laying out, painting and encoding one dashboard",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;
        let statuscard_last_render_height_pixels = Gauge::with_opts(opts!(
            "statuscard_last_render_height_pixels",
            "Canvas height of the most recent dashboard"
        ))?;
        let statuscard_cpu_usage_percent = Gauge::with_opts(opts!(
            "statuscard_cpu_usage_percent",
            "Global CPU usage in percent (0..100)"
        ))?;
        let statuscard_memory_usage_percent = Gauge::with_opts(opts!(
            "statuscard_memory_usage_percent",
            "Memory usage in percent (0..100)"
        ))?;
        let statuscard_disk_count =
            Gauge::with_opts(opts!("statuscard_disk_count", "Number of mounted disks"))?;
        let statuscard_messages_received_total = Gauge::with_opts(opts!(
            "statuscard_messages_received_total",
            "Chat messages handled by the bot"
        ))?;
        let statuscard_messages_sent_total = Gauge::with_opts(opts!(
            "statuscard_messages_sent_total",
            "Replies sent by the bot"
        ))?;
        let statuscard_last_collect_timestamp_seconds = Gauge::with_opts(opts!(
            "statuscard_last_collect_timestamp_seconds",
            "Unix time of the last host sample"
        ))?;
        let statuscard_uptime_seconds = Gauge::with_opts(opts!(
            "statuscard_uptime_seconds",
            "Seconds since the process started"
        ))?;

        register(&registry, &statuscard_renders_total)?;
        register(&registry, &statuscard_render_errors_total)?;
        register(&registry, &statuscard_render_duration_seconds)?;
        register(&registry, &statuscard_last_render_height_pixels)?;
        register(&registry, &statuscard_cpu_usage_percent)?;
        register(&registry, &statuscard_memory_usage_percent)?;
        register(&registry, &statuscard_disk_count)?;
        register(&registry, &statuscard_messages_received_total)?;
        register(&registry, &statuscard_messages_sent_total)?;
        register(&registry, &statuscard_last_collect_timestamp_seconds)?;
        register(&registry, &statuscard_uptime_seconds)?;

        Ok(Arc::new(Self {
            registry,
            statuscard_renders_total,
            statuscard_render_errors_total,
            statuscard_render_duration_seconds,
            statuscard_last_render_height_pixels,
            statuscard_cpu_usage_percent,
            statuscard_memory_usage_percent,
            statuscard_disk_count,
            statuscard_messages_received_total,
            statuscard_messages_sent_total,
            statuscard_last_collect_timestamp_seconds,
            statuscard_uptime_seconds,
        }))
    }

    pub fn update_from_state(&self, state: &State) {
        if let Some(host) = &state.host {
            self.statuscard_cpu_usage_percent.set(host.cpu_used_percent);
            self.statuscard_memory_usage_percent
                .set(host.mem_used_percent);
            self.statuscard_disk_count.set(host.disks.len() as f64);
        }
        self.statuscard_messages_received_total
            .set(state.received_total as f64);
        self.statuscard_messages_sent_total
            .set(state.sent_total as f64);
        self.statuscard_last_collect_timestamp_seconds
            .set(state.last_collect_timestamp_seconds as f64);
        self.statuscard_uptime_seconds
            .set(state.bot_uptime_seconds(now_unix()) as f64);
    }

    pub fn observe_render(&self, surface: &str, elapsed: Duration, height: Option<u32>) {
        self.statuscard_renders_total
            .with_label_values(&[surface])
            .inc();
        self.statuscard_render_duration_seconds
            .observe(elapsed.as_secs_f64());
        if let Some(height) = height {
            self.statuscard_last_render_height_pixels
                .set(f64::from(height));
        }
    }

    pub fn inc_render_error(&self, surface: &str) {
        self.statuscard_render_errors_total
            .with_label_values(&[surface])
            .inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}
