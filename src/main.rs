mod collectors;
mod config;
mod http;
mod metrics;
mod render;
mod snapshot;
mod state;
mod telegram;

use axum::serve;
use clap::Parser;
use collectors::system::collect_host;
use config::Config;
use metrics::Metrics;
use render::layout::LayoutConstants;
use render::{RenderResources, Renderer};
use snapshot::{SystemSnapshot, UptimeParts};
use state::{now_unix, State};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::SystemExt;
use teloxide::Bot;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CPU usage needs two refreshes this far apart to be meaningful.
const CPU_SAMPLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "statuscard")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    #[arg(long, conflicts_with = "telegram_off")]
    telegram_on: bool,
    #[arg(long, conflicts_with = "telegram_on")]
    telegram_off: bool,
    /// Render a single dashboard and exit.
    #[arg(long)]
    once: bool,
    /// Render this stored snapshot (JSON) instead of sampling the host. Implies --once.
    #[arg(long, value_name = "JSON")]
    snapshot: Option<PathBuf>,
    /// Write the PNG here instead of printing the base64:// reference.
    #[arg(long, value_name = "PNG")]
    output: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum OnceError {
    #[error("failed to read snapshot {path}: {source}")]
    ReadSnapshot {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {path}: {source}")]
    ParseSnapshot {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Render(#[from] render::RenderError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    if cli.telegram_on {
        cfg.telegram.enabled = true;
    } else if cli.telegram_off {
        cfg.telegram.enabled = false;
    }

    let resources = match RenderResources::load(&cfg.assets.font_path, &cfg.assets.background_path)
    {
        Ok(resources) => resources,
        Err(err) => {
            error!(error = %err, "failed to load render resources");
            std::process::exit(1);
        }
    };
    let renderer = Arc::new(Renderer::new(
        resources,
        LayoutConstants::default(),
        cfg.bot_name.clone(),
    ));

    if cli.once || cli.snapshot.is_some() {
        if let Err(err) = run_once(&cli, &cfg, &renderer).await {
            error!(error = %err, "single render failed");
            std::process::exit(1);
        }
        return;
    }

    let telegram_token = if cfg.telegram.enabled {
        match ensure_telegram_settings(&cfg) {
            Ok(token) => Some(token),
            Err(err) => {
                error!(error = %err, "invalid telegram settings");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    info!(
        listen = %cfg.listen,
        interval_secs = cfg.interval_secs,
        backend = cfg.backend_label(),
        "starting statuscard"
    );

    let shared_state = Arc::new(RwLock::new(State::new(now_unix())));
    let metrics = match Metrics::new() {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "failed to initialize metrics");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = {
        let listen = cfg.listen.clone();
        let app_state = http::HttpAppState {
            metrics: metrics.clone(),
            state: shared_state.clone(),
            renderer: renderer.clone(),
            backend: cfg.backend_label(),
        };
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let app = http::build_router(app_state);
            let addr: SocketAddr = match listen.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    error!(error = %err, listen = %listen, "invalid listen address");
                    return;
                }
            };

            let listener = match TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(err) => {
                    error!(error = %err, "failed to bind HTTP listener");
                    return;
                }
            };

            let server = serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });

            if let Err(err) = server.await {
                error!(error = %err, "HTTP server error");
            }
        })
    };

    let telegram_task = telegram_token.map(|token| {
        let bot = Bot::new(token);
        let telegram_cfg = cfg.telegram.clone();
        let state = shared_state.clone();
        let metrics = metrics.clone();
        let renderer = renderer.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(err) =
                telegram::run_bot(bot, telegram_cfg, state, metrics, renderer, shutdown).await
            {
                error!(error = %err, "telegram task error");
            }
        })
    });

    let collector_task = {
        let interval = Duration::from_secs(cfg.interval_secs);
        let metrics = metrics.clone();
        let shared_state = shared_state.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut system = sysinfo::System::new_all();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("collector loop stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let host = collect_host(&mut system);
                        let mut guard = shared_state.write().await;
                        guard.update_collected(now_unix(), host);
                        metrics.update_from_state(&guard);
                    }
                }
            }
        })
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl+C");
    }
    info!("Ctrl+C received, shutting down");

    let _ = shutdown_tx.send(true);

    let _ = collector_task.await;
    if let Some(task) = telegram_task {
        let _ = task.await;
    }
    let _ = http_task.await;
}

async fn run_once(cli: &Cli, cfg: &Config, renderer: &Renderer) -> Result<(), OnceError> {
    let snapshot = match &cli.snapshot {
        Some(path) => load_snapshot(path)?,
        None => {
            let mut system = sysinfo::System::new_all();
            collect_host(&mut system);
            tokio::time::sleep(CPU_SAMPLE_DELAY).await;
            let host = collect_host(&mut system);
            state::compose_snapshot(&host, cfg.backend_label(), UptimeParts::default(), 0, 0)
        }
    };

    match &cli.output {
        Some(path) => {
            let rendered = renderer.render_png(&snapshot)?;
            std::fs::write(path, &rendered.png).map_err(|source| OnceError::Write {
                path: path.display().to_string(),
                source,
            })?;
            info!(
                path = %path.display(),
                width = rendered.width,
                height = rendered.height,
                "dashboard written"
            );
        }
        None => println!("{}", renderer.render(&snapshot)?),
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<SystemSnapshot, OnceError> {
    let text = std::fs::read_to_string(path).map_err(|source| OnceError::ReadSnapshot {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| OnceError::ParseSnapshot {
        path: path.display().to_string(),
        source,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_telegram_token_from_env(env_name: &str) -> Option<String> {
    if let Ok(v) = std::env::var(env_name) {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }
    None
}

fn ensure_telegram_settings(cfg: &Config) -> Result<String, String> {
    let env_name = cfg.telegram.bot_token_env.clone();
    let env_token = resolve_telegram_token_from_env(&env_name);
    let cfg_token = cfg
        .telegram
        .bot_token
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    if cfg.telegram.allowed_chat_ids.is_empty() {
        return Err(
            "telegram.allowed_chat_ids is empty: list at least one chat id in the config"
                .to_string(),
        );
    }

    if let Some(v) = env_token {
        return Ok(v);
    }
    if let Some(v) = cfg_token {
        return Ok(v);
    }

    Err(format!(
        "telegram token not found: set '{}' in the environment or telegram.bot_token in the config",
        env_name
    ))
}
