use crate::config::TelegramConfig;
use crate::metrics::Metrics;
use crate::render::{ImageRefError, RenderError, Renderer};
use crate::snapshot::SystemSnapshot;
use crate::state::{now_unix, State};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

const SURFACE: &str = "telegram";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("rendered image reference is unusable: {0}")]
    ImageRef(#[from] ImageRefError),
}

#[derive(Clone)]
struct TelegramRuntime {
    shared_state: Arc<RwLock<State>>,
    metrics: Arc<Metrics>,
    renderer: Arc<Renderer>,
    allowed_chats: HashSet<i64>,
    limiter: Arc<Mutex<RateLimiter>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Help,
    Status,
}

impl Action {
    fn from_command(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let normalized = first.split('@').next()?.to_lowercase();
        match normalized.as_str() {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/status" | "/stat" | "/dashboard" => Some(Self::Status),
            _ => None,
        }
    }
}

pub async fn run_bot(
    bot: Bot,
    cfg: TelegramConfig,
    shared_state: Arc<RwLock<State>>,
    metrics: Arc<Metrics>,
    renderer: Arc<Renderer>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), TelegramError> {
    let runtime = TelegramRuntime {
        shared_state,
        metrics,
        renderer,
        allowed_chats: cfg.allowed_chat_ids.iter().copied().collect(),
        limiter: Arc::new(Mutex::new(RateLimiter::new(cfg.rate_limit_per_minute))),
    };

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![runtime])
        .build();

    let mut dispatch_handle = tokio::spawn(async move {
        dispatcher.dispatch().await;
    });

    tokio::select! {
        _ = shutdown.changed() => {
            dispatch_handle.abort();
            let _ = (&mut dispatch_handle).await;
            info!("telegram bot stopped");
            Ok(())
        }
        result = &mut dispatch_handle => {
            match result {
                Ok(()) => Ok(()),
                Err(join_err) if join_err.is_cancelled() => Ok(()),
                Err(join_err) => {
                    warn!(error = %join_err, "telegram task failed");
                    Ok(())
                }
            }
        }
    }
}

async fn handle_message(bot: Bot, msg: Message, runtime: TelegramRuntime) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    if !should_handle_message(msg.chat.is_private(), chat_id, &runtime.allowed_chats) {
        return Ok(());
    }
    let Some(action) = msg.text().and_then(Action::from_command) else {
        return Ok(());
    };
    runtime.shared_state.write().await.record_received();

    if !consume_rate_limit(&runtime, chat_id).await {
        bot.send_message(msg.chat.id, "Too many requests. Try again in a minute.")
            .await?;
        record_sent(&runtime).await;
        return Ok(());
    }

    match action {
        Action::Start | Action::Help => {
            bot.send_message(msg.chat.id, help_text()).await?;
        }
        Action::Status => send_dashboard(&bot, msg.chat.id, &runtime).await?,
    }
    record_sent(&runtime).await;
    Ok(())
}

async fn send_dashboard(bot: &Bot, chat: ChatId, runtime: &TelegramRuntime) -> ResponseResult<()> {
    let (snapshot, last_collect) = {
        let state = runtime.shared_state.read().await;
        (
            state.snapshot(SURFACE, now_unix()),
            state.last_collect_timestamp_seconds,
        )
    };
    let Some(snapshot) = snapshot else {
        bot.send_message(chat, "No metrics collected yet, try again in a few seconds.")
            .await?;
        return Ok(());
    };

    let renderer = runtime.renderer.clone();
    let started = Instant::now();
    let rendered = tokio::task::spawn_blocking(move || render_photo(&renderer, &snapshot)).await;

    let png = match rendered {
        Ok(Ok(png)) => {
            runtime.metrics.observe_render(SURFACE, started.elapsed(), None);
            debug!(chat_id = chat.0, bytes = png.len(), "sending dashboard");
            png
        }
        Ok(Err(err)) => {
            runtime.metrics.inc_render_error(SURFACE);
            warn!(error = %err, "dashboard render failed");
            bot.send_message(chat, "Failed to render the dashboard.").await?;
            return Ok(());
        }
        Err(err) => {
            runtime.metrics.inc_render_error(SURFACE);
            warn!(error = %err, "render task failed");
            bot.send_message(chat, "Failed to render the dashboard.").await?;
            return Ok(());
        }
    };

    bot.send_photo(chat, InputFile::memory(png).file_name("status.png"))
        .caption(format_last_collect_line(last_collect, now_unix()))
        .await?;
    Ok(())
}

fn render_photo(renderer: &Renderer, snapshot: &SystemSnapshot) -> Result<Vec<u8>, TelegramError> {
    let image = renderer.render(snapshot)?;
    Ok(image.png_bytes()?)
}

async fn record_sent(runtime: &TelegramRuntime) {
    runtime.shared_state.write().await.record_sent();
}

fn help_text() -> String {
    [
        "Commands",
        "/status - render the server dashboard (also /stat, /dashboard)",
        "/help - show this message",
    ]
    .join("\n")
}

async fn consume_rate_limit(runtime: &TelegramRuntime, chat_id: i64) -> bool {
    let now = now_unix();
    let mut limiter = runtime.limiter.lock().await;
    limiter.allow(chat_id, now)
}

pub fn should_handle_message(is_private: bool, chat_id: i64, allowed: &HashSet<i64>) -> bool {
    is_private && allowed.contains(&chat_id)
}

#[derive(Debug)]
struct RateLimiter {
    limit_per_minute: u32,
    timestamps_by_chat: HashMap<i64, VecDeque<i64>>,
}

impl RateLimiter {
    fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute,
            timestamps_by_chat: HashMap::new(),
        }
    }

    fn allow(&mut self, chat_id: i64, now_unix: i64) -> bool {
        let queue = self.timestamps_by_chat.entry(chat_id).or_default();
        while let Some(ts) = queue.front().copied() {
            if now_unix - ts >= 60 {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.limit_per_minute as usize {
            return false;
        }

        queue.push_back(now_unix);
        true
    }
}

fn format_unix(ts: i64) -> String {
    let st = UNIX_EPOCH + Duration::from_secs(ts.max(0) as u64);
    humantime::format_rfc3339_seconds(st).to_string()
}

fn format_last_collect_line(last_collect_ts: i64, now: i64) -> String {
    if last_collect_ts <= 0 {
        return "Collected: n/a".to_string();
    }

    let age = now.saturating_sub(last_collect_ts).max(0) as u64;
    let relative = if age < 60 {
        format!("{age}s ago")
    } else if age < 3600 {
        format!("{}m ago", age / 60)
    } else {
        format!("{}h ago", age / 3600)
    };

    format!("Collected: {} ({relative})", format_unix(last_collect_ts))
}
