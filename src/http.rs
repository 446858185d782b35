use crate::metrics::Metrics;
use crate::render::{RenderedImage, Renderer};
use crate::state::{now_unix, State as AgentState};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::warn;

const SURFACE: &str = "http";

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub state: Arc<RwLock<AgentState>>,
    pub renderer: Arc<Renderer>,
    pub backend: &'static str,
}

pub fn build_router(app: HttpAppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/status.png", get(status_png_handler))
        .with_state(app)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(app): State<HttpAppState>) -> Response {
    {
        let guard = app.state.read().await;
        app.metrics.update_from_state(&guard);
    }
    match app.metrics.encode_metrics() {
        Ok(encoded) => with_content_type(encoded, "text/plain; version=0.0.4"),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}

async fn snapshot_handler(State(app): State<HttpAppState>) -> Response {
    let snapshot = app.state.read().await.snapshot(app.backend, now_unix());
    match snapshot {
        Some(snapshot) => Json(snapshot).into_response(),
        None => not_collected_yet(),
    }
}

async fn status_png_handler(State(app): State<HttpAppState>) -> Response {
    let Some(snapshot) = app.state.read().await.snapshot(app.backend, now_unix()) else {
        return not_collected_yet();
    };

    let renderer = app.renderer.clone();
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || renderer.render_png(&snapshot)).await;

    match result {
        Ok(Ok(RenderedImage { png, height, .. })) => {
            app.metrics.observe_render(SURFACE, started.elapsed(), Some(height));
            with_content_type(png, "image/png")
        }
        Ok(Err(err)) => {
            app.metrics.inc_render_error(SURFACE);
            warn!(error = %err, "dashboard render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("render failed: {err}")).into_response()
        }
        Err(err) => {
            app.metrics.inc_render_error(SURFACE);
            warn!(error = %err, "render task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "render task failed").into_response()
        }
    }
}

fn with_content_type(body: Vec<u8>, content_type: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn not_collected_yet() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "no host sample collected yet",
    )
        .into_response()
}
