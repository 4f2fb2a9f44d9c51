use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::analysis::ComparisonResult;
use crate::engine::CoachEngine;
use crate::telemetry::{self, TelemetrySnapshot};

use super::sse;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct DebugHttpState {
    pub engine: &'static CoachEngine,
    token: Arc<String>,
}

impl DebugHttpState {
    pub fn new(engine: &'static CoachEngine, token: String) -> Self {
        Self {
            engine,
            token: Arc::new(token),
        }
    }

    fn authorize(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), HttpServerError> {
        match extract_token(headers, query_token) {
            Some(value) if value == *self.token => Ok(()),
            _ => Err(HttpServerError::Unauthorized),
        }
    }
}

/// Query payload for extracting token from URL.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Unauthorized,
    ServiceUnavailable(&'static str),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "missing or invalid token"),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_running: bool,
    pub poll_interval_ms: u64,
    pub voice_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub latest_comparison: Option<ComparisonResult>,
    pub diagnostics: TelemetrySnapshot,
}

/// Body of `POST /voice`.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceToggle {
    pub muted: bool,
}

#[derive(Debug, Serialize)]
pub struct VoiceAck {
    pub muted: bool,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: DebugHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/comparison-stream", get(comparison_stream_handler))
        .route("/cue-stream", get(cue_stream_handler))
        .route("/voice", post(set_voice))
        .with_state(state)
}

/// Run the HTTP server loop.
pub async fn run_http_server(state: DebugHttpState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding debug HTTP listener")?;
    axum::serve(listener, build_router(state))
        .await
        .context("serving debug HTTP router")?;
    Ok(())
}

pub async fn health(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let config = state.engine.config();
    Ok(Json(HealthResponse {
        status: "ok",
        session_running: state.engine.is_running(),
        poll_interval_ms: config.comparison.poll_interval_ms,
        voice_enabled: config.voice.enabled,
    }))
}

pub async fn metrics(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<MetricsResponse>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let latest_comparison = state
        .engine
        .subscribe_comparisons()
        .and_then(|mut rx| drain_broadcast(&mut rx));

    Ok(Json(MetricsResponse {
        latest_comparison,
        diagnostics: telemetry::hub().snapshot(),
    }))
}

pub async fn comparison_stream_handler(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<sse::EventStream, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    sse::comparisons(state.engine)
}

pub async fn cue_stream_handler(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<sse::EventStream, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;
    sse::cues(state.engine)
}

pub async fn set_voice(
    State(state): State<DebugHttpState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    Json(toggle): Json<VoiceToggle>,
) -> Result<Json<VoiceAck>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    if toggle.muted {
        state.engine.mute_voice();
    } else {
        state.engine.unmute_voice();
    }
    Ok(Json(VoiceAck {
        muted: toggle.muted,
    }))
}

fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(token) = query_token {
        return Some(token.to_string());
    }

    static X_DEBUG_TOKEN: HeaderName = HeaderName::from_static("x-debug-token");

    headers
        .get(&X_DEBUG_TOKEN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.strip_prefix("Bearer ").map(|v| v.to_string()))
        })
}

fn drain_broadcast<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(value) => latest = Some(value),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Closed) => return None,
        }
    }
    latest
}
