//! HTTP API for the purge agent.
//!
//! - `GET  /api/health`          liveness and current mapping count
//! - `POST /api/events`          deliver one content-change event
//! - `POST /api/test`            purge the test object on staging
//! - `POST /api/mappings/reload` re-read the configured mapping source

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use edgeflush_core::agent::mapping_source;
use edgeflush_core::config::MappingConfig;
use edgeflush_core::errors::AgentError;
use edgeflush_core::models::{ChangeEvent, DeliveryReport, DispatchResult};
use edgeflush_core::PurgeAgent;

/// Shared state for all handlers.
pub struct AppState {
    pub agent: PurgeAgent,
    pub mapping: MappingConfig,
    pub started_at: Instant,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/events", post(deliver_event))
        .route("/api/test", post(connection_test))
        .route("/api/mappings/reload", post(reload_mappings))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: String,
    mode: String,
    mappings: usize,
    uptime_secs: u64,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.agent.mode().to_string(),
        mappings: state.agent.mappings().len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EventRequest {
    /// Transport URI of the sending replication agent, when it has one.
    #[serde(default)]
    transport_uri: Option<String>,
    #[serde(flatten)]
    event: ChangeEvent,
}

#[derive(Serialize)]
struct EventResponse {
    ok: bool,
    handled: bool,
    #[serde(flatten)]
    report: Option<DeliveryReport>,
}

async fn deliver_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    if let Some(ref uri) = request.transport_uri {
        if !PurgeAgent::can_handle(uri) {
            info!(transport_uri = %uri, "event is for another transport; ignoring");
            return Ok((
                StatusCode::OK,
                Json(EventResponse {
                    ok: true,
                    handled: false,
                    report: None,
                }),
            ));
        }
    }

    let report = state.agent.deliver(request.event).await?;
    let status = if report.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((
        status,
        Json(EventResponse {
            ok: report.is_ok(),
            handled: true,
            report: Some(report),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Connection test
// ---------------------------------------------------------------------------

async fn connection_test(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DispatchResult>), AppError> {
    let result = state
        .agent
        .dispatcher()
        .test()
        .await
        .map_err(|e| AppError::Internal(format!("connection test could not run: {}", e)))?;
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(result)))
}

// ---------------------------------------------------------------------------
// Mapping reload
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReloadResponse {
    ok: bool,
    mappings: usize,
}

async fn reload_mappings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, AppError> {
    let source = mapping_source(&state.mapping);
    let count = state.agent.reload_mappings(source.as_ref()).map_err(|e| {
        warn!(error = %e, "mapping reload failed; keeping current table");
        AppError::Internal(format!("mapping reload failed: {}", e))
    })?;
    Ok(Json(ReloadResponse {
        ok: true,
        mappings: count,
    }))
}

// ---------------------------------------------------------------------------
// Shared error type for API handlers
// ---------------------------------------------------------------------------

/// Simple API error type that converts to an Axum response.
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Mapping(e) => AppError::BadRequest(e.to_string()),
            AgentError::Dispatch(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({ "ok": false, "error": message });
        (status, Json(body)).into_response()
    }
}
