/// HTTP ingestion endpoint
///
/// The chat listener POSTs each raw message here; every request is one
/// independent run of the relay pipeline.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::message::{RawMessage, RelayResponse, RelayStatus};
use crate::relay::{Outcome, Relay};
use crate::runtime::Extraction;

const MESSAGE_ID_HEADER: &str = "x-message-id";
const SOURCE_HEADER: &str = "x-source";

#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
}

/// Build the ingestion router around a relay
pub fn build_router(relay: Arc<Relay>) -> Router {
    let state = AppState { relay };

    Router::new()
        .route("/signals", post(relay_message))
        .route("/telegram", post(relay_message))
        .route("/extract", post(extract_message))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on an already bound listener until the process stops
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            "Signal relay listening on {} ({} mode, sink: {})",
            addr,
            relay.mode(),
            relay.sink_name()
        );
    }
    axum::serve(listener, build_router(relay)).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn raw_message(headers: &HeaderMap, body: String) -> RawMessage {
    let message = match header_value(headers, MESSAGE_ID_HEADER) {
        Some(id) => RawMessage::with_id(id, body),
        None => RawMessage::new(body),
    };

    match header_value(headers, SOURCE_HEADER) {
        Some(source) => message.from_source(source),
        None => message,
    }
}

/// Run one message through the relay
async fn relay_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<RelayResponse>), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::EmptyMessage);
    }

    let message = raw_message(&headers, body);
    let outcome = state.relay.process(&message).await;

    let (status, error) = match &outcome {
        Outcome::ForwardFailed(err) => (StatusCode::BAD_GATEWAY, Some(err.to_string())),
        Outcome::Dropped | Outcome::Forwarded(_) => (StatusCode::OK, None),
    };

    Ok((
        status,
        Json(RelayResponse {
            message_id: message.message_id,
            status: outcome.status(),
            error,
            timestamp: Utc::now(),
        }),
    ))
}

/// Dry run: show what the extractor makes of a message, without relaying it
async fn extract_message(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::EmptyMessage);
    }

    match state.relay.extract(&body) {
        Extraction::Valid(record) => {
            let value = serde_json::to_value(&record)
                .map_err(|e| AppError::InternalError(format!("Failed to encode record: {}", e)))?;
            Ok((StatusCode::OK, Json(value)))
        }
        Extraction::Invalid => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "status": "not_a_signal" })),
        )),
    }
}

/// Health check endpoint (liveness)
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "signal-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.relay.mode().to_string(),
    }))
}

// Error handling

#[derive(Debug)]
enum AppError {
    EmptyMessage,
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::EmptyMessage => (StatusCode::BAD_REQUEST, "Empty message".to_string()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({
            "status": RelayStatus::Failed,
            "error": message
        }))).into_response()
    }
}
