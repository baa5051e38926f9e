//! Continuum proxy server - forwards chat operations to the completion service.
//!
//! Architecture:
//! - Clients (the terminal front end, a browser widget) never hold the API key
//! - Every route is a thin pass-through to the upstream Responses API
//! - The server keeps no conversation state; the handle lives client-side
//!
//! Endpoints:
//! - POST /api/openai/responses - Create a turn
//! - GET /api/openai/responses/{id} - Outputs of a previous response
//! - GET /api/openai/responses/{id}/input_items - Inputs of a previous response
//! - GET /health - Liveness check

mod upstream;

pub use upstream::{output_text, UpstreamClient, UpstreamError};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{messages, ServerConfig, MAX_INPUT_LENGTH};
use crate::models::{CreateTurnRequest, CreateTurnResponse, ErrorBody};

/// Shared server state.
pub struct ServerState {
    upstream: UpstreamClient,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(config),
        }
    }
}

/// Error returned by a handler, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(
            status = %rejection.status(),
            reason = %rejection.body_text(),
            "rejected request body"
        );
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

// === Server Lifecycle ===

/// Build the router over `state`.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/openai/responses", post(create_turn))
        .route("/api/openai/responses/{id}", get(get_response))
        .route("/api/openai/responses/{id}/input_items", get(list_input_items))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server and serve until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail until it is");
    }

    let state = Arc::new(ServerState::new(&config));
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, upstream = %config.upstream_url, model = %config.model, "proxy listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// === Handlers ===

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::now_v7()))]
async fn create_turn(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<CreateTurnRequest>, JsonRejection>,
) -> Result<Json<CreateTurnResponse>, ApiError> {
    let Json(req) = payload?;
    if req.input.trim().is_empty() {
        return Err(ApiError::bad_request(messages::EMPTY_MESSAGE));
    }
    if req.input.chars().count() > MAX_INPUT_LENGTH {
        return Err(ApiError::bad_request(messages::INVALID_INPUT));
    }

    let response = state
        .upstream
        .create_response(&req.input, req.previous_response_id.as_ref())
        .await?;

    let response_id = response.get("id").and_then(Value::as_str).map(String::from);
    info!(
        continuing = req.previous_response_id.is_some(),
        response_id = ?response_id,
        "turn created"
    );

    Ok(Json(CreateTurnResponse {
        response: output_text(&response),
        response_id,
    }))
}

#[tracing::instrument(skip(state), fields(request_id = %Uuid::now_v7()))]
async fn get_response(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let response = state.upstream.get_response(&id).await?;
    let output = response.get("output").cloned().unwrap_or_else(|| json!([]));
    Ok(Json(json!({ "output": output })))
}

#[tracing::instrument(skip(state), fields(request_id = %Uuid::now_v7()))]
async fn list_input_items(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let list = state.upstream.list_input_items(&id).await?;
    let data = list.get("data").cloned().unwrap_or_else(|| json!([]));
    Ok(Json(json!({ "data": data })))
}
