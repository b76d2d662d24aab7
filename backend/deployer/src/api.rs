//! Axum REST API handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sfp_protocol::Address;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::db;
use crate::errors::DeployerError;
use crate::events::EventRow;
use crate::records::DeploymentRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub deployment_file: PathBuf,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/deployment", get(get_deployment))
        .route("/events", get(get_all_events))
        .route("/contracts/:address/events", get(get_contract_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub contract: String,
    pub count: usize,
    pub events: Vec<EventRow>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRow>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /deployment`
///
/// Returns the current deployment record.
pub async fn get_deployment(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match DeploymentRecord::load(&state.deployment_file) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e @ DeployerError::MissingRecord(_)) => error_response(StatusCode::NOT_FOUND, e),
        Err(e) => {
            warn!("Failed to read deployment record: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// `GET /contracts/:address/events`
///
/// Returns all indexed events emitted by the given instance.
pub async fn get_contract_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let contract = match address.parse::<Address>() {
        Ok(contract) => contract.to_string(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    match db::get_events_for_contract(&state.pool, &contract).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(EventsResponse {
                    contract,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// `GET /events`
///
/// Returns all indexed events across all instances.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(AllEventsResponse { count, events })).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
