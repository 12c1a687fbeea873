//! HTTP API routes.
//!
//! Thin handlers: validate nothing themselves, run the synchronous pipeline
//! on a blocking worker, and map domain errors to HTTP status codes.

use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_common::{
    ChatRequest, ChatResponse, CohortInterpretRequest, CohortInterpretation, FleetError,
    HealthResponse, VinInterpretRequest, VinInterpretation,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

type SharedState = Arc<AppState>;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/vin/interpret", post(interpret_vin))
        .route("/v1/cohort/interpret", post(interpret_cohort))
        .route("/v1/chat", post(chat))
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        graph_engine: state.orchestrator.graph_engine_enabled(),
        textgen_enabled: state.orchestrator.textgen_enabled(),
    })
}

async fn interpret_vin(
    State(state): State<SharedState>,
    Json(request): Json<VinInterpretRequest>,
) -> Result<Json<VinInterpretation>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    info!(%request_id, vin = %request.vin, "VIN interpretation requested");

    run_blocking(move || state.interpret_vin(&request.vin))
        .await
        .map(Json)
}

async fn interpret_cohort(
    State(state): State<SharedState>,
    Json(request): Json<CohortInterpretRequest>,
) -> Result<Json<CohortInterpretation>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    info!(%request_id, cohort_id = %request.cohort_id, "cohort interpretation requested");

    run_blocking(move || {
        state.interpret_cohort(&request.cohort_id, request.cohort_description.clone())
    })
    .await
    .map(Json)
}

async fn chat(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    info!(%request_id, "chat requested");

    let reply = run_blocking(move || {
        Ok(state.chat_reply(&request.user_message, request.context.as_ref()))
    })
    .await?;

    Ok(Json(ChatResponse {
        reply,
        request_id: request_id.to_string(),
    }))
}

/// Run a synchronous pipeline stage off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, (StatusCode, String)>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, FleetError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(error_response),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker task failed: {}", e),
        )),
    }
}

fn error_response(e: FleetError) -> (StatusCode, String) {
    let status = match e {
        FleetError::InvalidVin(_) | FleetError::InvalidCohort(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, format!("{} (code {})", e, e.code()))
}
