//! HTTP server.
//!
//! Exposes the four operations as JSON endpoints. Each endpoint is a thin
//! wrapper: decode the body, call the matching [`CurriculumService`]
//! method, encode the result or the error envelope.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Semantic search with result caching |
//! | `POST` | `/fetch` | Ordered batch retrieval of documents |
//! | `POST` | `/generate` | Localized tutoring answer |
//! | `POST` | `/validate` | Rubric scoring against curriculum standards |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Error", "code": "INVALID_GRADE", "message": "grade must be between 1 and 12, got 13" }
//! ```
//!
//! Validation errors are `400`, upstream failures `500`, an unprovisioned
//! vector index `503`. A body that is not valid JSON for the endpoint is
//! `400 INVALID_REQUEST`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{ErrorEnvelope, ServiceError};
use crate::models::{
    FetchRequest, FetchResult, GenerationRequest, GenerationResult, SearchQuery, SearchResult,
    ValidationRequest, ValidationResult,
};
use crate::service::CurriculumService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<CurriculumService>,
}

/// Builds the service from `config` and serves it on `[server].bind`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(CurriculumService::from_config(config).await?);
    serve(&config.server.bind, service).await
}

/// Serves an already-built service. Useful for custom collaborator wiring.
pub async fn serve(bind_addr: &str, service: Arc<CurriculumService>) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(service: Arc<CurriculumService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handle_search))
        .route("/fetch", post(handle_fetch))
        .route("/generate", post(handle_generate))
        .route("/validate", post(handle_validate))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service })
}

// ============ Error response ============

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    body: ErrorEnvelope,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        if err.is_validation() {
            tracing::debug!(code = err.code(), message = %err, "request rejected");
        } else {
            tracing::error!(code = err.code(), message = %err, "request failed");
        }
        Self {
            status: err.status(),
            body: err.envelope(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let err = ServiceError::InvalidRequest(rejection.body_text());
        Self {
            status: err.status(),
            body: err
                .envelope()
                .with_details(serde_json::json!({ "status": rejection.status().as_u16() })),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Operations ============

async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> Result<Json<SearchResult>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.service.search(&req).await?))
}

async fn handle_fetch(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<FetchResult>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.service.fetch(&req).await?))
}

async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.service.generate(&req).await?))
}

async fn handle_validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.service.validate(&req).await?))
}
