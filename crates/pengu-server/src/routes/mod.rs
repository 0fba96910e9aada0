//! HTTP routing for the Pengu backend.

pub mod ai;
pub mod auth;
pub mod feedback;
pub mod location;
pub mod purpleair;

use crate::error::ApiError;
use crate::state::AppState;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// GET /health - liveness check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Weather App Backend is running",
    })
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth::router())
        .nest("/api/purpleair", purpleair::router())
        .nest("/api/location", location::router())
        .nest("/api/feedback", feedback::router())
        .nest("/api/ai", ai::router())
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}
