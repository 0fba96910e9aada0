//! User feedback, kept in memory for the lifetime of the process.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Deserialize)]
struct FeedbackRequest {
    feedback: Option<String>,
    rating: Option<Value>,
    location: Option<Value>,
    api_source: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    id: String,
    timestamp: String,
    user_id: String,
    feedback: Option<String>,
    rating: Option<Value>,
    location: Option<Value>,
    api_source: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    message: &'static str,
    data: Feedback,
}

#[derive(Serialize)]
struct ListResponse {
    count: usize,
    feedbacks: Vec<Feedback>,
}

/// In-memory feedback store.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    entries: RwLock<Vec<Feedback>>,
}

/// POST /api/feedback
async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    if req.feedback.is_none() && req.rating.is_none() {
        return Err(ApiError::bad_request("Feedback or rating is required"));
    }

    let entry = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339(),
        user_id: req.user_id.unwrap_or_else(|| "anonymous".to_string()),
        feedback: req.feedback,
        rating: req.rating,
        location: req.location,
        api_source: req.api_source,
    };

    // Stands in for an admin notification channel.
    log::info!("New feedback received from {}", entry.user_id);

    state.feedback.entries.write().await.push(entry.clone());

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Feedback submitted successfully",
            data: entry,
        }),
    ))
}

/// GET /api/feedback - admin/debug listing
async fn list_feedback(State(state): State<AppState>) -> Json<ListResponse> {
    let entries = state.feedback.entries.read().await;
    Json(ListResponse {
        count: entries.len(),
        feedbacks: entries.clone(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_feedback).get(list_feedback))
}
