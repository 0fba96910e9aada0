//! The weather-analysis endpoint, where the AI resolution pipeline meets
//! HTTP.
//!
//! Terminal pipeline failures map to generic 500s: provider-internal
//! detail (quota state, credentials) never reaches the caller.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use pengu_ai::{annotate, build_weather_prompt, normalize, WeatherAdvice};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct AnalyzeRequest {
    weather_data: Option<Value>,
}

/// POST /api/ai/analyze-weather
async fn analyze_weather(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Value>, ApiError> {
    let weather_data = req
        .weather_data
        .ok_or_else(|| ApiError::bad_request("Weather data is required"))?;

    let prompt = build_weather_prompt(&weather_data);

    let generation = state.resolver.resolve(&prompt).await.map_err(|e| {
        log::error!("AI analysis failed: {}", e);
        ApiError::internal("Internal server error")
    })?;

    let value = normalize(&generation.raw_text).map_err(|_| {
        log::error!("Failed to parse AI response: {}", generation.raw_text);
        ApiError::internal("Failed to generate valid JSON response from AI")
    })?;

    if !WeatherAdvice::matches(&value) {
        log::warn!(
            "AI response from {} does not match the advice schema",
            generation.model_used
        );
    }

    Ok(Json(annotate(value, &generation.model_used)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze-weather", post(analyze_weather))
}
