//! Authenticated proxy in front of the PurpleAir API.
//!
//! Keeps the upstream API key server-side. Query parameters pass through
//! untouched except for a default `fields` selection, and upstream error
//! envelopes are rewrapped so callers see a uniform shape.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const SENSOR_FIELDS: &str = "sensor_index,name,latitude,longitude,pm2.5,pm2.5_10minute,\
    pm2.5_30minute,pm2.5_60minute,pm2.5_24hour,pm2.5_atm,pm2.5_cf_1,temperature,humidity,\
    pressure,last_seen";
const HISTORY_FIELDS: &str = "time_stamp,pm2.5,pm2.5_atm,pm2.5_cf_1,temperature,humidity,pressure";
const GROUP_FIELDS: &str = "group_id,name,description,sensor_count,created,modified";

// ── Upstream error envelope ─────────────────────────────────────────

/// Error body PurpleAir returns on failure.
#[derive(Debug, Default, Deserialize)]
struct UpstreamErrorBody {
    error: Option<String>,
    description: Option<String>,
    api_version: Option<String>,
    time_stamp: Option<i64>,
}

#[derive(Serialize)]
struct ProxyErrorEnvelope {
    error: ProxyErrorBody,
}

#[derive(Serialize)]
struct ProxyErrorBody {
    message: String,
    r#type: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_stamp: Option<i64>,
}

/// A failed proxy call, carrying whatever detail the upstream provided.
#[derive(Debug)]
struct ProxyError {
    status: StatusCode,
    message: String,
    kind: String,
    api_version: Option<String>,
    time_stamp: Option<i64>,
}

impl ProxyError {
    fn key_missing() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "PurpleAir API key not configured".to_string(),
            kind: "APIError".to_string(),
            api_version: None,
            time_stamp: None,
        }
    }

    fn from_upstream(status: StatusCode, body: UpstreamErrorBody, fallback: &str) -> Self {
        Self {
            status,
            message: body
                .description
                .or_else(|| body.error.clone())
                .unwrap_or_else(|| fallback.to_string()),
            kind: body.error.unwrap_or_else(|| "APIError".to_string()),
            api_version: body.api_version,
            time_stamp: body.time_stamp,
        }
    }

    fn sensor_not_found(sensor_index: u64, body: UpstreamErrorBody) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Sensor with index {} not found", sensor_index),
            kind: "NotFoundError".to_string(),
            api_version: body.api_version,
            time_stamp: body.time_stamp,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let envelope = ProxyErrorEnvelope {
            error: ProxyErrorBody {
                message: self.message,
                r#type: self.kind,
                status: self.status.as_u16(),
                api_version: self.api_version,
                time_stamp: self.time_stamp,
            },
        };
        (self.status, Json(envelope)).into_response()
    }
}

// ── Proxy plumbing ──────────────────────────────────────────────────

/// Forward a GET to PurpleAir, filling in a default `fields` selection.
async fn forward(
    state: &AppState,
    path: &str,
    mut params: HashMap<String, String>,
    default_fields: &str,
) -> Result<reqwest::Response, ProxyError> {
    let Some(api_key) = &state.config.purpleair_api_key else {
        return Err(ProxyError::key_missing());
    };

    params
        .entry("fields".to_string())
        .or_insert_with(|| default_fields.to_string());

    state
        .http
        .get(format!("{}{}", state.config.purpleair_base_url, path))
        .query(&params)
        .header("X-API-Key", api_key)
        .send()
        .await
        .map_err(|e| {
            log::error!("PurpleAir API error: {}", e);
            ProxyError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: e.to_string(),
                kind: "APIError".to_string(),
                api_version: None,
                time_stamp: None,
            }
        })
}

/// Decode an upstream failure body, tolerating non-JSON payloads.
async fn upstream_error(response: reqwest::Response) -> (StatusCode, UpstreamErrorBody) {
    let status = response.status();
    let body = response
        .json::<UpstreamErrorBody>()
        .await
        .unwrap_or_default();
    (status, body)
}

fn log_upstream(status: StatusCode, body: &UpstreamErrorBody) {
    let detail = body
        .error
        .as_deref()
        .or(body.description.as_deref())
        .unwrap_or("unknown");
    if status.is_client_error() {
        log::info!("PurpleAir API client error ({}): {}", status.as_u16(), detail);
    } else {
        log::error!("PurpleAir API error ({}): {}", status.as_u16(), detail);
    }
}

async fn proxy_json(
    state: &AppState,
    path: &str,
    params: HashMap<String, String>,
    default_fields: &str,
    fallback: &str,
) -> Result<Json<Value>, ProxyError> {
    let response = forward(state, path, params, default_fields).await?;

    if !response.status().is_success() {
        let (status, body) = upstream_error(response).await;
        log_upstream(status, &body);
        return Err(ProxyError::from_upstream(status, body, fallback));
    }

    let data = response.json::<Value>().await.map_err(|e| {
        log::error!("PurpleAir API error: {}", e);
        ProxyError::from_upstream(
            StatusCode::INTERNAL_SERVER_ERROR,
            UpstreamErrorBody::default(),
            fallback,
        )
    })?;
    Ok(Json(data))
}

/// Map a 404 or `NotFoundError` onto the sensor-specific message.
fn sensor_scoped(error: ProxyError, sensor_index: u64) -> ProxyError {
    if error.status == StatusCode::NOT_FOUND || error.kind == "NotFoundError" {
        log::info!("Sensor {} not found", sensor_index);
        ProxyError {
            status: StatusCode::NOT_FOUND,
            message: format!("Sensor with index {} not found", sensor_index),
            kind: "NotFoundError".to_string(),
            ..error
        }
    } else {
        error
    }
}

fn require_window(params: &HashMap<String, String>) -> Result<(), ApiError> {
    if params.contains_key("start_timestamp") && params.contains_key("end_timestamp") {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "start_timestamp and end_timestamp are required",
        ))
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /api/purpleair/sensors
async fn list_sensors(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ProxyError> {
    proxy_json(
        &state,
        "/sensors",
        params,
        SENSOR_FIELDS,
        "Failed to fetch sensors from PurpleAir",
    )
    .await
}

/// GET /api/purpleair/sensors/{sensor_index}
async fn get_sensor(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ProxyError> {
    proxy_json(
        &state,
        &format!("/sensors/{}", sensor_index),
        params,
        SENSOR_FIELDS,
        "Failed to fetch sensor data from PurpleAir",
    )
    .await
    .map_err(|e| sensor_scoped(e, sensor_index))
}

/// GET /api/purpleair/sensors/{sensor_index}/history
async fn sensor_history(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    require_window(&params).map_err(IntoResponse::into_response)?;

    proxy_json(
        &state,
        &format!("/sensors/{}/history", sensor_index),
        params,
        HISTORY_FIELDS,
        "Failed to fetch sensor history from PurpleAir",
    )
    .await
    .map_err(|e| sensor_scoped(e, sensor_index).into_response())
}

/// GET /api/purpleair/sensors/{sensor_index}/history/csv
///
/// Body passes through verbatim as `text/csv`.
async fn sensor_history_csv(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
    require_window(&params).map_err(IntoResponse::into_response)?;

    let response = forward(
        &state,
        &format!("/sensors/{}/history/csv", sensor_index),
        params,
        HISTORY_FIELDS,
    )
    .await
    .map_err(IntoResponse::into_response)?;

    if !response.status().is_success() {
        let (status, body) = upstream_error(response).await;
        log_upstream(status, &body);
        let error = ProxyError::from_upstream(
            status,
            body,
            "Failed to fetch sensor history CSV from PurpleAir",
        );
        return Err(sensor_scoped(error, sensor_index).into_response());
    }

    let csv = response.text().await.map_err(|e| {
        log::error!("PurpleAir API error: {}", e);
        ProxyError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to fetch sensor history CSV from PurpleAir".to_string(),
            kind: "APIError".to_string(),
            api_version: None,
            time_stamp: None,
        }
        .into_response()
    })?;

    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

/// GET /api/purpleair/groups
async fn list_groups(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ProxyError> {
    proxy_json(
        &state,
        "/groups",
        params,
        GROUP_FIELDS,
        "Failed to fetch groups from PurpleAir",
    )
    .await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sensors", get(list_sensors))
        .route("/sensors/{sensor_index}", get(get_sensor))
        .route("/sensors/{sensor_index}/history", get(sensor_history))
        .route(
            "/sensors/{sensor_index}/history/csv",
            get(sensor_history_csv),
        )
        .route("/groups", get(list_groups))
}

// ── Tests ───────────────────────────────────────────────────────────
