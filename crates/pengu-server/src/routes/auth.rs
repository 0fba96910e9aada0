//! Login, registration, and the current-user endpoint.

use crate::auth::{issue_token, AuthUser, RegisterError};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct CredentialsRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct UserBody {
    id: u64,
    username: String,
}

#[derive(Serialize)]
struct AuthResponse {
    message: &'static str,
    token: String,
    user: UserBody,
}

#[derive(Serialize)]
struct MeResponse {
    user: UserBody,
}

fn require_credentials(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    match (req.username, req.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(ApiError::bad_request("Username and password are required")),
    }
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (username, password) = require_credentials(req)?;

    let (id, username) = state
        .users
        .verify(&username, &password)
        .await
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let token = issue_token(&state.config.jwt_secret, id, &username).map_err(|e| {
        log::error!("Failed to sign token: {}", e);
        ApiError::internal("Internal server error")
    })?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserBody { id, username },
    }))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (username, password) = require_credentials(req)?;

    let (id, username) = state
        .users
        .register(&username, &password)
        .await
        .map_err(|e| match e {
            RegisterError::DuplicateUsername => {
                ApiError::new(StatusCode::CONFLICT, "Username already exists")
            }
            RegisterError::Hash(e) => {
                log::error!("Registration error: {}", e);
                ApiError::internal("Internal server error")
            }
        })?;

    let token = issue_token(&state.config.jwt_secret, id, &username).map_err(|e| {
        log::error!("Failed to sign token: {}", e);
        ApiError::internal("Internal server error")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: UserBody { id, username },
        }),
    ))
}

/// GET /api/auth/me
async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserBody {
            id: user.id,
            username: user.username,
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}
