//! JWT issuing/verification, the in-memory user store, and the
//! authenticated-request extractor.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Token lifetime.
const TOKEN_TTL_HOURS: i64 = 24;

/// Matches the original bcryptjs salt rounds.
const HASH_COST: u32 = 10;

// ── Tokens ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,
    pub username: String,
    pub exp: i64,
}

/// Sign a 24h HS256 token for the given user.
pub fn issue_token(
    secret: &str,
    id: u64,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id,
        username: username.to_string(),
        exp: (Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and return its claims. Expiry is validated.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

// ── User store ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct User {
    id: u64,
    username: String,
    password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// In-memory user store, process-lifetime only.
#[derive(Debug)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    /// Create a store seeded with the default user.
    pub fn seeded(username: &str, password: &str) -> Result<Self, bcrypt::BcryptError> {
        let password_hash = bcrypt::hash(password, HASH_COST)?;
        log::info!("Default user initialized: {}", username);
        Ok(Self {
            users: RwLock::new(vec![User {
                id: 1,
                username: username.to_string(),
                password_hash,
            }]),
        })
    }

    /// Check credentials. Returns `(id, username)` on success.
    pub async fn verify(&self, username: &str, password: &str) -> Option<(u64, String)> {
        let users = self.users.read().await;
        let user = users.iter().find(|u| u.username == username)?;
        match bcrypt::verify(password, &user.password_hash) {
            Ok(true) => Some((user.id, user.username.clone())),
            _ => None,
        }
    }

    /// Add a user. Returns the new `(id, username)`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(u64, String), RegisterError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(RegisterError::DuplicateUsername);
        }
        let password_hash = bcrypt::hash(password, HASH_COST)?;
        let id = users.len() as u64 + 1;
        users.push(User {
            id,
            username: username.to_string(),
            password_hash,
        });
        Ok((id, username.to_string()))
    }
}

// ── Request extractor ───────────────────────────────────────────────

/// The authenticated caller. Extracting this rejects unauthenticated
/// requests; in dev mode it yields a mock user without a token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.dev_mode {
            log::info!("Dev mode: authentication bypassed for user dev_user");
            return Ok(AuthUser {
                id: 999,
                username: "dev_user".to_string(),
            });
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Access token required"))?;

        let claims = verify_token(&state.config.jwt_secret, token)
            .map_err(|_| ApiError::forbidden("Invalid or expired token"))?;

        Ok(AuthUser {
            id: claims.id,
            username: claims.username,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = issue_token("secret", 1, "admin@myapp.com").unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.id, 1);
        assert_eq!(claims.username, "admin@myapp.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let token = issue_token("secret", 1, "admin@myapp.com").unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            id: 1,
            username: "admin@myapp.com".to_string(),
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token("secret", &token).is_err());
    }

    #[tokio::test]
    async fn seeded_store_verifies_default_credentials() {
        let store = UserStore::seeded("admin@myapp.com", "admin123").unwrap();
        assert_eq!(
            store.verify("admin@myapp.com", "admin123").await,
            Some((1, "admin@myapp.com".to_string()))
        );
        assert_eq!(store.verify("admin@myapp.com", "wrong").await, None);
        assert_eq!(store.verify("nobody", "admin123").await, None);
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let store = UserStore::seeded("admin@myapp.com", "admin123").unwrap();
        let (id, _) = store.register("kid@myapp.com", "pw").await.unwrap();
        assert_eq!(id, 2);
        assert!(matches!(
            store.register("kid@myapp.com", "pw").await,
            Err(RegisterError::DuplicateUsername)
        ));
    }
}
