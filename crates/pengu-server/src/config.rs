//! Environment-driven server configuration.

use std::env;

/// Used when `JWT_SECRET` is absent. Logged loudly at startup.
pub const DEFAULT_JWT_SECRET: &str = "default-secret-change-in-production";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PURPLEAIR_BASE_URL: &str = "https://api.purpleair.com/v1";
const DEFAULT_USERNAME: &str = "admin@myapp.com";
const DEFAULT_PASSWORD: &str = "admin123";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    /// Bypass authentication with a mock user. Development only.
    pub dev_mode: bool,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub purpleair_api_key: Option<String>,
    pub purpleair_base_url: String,
    pub default_username: String,
    pub default_password: String,
}

impl Config {
    /// Read configuration from the environment, applying defaults.
    pub fn from_env() -> Self {
        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                log::warn!(
                    "JWT_SECRET is not set. Using default secret (not recommended for production)."
                );
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        Self {
            port: non_empty("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            jwt_secret,
            dev_mode: non_empty("DEV_MODE").as_deref() == Some("true"),
            groq_api_key: non_empty("GROQ_API_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            purpleair_api_key: non_empty("PURPLEAIR_API_KEY"),
            purpleair_base_url: non_empty("PURPLEAIR_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PURPLEAIR_BASE_URL.to_string()),
            default_username: non_empty("DEFAULT_USERNAME")
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            default_password: non_empty("DEFAULT_PASSWORD")
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
