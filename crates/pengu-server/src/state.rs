//! Shared state for HTTP handlers.

use crate::auth::UserStore;
use crate::config::Config;
use crate::routes::feedback::FeedbackStore;
use pengu_ai::Resolver;
use std::sync::Arc;
use std::time::Duration;

/// Per-request proxy call timeout.
const PROXY_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<UserStore>,
    pub feedback: Arc<FeedbackStore>,
    /// Shared client for the pass-through proxy routes.
    pub http: reqwest::Client,
    pub resolver: Arc<Resolver>,
}

impl AppState {
    /// Build production state: the cascade is wired from the configured
    /// provider credentials.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let resolver =
            Resolver::from_keys(config.groq_api_key.clone(), config.gemini_api_key.clone())?;
        Self::with_resolver(config, resolver)
    }

    /// Build state around an explicit resolver (tests point its clients
    /// at mock upstreams).
    pub fn with_resolver(config: Config, resolver: Resolver) -> anyhow::Result<Self> {
        let users = UserStore::seeded(&config.default_username, &config.default_password)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROXY_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(users),
            feedback: Arc::new(FeedbackStore::default()),
            http,
            resolver: Arc::new(resolver),
        })
    }
}
