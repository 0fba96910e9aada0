//! Ordered fallback across heterogeneous generation providers.
//!
//! The fast provider is the common case optimized for latency and cost;
//! the discoverable family is the resilience reservoir. Discovery is only
//! paid for on the failure path, attempts are strictly sequential, and
//! every candidate gets exactly one shot. Retrying a model would just
//! burn quota that the next candidate might not need.

use crate::attempt::{first_line, AttemptError, Generation};
use crate::catalog::ModelCatalog;
use crate::gemini::GeminiClient;
use crate::groq::GroqClient;
use async_trait::async_trait;

// ── Seams ───────────────────────────────────────────────────────────

/// The provider tried first: fixed single model, no discovery step.
#[async_trait]
pub trait FastProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, AttemptError>;
}

/// Source of candidate model identifiers, in attempt-priority order.
/// Total: implementations degrade to a fallback list instead of failing.
#[async_trait]
pub trait CandidateCatalog: Send + Sync {
    async fn list_candidates(&self) -> Vec<String>;
}

/// The provider whose models are enumerated dynamically per request.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, AttemptError>;
}

#[async_trait]
impl FastProvider for GroqClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, AttemptError> {
        GroqClient::generate(self, prompt).await
    }
}

#[async_trait]
impl CandidateCatalog for ModelCatalog {
    async fn list_candidates(&self) -> Vec<String> {
        ModelCatalog::list_candidates(self).await
    }
}

#[async_trait]
impl CandidateProvider for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, AttemptError> {
        GeminiClient::generate(self, model, prompt).await
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// Terminal failure: every cascade step failed. Carries the most recent
/// attempt's message, since the last failure is the most diagnostically
/// relevant one.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ExhaustedError {
    pub message: String,
}

// ── Executor ────────────────────────────────────────────────────────

/// Orchestrates the ordered attempt sequence across both provider
/// families. Never proceeds past the first success.
#[derive(Debug, Clone)]
pub struct CascadeExecutor<F, C, D> {
    fast: F,
    catalog: C,
    discoverable: D,
}

impl<F, C, D> CascadeExecutor<F, C, D>
where
    F: FastProvider,
    C: CandidateCatalog,
    D: CandidateProvider,
{
    pub fn new(fast: F, catalog: C, discoverable: D) -> Self {
        Self {
            fast,
            catalog,
            discoverable,
        }
    }

    /// Resolve a prompt to raw successful text plus attribution, or a
    /// terminal failure after exhausting every option.
    pub async fn resolve(&self, prompt: &str) -> Result<Generation, ExhaustedError> {
        // 1. Fast path, exactly once. Success skips discovery entirely.
        match self.fast.generate(prompt).await {
            Ok(generation) => {
                log::info!("Generated content using {}", generation.model_used);
                return Ok(generation);
            }
            Err(e) => {
                log::warn!(
                    "Fast provider failed, falling back to model discovery: {}",
                    first_line(&e.to_string())
                );
            }
        }

        // 2. Discoverable family, strictly in catalog order, one attempt
        // per candidate. Only the last failure is retained.
        let candidates = self.catalog.list_candidates().await;
        log::info!("Found {} candidate model(s) to try", candidates.len());

        let mut last_failure: Option<AttemptError> = None;
        for model in &candidates {
            match self.discoverable.generate(model, prompt).await {
                Ok(generation) => {
                    log::info!("Generated content using {}", generation.model_used);
                    return Ok(generation);
                }
                Err(e) => {
                    log::warn!("Model {} failed: {}", model, first_line(&e.to_string()));
                    last_failure = Some(e);
                }
            }
        }

        log::error!("All providers failed to generate content");
        Err(ExhaustedError {
            message: last_failure
                .map(|e| e.to_string())
                .unwrap_or_else(|| "all providers failed to generate content".to_string()),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
