//! Model catalog for the discoverable provider family.
//!
//! Discovery runs per invocation: models available to an API key change,
//! so staleness is avoided at the cost of one listing round trip on the
//! cold path. `list_candidates` is total: any discovery failure degrades
//! to a single known-good fallback model instead of propagating.

use crate::attempt::first_line;
use crate::gemini::{GeminiClient, ModelDescriptor};

/// Known-good default when discovery fails or returns nothing usable.
pub const FALLBACK_MODEL: &str = "gemini-2.5-flash";

/// Ordered catalog of candidate generation models.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    gemini: GeminiClient,
}

impl ModelCatalog {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// List candidate model identifiers in attempt-priority order.
    ///
    /// Never fails: transport errors, non-2xx listings, malformed bodies,
    /// and empty post-filter results all yield the one-element fallback.
    pub async fn list_candidates(&self) -> Vec<String> {
        let models = match self.gemini.list_models().await {
            Ok(models) => models,
            Err(e) => {
                log::warn!(
                    "Failed to list Gemini models, using fallback: {}",
                    first_line(&e.to_string())
                );
                return vec![FALLBACK_MODEL.to_string()];
            }
        };

        let candidates = usable_candidates(models);
        if candidates.is_empty() {
            log::warn!("Model listing had no usable candidates, using fallback");
            return vec![FALLBACK_MODEL.to_string()];
        }

        candidates
    }
}

/// Filter to Gemini-family models capable of text generation and strip
/// the `models/` namespace prefix. Listing order is preserved.
fn usable_candidates(models: Vec<ModelDescriptor>) -> Vec<String> {
    models
        .into_iter()
        .filter(|m| {
            m.name.contains("gemini")
                && m.supported_generation_methods
                    .as_ref()
                    .is_none_or(|methods| methods.iter().any(|method| method == "generateContent"))
        })
        .map(|m| {
            m.name
                .strip_prefix("models/")
                .unwrap_or(&m.name)
                .to_string()
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
