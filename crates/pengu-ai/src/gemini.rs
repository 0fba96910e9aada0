//! Raw reqwest Gemini client, the discoverable provider family.
//!
//! Two endpoints: model listing (for the catalog) and per-candidate
//! generation with a JSON response MIME type. Each candidate gets exactly
//! one attempt; advancing to the next model is the cascade's decision.

use crate::attempt::{AttemptError, Generation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Constants ───────────────────────────────────────────────────────

/// Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Per-request timeout so one hung upstream cannot stall the cascade.
const REQUEST_TIMEOUT_SECS: u64 = 15;

// ── Wire format ─────────────────────────────────────────────────────

/// One model descriptor from the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Namespaced identifier, e.g. `models/gemini-2.5-flash`.
    pub name: String,

    /// Declared capabilities. Absent means capable of generation.
    #[serde(default)]
    pub supported_generation_methods: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────

/// Discoverable-family provider adapter.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    /// Create a client. With `api_key = None` every call fails as a
    /// provider error without a network round trip.
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<&str, AttemptError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AttemptError::provider("GEMINI_API_KEY not configured"))
    }

    /// Fetch the raw model descriptors. The catalog applies filtering,
    /// prefix stripping, and the fallback on top of this.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, AttemptError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| AttemptError::provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::provider(format!(
                "model listing returned {}",
                status.as_u16()
            )));
        }

        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::provider(e.to_string()))?;

        Ok(listing.models)
    }

    /// Execute one generation attempt against the given candidate model,
    /// requesting structured-JSON output.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, AttemptError> {
        let api_key = self.api_key()?;

        log::info!("Attempting generation with Gemini model: {}", model);

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AttemptError::provider(format!(
                "Gemini returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::provider(e.to_string()))?;

        let raw_text = extract_text(&generated)
            .ok_or_else(|| AttemptError::provider("Gemini response contained no text"))?;

        Ok(Generation {
            raw_text,
            model_used: model.to_string(),
        })
    }
}

/// Concatenate all text parts of the first candidate.
fn extract_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
