//! Raw reqwest Groq client, the fast single-model provider.
//!
//! One JSON-mode chat completion per call against Groq's OpenAI-compatible
//! endpoint. No discovery step and no internal retries; a missing API key
//! short-circuits before any network call so the cascade can move on
//! immediately.

use crate::attempt::{AttemptError, Generation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Constants ───────────────────────────────────────────────────────

/// Groq API base URL.
const DEFAULT_BASE_URL: &str = "https://api.groq.com";

/// The single fixed model for the fast path.
const MODEL: &str = "llama-3.1-8b-instant";

/// Per-request timeout so one hung upstream cannot stall the cascade.
const REQUEST_TIMEOUT_SECS: u64 = 15;

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// Fast-family provider adapter.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GroqClient {
    /// Create a client. `api_key = None` is valid: every `generate` call
    /// then fails pre-flight with `ConfigMissing`.
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

    /// Execute one JSON-mode completion attempt.
    pub async fn generate(&self, prompt: &str) -> Result<Generation, AttemptError> {
        let Some(api_key) = &self.api_key else {
            log::warn!("GROQ_API_KEY not configured, skipping Groq");
            return Err(AttemptError::ConfigMissing);
        };

        log::info!("Attempting generation with Groq (model: {})", MODEL);

        let body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/openai/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
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
                "Groq returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::provider(e.to_string()))?;

        let raw_text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AttemptError::provider("Groq response contained no choices"))?;

        Ok(Generation {
            raw_text,
            model_used: format!("groq/{}", MODEL),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serialization() {
        let body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn chat_response_deserialization() {
        let json_str = r#"{
            "id": "chatcmpl-123",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"weather\":\"sunny\"}"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 8}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json_str).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content, "{\"weather\":\"sunny\"}");
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        // Unroutable base URL: a network attempt would error differently.
        let client = GroqClient::new(None)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, AttemptError::ConfigMissing));
    }
}
