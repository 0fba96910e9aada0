//! Shared outcome types for a single generation attempt.
//!
//! Provider-specific error shapes are reduced to `AttemptError` at the
//! adapter boundary so the rest of the pipeline never inspects them again.

/// A successful generation attempt: the raw model output plus the
/// provider/model identifier that produced it.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Raw completion text, expected (but not guaranteed) to be JSON.
    pub raw_text: String,

    /// Combined identifier, e.g. `groq/llama-3.1-8b-instant` or
    /// `gemini-2.5-flash`.
    pub model_used: String,
}

/// A classified failure for one generation attempt.
///
/// Display gives the underlying message verbatim; the cascade surfaces
/// the last attempt's message as its terminal error.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// Required credential absent. Detected pre-flight, no network cost.
    #[error("API key not configured")]
    ConfigMissing,

    /// Upstream 4xx/5xx, rate limit, or transport failure. Always
    /// recoverable by falling through to the next cascade step.
    #[error("{message}")]
    Provider { message: String },
}

impl AttemptError {
    /// Wrap an upstream message as a provider failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }
}

/// First line of a (possibly multi-line) error message, for one-line logs.
/// The full message is kept in the error itself.
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
