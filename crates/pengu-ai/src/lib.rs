//! AI response resolution pipeline for the Pengu weather backend.
//!
//! Produces a single well-formed JSON result from an unreliable set of
//! generative-text providers: Groq is tried once on the fast path, then
//! the dynamically discovered Gemini catalog is walked in order until one
//! attempt succeeds or everything is exhausted. Whatever raw text wins is
//! coerced into JSON with a tolerant two-tier parse and stamped with the
//! model that produced it.
//!
//! All entities are request-scoped; the pipeline keeps no state across
//! invocations.

pub mod attempt;
pub mod cascade;
pub mod catalog;
pub mod gemini;
pub mod groq;
pub mod normalize;
pub mod prompt;

pub use attempt::{AttemptError, Generation};
pub use cascade::{CascadeExecutor, ExhaustedError};
pub use catalog::ModelCatalog;
pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use normalize::{annotate, normalize, ParseFailure, WeatherAdvice};
pub use prompt::build_weather_prompt;

/// The production cascade: Groq fast path, Gemini discovery fallback.
pub type Resolver = CascadeExecutor<GroqClient, ModelCatalog, GeminiClient>;

impl Resolver {
    /// Wire up the production cascade from provider credentials.
    pub fn from_keys(
        groq_api_key: Option<String>,
        gemini_api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let groq = GroqClient::new(groq_api_key)?;
        let gemini = GeminiClient::new(gemini_api_key)?;
        let catalog = ModelCatalog::new(gemini.clone());
        Ok(CascadeExecutor::new(groq, catalog, gemini))
    }
}
