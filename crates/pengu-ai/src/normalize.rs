//! Tolerant recovery of structured JSON from raw model output, plus
//! attribution stamping.
//!
//! Providers wrap structured output in prose or markdown fences despite
//! being asked for strict JSON, so parsing is two-tier: direct first,
//! then fence-stripped. Both failing is terminal for the request.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Raw model output could not be coerced into JSON after tolerant
/// recovery. No further strategy exists; terminal for the request.
#[derive(Debug, thiserror::Error)]
#[error("model output is not valid JSON")]
pub struct ParseFailure;

/// Recover a JSON value from raw model output.
///
/// First attempt parses the text directly; the second strips code-fence
/// markers anywhere in the text and trims before re-parsing.
pub fn normalize(raw: &str) -> Result<Value, ParseFailure> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    let cleaned = raw.replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim()).map_err(|_| ParseFailure)
}

/// Stamp the parsed result with the provider/model that produced it.
///
/// Pure. Only top-level objects can carry the `_meta` field; any other
/// valid JSON is returned unchanged.
pub fn annotate(mut value: Value, model_used: &str) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("_meta".to_string(), json!({ "model_used": model_used }));
    }
    value
}

// ── Expected output schema ──────────────────────────────────────────

/// The shape the prompt asks every model to produce.
///
/// Parsed output that does not match is logged but passed through
/// unchanged. The consumer owns shape expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAdvice {
    pub weather: String,
    pub suggestions: AdviceSuggestions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceSuggestions {
    pub cloth: String,
    pub game: String,
    pub smart_suggestion: String,
    pub short_response_to_weather: String,
}

impl WeatherAdvice {
    /// Whether a parsed value conforms to the expected shape.
    pub fn matches(value: &Value) -> bool {
        serde_json::from_value::<WeatherAdvice>(value.clone()).is_ok()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
