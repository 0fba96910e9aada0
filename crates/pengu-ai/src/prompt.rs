//! Advice prompt builder. Embeds the caller's weather observations.

use serde_json::Value;

/// Build the weather-advice prompt around the given observation data.
///
/// The output schema in the prompt must stay in sync with
/// [`crate::normalize::WeatherAdvice`].
pub fn build_weather_prompt(weather_data: &Value) -> String {
    let data = serde_json::to_string(weather_data).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a friendly, excited, and fun penguin!
Your goal is to look at the weather data and give advice to a kid user. Do not ask the kid for personal information.

Here is the weather data:
{data}

Based on this weather, please provide:
1. A categorize of the weather (snowing, raining, sunny, cloudy, etc.)
2. A clothing suggestion (max 1 line)
3. A game suggestion (max 1 line)
4. A "smart suggestion" which is a message from you (the penguin) to the kid. It should be very friendly, excited, and fun.
5. A short, fun 1-3 word reaction to the weather.

You MUST output the response in this exact JSON format:
{{
  "weather": "string (e.g., snowing, raining, sunny, cloudy)",
  "suggestions": {{
    "cloth": "string (max 1 line)",
    "game": "string (max 1 line)",
    "smart_suggestion": "string (penguin persona message)",
    "short_response_to_weather": "string (1-3 words)"
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embeds_weather_data_and_schema() {
        let prompt = build_weather_prompt(&json!({"temperature": "72F", "condition": "Clear sky"}));
        assert!(prompt.contains("\"temperature\":\"72F\""));
        assert!(prompt.contains("short_response_to_weather"));
        assert!(prompt.contains("penguin"));
    }
}
