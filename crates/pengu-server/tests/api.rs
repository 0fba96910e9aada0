//! End-to-end API tests: a real router on an ephemeral port, exercised
//! over HTTP. AI provider upstreams are mocked with wiremock.

use pengu_ai::{CascadeExecutor, GeminiClient, GroqClient, ModelCatalog, Resolver};
use pengu_server::{create_router, AppState, Config};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    let mut config = Config::from_env();
    config.jwt_secret = "test-secret".to_string();
    config.dev_mode = false;
    config.groq_api_key = None;
    config.gemini_api_key = None;
    config.purpleair_api_key = None;
    config.default_username = "admin@myapp.com".to_string();
    config.default_password = "admin123".to_string();
    config
}

/// Resolver with no credentials: every AI call fails fast, no network.
fn dead_resolver() -> Resolver {
    Resolver::from_keys(None, None).unwrap()
}

/// Resolver whose Groq client points at a mock upstream.
fn groq_resolver(groq_url: &str) -> Resolver {
    let groq = GroqClient::new(Some("test-key".to_string()))
        .unwrap()
        .with_base_url(groq_url.to_string());
    let gemini = GeminiClient::new(None).unwrap();
    let catalog = ModelCatalog::new(gemini.clone());
    CascadeExecutor::new(groq, catalog, gemini)
}

/// Spawn the router on an ephemeral port and return its base URL.
async fn spawn_server(resolver: Resolver) -> String {
    let state = AppState::with_resolver(test_config(), resolver).unwrap();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn login(client: &reqwest::Client, base: &str) -> String {
    let body: Value = client
        .post(format!("{}/api/auth/login", base))
        .json(&json!({"username": "admin@myapp.com", "password": "admin123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_reports_ok() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Weather App Backend is running");
}

#[tokio::test]
async fn unknown_route_returns_error_envelope() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/nope", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Route not found");
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn login_requires_both_credentials() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", base))
        .json(&json!({"username": "admin@myapp.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Username and password are required");
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", base))
        .json(&json!({"username": "admin@myapp.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_issues_token_for_default_user() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", base))
        .json(&json!({"username": "admin@myapp.com", "password": "admin123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["username"], "admin@myapp.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn me_requires_a_token() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/auth/me", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Access token required");
}

#[tokio::test]
async fn me_rejects_garbage_tokens() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/auth/me", base))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid or expired token");
}

#[tokio::test]
async fn me_returns_the_token_subject() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let response = client
        .get(format!("{}/api/auth/me", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["username"], "admin@myapp.com");
}

#[tokio::test]
async fn register_rejects_existing_username() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({"username": "admin@myapp.com", "password": "whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Username already exists");
}

#[tokio::test]
async fn register_creates_a_usable_account() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({"username": "kid@myapp.com", "password": "waddle"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");
    let token = body["token"].as_str().unwrap();

    let me: Value = client
        .get(format!("{}/api/auth/me", base))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["username"], "kid@myapp.com");
}

#[tokio::test]
async fn analyze_weather_requires_weather_data() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let response = client
        .post(format!("{}/api/ai/analyze-weather", base))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Weather data is required");
}

#[tokio::test]
async fn analyze_weather_returns_advice_with_attribution() {
    let groq = MockServer::start().await;
    let advice = json!({
        "weather": "snowing",
        "suggestions": {
            "cloth": "A thick parka",
            "game": "Build a snow fort",
            "smart_suggestion": "Keep your flippers dry",
            "short_response_to_weather": "Perfect penguin weather!"
        }
    });
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {
                "content": format!("```json\n{}\n```", advice)
            }}]
        })))
        .expect(1)
        .mount(&groq)
        .await;

    let base = spawn_server(groq_resolver(&groq.uri())).await;
    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let response = client
        .post(format!("{}/api/ai/analyze-weather", base))
        .bearer_auth(&token)
        .json(&json!({"weather_data": {"temperature": "12F", "condition": "Snowing"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["weather"], "snowing");
    assert_eq!(body["suggestions"]["cloth"], "A thick parka");
    assert_eq!(body["_meta"]["model_used"], "groq/llama-3.1-8b-instant");
}

#[tokio::test]
async fn analyze_weather_hides_provider_detail_on_exhaustion() {
    // No credentials anywhere: the cascade exhausts without network I/O.
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let response = client
        .post(format!("{}/api/ai/analyze-weather", base))
        .bearer_auth(&token)
        .json(&json!({"weather_data": {"temperature": "70F"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Internal server error");
}

#[tokio::test]
async fn purpleair_requires_auth_and_key() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/purpleair/sensors", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let token = login(&client, &base).await;
    let response = client
        .get(format!("{}/api/purpleair/sensors", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "PurpleAir API key not configured");
}

#[tokio::test]
async fn feedback_round_trips() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/feedback", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/api/feedback", base))
        .json(&json!({"feedback": "More fish facts please", "rating": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Feedback submitted successfully");
    assert_eq!(body["data"]["user_id"], "anonymous");

    let listing: Value = client
        .get(format!("{}/api/feedback", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["feedbacks"][0]["feedback"], "More fish facts please");
}

#[tokio::test]
async fn location_search_requires_query() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/location/search", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Query parameter \"q\" is required");
}

#[tokio::test]
async fn location_weather_requires_coordinates() {
    let base = spawn_server(dead_resolver()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/location/weather?lat=47.6", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "lat and lon are required");
}
