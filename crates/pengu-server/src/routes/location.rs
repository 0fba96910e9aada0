//! Public location routes: city search and current-conditions lookup.
//!
//! No auth here: the client needs these before a location is picked.
//! The weather lookup fans out to three upstreams concurrently (forecast,
//! air quality, reverse geocode) and joins the results.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";

// ── City search ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    /// State/region.
    admin1: Option<String>,
}

#[derive(Serialize)]
struct CityResult {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<CityResult>,
}

/// GET /api/location/search?q=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter \"q\" is required"))?;

    let response = state
        .http
        .get(GEOCODING_URL)
        .query(&[
            ("name", q.as_str()),
            ("count", "5"),
            ("language", "en"),
            ("format", "json"),
        ])
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| {
            log::error!("Geocoding error: {}", e);
            ApiError::internal("Failed to search for cities")
        })?;

    let body: GeocodingResponse = response.json().await.map_err(|e| {
        log::error!("Geocoding error: {}", e);
        ApiError::internal("Failed to search for cities")
    })?;

    let results = body
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|item| CityResult {
            id: item.id,
            name: item.name,
            latitude: item.latitude,
            longitude: item.longitude,
            country: item.country,
            admin1: item.admin1,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

// ── Current conditions ──────────────────────────────────────────────

#[derive(Deserialize)]
struct WeatherQuery {
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: i64,
    is_day: i64,
    precipitation: f64,
    snowfall: f64,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    cloud_cover: f64,
    visibility: f64,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: CurrentAirQuality,
}

#[derive(Debug, Deserialize)]
struct CurrentAirQuality {
    us_aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    uv_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseGeocodeResponse {
    city: Option<String>,
    locality: Option<String>,
    principal_subdivision: Option<String>,
    country_name: Option<String>,
}

#[derive(Serialize)]
struct LocationInfo {
    city: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

#[derive(Serialize)]
struct WeatherInfo {
    temperature: String,
    feels_like: String,
    humidity: String,
    condition: &'static str,
    is_day: bool,
    precipitation: f64,
    snowfall: f64,
    wind_speed: String,
    cloud_cover: String,
    visibility: String,
}

#[derive(Serialize)]
struct AirQualityInfo {
    aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    uv_index: Option<f64>,
}

#[derive(Serialize)]
struct LocationWeatherResponse {
    location: LocationInfo,
    weather: WeatherInfo,
    air_quality: AirQualityInfo,
    source: &'static str,
}

/// Map a WMO weather code to a condition string.
fn condition_for_code(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Cloudy",
        4..=49 => "Foggy",
        50..=59 => "Drizzle",
        60..=69 => "Raining",
        70..=79 => "Snowing",
        80..=84 => "Rain showers",
        85..=94 => "Snow showers",
        95.. => "Thunderstorm",
        _ => "Unknown",
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    state: &AppState,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T, reqwest::Error> {
    state
        .http
        .get(url)
        .query(params)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// GET /api/location/weather?lat=&lon=
async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<LocationWeatherResponse>, ApiError> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::bad_request("lat and lon are required"));
    };
    let (latitude, longitude) = match (lat.parse::<f64>(), lon.parse::<f64>()) {
        (Ok(latitude), Ok(longitude)) => (latitude, longitude),
        _ => return Err(ApiError::bad_request("lat and lon are required")),
    };

    let forecast_params = [
        ("latitude", lat.as_str()),
        ("longitude", lon.as_str()),
        (
            "current",
            "temperature_2m,relative_humidity_2m,weather_code,is_day,precipitation,\
             rain,showers,snowfall,apparent_temperature,wind_speed_10m,cloud_cover,visibility",
        ),
        ("temperature_unit", "fahrenheit"),
        ("wind_speed_unit", "mph"),
        ("precipitation_unit", "inch"),
    ];
    let forecast = fetch_json::<ForecastResponse>(&state, FORECAST_URL, &forecast_params);

    let air_quality_params = [
        ("latitude", lat.as_str()),
        ("longitude", lon.as_str()),
        ("current", "us_aqi,pm10,pm2_5,uv_index"),
    ];
    let air_quality = fetch_json::<AirQualityResponse>(&state, AIR_QUALITY_URL, &air_quality_params);

    let reverse_geo_params = [
        ("latitude", lat.as_str()),
        ("longitude", lon.as_str()),
        ("localityLanguage", "en"),
    ];
    let reverse_geo =
        fetch_json::<ReverseGeocodeResponse>(&state, REVERSE_GEOCODE_URL, &reverse_geo_params);

    let (forecast, air_quality, reverse_geo) = tokio::join!(forecast, air_quality, reverse_geo);

    let (forecast, air_quality, reverse_geo) = match (forecast, air_quality, reverse_geo) {
        (Ok(f), Ok(a), Ok(g)) => (f, a, g),
        (f, a, g) => {
            let e = [
                f.err().map(|e| e.to_string()),
                a.err().map(|e| e.to_string()),
                g.err().map(|e| e.to_string()),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ");
            log::error!("Weather error: {}", e);
            return Err(ApiError::internal("Failed to fetch weather data"));
        }
    };

    let current = forecast.current;
    let aqi = air_quality.current;

    let city = reverse_geo
        .city
        .filter(|c| !c.is_empty())
        .or(reverse_geo.locality)
        .or(reverse_geo.principal_subdivision)
        .unwrap_or_else(|| "Unknown Location".to_string());

    Ok(Json(LocationWeatherResponse {
        location: LocationInfo {
            city,
            latitude,
            longitude,
            country: reverse_geo.country_name,
        },
        weather: WeatherInfo {
            temperature: format!("{}F", current.temperature_2m),
            feels_like: format!("{}F", current.apparent_temperature),
            humidity: format!("{}%", current.relative_humidity_2m),
            condition: condition_for_code(current.weather_code),
            is_day: current.is_day == 1,
            precipitation: current.precipitation,
            snowfall: current.snowfall,
            wind_speed: format!("{} mph", current.wind_speed_10m),
            cloud_cover: format!("{}%", current.cloud_cover),
            visibility: format!("{} meters", current.visibility),
        },
        air_quality: AirQualityInfo {
            aqi: aqi.us_aqi,
            pm2_5: aqi.pm2_5,
            pm10: aqi.pm10,
            uv_index: aqi.uv_index,
        },
        source: "OpenMeteo",
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/weather", get(weather))
}

// ── Tests ───────────────────────────────────────────────────────────
