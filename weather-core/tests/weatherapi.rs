//! HTTP contract tests for the WeatherAPI.com provider against a mock server.

use weather_core::{
    FetchError, WeatherProvider, error::RATE_LIMIT_MESSAGE,
    provider::weatherapi::WeatherApiProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "location": {
            "name": "São Paulo",
            "region": "Sao Paulo",
            "country": "Brazil",
            "lat": -23.53,
            "lon": -46.62
        },
        "current": {
            "temp_c": 21.6,
            "feelslike_c": 20.4,
            "condition": {
                "text": "Partly cloudy",
                "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png",
                "code": 1003
            },
            "humidity": 68,
            "wind_kph": 13.0,
            "precip_mm": 0.2,
            "is_day": 1
        }
    })
}

fn provider(server: &MockServer) -> WeatherApiProvider {
    WeatherApiProvider::new(Some("test-key".to_string()))
        .unwrap()
        .with_base_url(format!("{}/v1", server.uri()))
}

#[tokio::test]
async fn parses_current_conditions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "test-key"))
        .and(query_param("q", "São Paulo, Brazil"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = provider(&server).current("São Paulo, Brazil").await.unwrap();

    assert_eq!(snapshot.location_name, "São Paulo");
    assert_eq!(snapshot.region, "Sao Paulo");
    assert_eq!(snapshot.country, "Brazil");
    assert_eq!(snapshot.rounded_temperature(), 22);
    assert_eq!(snapshot.rounded_feels_like(), 20);
    assert_eq!(snapshot.condition_text, "Partly cloudy");
    assert_eq!(snapshot.humidity_pct, 68);
    assert_eq!(snapshot.wind_kph, 13.0);
    assert_eq!(snapshot.precip_mm, 0.2);
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = provider(&server).current("Paris").await.unwrap_err();

    assert!(matches!(err, FetchError::RateLimited));
    assert_eq!(err.to_string(), RATE_LIMIT_MESSAGE);
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .mount(&server)
        .await;

    let err = provider(&server).current("Atlantis").await.unwrap_err();

    assert_eq!(err.to_string(), "No matching location found.");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_without_body_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider(&server).current("Paris").await.unwrap_err();

    assert!(matches!(err, FetchError::Api { status: 500, .. }));
    assert_eq!(err.to_string(), "Failed to fetch weather data (status 500)");
}

#[tokio::test]
async fn malformed_success_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"location\":{}}"))
        .mount(&server)
        .await;

    let err = provider(&server).current("Paris").await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn missing_key_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(0)
        .mount(&server)
        .await;

    let provider = WeatherApiProvider::new(None)
        .unwrap()
        .with_base_url(format!("{}/v1", server.uri()));
    let err = provider.current("Paris").await.unwrap_err();

    assert!(matches!(err, FetchError::MissingApiKey));
    assert!(!err.is_retryable());
}
