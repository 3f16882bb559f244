//! Integration tests for WeatherApiClient using wiremock.

use std::sync::Arc;

use forekast_core::{
    ApiError, GeoLocation, LocationId, WeatherApi, WeatherApiClient, WeatherConditionCode,
    WeatherRepository,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WeatherApiClient {
    WeatherApiClient::with_base_url("TEST_KEY".into(), &format!("{}/v1", server.uri())).unwrap()
}

fn current_body(temp: f64, code: i64) -> serde_json::Value {
    serde_json::json!({
        "location": {
            "name": "London",
            "region": "City of London, Greater London",
            "country": "United Kingdom",
            "lat": 51.52,
            "lon": -0.11,
            "localtime": "2026-10-19 12:00"
        },
        "current": {
            "last_updated_epoch": 1_792_400_400,
            "temp_c": temp,
            "is_day": 1,
            "condition": { "text": "Partly cloudy", "icon": "//cdn/116.png", "code": code },
            "wind_kph": 18.0,
            "humidity": 72,
            "feelslike_c": 9.5,
            "uv": 3.0
        }
    })
}

#[tokio::test]
async fn current_weather_sends_id_query_and_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "TEST_KEY"))
        .and(query_param("q", "id:2801268"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(11.0, 1003)))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server).current_weather(LocationId(2801268)).await.unwrap();

    assert_eq!(data.current.temperature_c, 11.0);
    assert_eq!(data.current.condition.code, Some(WeatherConditionCode::PartlyCloudy));
    assert_eq!(data.current.humidity, Some(72));
    assert_eq!(data.current.feels_like_c, Some(9.5));
    assert_eq!(data.location.unwrap().country.as_deref(), Some("United Kingdom"));
}

#[tokio::test]
async fn unknown_condition_code_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(20.0, 9999)))
        .mount(&server)
        .await;

    let data = client(&server).current_weather(LocationId(1)).await.unwrap();
    assert_eq!(data.current.condition.code, None);
    assert_eq!(data.current.condition.text, "Partly cloudy");
}

#[tokio::test]
async fn search_by_name_returns_all_hits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search.json"))
        .and(query_param("q", "lond"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 2801268, "name": "London", "region": "City of London, Greater London",
              "country": "United Kingdom", "lat": 51.52, "lon": -0.11, "url": "london" },
            { "id": 315398, "name": "London", "region": "Ontario", "country": "Canada" },
            { "id": 42, "name": "Londrina" }
        ])))
        .mount(&server)
        .await;

    let hits = client(&server).search_location("lond").await.unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, 2801268);
    assert_eq!(hits[1].region.as_deref(), Some("Ontario"));
    assert_eq!(hits[2].country, None);
}

#[tokio::test]
async fn search_by_coordinates_takes_first_hit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search.json"))
        .and(query_param("q", "48.85,2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 803267, "name": "Paris", "region": "Ile-de-France", "country": "France" },
            { "id": 1, "name": "Paris Suburb" }
        ])))
        .mount(&server)
        .await;

    let geo = GeoLocation { latitude: 48.85, longitude: 2.35 };
    let hit = client(&server).search_location_at(geo).await.unwrap();
    assert_eq!(hit.map(|l| l.name).as_deref(), Some("Paris"));
}

#[tokio::test]
async fn search_by_coordinates_with_no_hits_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let geo = GeoLocation { latitude: 0.0, longitude: -160.0 };
    assert_eq!(client(&server).search_location_at(geo).await.unwrap(), None);
}

#[tokio::test]
async fn forecast_clamps_days_and_decodes_days() {
    let server = MockServer::start().await;

    let mut body = current_body(14.0, 1000);
    body["forecast"] = serde_json::json!({
        "forecastday": [
            { "date": "2026-10-19", "date_epoch": 1_792_368_000,
              "day": { "maxtemp_c": 16.2, "mintemp_c": 8.1, "avgtemp_c": 12.0,
                       "daily_chance_of_rain": 20,
                       "condition": { "text": "Sunny", "code": 1000 } },
              "hour": [] },
            { "date": "2026-10-20",
              "day": { "maxtemp_c": 13.0, "mintemp_c": 7.4,
                       "condition": { "text": "Light rain", "code": 1183 } } }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("days", "14"))
        .and(query_param("q", "id:7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server).forecast(LocationId(7), 30).await.unwrap();
    let days = data.forecast.unwrap().forecastday;

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date.to_string(), "2026-10-19");
    assert_eq!(days[0].day.daily_chance_of_rain, Some(20));
    assert_eq!(days[1].day.condition.code, Some(WeatherConditionCode::LightRain));
    assert_eq!(days[1].day.avgtemp_c, None);
}

#[tokio::test]
async fn error_status_surfaces_service_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "code": 2006, "message": "API key is invalid." }
        })))
        .mount(&server)
        .await;

    let err = client(&server).current_weather(LocationId(1)).await.unwrap_err();
    assert_eq!(err, ApiError::Status { status: 401, body: "API key is invalid.".into() });
    assert!(err.user_message().contains("forekast configure"));
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": { "condition": { "text": "Sunny" } }
        })))
        .mount(&server)
        .await;

    let err = client(&server).current_weather(LocationId(1)).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client =
        WeatherApiClient::with_base_url("TEST_KEY".into(), &format!("http://127.0.0.1:{port}/v1"))
            .unwrap();

    let err = client.search_location("x").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn repository_hits_network_once_until_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(5.0, 1000)))
        .expect(2)
        .mount(&server)
        .await;

    let repo = WeatherRepository::new(Arc::new(client(&server)));

    repo.current_weather(LocationId(1)).await.unwrap();
    repo.current_weather(LocationId(1)).await.unwrap();
    repo.clear_cache();
    repo.current_weather(LocationId(1)).await.unwrap();

    server.verify().await;
}
