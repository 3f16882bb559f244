use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

use crate::{
    config::Config,
    error::ApiError,
    model::{GeoLocation, Location, LocationId, WeatherData, WeatherResult},
};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const MAX_FORECAST_DAYS: u8 = 14;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, id: LocationId) -> WeatherResult;

    async fn search_location(&self, query: &str) -> Result<Vec<Location>, ApiError>;

    /// Nearest known location to `geo`, if the service has one.
    async fn search_location_at(&self, geo: GeoLocation) -> Result<Option<Location>, ApiError>;

    async fn forecast(&self, id: LocationId, days: u8) -> WeatherResult;
}

/// weatherapi.com client.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Result<Self, ApiError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .user_agent(concat!("forekast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build a client from config; the key may come from the environment.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let api_key = config.effective_api_key().ok_or(ApiError::MissingApiKey)?;
        Self::with_base_url(api_key, config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?params, "weather request");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "weather request failed");
                ApiError::Network(e.to_string())
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::trace!(%url, %status, %body, "weather response");

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::warn!(%url, %status, error = %err, "weather service error");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%url, error = %e, "failed to decode weather response");
            ApiError::from(e)
        })
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    async fn current_weather(&self, id: LocationId) -> WeatherResult {
        let q = id.as_query();
        self.get_json::<WeatherData>("current.json", &[("q", q.as_str())]).await
    }

    async fn search_location(&self, query: &str) -> Result<Vec<Location>, ApiError> {
        let locations: Vec<Location> = self.get_json("search.json", &[("q", query)]).await?;
        tracing::debug!(query, hits = locations.len(), "location search");
        Ok(locations)
    }

    async fn search_location_at(&self, geo: GeoLocation) -> Result<Option<Location>, ApiError> {
        let q = geo.as_query();
        let locations: Vec<Location> = self.get_json("search.json", &[("q", q.as_str())]).await?;
        Ok(locations.into_iter().next())
    }

    async fn forecast(&self, id: LocationId, days: u8) -> WeatherResult {
        let q = id.as_query();
        let days = days.clamp(1, MAX_FORECAST_DAYS).to_string();
        self.get_json::<WeatherData>("forecast.json", &[("q", q.as_str()), ("days", days.as_str())])
            .await
    }
}
