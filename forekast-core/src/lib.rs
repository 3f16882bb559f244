//! Core library for the `forekast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - A persisted, observable list of tracked locations
//! - A client for the weatherapi.com endpoints
//! - A per-location cache of weather results
//!
//! It is used by `forekast-cli`, but can also be reused by other front ends.

pub mod api;
pub mod config;
pub mod error;
pub mod location_store;
pub mod model;
pub mod repository;
pub mod settings;

pub use api::{WeatherApi, WeatherApiClient};
pub use config::Config;
pub use error::{ApiError, StoreError};
pub use location_store::LocationStore;
pub use model::{
    CurrentWeather, Forecast, ForecastDay, GeoLocation, Location, LocationId, WeatherCondition,
    WeatherConditionCode, WeatherData, WeatherResult,
};
pub use repository::WeatherRepository;
pub use settings::{FileSettings, MemorySettings, Settings};
