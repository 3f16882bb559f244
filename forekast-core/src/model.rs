use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ApiError;

/// A place the user tracks, as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Location {
    pub fn location_id(&self) -> LocationId {
        LocationId(self.id)
    }

    /// "Name, Region, Country", skipping empty parts.
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        parts.extend(
            [self.region.as_deref(), self.country.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty()),
        );
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub i64);

impl LocationId {
    /// Query form understood by the `q=` parameter.
    pub fn as_query(&self) -> String {
        format!("id:{}", self.0)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&Location> for LocationId {
    fn from(location: &Location) -> Self {
        location.location_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Decoded body of `current.json` / `forecast.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: CurrentWeather,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ApiLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

/// Location block echoed back by weather endpoints (no id there).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiLocation {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub localtime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(rename = "temp_c")]
    pub temperature_c: f64,
    pub condition: WeatherCondition,
    #[serde(rename = "feelslike_c", default)]
    pub feels_like_c: Option<f64>,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub wind_kph: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_day: Option<bool>,
    #[serde(default)]
    pub last_updated_epoch: Option<i64>,
}

impl CurrentWeather {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated_epoch
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }

    pub fn wind_speed_mps(&self) -> Option<f64> {
        self.wind_kph.map(|kph| kph / 3.6)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub text: String,
    #[serde(default, with = "condition_code")]
    pub code: Option<WeatherConditionCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day: DaySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    #[serde(default)]
    pub avgtemp_c: Option<f64>,
    #[serde(default)]
    pub daily_chance_of_rain: Option<u8>,
    pub condition: WeatherCondition,
}

/// Outcome of a single weather fetch; cached as-is by the repository.
pub type WeatherResult = Result<WeatherData, ApiError>;

macro_rules! condition_codes {
    ($($variant:ident = $code:literal => $label:literal,)*) => {
        /// Condition codes published by weatherapi.com.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum WeatherConditionCode {
            $($variant,)*
        }

        impl WeatherConditionCode {
            pub const fn code(&self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                }
            }

            pub const fn all() -> &'static [WeatherConditionCode] {
                &[$(Self::$variant,)*]
            }
        }
    };
}

condition_codes! {
    Sunny = 1000 => "Sunny",
    PartlyCloudy = 1003 => "Partly cloudy",
    Cloudy = 1006 => "Cloudy",
    Overcast = 1009 => "Overcast",
    Mist = 1030 => "Mist",
    PatchyRainPossible = 1063 => "Patchy rain possible",
    PatchySnowPossible = 1066 => "Patchy snow possible",
    PatchySleetPossible = 1069 => "Patchy sleet possible",
    PatchyFreezingDrizzlePossible = 1072 => "Patchy freezing drizzle possible",
    ThunderyOutbreaksPossible = 1087 => "Thundery outbreaks possible",
    BlowingSnow = 1114 => "Blowing snow",
    Blizzard = 1117 => "Blizzard",
    Fog = 1135 => "Fog",
    FreezingFog = 1147 => "Freezing fog",
    PatchyLightDrizzle = 1150 => "Patchy light drizzle",
    LightDrizzle = 1153 => "Light drizzle",
    FreezingDrizzle = 1168 => "Freezing drizzle",
    HeavyFreezingDrizzle = 1171 => "Heavy freezing drizzle",
    PatchyLightRain = 1180 => "Patchy light rain",
    LightRain = 1183 => "Light rain",
    ModerateRainAtTimes = 1186 => "Moderate rain at times",
    ModerateRain = 1189 => "Moderate rain",
    HeavyRainAtTimes = 1192 => "Heavy rain at times",
    HeavyRain = 1195 => "Heavy rain",
    LightFreezingRain = 1198 => "Light freezing rain",
    ModerateOrHeavyFreezingRain = 1201 => "Moderate or heavy freezing rain",
    LightSleet = 1204 => "Light sleet",
    ModerateOrHeavySleet = 1207 => "Moderate or heavy sleet",
    PatchyLightSnow = 1210 => "Patchy light snow",
    LightSnow = 1213 => "Light snow",
    PatchyModerateSnow = 1216 => "Patchy moderate snow",
    ModerateSnow = 1219 => "Moderate snow",
    PatchyHeavySnow = 1222 => "Patchy heavy snow",
    HeavySnow = 1225 => "Heavy snow",
    IcePellets = 1237 => "Ice pellets",
    LightRainShower = 1240 => "Light rain shower",
    ModerateOrHeavyRainShower = 1243 => "Moderate or heavy rain shower",
    TorrentialRainShower = 1246 => "Torrential rain shower",
    LightSleetShowers = 1249 => "Light sleet showers",
    ModerateOrHeavySleetShowers = 1252 => "Moderate or heavy sleet showers",
    LightSnowShowers = 1255 => "Light snow showers",
    ModerateOrHeavySnowShowers = 1258 => "Moderate or heavy snow showers",
    LightShowersOfIcePellets = 1261 => "Light showers of ice pellets",
    ModerateOrHeavyShowersOfIcePellets = 1264 => "Moderate or heavy showers of ice pellets",
    PatchyLightRainWithThunder = 1273 => "Patchy light rain with thunder",
    ModerateOrHeavyRainWithThunder = 1276 => "Moderate or heavy rain with thunder",
    PatchyLightSnowWithThunder = 1279 => "Patchy light snow with thunder",
    ModerateOrHeavySnowWithThunder = 1282 => "Moderate or heavy snow with thunder",
}

/// Unknown codes decode to `None`; `None` encodes as 0.
mod condition_code {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<WeatherConditionCode>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(value.map(|c| c.code()).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<WeatherConditionCode>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|c| i32::try_from(c).ok())
            .and_then(WeatherConditionCode::from_code))
    }
}

/// The service sends `is_day` as 0/1; accept real booleans as well.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}
