use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Parse two user-entered strings. Both must be finite numbers.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, FetchError> {
        let parse_one = |raw: &str| raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());

        match (parse_one(latitude), parse_one(longitude)) {
            (Some(lat), Some(lon)) => Ok(Self::new(lat, lon)),
            _ => Err(FetchError::InvalidInput {
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
            }),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Body of a forecast response. Only the current-weather block is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
}

/// Current conditions as reported by the forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub winddirection: i32,
    pub weathercode: i32,
    pub is_day: u8,
    pub time: String,
}

impl CurrentWeather {
    /// Observation timestamp, if `time` is in the `YYYY-MM-DDTHH:MM` form the API uses.
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }
}

/// Location permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}
