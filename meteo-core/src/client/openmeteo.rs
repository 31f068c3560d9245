use async_trait::async_trait;
use reqwest::Client;

use crate::{Coordinates, CurrentWeather, FetchError, model::ForecastResponse};

use super::WeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: Client::new() }
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl WeatherClient for OpenMeteoClient {
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<CurrentWeather, FetchError> {
        tracing::debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            url = %self.base_url,
            "requesting current weather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "forecast request rejected");
            return Err(FetchError::Api { status: status.as_u16(), body });
        }

        let parsed = serde_json::from_str::<ForecastResponse>(&body)
            .ok()
            .and_then(|r| r.current_weather);

        match parsed {
            Some(current) => {
                tracing::debug!(time = %current.time, "current weather received");
                Ok(current)
            }
            None => {
                tracing::warn!(status = status.as_u16(), "forecast body has no current weather");
                Err(FetchError::MalformedResponse { status: status.as_u16(), body })
            }
        }
    }
}
