use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Config, Coordinates, CurrentWeather, FetchError};

pub mod openmeteo;

pub use openmeteo::OpenMeteoClient;

/// One-shot current-weather lookup for a coordinate pair.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_forecast(&self, coords: Coordinates) -> Result<CurrentWeather, FetchError>;
}

/// Construct the forecast client from config.
pub fn client_from_config(config: &Config) -> Box<dyn WeatherClient> {
    Box::new(OpenMeteoClient::new(config.api.base_url.clone()))
}
