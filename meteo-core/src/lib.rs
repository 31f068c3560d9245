//! Core library for the `meteo` current-weather client.
//!
//! This crate defines:
//! - Configuration handling
//! - The forecast client and its domain models
//! - Permission and location abstractions over the platform
//! - The fetch orchestrator and the details presenter
//!
//! It is used by `meteo-cli`, but the orchestrator only talks to traits, so any
//! other host (GUI, service) can drive it with its own view and location source.

pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod permission;
pub mod presenter;

pub use client::{OpenMeteoClient, WeatherClient};
pub use config::Config;
pub use error::FetchError;
pub use location::{LocationProvider, LocationRequest, LocationSource, LocationSourceKind};
pub use model::{Coordinates, CurrentWeather, PermissionState};
pub use orchestrator::{FetchState, FetchView, WeatherFetchOrchestrator};
pub use permission::PermissionGate;
