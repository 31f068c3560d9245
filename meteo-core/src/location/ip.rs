use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{Coordinates, FetchError};

use super::{FixSink, LocationRequest, LocationSource, Subscription};

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Approximate position from an IP-geolocation service, polled at the
/// requested interval.
#[derive(Debug, Clone)]
pub struct IpLocationSource {
    lookup_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocationSource {
    pub fn new(lookup_url: impl Into<String>) -> Self {
        Self { lookup_url: lookup_url.into(), http: Client::new() }
    }

    pub async fn lookup(&self) -> Result<Coordinates> {
        let res = self
            .http
            .get(&self.lookup_url)
            .send()
            .await
            .context("Failed to send IP geolocation request")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("IP geolocation request failed with status {status}"));
        }

        let parsed: IpLookupResponse =
            res.json().await.context("Failed to parse IP geolocation JSON")?;

        if parsed.status.as_deref().is_some_and(|s| s != "success") {
            return Err(anyhow!(
                "IP geolocation lookup failed: {}",
                parsed.message.unwrap_or_else(|| "unknown reason".to_string())
            ));
        }

        match (parsed.lat, parsed.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(anyhow!("IP geolocation response has no coordinates")),
        }
    }
}

impl LocationSource for IpLocationSource {
    fn request_updates(
        &self,
        request: &LocationRequest,
        sink: FixSink,
    ) -> Result<Subscription, FetchError> {
        let token = CancellationToken::new();
        let stop = token.clone();
        let this = self.clone();
        let interval = request.interval;
        let retry = request.fastest_interval;

        tokio::spawn(async move {
            loop {
                let delay = tokio::select! {
                    _ = stop.cancelled() => break,
                    lookup = this.lookup() => match lookup {
                        Ok(coords) => {
                            if sink.send(coords).is_err() {
                                break;
                            }
                            interval
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "IP geolocation failed; retrying");
                            retry
                        }
                    },
                };

                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            tracing::debug!("IP location updates stopped");
        });

        Ok(Subscription::new(token))
    }
}
