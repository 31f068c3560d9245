//! Single-fix location acquisition on top of a subscription-style source.

use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Coordinates, FetchError,
    location::{fixed::FixedLocationSource, ip::IpLocationSource},
    permission::PermissionGate,
};

pub mod fixed;
pub mod ip;

/// Channel a source pushes fixes into.
pub type FixSink = mpsc::UnboundedSender<Coordinates>;

/// Accuracy hint handed to the source. Advisory: the built-in `ip` and
/// `fixed` sources have a single accuracy level and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    HighAccuracy,
    Balanced,
    LowPower,
}

/// Update cadence requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub priority: Priority,
    pub interval: Duration,
    pub fastest_interval: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval: Duration::from_secs(60),
            fastest_interval: Duration::from_secs(5),
        }
    }
}

/// Live registration with a source. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Platform location service: streams fixes until the subscription is dropped.
pub trait LocationSource: Send + Sync + Debug {
    fn request_updates(
        &self,
        request: &LocationRequest,
        sink: FixSink,
    ) -> Result<Subscription, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSourceKind {
    #[default]
    Ip,
    Fixed,
}

impl LocationSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSourceKind::Ip => "ip",
            LocationSourceKind::Fixed => "fixed",
        }
    }

    pub const fn all() -> &'static [LocationSourceKind] {
        &[LocationSourceKind::Ip, LocationSourceKind::Fixed]
    }
}

impl std::fmt::Display for LocationSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LocationSourceKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "ip" => Ok(LocationSourceKind::Ip),
            "fixed" => Ok(LocationSourceKind::Fixed),
            _ => Err(anyhow::anyhow!(
                "Unknown location source '{value}'. Supported sources: ip, fixed."
            )),
        }
    }
}

/// Construct the configured location source.
pub fn source_from_config(config: &Config) -> anyhow::Result<Arc<dyn LocationSource>> {
    let source: Arc<dyn LocationSource> = match config.location.source {
        LocationSourceKind::Ip => {
            Arc::new(IpLocationSource::new(config.location.ip_lookup_url.clone()))
        }
        LocationSourceKind::Fixed => {
            let home = config.location.home.ok_or_else(|| {
                anyhow::anyhow!(
                    "Location source 'fixed' has no home coordinates.\n\
                     Hint: run `meteo configure` and enter a latitude and longitude."
                )
            })?;
            Arc::new(FixedLocationSource::new(home))
        }
    };

    Ok(source)
}

/// Hands out at most one fix per call, then unsubscribes.
#[derive(Debug, Clone)]
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    gate: Arc<dyn PermissionGate>,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>, gate: Arc<dyn PermissionGate>) -> Self {
        Self { source, gate }
    }

    /// Wait for the first valid fix. Cancelling `cancel` (or dropping the
    /// future) tears the subscription down even if nothing arrived yet.
    pub async fn get_current_fix(
        &self,
        request: &LocationRequest,
        cancel: &CancellationToken,
    ) -> Result<Coordinates, FetchError> {
        if !self.gate.check().is_granted() {
            return Err(FetchError::PermissionMissing);
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = self.source.request_updates(request, tx)?;
        tracing::debug!(?request, "subscribed to location updates");

        let fix = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(FetchError::Cancelled),
                update = rx.recv() => match update {
                    Some(coords) if coords.is_finite() => break Ok(coords),
                    Some(coords) => {
                        tracing::warn!(%coords, "ignoring invalid location fix");
                    }
                    None => {
                        break Err(FetchError::LocationUnavailable(
                            "location updates stopped before a fix arrived".to_string(),
                        ))
                    }
                },
            }
        };

        drop(subscription);
        rx.close();
        tracing::debug!(ok = fix.is_ok(), "unsubscribed from location updates");

        fix
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;
    use crate::{PermissionState, permission::fake::FakeGate};

    fn provider(source: Arc<FakeSource>, state: PermissionState) -> LocationProvider {
        LocationProvider::new(source, Arc::new(FakeGate::new(state, PermissionState::Denied)))
    }

    #[tokio::test]
    async fn delivers_only_the_first_fix_and_unsubscribes() {
        let source = Arc::new(FakeSource::emitting(vec![
            Coordinates::new(45.81, 15.98),
            Coordinates::new(1.0, 2.0),
            Coordinates::new(3.0, 4.0),
        ]));
        let provider = provider(source.clone(), PermissionState::Granted);

        let fix = provider
            .get_current_fix(&LocationRequest::default(), &CancellationToken::new())
            .await
            .expect("fix");

        assert_eq!(fix, Coordinates::new(45.81, 15.98));
        assert_eq!(source.subscriptions(), 1);
        assert!(source.all_unsubscribed());

        // Late updates have nowhere to go.
        let sink = source.sinks.lock()[0].clone();
        assert!(sink.send(Coordinates::new(9.0, 9.0)).is_err());
    }

    #[tokio::test]
    async fn skips_non_finite_fixes() {
        let source = Arc::new(FakeSource::emitting(vec![
            Coordinates::new(f64::NAN, 1.0),
            Coordinates::new(10.0, 20.0),
        ]));
        let provider = provider(source, PermissionState::Granted);

        let fix = provider
            .get_current_fix(&LocationRequest::default(), &CancellationToken::new())
            .await
            .expect("fix");
        assert_eq!(fix, Coordinates::new(10.0, 20.0));
    }

    #[tokio::test]
    async fn refuses_without_permission() {
        let source = Arc::new(FakeSource::emitting(vec![Coordinates::new(1.0, 1.0)]));
        let provider = provider(source.clone(), PermissionState::Unknown);

        let err = provider
            .get_current_fix(&LocationRequest::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::PermissionMissing);
        assert_eq!(source.subscriptions(), 0);
    }

    #[tokio::test]
    async fn cancellation_unsubscribes_before_any_fix() {
        let source = Arc::new(FakeSource::silent());
        let provider = provider(source.clone(), PermissionState::Granted);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        });

        let err = provider
            .get_current_fix(&LocationRequest::default(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Cancelled);
        assert_eq!(source.subscriptions(), 1);
        assert!(source.all_unsubscribed());
    }

    #[tokio::test]
    async fn already_cancelled_never_subscribes() {
        let source = Arc::new(FakeSource::emitting(vec![Coordinates::new(1.0, 1.0)]));
        let provider = provider(source.clone(), PermissionState::Granted);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provider
            .get_current_fix(&LocationRequest::default(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Cancelled);
        assert_eq!(source.subscriptions(), 0);
    }

    #[tokio::test]
    async fn closed_source_reports_unavailable() {
        let source = Arc::new(FakeSource { keep_open: false, ..Default::default() });
        let provider = provider(source, PermissionState::Granted);

        let err = provider
            .get_current_fix(&LocationRequest::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::LocationUnavailable(_)));
    }

    #[test]
    fn source_kind_roundtrip() {
        for kind in LocationSourceKind::all() {
            let parsed = LocationSourceKind::try_from(kind.as_str()).expect("roundtrip");
            assert_eq!(*kind, parsed);
        }
        let err = LocationSourceKind::try_from("gps").unwrap_err();
        assert!(err.to_string().contains("Unknown location source"));
    }

    #[test]
    fn fixed_source_requires_home() {
        let mut cfg = Config::default();
        cfg.location.source = LocationSourceKind::Fixed;

        let err = source_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Hint: run `meteo configure`"));

        cfg.location.home = Some(Coordinates::new(45.81, 15.98));
        assert!(source_from_config(&cfg).is_ok());
    }
}
