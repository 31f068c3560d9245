//! Permission -> location fix -> forecast request -> details, as one state machine.

use parking_lot::Mutex;
use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    Coordinates, CurrentWeather, FetchError,
    client::WeatherClient,
    location::{LocationProvider, LocationRequest, LocationSource},
    permission::{PermissionGate, ensure_location_permission},
};

/// Where a fetch attempt currently is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    AwaitingPermission,
    AwaitingLocation,
    Fetching,
    Done(CurrentWeather),
    Failed(FetchError),
}

impl FetchState {
    /// The busy indicator is shown exactly while this holds.
    pub fn is_busy(&self) -> bool {
        matches!(self, FetchState::AwaitingLocation | FetchState::Fetching)
    }

    /// An attempt is running and has not reached a terminal state.
    pub fn is_pending(&self) -> bool {
        self.is_busy() || *self == FetchState::AwaitingPermission
    }
}

/// The host screen. Calls are skipped once it reports itself detached.
pub trait FetchView: Send + Sync + Debug {
    fn set_busy(&self, busy: bool);

    /// Echo an acquired fix into the coordinate fields.
    fn show_coordinates(&self, coords: &Coordinates);

    /// Transient, auto-dismissing message.
    fn show_notice(&self, message: &str);

    /// Blocking notice whose only action ends the session.
    fn show_permission_rationale(&self);

    /// Navigate to the details screen.
    fn show_details(&self, weather: &CurrentWeather);

    fn is_attached(&self) -> bool;
}

#[derive(Debug)]
pub struct WeatherFetchOrchestrator {
    gate: Arc<dyn PermissionGate>,
    locator: Option<LocationProvider>,
    client: Arc<dyn WeatherClient>,
    view: Arc<dyn FetchView>,
    request: LocationRequest,
    state: watch::Sender<FetchState>,
    in_flight: AtomicBool,
    lifecycle: Mutex<CancellationToken>,
}

/// One running attempt. Dropping it mid-flight returns the machine to `Idle`.
struct Attempt<'a> {
    owner: &'a WeatherFetchOrchestrator,
    cancel: CancellationToken,
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.owner.state.borrow().is_pending() {
            tracing::debug!("fetch abandoned mid-flight");
            self.owner.transition(FetchState::Idle);
        }
        self.owner.in_flight.store(false, Ordering::Release);
    }
}

impl WeatherFetchOrchestrator {
    /// Without a location source only the manual path is available.
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        client: Arc<dyn WeatherClient>,
        view: Arc<dyn FetchView>,
    ) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);

        Self {
            locator: None,
            gate,
            client,
            view,
            request: LocationRequest::default(),
            state,
            in_flight: AtomicBool::new(false),
            lifecycle: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_location_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.locator = Some(LocationProvider::new(source, self.gate.clone()));
        self
    }

    pub fn with_location_request(mut self, request: LocationRequest) -> Self {
        self.request = request;
        self
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Host lost the foreground: end an attempt still waiting on permission or
    /// a location fix. An HTTP request already sent is left to finish.
    pub fn pause(&self) {
        let mut token = self.lifecycle.lock();
        token.cancel();
        *token = CancellationToken::new();
        tracing::debug!("orchestrator paused");
    }

    /// "Use my location": permission, one fix, then the forecast.
    pub async fn use_device_location(&self) -> Result<CurrentWeather, FetchError> {
        let attempt = self.begin()?;
        let Some(locator) = &self.locator else {
            return Err(self.fail(FetchError::LocationUnavailable(
                "no location source configured".to_string(),
            )));
        };

        self.transition(FetchState::AwaitingPermission);
        let permission = tokio::select! {
            biased;
            _ = attempt.cancel.cancelled() => return Err(self.fail(FetchError::Cancelled)),
            answer = ensure_location_permission(self.gate.as_ref()) => answer,
        };
        if !permission.is_granted() {
            return Err(self.fail(FetchError::PermissionDenied));
        }

        self.transition(FetchState::AwaitingLocation);
        let coords = match locator.get_current_fix(&self.request, &attempt.cancel).await {
            Ok(coords) => coords,
            Err(e) => return Err(self.fail(e)),
        };

        if !self.view.is_attached() {
            return Err(self.fail(FetchError::HostGone));
        }
        tracing::info!(%coords, "location fix acquired");
        self.view.show_coordinates(&coords);

        self.fetch(coords).await
    }

    /// Manual entry: skips permission and location entirely.
    pub async fn fetch_manual(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<CurrentWeather, FetchError> {
        let _attempt = self.begin()?;

        match Coordinates::parse(latitude, longitude) {
            Ok(coords) => self.fetch(coords).await,
            Err(e) => Err(self.fail(e)),
        }
    }

    fn begin(&self) -> Result<Attempt<'_>, FetchError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                tracing::debug!("fetch rejected: another one is in flight");
                FetchError::AlreadyInFlight
            })?;

        // Taken up front so a pause at any later point reaches this attempt.
        let cancel = self.lifecycle.lock().child_token();
        Ok(Attempt { owner: self, cancel })
    }

    async fn fetch(&self, coords: Coordinates) -> Result<CurrentWeather, FetchError> {
        self.transition(FetchState::Fetching);

        let result = self.client.fetch_forecast(coords).await;

        if !self.view.is_attached() {
            return Err(self.fail(FetchError::HostGone));
        }

        match result {
            Ok(weather) => {
                self.transition(FetchState::Done(weather.clone()));
                self.view.show_details(&weather);
                Ok(weather)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, error: FetchError) -> FetchError {
        if error.is_silent() {
            tracing::debug!(%error, "fetch dropped");
            self.transition(FetchState::Idle);
            return error;
        }

        tracing::warn!(%error, "fetch failed");
        self.transition(FetchState::Failed(error.clone()));

        if self.view.is_attached() {
            if error.is_terminal() {
                self.view.show_permission_rationale();
            } else {
                self.view.show_notice(&error.to_string());
            }
        }

        error
    }

    fn transition(&self, next: FetchState) {
        let now_busy = next.is_busy();
        tracing::debug!(state = ?next, "fetch state changed");

        let was_busy = self.state.send_replace(next).is_busy();
        if was_busy != now_busy && self.view.is_attached() {
            self.view.set_busy(now_busy);
        }
    }
}
