use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{Coordinates, FetchError};

use super::{FixSink, LocationRequest, LocationSource, Subscription};

/// Reports a configured home position on every tick.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSource {
    home: Coordinates,
}

impl FixedLocationSource {
    pub fn new(home: Coordinates) -> Self {
        Self { home }
    }
}

impl LocationSource for FixedLocationSource {
    fn request_updates(
        &self,
        request: &LocationRequest,
        sink: FixSink,
    ) -> Result<Subscription, FetchError> {
        let token = CancellationToken::new();
        let stop = token.clone();
        let home = self.home;
        let period = request.interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if sink.send(home).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Subscription::new(token))
    }
}
