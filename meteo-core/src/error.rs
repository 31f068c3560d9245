use thiserror::Error;

/// Everything that can end a fetch attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Location permission was not granted")]
    PermissionDenied,

    #[error("Location updates requested without a granted permission")]
    PermissionMissing,

    #[error("Invalid latitude or longitude")]
    InvalidInput { latitude: String, longitude: String },

    #[error("No location fix available: {0}")]
    LocationUnavailable(String),

    #[error("Location request was cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Forecast request failed with status {status}: {}", truncate_body(.body))]
    Api { status: u16, body: String },

    #[error("Unreadable forecast response (status {status}): {}", truncate_body(.body))]
    MalformedResponse { status: u16, body: String },

    #[error("A weather fetch is already in progress")]
    AlreadyInFlight,

    #[error("Result arrived after the view was closed")]
    HostGone,
}

impl FetchError {
    /// Ends the session; no retry path.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::PermissionDenied)
    }

    /// Dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, FetchError::HostGone | FetchError::Cancelled)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_truncates_long_bodies() {
        let err = FetchError::Api { status: 503, body: "ž".repeat(500) };
        let msg = err.to_string();

        assert!(msg.starts_with("Forecast request failed with status 503"));
        assert!(msg.ends_with("..."));
        assert!(msg.chars().count() < 300);
    }

    #[test]
    fn classification() {
        assert!(FetchError::PermissionDenied.is_terminal());
        assert!(!FetchError::Transport("reset".into()).is_terminal());
        assert!(FetchError::HostGone.is_silent());
        assert!(FetchError::Cancelled.is_silent());
        assert!(!FetchError::AlreadyInFlight.is_silent());
    }
}
