use async_trait::async_trait;
use std::fmt::Debug;

use crate::PermissionState;

/// Platform access to the fine-location permission.
#[async_trait]
pub trait PermissionGate: Send + Sync + Debug {
    /// Current state without prompting.
    fn check(&self) -> PermissionState;

    /// Show the one-time system prompt and report the user's choice.
    async fn request(&self) -> PermissionState;
}

/// Resolves to `Granted` or `Denied`; prompts at most once.
pub async fn ensure_location_permission(gate: &dyn PermissionGate) -> PermissionState {
    if gate.check().is_granted() {
        return PermissionState::Granted;
    }

    match gate.request().await {
        PermissionState::Granted => {
            tracing::info!("location permission granted");
            PermissionState::Granted
        }
        other => {
            tracing::info!(state = ?other, "location permission denied");
            PermissionState::Denied
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeGate;
    use super::*;

    #[tokio::test]
    async fn already_granted_skips_prompt() {
        let gate = FakeGate::new(PermissionState::Granted, PermissionState::Denied);

        assert_eq!(ensure_location_permission(&gate).await, PermissionState::Granted);
        assert_eq!(gate.prompts(), 0);
    }

    #[tokio::test]
    async fn prompts_once_and_returns_choice() {
        let gate = FakeGate::new(PermissionState::Unknown, PermissionState::Granted);
        assert_eq!(ensure_location_permission(&gate).await, PermissionState::Granted);
        assert_eq!(gate.prompts(), 1);

        let gate = FakeGate::new(PermissionState::Denied, PermissionState::Denied);
        assert_eq!(ensure_location_permission(&gate).await, PermissionState::Denied);
        assert_eq!(gate.prompts(), 1);
    }

    #[tokio::test]
    async fn dismissed_prompt_counts_as_denied() {
        let gate = FakeGate::new(PermissionState::Unknown, PermissionState::Unknown);
        assert_eq!(ensure_location_permission(&gate).await, PermissionState::Denied);
    }
}
