use async_trait::async_trait;
use inquire::Confirm;
use meteo_core::{PermissionGate, PermissionState};

/// Asks on the terminal, once per process, unless `--grant` was passed.
#[derive(Debug)]
pub struct PromptPermissionGate {
    pre_granted: bool,
    answer: std::sync::OnceLock<PermissionState>,
}

impl PromptPermissionGate {
    pub fn new(pre_granted: bool) -> Self {
        Self { pre_granted, answer: std::sync::OnceLock::new() }
    }
}

#[async_trait]
impl PermissionGate for PromptPermissionGate {
    fn check(&self) -> PermissionState {
        if self.pre_granted {
            return PermissionState::Granted;
        }
        self.answer.get().copied().unwrap_or_default()
    }

    async fn request(&self) -> PermissionState {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow meteo to use your location?")
                .with_default(false)
                .with_help_message("Needed to look up the weather where you are")
                .prompt()
        })
        .await;

        let state = match answer {
            Ok(Ok(true)) => PermissionState::Granted,
            Ok(Ok(false)) => PermissionState::Denied,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "permission prompt unavailable");
                PermissionState::Denied
            }
            Err(e) => {
                tracing::warn!(error = %e, "permission prompt task failed");
                PermissionState::Denied
            }
        };

        *self.answer.get_or_init(|| state)
    }
}
