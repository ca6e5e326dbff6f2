//! # Update Trigger
//!
//! Two states, `Idle` and `Checking`. The reducer owns the transition into
//! `Checking`; the flow below runs on a background task and always reports
//! exactly one [`UpdateOutcome`], which the reducer turns back into `Idle`.
//!
//! ```text
//!          CheckForUpdate
//!   Idle ─────────────────▶ Checking
//!    ▲                         │ check_and_apply()
//!    │   UpToDate / Failed     │
//!    └─────────────────────────┤
//!                              │ Restarting
//!                              ▼
//!                       process restarts
//! ```

use std::sync::Arc;

use log::{error, info};

use crate::updates::{UpdateClient, UpdateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateState {
    #[default]
    Idle,
    Checking,
}

impl UpdateState {
    /// The `updating` flag the UI keys off.
    pub fn is_updating(self) -> bool {
        matches!(self, UpdateState::Checking)
    }
}

#[derive(Debug)]
pub enum UpdateOutcome {
    /// The running version is current.
    UpToDate,
    /// A new bundle is in place; the process must restart.
    Restarting,
    Failed(UpdateError),
}

/// Runs check → fetch → reload against the update collaborator.
pub async fn check_and_apply(client: &dyn UpdateClient) -> UpdateOutcome {
    match apply_if_available(client).await {
        Ok(true) => UpdateOutcome::Restarting,
        Ok(false) => UpdateOutcome::UpToDate,
        Err(e) => {
            error!("Update via {} failed: {}", client.name(), e);
            UpdateOutcome::Failed(e)
        }
    }
}

async fn apply_if_available(client: &dyn UpdateClient) -> Result<bool, UpdateError> {
    let check = client.check_for_update().await?;
    if !check.is_available {
        info!("No update available");
        return Ok(false);
    }
    info!("Update available: {:?}", check.version);
    client.fetch_update().await?;
    client.reload().await?;
    Ok(true)
}

/// [`check_and_apply`] on its own task. A panic inside the flow still yields
/// an outcome, so the caller can always leave `Checking`.
pub async fn check_and_apply_guarded(client: Arc<dyn UpdateClient>) -> UpdateOutcome {
    let flow = tokio::spawn(async move { check_and_apply(client.as_ref()).await });
    match flow.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Update task ended abnormally: {}", e);
            UpdateOutcome::Failed(UpdateError::Interrupted(e.to_string()))
        }
    }
}
