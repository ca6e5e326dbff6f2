//! # Actions
//!
//! Everything that can happen in pushbox becomes an `Action`.
//! A push message arrives? That's `Action::NotificationReceived`.
//! The user hits `u`? That's `Action::CheckForUpdate`.
//!
//! `update()` applies an action to the state and returns the `Effect` the
//! event loop must carry out. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::core::notification::{Origin, RemoteMessage, ingest};
use crate::core::state::{App, Prompt};
use crate::core::update::{UpdateOutcome, UpdateState};

#[derive(Debug)]
pub enum Action {
    Quit,
    NotificationReceived {
        origin: Origin,
        message: RemoteMessage,
        received_at: DateTime<Local>,
    },
    ToggleRead(String),
    CheckForUpdate,
    UpdateFinished(UpdateOutcome),
    DismissPrompt,
}

/// Side effect requested by `update()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    SpawnUpdateCheck,
    /// A new bundle is installed; leave the event loop and re-exec.
    Restart,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Quit => Effect::Quit,

        Action::NotificationReceived {
            origin,
            message,
            received_at,
        } => {
            let record = ingest(&message, &mut app.ids, &app.placeholder_title, received_at);
            info!("Ingested {} notification {}", origin.label(), record.id);
            if origin == Origin::Foreground {
                app.prompts
                    .push_back(Prompt::alert(record.title.clone(), record.message.clone()));
            }
            app.log = app.log.append(record);
            Effect::None
        }

        Action::ToggleRead(id) => {
            if app.log.position(&id).is_none() {
                debug!("Toggle for unknown notification {}", id);
            }
            app.log = app.log.toggle_read(&id);
            Effect::None
        }

        Action::CheckForUpdate => {
            if app.update_state.is_updating() {
                debug!("Update check already running");
                return Effect::None;
            }
            app.update_state = UpdateState::Checking;
            app.status_message = "Checking for updates…".to_string();
            Effect::SpawnUpdateCheck
        }

        Action::UpdateFinished(outcome) => {
            app.update_state = UpdateState::Idle;
            app.status_message.clear();
            match outcome {
                UpdateOutcome::UpToDate => {
                    app.prompts.push_back(Prompt::up_to_date());
                    Effect::None
                }
                UpdateOutcome::Failed(e) => {
                    warn!("Update check failed: {}", e);
                    app.prompts.push_back(Prompt::update_error());
                    Effect::None
                }
                UpdateOutcome::Restarting => {
                    app.status_message = "Restarting…".to_string();
                    Effect::Restart
                }
            }
        }

        Action::DismissPrompt => {
            app.prompts.pop_front();
            Effect::None
        }
    }
}
