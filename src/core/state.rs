//! # Application State
//!
//! Core business state for pushbox. No TUI types in here; presentation
//! state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── updater: Arc<dyn UpdateClient>   // over-the-air update source
//! ├── log: NotificationLog             // newest-first, replaced on every change
//! ├── update_state: UpdateState        // Idle / Checking
//! ├── prompts: VecDeque<Prompt>        // blocking dialogs, oldest first
//! ├── status_message: String           // footer text
//! ├── placeholder_title: String        // title for untitled notifications
//! └── ids: IdGenerator                 // record id source
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::config::ResolvedConfig;
use crate::core::notification::{DEFAULT_TITLE, IdGenerator};
use crate::core::notification_log::NotificationLog;
use crate::core::update::UpdateState;
use crate::updates::UpdateClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    UpToDate,
    UpdateError,
    /// A notification that arrived while the app was in the foreground.
    Alert,
}

/// A dialog the user has to acknowledge before doing anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub title: String,
    pub body: String,
}

impl Prompt {
    pub fn up_to_date() -> Self {
        Self {
            kind: PromptKind::UpToDate,
            title: "Up to date".to_string(),
            body: "You are using the latest version.".to_string(),
        }
    }

    pub fn update_error() -> Self {
        Self {
            kind: PromptKind::UpdateError,
            title: "Update Error".to_string(),
            body: "Could not fetch updates.".to_string(),
        }
    }

    pub fn alert(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Alert,
            title: title.into(),
            body: body.into(),
        }
    }
}

pub struct App {
    pub updater: Arc<dyn UpdateClient>,
    pub log: NotificationLog,
    pub update_state: UpdateState,
    pub prompts: VecDeque<Prompt>,
    pub status_message: String,
    pub placeholder_title: String,
    pub(crate) ids: IdGenerator,
}

impl App {
    pub fn new(updater: Arc<dyn UpdateClient>) -> Self {
        Self {
            updater,
            log: NotificationLog::new(),
            update_state: UpdateState::Idle,
            prompts: VecDeque::new(),
            status_message: String::new(),
            placeholder_title: DEFAULT_TITLE.to_string(),
            ids: IdGenerator::new(),
        }
    }

    pub fn from_config(updater: Arc<dyn UpdateClient>, config: &ResolvedConfig) -> Self {
        Self {
            placeholder_title: config.placeholder_title.clone(),
            ..Self::new(updater)
        }
    }

    pub fn is_updating(&self) -> bool {
        self.update_state.is_updating()
    }

    /// The dialog currently on screen, if any.
    pub fn active_prompt(&self) -> Option<&Prompt> {
        self.prompts.front()
    }
}
