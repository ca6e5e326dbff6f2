//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::notification::RemoteMessage;
use crate::messaging::{
    AuthorizationStatus, MessagingClient, MessagingError, MessagingEvent, Subscription,
};
use crate::updates::{UpdateCheck, UpdateClient, UpdateError};

/// What a [`ScriptedUpdates`] should do when driven through the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScript {
    UpToDate,
    Available,
    CheckFails,
    FetchFails,
    Panics,
}

/// An update source that follows a fixed script and counts calls.
pub struct ScriptedUpdates {
    script: UpdateScript,
    checks: AtomicUsize,
    fetches: AtomicUsize,
    reloads: AtomicUsize,
}

impl ScriptedUpdates {
    pub fn new(script: UpdateScript) -> Self {
        Self {
            script,
            checks: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
        }
    }

    /// `(checks, fetches, reloads)` seen so far.
    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.checks.load(Ordering::SeqCst),
            self.fetches.load(Ordering::SeqCst),
            self.reloads.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl UpdateClient for ScriptedUpdates {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn check_for_update(&self) -> Result<UpdateCheck, UpdateError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match self.script {
            UpdateScript::UpToDate => Ok(UpdateCheck {
                is_available: false,
                version: Some("0.1.0".into()),
            }),
            UpdateScript::Available | UpdateScript::FetchFails => Ok(UpdateCheck {
                is_available: true,
                version: Some("9.9.9".into()),
            }),
            UpdateScript::CheckFails => Err(UpdateError::Network("connection refused".into())),
            UpdateScript::Panics => panic!("scripted update panic"),
        }
    }

    async fn fetch_update(&self) -> Result<(), UpdateError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.script {
            UpdateScript::FetchFails => Err(UpdateError::Api {
                status: 500,
                message: "bundle unavailable".into(),
            }),
            _ => Ok(()),
        }
    }

    async fn reload(&self) -> Result<(), UpdateError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A messaging backend with a canned initial notification and an optional
/// list of live events delivered once on subscribe.
#[derive(Default)]
pub struct ScriptedMessaging {
    initial: Option<RemoteMessage>,
    events: Mutex<Vec<MessagingEvent>>,
}

impl ScriptedMessaging {
    pub fn with_initial(message: RemoteMessage) -> Self {
        Self {
            initial: Some(message),
            ..Self::default()
        }
    }

    pub fn with_events(events: Vec<MessagingEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }
}

#[async_trait]
impl MessagingClient for ScriptedMessaging {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request_permission(&self) -> Result<AuthorizationStatus, MessagingError> {
        Ok(AuthorizationStatus::Authorized)
    }

    async fn token(&self) -> Result<String, MessagingError> {
        Ok("test-token".into())
    }

    async fn initial_notification(&self) -> Result<Option<RemoteMessage>, MessagingError> {
        Ok(self.initial.clone())
    }

    fn subscribe(&self, sink: Sender<MessagingEvent>) -> Subscription {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        if events.is_empty() {
            return Subscription::inactive();
        }
        let task = tokio::spawn(async move {
            for event in events {
                if sink.send(event).await.is_err() {
                    return;
                }
            }
        });
        Subscription::new(task.abort_handle())
    }
}

/// Creates a test App whose update source always reports "up to date".
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(ScriptedUpdates::new(UpdateScript::UpToDate)))
}
