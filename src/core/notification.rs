//! # Notification Records
//!
//! A push message becomes a `NotificationRecord` at the ingestion boundary.
//! Every field a sender may leave out is defaulted here, so nothing past this
//! module ever deals with missing data.
//!
//! ```text
//! RemoteMessage { notification: Option<{ title?, body? }> }
//!        │
//!        ▼  ingest()
//! NotificationRecord { id, title, message, date, read: false }
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Title shown when a message arrives without one.
pub const DEFAULT_TITLE: &str = "New Notification";

/// The user-visible part of a push message. Both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A message as delivered by the push gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub notification: Option<NotificationPayload>,
}

impl RemoteMessage {
    pub fn new(title: Option<&str>, body: Option<&str>) -> Self {
        Self {
            notification: Some(NotificationPayload {
                title: title.map(str::to_string),
                body: body.map(str::to_string),
            }),
        }
    }

    /// Title and body with defaults applied. Total over every payload shape,
    /// including a missing `notification` object and empty strings.
    pub fn display_fields(&self, placeholder_title: &str) -> (String, String) {
        let payload = self.notification.as_ref();
        let title = payload
            .and_then(|n| n.title.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(placeholder_title)
            .to_string();
        let message = payload
            .and_then(|n| n.body.clone())
            .unwrap_or_default();
        (title, message)
    }
}

/// How a message reached the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The process was launched by tapping this notification.
    Initial,
    /// A notification was tapped while the app was in the background.
    OpenedApp,
    /// Delivered while the app is active; also raises an alert.
    Foreground,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::Initial => "initial",
            Origin::OpenedApp => "opened-app",
            Origin::Foreground => "foreground",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Creation date, fixed at ingestion.
    pub date: String,
    pub read: bool,
}

impl NotificationRecord {
    /// A copy of this record with `read` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            read: !self.read,
            ..self.clone()
        }
    }
}

/// Formats a date the way the card footer shows it, e.g. `Fri Oct 16 2026`.
pub fn format_date(at: DateTime<Local>) -> String {
    at.format("%a %b %d %Y").to_string()
}

/// Hands out record ids.
///
/// Ids are millisecond timestamps, bumped past the last issued value so two
/// records ingested within the same millisecond never collide.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_at(&mut self, at: DateTime<Local>) -> String {
        let millis = at.timestamp_millis().max(self.last + 1);
        self.last = millis;
        millis.to_string()
    }
}

/// Converts a remote message into a fresh, unread record.
pub fn ingest(
    message: &RemoteMessage,
    ids: &mut IdGenerator,
    placeholder_title: &str,
    at: DateTime<Local>,
) -> NotificationRecord {
    let (title, message) = message.display_fields(placeholder_title);
    NotificationRecord {
        id: ids.next_at(at),
        title,
        message,
        date: format_date(at),
        read: false,
    }
}
