//! # Messaging Collaborator
//!
//! The push-notification service. The core consumes three event shapes from
//! it and treats them identically (one log append each):
//!
//! - the initial notification, fetched once at startup,
//! - opened-app events, from the live subscription,
//! - foreground messages, from the live subscription (these also raise an alert).
//!
//! Startup also asks for delivery permission and fetches the routing token.
//! Neither result changes behavior; both are only logged.

pub mod http;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc::Sender;
use tokio::task::AbortHandle;

use crate::core::config::ResolvedConfig;
use crate::core::notification::{Origin, RemoteMessage};

pub use http::HttpMessagingClient;

#[derive(Debug)]
pub enum MessagingError {
    /// Gateway missing or misconfigured.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Gateway returned an error response.
    Api { status: u16, message: String },
    /// Gateway response could not be parsed.
    Parse(String),
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagingError::Config(msg) => write!(f, "config error: {msg}"),
            MessagingError::Network(msg) => write!(f, "network error: {msg}"),
            MessagingError::Api { status, message } => {
                write!(f, "gateway error (HTTP {status}): {message}")
            }
            MessagingError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for MessagingError {}

/// Result of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Authorized,
    Provisional,
    Denied,
    NotDetermined,
}

impl AuthorizationStatus {
    /// Notifications will be delivered.
    pub fn is_enabled(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional
        )
    }
}

/// An event from the live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingEvent {
    OpenedApp(RemoteMessage),
    Foreground(RemoteMessage),
}

impl MessagingEvent {
    pub fn into_parts(self) -> (Origin, RemoteMessage) {
        match self {
            MessagingEvent::OpenedApp(msg) => (Origin::OpenedApp, msg),
            MessagingEvent::Foreground(msg) => (Origin::Foreground, msg),
        }
    }
}

/// Handle to a live subscription. Dropping it tears the listener down.
pub struct Subscription {
    handle: Option<AbortHandle>,
}

impl Subscription {
    pub fn new(handle: AbortHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// A subscription that was never connected.
    pub fn inactive() -> Self {
        Self { handle: None }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("Tearing down messaging subscription");
            handle.abort();
        }
    }
}

#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Returns the name of the messaging backend (for logs).
    fn name(&self) -> &str;

    async fn request_permission(&self) -> Result<AuthorizationStatus, MessagingError>;

    /// The routing token the gateway uses to address this client.
    async fn token(&self) -> Result<String, MessagingError>;

    /// The notification that launched the process, if any.
    async fn initial_notification(&self) -> Result<Option<RemoteMessage>, MessagingError>;

    /// Starts delivering opened-app and foreground events to `sink` until the
    /// returned handle is dropped.
    fn subscribe(&self, sink: Sender<MessagingEvent>) -> Subscription;
}

/// Stand-in used when no push gateway is configured. Nothing ever arrives.
pub struct DisabledMessaging;

#[async_trait]
impl MessagingClient for DisabledMessaging {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn request_permission(&self) -> Result<AuthorizationStatus, MessagingError> {
        Ok(AuthorizationStatus::Denied)
    }

    async fn token(&self) -> Result<String, MessagingError> {
        Err(MessagingError::Config(
            "no push gateway configured".to_string(),
        ))
    }

    async fn initial_notification(&self) -> Result<Option<RemoteMessage>, MessagingError> {
        Ok(None)
    }

    fn subscribe(&self, _sink: Sender<MessagingEvent>) -> Subscription {
        Subscription::inactive()
    }
}

/// Builds the messaging backend for `config`. Without a gateway URL the
/// app still runs, it just never receives anything.
pub fn from_config(config: &ResolvedConfig) -> Arc<dyn MessagingClient> {
    match &config.push_base_url {
        Some(url) => {
            info!("Push gateway: {} (client {})", url, config.client_name);
            Arc::new(HttpMessagingClient::new(
                url.clone(),
                config.client_name.clone(),
            ))
        }
        None => {
            info!("No push gateway configured; messaging disabled");
            Arc::new(DisabledMessaging)
        }
    }
}

/// Startup registration: permission, routing token, initial notification.
///
/// Failures are logged and otherwise ignored. Returns the initial
/// notification when the process was launched by one.
pub async fn register(client: &dyn MessagingClient) -> Option<RemoteMessage> {
    match client.request_permission().await {
        Ok(status) if status.is_enabled() => {
            info!("Notification permission granted: {:?}", status);
        }
        Ok(status) => info!("Notification permission not granted: {:?}", status),
        Err(e) => warn!("Permission request via {} failed: {}", client.name(), e),
    }

    // The token is not registered anywhere from here; it is only logged.
    match client.token().await {
        Ok(token) => info!("Push token: {}", token),
        Err(e) => error!("Token error: {}", e),
    }

    match client.initial_notification().await {
        Ok(initial) => initial,
        Err(e) => {
            warn!("Initial notification lookup failed: {}", e);
            None
        }
    }
}
