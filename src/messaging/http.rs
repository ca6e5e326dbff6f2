//! HTTP push gateway client.
//!
//! Endpoints, all relative to the configured base URL and keyed by client name:
//!
//! - `POST /permission` → `{"status": "authorized" | "provisional" | "denied" | "not_determined"}`
//! - `GET /token` → `{"token": "..."}`
//! - `GET /initial` → `200 {"notification": {...}}`, or `204` when not launched by one
//! - `GET /events` → server-sent events; `event: message` is a foreground
//!   message, `event: opened` an opened-app event, `data:` the message JSON
//!
//! The event listener reconnects with exponential backoff (1s doubling, capped at 30s).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::Sender;

use super::{AuthorizationStatus, MessagingClient, MessagingError, MessagingEvent, Subscription};
use crate::core::notification::RemoteMessage;

const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Deserialize, Debug)]
struct PermissionResponse {
    status: AuthorizationStatus,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: String,
}

/// One parsed server-sent event.
#[derive(Debug, Default, PartialEq, Eq)]
struct SseEvent {
    event: Option<String>,
    data: String,
}

pub struct HttpMessagingClient {
    base_url: String,
    client_name: String,
    client: reqwest::Client,
}

impl HttpMessagingClient {
    pub fn new(base_url: String, client_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_name,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MessagingError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Push gateway error: {} - {}", status, message);
        Err(MessagingError::Api { status, message })
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn request_permission(&self) -> Result<AuthorizationStatus, MessagingError> {
        let response = self
            .client
            .post(self.url("permission"))
            .json(&json!({ "client": self.client_name }))
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;
        let body: PermissionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;
        Ok(body.status)
    }

    async fn token(&self) -> Result<String, MessagingError> {
        let response = self
            .client
            .get(self.url("token"))
            .query(&[("client", &self.client_name)])
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;
        let body: TokenResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;
        Ok(body.token)
    }

    async fn initial_notification(&self) -> Result<Option<RemoteMessage>, MessagingError> {
        let response = self
            .client
            .get(self.url("initial"))
            .query(&[("client", &self.client_name)])
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let message: RemoteMessage = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MessagingError::Parse(e.to_string()))?;
        Ok(Some(message))
    }

    fn subscribe(&self, sink: Sender<MessagingEvent>) -> Subscription {
        let request = self
            .client
            .get(self.url("events"))
            .query(&[("client", &self.client_name)])
            .header(reqwest::header::ACCEPT, "text/event-stream");

        let task = tokio::spawn(async move {
            let mut backoff = Backoff::default();
            loop {
                let Some(attempt) = request.try_clone() else {
                    warn!("Event request cannot be cloned; listener stopping");
                    return;
                };
                match connect(attempt).await {
                    Ok(response) => {
                        backoff.reset();
                        match listen(response, &sink).await {
                            Ok(ListenEnd::SinkClosed) => {
                                info!("Event sink closed; listener stopping");
                                return;
                            }
                            Ok(ListenEnd::StreamEnded) => info!("Event stream ended"),
                            Err(e) => warn!("Event stream error: {}", e),
                        }
                    }
                    Err(e) => warn!("Event stream connect failed: {}", e),
                }
                let delay = backoff.next_delay();
                debug!("Reconnecting to event stream in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        });

        Subscription::new(task.abort_handle())
    }
}

/// Reconnect delay: 1s doubling up to `MAX_BACKOFF_SECS`, back to 1s after
/// every successful connect.
#[derive(Debug)]
struct Backoff {
    secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { secs: 1 }
    }
}

impl Backoff {
    fn reset(&mut self) {
        self.secs = 1;
    }

    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.secs);
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
        delay
    }
}

enum ListenEnd {
    StreamEnded,
    SinkClosed,
}

async fn connect(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, MessagingError> {
    let response = request
        .send()
        .await
        .map_err(|e| MessagingError::Network(e.to_string()))?;
    let response = HttpMessagingClient::check_status(response).await?;
    info!("Event stream connected");
    Ok(response)
}

/// Reads one connection's worth of events into `sink`.
async fn listen(
    response: reqwest::Response,
    sink: &Sender<MessagingEvent>,
) -> Result<ListenEnd, MessagingError> {
    let mut buffer = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MessagingError::Network(e.to_string()))?;
        buffer.extend_from_slice(&chunk);

        for sse in drain_events(&mut buffer) {
            let Some(event) = to_messaging_event(sse) else {
                continue;
            };
            if sink.send(event).await.is_err() {
                return Ok(ListenEnd::SinkClosed);
            }
        }
    }
    Ok(ListenEnd::StreamEnded)
}

/// Removes every complete event (terminated by a blank line) from `buffer`.
///
/// Lines are decoded only once their terminating newline has arrived, so a
/// multi-byte character split across network chunks stays intact.
fn drain_events(buffer: &mut Vec<u8>) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut current = SseEvent::default();
    let mut has_fields = false;

    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw[..pos]);
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            if has_fields {
                events.push(std::mem::take(&mut current));
                has_fields = false;
            }
            continue;
        }
        if line.starts_with(':') {
            continue; // comment / keep-alive
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => current.event = Some(value.to_string()),
            "data" => {
                if !current.data.is_empty() {
                    current.data.push('\n');
                }
                current.data.push_str(value);
            }
            _ => {}
        }
        has_fields = true;
    }

    // Put back a partially received event so the next chunk can finish it.
    if has_fields {
        let mut pending = String::new();
        if let Some(event) = &current.event {
            pending.push_str(&format!("event: {event}\n"));
        }
        for line in current.data.lines() {
            pending.push_str(&format!("data: {line}\n"));
        }
        let mut rest = std::mem::replace(buffer, pending.into_bytes());
        buffer.append(&mut rest);
    }

    events
}

fn to_messaging_event(sse: SseEvent) -> Option<MessagingEvent> {
    let kind = sse.event.as_deref().unwrap_or("message");
    if kind != "message" && kind != "opened" {
        debug!("Ignoring event type {:?}", kind);
        return None;
    }
    let message: RemoteMessage = match serde_json::from_str(&sse.data) {
        Ok(message) => message,
        Err(e) => {
            warn!("Skipping malformed {} event: {}", kind, e);
            return None;
        }
    };
    Some(match kind {
        "opened" => MessagingEvent::OpenedApp(message),
        _ => MessagingEvent::Foreground(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_events_parses_complete_events() {
        let mut buffer = [
            "event: message\ndata: {\"notification\":{\"title\":\"Sale\"}}\n\n",
            "event: opened\ndata: {}\n\n",
        ]
        .concat()
        .into_bytes();
        let events = drain_events(&mut buffer);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.as_deref(), Some("message"));
        assert_eq!(events[0].data, "{\"notification\":{\"title\":\"Sale\"}}");
        assert_eq!(events[1].event.as_deref(), Some("opened"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_events_keeps_partial_event() {
        let mut buffer = b"event: message\ndata: {\"notif".to_vec();
        assert!(drain_events(&mut buffer).is_empty());

        buffer.extend_from_slice(b"ication\":{}}\n\n");
        let events = drain_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("message"));
        assert_eq!(events[0].data, "{\"notification\":{}}");
    }

    #[test]
    fn test_drain_events_skips_comments_and_crlf() {
        let mut buffer = b": keep-alive\r\n\r\ndata: {}\r\n\r\n".to_vec();
        let events = drain_events(&mut buffer);
        assert_eq!(events, vec![SseEvent { event: None, data: "{}".into() }]);
    }

    #[test]
    fn test_drain_events_keeps_character_split_across_chunks() {
        let payload = "event: message\ndata: {\"notification\":{\"title\":\"Café\"}}\n\n";
        let bytes = payload.as_bytes();
        // Split between the two bytes of 'é'.
        let split = payload.find('é').unwrap() + 1;

        let mut buffer = bytes[..split].to_vec();
        assert!(drain_events(&mut buffer).is_empty());
        buffer.extend_from_slice(&bytes[split..]);
        let events = drain_events(&mut buffer);

        assert_eq!(events.len(), 1);
        let event = to_messaging_event(events.into_iter().next().unwrap());
        assert_eq!(
            event,
            Some(MessagingEvent::Foreground(RemoteMessage::new(Some("Café"), None)))
        );
    }

    #[test]
    fn test_to_messaging_event_kinds() {
        let foreground = to_messaging_event(SseEvent {
            event: None,
            data: r#"{"notification":{"title":"A","body":"B"}}"#.into(),
        });
        assert_eq!(
            foreground,
            Some(MessagingEvent::Foreground(RemoteMessage::new(Some("A"), Some("B"))))
        );

        let opened = to_messaging_event(SseEvent {
            event: Some("opened".into()),
            data: "{}".into(),
        });
        assert_eq!(opened, Some(MessagingEvent::OpenedApp(RemoteMessage::default())));
    }

    #[test]
    fn test_to_messaging_event_ignores_unknown_and_malformed() {
        assert!(to_messaging_event(SseEvent {
            event: Some("ping".into()),
            data: "{}".into(),
        })
        .is_none());
        assert!(to_messaging_event(SseEvent {
            event: Some("message".into()),
            data: "not json".into(),
        })
        .is_none());
    }

    #[test]
    fn test_backoff_grows_then_resets_on_connect() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);

        // A long-lived connection that later fails starts over at 1s.
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpMessagingClient::new("http://gw/".into(), "me".into());
        assert_eq!(client.url("token"), "http://gw/token");
    }
}
