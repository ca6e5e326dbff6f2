//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard and mouse events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background work
//!
//! Messaging and update checks run as tokio tasks. They never touch `App`;
//! they send `Action`s over a std channel that the loop drains between
//! frames, so every state change goes through `core::action::update`.
//!
//! ## Redraw Strategy
//!
//! - **Checking for updates**: draws every ~80ms to animate the spinner.
//! - **Idle**: wakes every 250ms to drain the action channel, and only
//!   redraws when an event or action arrived.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::notification::Origin;
use crate::core::state::App;
use crate::core::update::check_and_apply_guarded;
use crate::messaging::{self, MessagingClient, MessagingEvent, Subscription};
use crate::tui::component::EventHandler;
use crate::tui::components::NotificationListState;
use crate::tui::components::dialog::is_acknowledgement;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Buffer between the messaging listener and the forwarding task.
const MESSAGING_CHANNEL_CAPACITY: usize = 64;

/// How the event loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Quit,
    /// A new binary is installed and the process should re-exec.
    Restart,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub list: NotificationListState,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            list: NotificationListState::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, Hide)?;
        info!("Terminal modes enabled (mouse capture, hidden cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, Show);
    }
}

pub fn run(mut app: App, messaging: Arc<dyn MessagingClient>) -> std::io::Result<RunOutcome> {
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    // Held for the whole loop: dropping it closes the live event stream.
    let _subscription = start_messaging(messaging, tx.clone());

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame
    let mut outcome = RunOutcome::Quit;

    'event_loop: loop {
        let animating = app.is_updating();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(250)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let Some(action) = route_event(&event, &app, &mut tui) else {
                continue;
            };
            if apply(&mut app, action, &tx) == Effect::Quit {
                break 'event_loop;
            }
        }

        // Handle background task actions (notifications, update results)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            match apply(&mut app, action, &tx) {
                Effect::Quit => break 'event_loop,
                Effect::Restart => {
                    outcome = RunOutcome::Restart;
                    break 'event_loop;
                }
                _ => {}
            }
        }
    }

    ratatui::restore();
    Ok(outcome)
}

/// Runs `update` and starts any background work it asks for. Quit and
/// Restart are returned for the loop to act on.
fn apply(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) -> Effect {
    let effect = update(app, action);
    if effect == Effect::SpawnUpdateCheck {
        spawn_update_check(app, tx.clone());
    }
    effect
}

/// Maps an input event to a core action, handling list-local events
/// (selection, scrolling) in place.
fn route_event(event: &TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    if matches!(event, TuiEvent::ForceQuit) {
        return Some(Action::Quit);
    }

    // An open dialog swallows everything except its acknowledgement.
    if app.active_prompt().is_some() {
        return is_acknowledgement(event).then_some(Action::DismissPrompt);
    }

    match event {
        TuiEvent::InputChar('q') => Some(Action::Quit),
        // The control is not on screen while a check runs.
        TuiEvent::CheckForUpdate if !app.is_updating() => Some(Action::CheckForUpdate),
        TuiEvent::CursorUp => {
            tui.list.move_selection(&app.log, -1);
            None
        }
        TuiEvent::CursorDown => {
            tui.list.move_selection(&app.log, 1);
            None
        }
        TuiEvent::Submit | TuiEvent::InputChar(' ') => {
            tui.list.selected_id.clone().map(Action::ToggleRead)
        }
        TuiEvent::MouseClick(column, row) => {
            let index = tui.list.hit_test(*column, *row)?;
            tui.list.select_index(&app.log, index);
            app.log
                .get(index)
                .map(|record| Action::ToggleRead(record.id.clone()))
        }
        TuiEvent::Escape => {
            tui.list.clear_selection();
            None
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.list.handle_event(event);
            None
        }
        _ => None,
    }
}

/// Starts registration and the live subscription. Every message that
/// arrives is forwarded as `Action::NotificationReceived`.
fn start_messaging(
    client: Arc<dyn MessagingClient>,
    tx: mpsc::Sender<Action>,
) -> Subscription {
    info!("Starting messaging via {}", client.name());
    let (event_tx, mut event_rx) =
        tokio::sync::mpsc::channel::<MessagingEvent>(MESSAGING_CHANNEL_CAPACITY);
    let subscription = client.subscribe(event_tx);

    let tx_initial = tx.clone();
    tokio::spawn(async move {
        if let Some(message) = messaging::register(client.as_ref()).await {
            let action = Action::NotificationReceived {
                origin: Origin::Initial,
                message,
                received_at: Local::now(),
            };
            if tx_initial.send(action).is_err() {
                warn!("Failed to send initial notification: receiver dropped");
            }
        }
    });

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let (origin, message) = event.into_parts();
            debug!("Forwarding {} notification", origin.label());
            let action = Action::NotificationReceived {
                origin,
                message,
                received_at: Local::now(),
            };
            if tx.send(action).is_err() {
                warn!("Failed to forward notification: receiver dropped");
                return;
            }
        }
        debug!("Messaging event stream closed");
    });

    subscription
}

fn spawn_update_check(app: &App, tx: mpsc::Sender<Action>) {
    info!("Spawning update check via {}", app.updater.name());
    let updater = app.updater.clone();
    tokio::spawn(async move {
        let outcome = check_and_apply_guarded(updater).await;
        if tx.send(Action::UpdateFinished(outcome)).is_err() {
            warn!("Failed to send update outcome: receiver dropped");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notification::RemoteMessage;
    use crate::core::state::{Prompt, PromptKind};
    use crate::core::update::{UpdateOutcome, UpdateState};
    use crate::test_support::{ScriptedMessaging, ScriptedUpdates, UpdateScript, test_app};

    fn receive(app: &mut App, origin: Origin, title: &str) {
        update(
            app,
            Action::NotificationReceived {
                origin,
                message: RemoteMessage::new(Some(title), None),
                received_at: Local::now(),
            },
        );
    }

    #[test]
    fn test_open_dialog_only_accepts_acknowledgement() {
        let mut app = test_app();
        let mut tui = TuiState::new();
        receive(&mut app, Origin::Foreground, "Sale");

        assert!(route_event(&TuiEvent::CheckForUpdate, &app, &mut tui).is_none());
        assert!(route_event(&TuiEvent::CursorDown, &app, &mut tui).is_none());
        assert!(tui.list.selected_id.is_none());
        assert!(matches!(
            route_event(&TuiEvent::Submit, &app, &mut tui),
            Some(Action::DismissPrompt)
        ));
        assert!(matches!(
            route_event(&TuiEvent::ForceQuit, &app, &mut tui),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn test_update_key_ignored_while_checking() {
        let mut app = test_app();
        let mut tui = TuiState::new();
        assert!(matches!(
            route_event(&TuiEvent::CheckForUpdate, &app, &mut tui),
            Some(Action::CheckForUpdate)
        ));
        app.update_state = UpdateState::Checking;
        assert!(route_event(&TuiEvent::CheckForUpdate, &app, &mut tui).is_none());
    }

    #[test]
    fn test_enter_toggles_selected_card() {
        let mut app = test_app();
        let mut tui = TuiState::new();
        receive(&mut app, Origin::OpenedApp, "a");
        receive(&mut app, Origin::OpenedApp, "b");

        assert!(route_event(&TuiEvent::Submit, &app, &mut tui).is_none());

        route_event(&TuiEvent::CursorDown, &app, &mut tui);
        route_event(&TuiEvent::CursorDown, &app, &mut tui);
        let expected = app.log.get(1).unwrap().id.clone();
        match route_event(&TuiEvent::Submit, &app, &mut tui) {
            Some(Action::ToggleRead(id)) => assert_eq!(id, expected),
            other => panic!("expected ToggleRead, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_clears_selection() {
        let mut app = test_app();
        let mut tui = TuiState::new();
        receive(&mut app, Origin::OpenedApp, "a");
        route_event(&TuiEvent::CursorDown, &app, &mut tui);
        assert!(tui.list.selected_id.is_some());
        route_event(&TuiEvent::Escape, &app, &mut tui);
        assert!(tui.list.selected_id.is_none());
    }

    #[tokio::test]
    async fn test_apply_spawns_update_check_and_reports_back() {
        let mut app = App::new(Arc::new(ScriptedUpdates::new(UpdateScript::UpToDate)));
        let (tx, rx) = mpsc::channel();

        assert_eq!(apply(&mut app, Action::CheckForUpdate, &tx), Effect::SpawnUpdateCheck);
        assert!(app.is_updating());

        let action = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            action,
            Action::UpdateFinished(UpdateOutcome::UpToDate)
        ));
        apply(&mut app, action, &tx);
        assert!(!app.is_updating());
        assert_eq!(app.active_prompt().map(|p| p.kind), Some(PromptKind::UpToDate));
    }

    #[tokio::test]
    async fn test_panicking_update_check_still_reports_failure() {
        let mut app = App::new(Arc::new(ScriptedUpdates::new(UpdateScript::Panics)));
        let (tx, rx) = mpsc::channel();

        apply(&mut app, Action::CheckForUpdate, &tx);
        let action = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        apply(&mut app, action, &tx);
        assert_eq!(app.update_state, UpdateState::Idle);
        assert_eq!(app.active_prompt(), Some(&Prompt::update_error()));
    }

    #[tokio::test]
    async fn test_initial_notification_is_forwarded() {
        let client = Arc::new(ScriptedMessaging::with_initial(RemoteMessage::new(
            Some("Launch"),
            Some("opened from a notification"),
        )));
        let (tx, rx) = mpsc::channel();
        let _subscription = start_messaging(client, tx);

        let action = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();

        let mut app = test_app();
        match &action {
            Action::NotificationReceived { origin, .. } => assert_eq!(*origin, Origin::Initial),
            other => panic!("expected NotificationReceived, got {:?}", other),
        }
        update(&mut app, action);
        assert_eq!(app.log.get(0).unwrap().title, "Launch");
        assert!(app.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_live_events_are_forwarded_in_order() {
        let client = Arc::new(ScriptedMessaging::with_events(vec![
            MessagingEvent::OpenedApp(RemoteMessage::new(Some("Order shipped"), None)),
            MessagingEvent::Foreground(RemoteMessage::new(Some("Sale"), Some("50% off"))),
        ]));
        let (tx, rx) = mpsc::channel();
        let _subscription = start_messaging(client, tx);

        let actions = tokio::task::spawn_blocking(move || {
            (0..2)
                .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();

        let mut app = test_app();
        let origins: Vec<Origin> = actions
            .iter()
            .map(|action| match action {
                Action::NotificationReceived { origin, .. } => *origin,
                other => panic!("expected NotificationReceived, got {:?}", other),
            })
            .collect();
        assert_eq!(origins, vec![Origin::OpenedApp, Origin::Foreground]);

        for action in actions {
            update(&mut app, action);
        }
        assert_eq!(app.log.get(0).unwrap().title, "Sale");
        assert_eq!(app.log.get(1).unwrap().title, "Order shipped");
        assert_eq!(app.active_prompt(), Some(&Prompt::alert("Sale", "50% off")));
    }
}
