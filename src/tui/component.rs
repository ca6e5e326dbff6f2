//! Shared traits for TUI components.
//!
//! Stateless pieces (header, dialog) are plain `Component`s built from props
//! each frame. Stateful pieces keep a `…State` struct in `TuiState` and
//! implement `EventHandler` on it, so input handling survives between frames.

use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// Something that draws itself into an area of the frame.
///
/// `render` takes `&mut self` so a component can refresh layout caches or
/// scroll offsets while drawing.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Turns raw `TuiEvent`s into component-level events.
pub trait EventHandler {
    /// What the component reports back to the event loop.
    type Event;

    /// Returns `None` when the event was consumed internally or ignored.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
