use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use super::notification_card::NotificationCard;
use crate::core::notification_log::{Cards, EMPTY_STATE_TEXT, NotificationLog, Surface};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Scroll position, selection and card geometry for the notification list.
///
/// Selection is held by record id so a prepended notification does not shift
/// the highlight onto a different card.
pub struct NotificationListState {
    pub scroll_state: ScrollViewState,
    pub layout: CardLayout,
    pub selected_id: Option<String>,
    pub viewport_height: u16,
    /// Screen area of the last render, for hit testing clicks.
    area: Rect,
}

impl Default for NotificationListState {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: CardLayout::default(),
            selected_id: None,
            viewport_height: 0,
            area: Rect::default(),
        }
    }

    pub fn selected_index(&self, log: &NotificationLog) -> Option<usize> {
        self.selected_id.as_deref().and_then(|id| log.position(id))
    }

    pub fn select_index(&mut self, log: &NotificationLog, index: usize) {
        self.selected_id = log.get(index).map(|r| r.id.clone());
        self.scroll_to_selected(log);
    }

    /// Moves the selection by `delta` rows, starting from the top when
    /// nothing is selected yet.
    pub fn move_selection(&mut self, log: &NotificationLog, delta: isize) {
        if log.is_empty() {
            self.selected_id = None;
            return;
        }
        let last = log.len() - 1;
        let next = match self.selected_index(log) {
            Some(current) => current.saturating_add_signed(delta).min(last),
            None => 0,
        };
        self.select_index(log, next);
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Scroll so the selected card is fully visible.
    pub fn scroll_to_selected(&mut self, log: &NotificationLog) {
        let Some((top, bottom)) = self
            .selected_index(log)
            .and_then(|idx| self.layout.span(idx))
        else {
            return;
        };
        let offset_y = self.scroll_state.offset().y;
        if top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: top });
        } else if bottom > offset_y + self.viewport_height {
            let y = bottom.saturating_sub(self.viewport_height).min(top);
            self.scroll_state.set_offset(Position { x: 0, y });
        }
    }

    /// Index of the card under screen cell (`column`, `row`), if any.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        if !self.area.contains(Position { x: column, y: row }) {
            return None;
        }
        let content_y = row - self.area.y + self.scroll_state.offset().y;
        self.layout.index_at(content_y)
    }
}

impl EventHandler for NotificationListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => self.scroll_state.scroll_up(),
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.clamp_scroll();
            }
            TuiEvent::ScrollPageUp => self.scroll_state.scroll_page_up(),
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.clamp_scroll();
            }
            _ => {}
        }
        None
    }
}

/// Card heights and their running totals for the current width.
#[derive(Debug, Default)]
pub struct CardLayout {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
}

impl CardLayout {
    pub fn rebuild(&mut self, cards: Cards<'_>, width: u16) {
        self.heights = cards
            .map(|card| NotificationCard::calculate_height(&card, width))
            .collect();
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.prefix_heights.clear();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Top (inclusive) and bottom (exclusive) rows of card `index`.
    pub fn span(&self, index: usize) -> Option<(u16, u16)> {
        let bottom = *self.prefix_heights.get(index)?;
        let top = if index == 0 { 0 } else { self.prefix_heights[index - 1] };
        Some((top, bottom))
    }

    pub fn index_at(&self, content_y: u16) -> Option<usize> {
        let idx = self.prefix_heights.partition_point(|&end| end <= content_y);
        (idx < self.prefix_heights.len()).then_some(idx)
    }
}

/// Draws the log as a scrolling column of cards, or the empty-state text
/// when there is nothing to show.
pub struct NotificationList<'a> {
    state: &'a mut NotificationListState,
    log: &'a NotificationLog,
}

impl<'a> NotificationList<'a> {
    pub fn new(state: &'a mut NotificationListState, log: &'a NotificationLog) -> Self {
        Self { state, log }
    }
}

impl Component for NotificationList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.area = area;
        self.state.viewport_height = area.height;

        let cards = match self.log.surface() {
            Surface::Empty => {
                self.state.layout.clear();
                self.state.scroll_state = ScrollViewState::default();
                let [text_area] = Layout::vertical([Constraint::Length(1)])
                    .flex(Flex::Center)
                    .areas(area);
                let empty = Paragraph::new(EMPTY_STATE_TEXT)
                    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                    .centered();
                frame.render_widget(empty, text_area);
                return;
            }
            Surface::Cards(cards) => cards,
        };

        // Leave a column for the scrollbar.
        let content_width = area.width.saturating_sub(1);
        self.state.layout.rebuild(cards.clone(), content_width);
        self.state.clamp_scroll();

        let content_size = Size::new(content_width, self.state.layout.total_height());
        let mut scroll_view = ScrollView::new(content_size)
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let selected = self.state.selected_index(self.log);
        let mut y = 0u16;
        for (i, card) in cards.enumerate() {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y, content_width, height);
            scroll_view.render_widget(NotificationCard::new(card, selected == Some(i)), rect);
            y = y.saturating_add(height);
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}
