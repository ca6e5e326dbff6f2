//! # Header
//!
//! Two rows above the list: the screen title with an unread count, then the
//! update control. While a check runs the control becomes a spinner so it
//! cannot be triggered twice.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::notification_card::ACCENT;
use crate::tui::component::Component;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const UPDATE_BUTTON_TEXT: &str = " [u] Check for Update ";
pub const CHECKING_TEXT: &str = "Checking for updates…";

pub struct Header {
    pub unread: usize,
    pub is_updating: bool,
    pub spinner_frame: usize,
}

impl Component for Header {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [title_row, control_row] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);
        let [title_area, count_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(12)]).areas(title_row);

        frame.render_widget(
            Paragraph::new(" Notifications").style(Style::default().add_modifier(Modifier::BOLD)),
            title_area,
        );
        if self.unread > 0 {
            frame.render_widget(
                Paragraph::new(format!("{} unread ", self.unread))
                    .style(Style::default().fg(ACCENT))
                    .right_aligned(),
                count_area,
            );
        }

        let control = if self.is_updating {
            let glyph = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            Line::from(vec![
                Span::styled(format!(" {glyph} "), Style::default().fg(ACCENT)),
                Span::styled(CHECKING_TEXT, Style::default().fg(Color::Gray)),
            ])
        } else {
            Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    UPDATE_BUTTON_TEXT,
                    Style::default()
                        .fg(Color::White)
                        .bg(ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        };
        frame.render_widget(Paragraph::new(control), control_row);
    }
}
