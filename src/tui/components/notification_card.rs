use std::borrow::Cow;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::notification_log::{Card, Emphasis};

/// Accent used for unread borders and the update button.
pub const ACCENT: Color = Color::Rgb(30, 144, 255);

const ICON: &str = "◆";
/// Icon glyph plus the gap after it.
const ICON_WIDTH: u16 = 2;
/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Borders, padding and the icon column.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2 + ICON_WIDTH;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// One notification drawn as a bordered card: icon and title, the wrapped
/// message, and the date right-aligned on the last line.
///
/// Unread cards get an accent border; read cards are drawn dim. Both come
/// from `Card::emphasis`, never from separate state.
///
/// [`calculate_height`](Self::calculate_height) and `render` share the same
/// wrapping, so the list can lay cards out before drawing them.
#[derive(Clone, Copy)]
pub struct NotificationCard<'a> {
    pub card: Card<'a>,
    pub is_selected: bool,
}

impl<'a> NotificationCard<'a> {
    pub fn new(card: Card<'a>, is_selected: bool) -> Self {
        Self { card, is_selected }
    }

    /// Rows needed to draw `card` at `width` columns.
    pub fn calculate_height(card: &Card<'_>, width: u16) -> u16 {
        let text_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if text_width == 0 {
            return VERTICAL_OVERHEAD + 1;
        }
        let message_lines = wrap_message(&card.record.message, text_width).len();
        let message_lines = u16::try_from(message_lines).unwrap_or(u16::MAX);
        // title + message + date
        (VERTICAL_OVERHEAD + 2).saturating_add(message_lines)
    }
}

fn wrap_message(message: &str, width: u16) -> Vec<String> {
    let message = message.trim();
    if message.is_empty() || width == 0 {
        return Vec::new();
    }
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::wrap(message, options)
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

/// Cuts `s` to at most `max_width` display columns, ending in `…` when cut.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

impl<'a> Widget for NotificationCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let record = self.card.record;

        let (border_style, text_style) = match self.card.emphasis {
            Emphasis::Highlighted => (Style::default().fg(ACCENT), Style::default()),
            Emphasis::Dimmed => (
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
                Style::default().add_modifier(Modifier::DIM),
            ),
        };
        let (border_type, border_style) = if self.is_selected {
            (BorderType::Thick, border_style.add_modifier(Modifier::BOLD))
        } else {
            (BorderType::Rounded, border_style)
        };

        let block = Block::bordered()
            .border_type(border_type)
            .border_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);

        let text_width = inner.width.saturating_sub(ICON_WIDTH);
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{ICON} "), border_style),
            Span::styled(
                truncate_to_width(&record.title, text_width as usize),
                text_style.add_modifier(Modifier::BOLD),
            ),
        ])];
        let indent = " ".repeat(ICON_WIDTH as usize);
        for line in wrap_message(&record.message, text_width) {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(line, text_style),
            ]));
        }
        lines.push(
            Line::from(Span::styled(
                record.date.clone(),
                text_style.fg(Color::Gray),
            ))
            .alignment(Alignment::Right),
        );

        Paragraph::new(lines).render(inner, buf);
    }
}
