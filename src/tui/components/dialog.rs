use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use super::notification_card::ACCENT;
use crate::core::state::{Prompt, PromptKind};
use crate::tui::component::Component;
use crate::tui::event::TuiEvent;

const DIALOG_WIDTH_PERCENT: u16 = 60;
const MIN_DIALOG_WIDTH: u16 = 30;

/// Modal box for the prompt at the head of the queue.
pub struct Dialog<'a> {
    pub prompt: &'a Prompt,
}

impl<'a> Dialog<'a> {
    pub fn new(prompt: &'a Prompt) -> Self {
        Self { prompt }
    }

    fn accent(&self) -> Color {
        match self.prompt.kind {
            PromptKind::UpToDate => Color::Green,
            PromptKind::UpdateError => Color::Red,
            PromptKind::Alert => ACCENT,
        }
    }
}

/// Whether `event` acknowledges the open dialog.
pub fn is_acknowledgement(event: &TuiEvent) -> bool {
    matches!(
        event,
        TuiEvent::Submit | TuiEvent::Escape | TuiEvent::InputChar(' ')
    )
}

impl Component for Dialog<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let scaled = u32::from(area.width) * u32::from(DIALOG_WIDTH_PERCENT) / 100;
        let width = u16::try_from(scaled)
            .unwrap_or(u16::MAX)
            .max(MIN_DIALOG_WIDTH)
            .min(area.width);
        // borders + horizontal padding
        let text_width = width.saturating_sub(4).max(1) as usize;
        let body_lines = textwrap::wrap(&self.prompt.body, text_width).len().max(1);
        let body_lines = u16::try_from(body_lines).unwrap_or(u16::MAX);
        // borders + blank line above and below the body
        let height = body_lines.saturating_add(4).min(area.height);

        let [row] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [overlay] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(row);

        frame.render_widget(Clear, overlay);

        let accent = self.accent();
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .title(Line::from(format!(" {} ", self.prompt.title)).style(
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from(" Enter OK ").centered())
            .padding(Padding::new(1, 1, 1, 1));

        let body = Paragraph::new(self.prompt.body.as_str())
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(body, overlay);
    }
}
