use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{Dialog, Header, NotificationList};

const HELP_TEXT: &str = " ↑↓ select  Enter toggle read  u update  q quit";

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(2), Length(1), Min(0), Length(1)]);
    let [header_area, _gap, list_area, footer_area] = layout.areas(frame.area());

    Header {
        unread: app.log.unread_count(),
        is_updating: app.is_updating(),
        spinner_frame,
    }
    .render(frame, header_area);

    NotificationList::new(&mut tui.list, &app.log).render(frame, list_area);

    let footer = if app.status_message.is_empty() {
        HELP_TEXT.to_string()
    } else {
        format!(" {}", app.status_message)
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        footer_area,
    );

    if let Some(prompt) = app.active_prompt() {
        Dialog::new(prompt).render(frame, frame.area());
    }
}
