mod draft_prompt;
mod help;
mod leave_confirm;

pub use draft_prompt::{DraftPromptDialog, DraftPromptSelection};
pub use help::HelpDialog;
pub use leave_confirm::{LeaveConfirmDialog, LeaveSelection};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::keybindings::{footer_shortcuts, ShortcutContext};

/// Helper to create a centered rect
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// One-line key hints for a context, centered
pub(crate) fn render_instructions(frame: &mut Frame, area: Rect, context: ShortcutContext) {
    let mut spans = Vec::new();
    for shortcut in footer_shortcuts(context) {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            shortcut.key_display(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::raw(format!(" {}", shortcut.description)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}
