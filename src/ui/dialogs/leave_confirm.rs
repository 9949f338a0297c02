use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, render_instructions};
use crate::ui::keybindings::ShortcutContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveSelection {
    Stay,
    Leave,
}

/// Shown when quitting with unsaved edits
pub struct LeaveConfirmDialog {
    pub visible: bool,
    pub selection: LeaveSelection,
}

impl LeaveConfirmDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            selection: LeaveSelection::Stay,
        }
    }

    pub fn show(&mut self) {
        self.selection = LeaveSelection::Stay;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Handle a key; returns the decision and hides the dialog once made
    pub fn handle_key(&mut self, code: KeyCode) -> Option<LeaveSelection> {
        let decision = match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selection = match self.selection {
                    LeaveSelection::Stay => LeaveSelection::Leave,
                    LeaveSelection::Leave => LeaveSelection::Stay,
                };
                None
            }
            KeyCode::Enter => Some(self.selection),
            KeyCode::Char('y' | 'Y') => Some(LeaveSelection::Leave),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(LeaveSelection::Stay),
            _ => None,
        };
        if decision.is_some() {
            self.hide();
        }
        decision
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Unsaved Changes ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(2),
                Constraint::Length(1), // Buttons
                Constraint::Length(1), // Instructions
            ])
            .margin(1)
            .split(inner);

        frame.render_widget(
            Paragraph::new(
                "You have changes that have not been submitted. Your draft is kept and can be resumed later.",
            )
            .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let button = |label: &'static str, option: LeaveSelection| {
            let style = if self.selection == option {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Span::styled(format!(" {label} "), style)
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                button("Stay", LeaveSelection::Stay),
                Span::raw("   "),
                button("Leave", LeaveSelection::Leave),
            ]))
            .alignment(Alignment::Center),
            chunks[1],
        );

        render_instructions(frame, chunks[2], ShortcutContext::LeaveConfirm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_defaults_to_stay() {
        let mut dialog = LeaveConfirmDialog::new();
        dialog.selection = LeaveSelection::Leave;

        dialog.show();

        assert!(dialog.visible);
        assert_eq!(dialog.selection, LeaveSelection::Stay);
    }

    #[test]
    fn test_enter_on_default_stays() {
        let mut dialog = LeaveConfirmDialog::new();
        dialog.show();

        assert_eq!(dialog.handle_key(KeyCode::Enter), Some(LeaveSelection::Stay));
        assert!(!dialog.visible);
    }

    #[test]
    fn test_y_leaves_and_esc_stays() {
        let mut dialog = LeaveConfirmDialog::new();
        dialog.show();
        assert_eq!(dialog.handle_key(KeyCode::Char('y')), Some(LeaveSelection::Leave));

        dialog.show();
        assert_eq!(dialog.handle_key(KeyCode::Esc), Some(LeaveSelection::Stay));
    }

    #[test]
    fn test_navigation_keeps_dialog_open() {
        let mut dialog = LeaveConfirmDialog::new();
        dialog.show();

        assert_eq!(dialog.handle_key(KeyCode::Right), None);
        assert!(dialog.visible);
        assert_eq!(dialog.handle_key(KeyCode::Enter), Some(LeaveSelection::Leave));
    }
}
