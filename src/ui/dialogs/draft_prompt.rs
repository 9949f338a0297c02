use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{centered_rect, render_instructions};
use crate::ui::keybindings::ShortcutContext;

/// Selection state for the draft prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPromptSelection {
    Resume,
    StartFresh,
}

impl DraftPromptSelection {
    fn toggle(self) -> Self {
        match self {
            Self::Resume => Self::StartFresh,
            Self::StartFresh => Self::Resume,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Resume => "Resume draft",
            Self::StartFresh => "Start fresh",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Self::Resume => "R",
            Self::StartFresh => "S",
        }
    }
}

/// Asks whether to continue a saved draft before any step is shown
pub struct DraftPromptDialog {
    pub form_name: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub selection: DraftPromptSelection,
}

impl DraftPromptDialog {
    pub fn new(form_name: impl Into<String>, saved_at: Option<DateTime<Utc>>) -> Self {
        Self {
            form_name: form_name.into(),
            saved_at,
            selection: DraftPromptSelection::Resume,
        }
    }

    /// Handle a key; returns the chosen option once the user decides
    pub fn handle_key(&mut self, code: KeyCode) -> Option<DraftPromptSelection> {
        match code {
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::Char('j' | 'k') => {
                self.selection = self.selection.toggle();
                None
            }
            KeyCode::Enter => Some(self.selection),
            KeyCode::Char('r' | 'R') => Some(DraftPromptSelection::Resume),
            KeyCode::Char('s' | 'S') => Some(DraftPromptSelection::StartFresh),
            _ => None,
        }
    }

    fn saved_at_display(&self) -> String {
        self.saved_at.map_or_else(
            || "at an unknown time".to_string(),
            |ts| {
                ts.with_timezone(&Local)
                    .format("on %Y-%m-%d at %H:%M")
                    .to_string()
            },
        )
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(55, 40, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Unfinished Draft ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Message
                Constraint::Min(2),    // Options
                Constraint::Length(1), // Instructions
            ])
            .margin(1)
            .split(inner);

        let message = Paragraph::new(Line::from(vec![
            Span::raw("You have an unfinished "),
            Span::styled(
                self.form_name.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" saved {}.", self.saved_at_display())),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[0]);

        let option_lines: Vec<Line> = [DraftPromptSelection::Resume, DraftPromptSelection::StartFresh]
            .iter()
            .map(|option| {
                let is_selected = *option == self.selection;
                let style = if is_selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::raw(if is_selected { "▶ " } else { "  " }),
                    Span::styled(
                        format!("[{}] ", option.key()),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(option.label(), style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(option_lines), chunks[1]);

        render_instructions(frame, chunks[2], ShortcutContext::DraftPrompt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_resume() {
        let dialog = DraftPromptDialog::new("Event", None);
        assert_eq!(dialog.selection, DraftPromptSelection::Resume);
    }

    #[test]
    fn test_navigation_then_enter() {
        let mut dialog = DraftPromptDialog::new("Event", Some(Utc::now()));

        assert_eq!(dialog.handle_key(KeyCode::Down), None);
        assert_eq!(dialog.selection, DraftPromptSelection::StartFresh);
        assert_eq!(
            dialog.handle_key(KeyCode::Enter),
            Some(DraftPromptSelection::StartFresh)
        );
    }

    #[test]
    fn test_shortcut_keys() {
        let mut dialog = DraftPromptDialog::new("Event", None);

        assert_eq!(
            dialog.handle_key(KeyCode::Char('s')),
            Some(DraftPromptSelection::StartFresh)
        );
        assert_eq!(
            dialog.handle_key(KeyCode::Char('R')),
            Some(DraftPromptSelection::Resume)
        );
        assert_eq!(dialog.handle_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_label_and_key() {
        assert_eq!(DraftPromptSelection::Resume.label(), "Resume draft");
        assert_eq!(DraftPromptSelection::StartFresh.label(), "Start fresh");
        assert_eq!(DraftPromptSelection::Resume.key(), "R");
        assert_eq!(DraftPromptSelection::StartFresh.key(), "S");
    }
}
