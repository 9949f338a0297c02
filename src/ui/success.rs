//! Terminal view shown after a successful submit

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::wizard::{CallToAction, SuccessAction, SuccessView, Submission};

/// Selection over the success view's calls to action
#[derive(Debug, Default)]
pub struct SuccessPanel {
    /// 0 = primary, 1 = secondary
    selected: usize,
}

impl SuccessPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.selected = 0;
    }

    fn actions(view: &SuccessView) -> Vec<&CallToAction> {
        std::iter::once(&view.primary)
            .chain(view.secondary.as_ref())
            .collect()
    }

    /// Handle a key; returns the activated action
    pub fn handle_key(&mut self, code: KeyCode, view: &SuccessView) -> Option<SuccessAction> {
        let count = Self::actions(view).len();
        match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.selected = (self.selected + 1) % count;
                None
            }
            KeyCode::Enter => Self::actions(view).get(self.selected).map(|cta| cta.action),
            KeyCode::Char('q') | KeyCode::Esc => Some(SuccessAction::Exit),
            _ => None,
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        view: &SuccessView,
        submission: Option<&Submission>,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Length(2), // Title
                Constraint::Min(3),    // Message + reference
                Constraint::Length(1), // Buttons
                Constraint::Percentage(20),
            ])
            .margin(1)
            .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("✓ {}", view.title),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[1],
        );

        let mut message = vec![Line::from(view.message.as_str())];
        if let Some(submission) = submission {
            message.push(Line::from(""));
            message.push(Line::from(Span::styled(
                format!("Reference: {}", submission.id),
                Style::default().fg(Color::DarkGray),
            )));
        }
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[2],
        );

        let mut buttons = Vec::new();
        for (i, cta) in Self::actions(view).into_iter().enumerate() {
            if i > 0 {
                buttons.push(Span::raw("   "));
            }
            let style = if i == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            buttons.push(Span::styled(format!(" {} ", cta.label), style));
        }
        frame.render_widget(
            Paragraph::new(Line::from(buttons)).alignment(Alignment::Center),
            chunks[3],
        );
    }
}
