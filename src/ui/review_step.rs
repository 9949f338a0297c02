//! Read-only summary of every answer, used for review steps

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use super::step_view::{StepInput, StepView};
use crate::form_data::{ErrorMap, FormData};
use crate::forms::schema::{FieldType, FormDefinition, StepKind};

struct ReviewRow {
    name: String,
    label: String,
    field_type: FieldType,
}

struct ReviewSection {
    title: String,
    rows: Vec<ReviewRow>,
}

pub struct ReviewStep {
    sections: Vec<ReviewSection>,
    scroll: u16,
}

impl ReviewStep {
    pub fn new(form: &FormDefinition) -> Self {
        let sections = form
            .steps
            .iter()
            .filter(|step| step.kind == StepKind::Fields && !step.fields.is_empty())
            .map(|step| ReviewSection {
                title: step.title.clone(),
                rows: step
                    .fields
                    .iter()
                    .map(|field| ReviewRow {
                        name: field.name.clone(),
                        label: field.label().to_string(),
                        field_type: field.field_type,
                    })
                    .collect(),
            })
            .collect();

        Self {
            sections,
            scroll: 0,
        }
    }

    fn lines(&self, data: &FormData) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for section in &self.sections {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                section.title.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            for row in &section.rows {
                let value = display_value(data.get(&row.name), row.field_type);
                let value_style = if value.is_none() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}: ", row.label), Style::default().fg(Color::Gray)),
                    Span::styled(value.unwrap_or_else(|| "(not set)".to_string()), value_style),
                ]));
            }
        }
        lines
    }
}

/// Human text for a stored value, `None` when there is nothing to show
fn display_value(value: Option<&Value>, field_type: FieldType) -> Option<String> {
    match (value?, field_type) {
        (Value::Bool(b), _) => Some(if *b { "Yes" } else { "No" }.to_string()),
        (Value::String(s), _) if s.trim().is_empty() => None,
        (Value::String(s), FieldType::Text) => Some(s.lines().collect::<Vec<_>>().join(" / ")),
        (Value::String(s), _) => Some(s.clone()),
        (Value::Null, _) => None,
        (other, _) => Some(other.to_string()),
    }
}

impl StepView for ReviewStep {
    fn render(&mut self, frame: &mut Frame, area: Rect, data: &FormData, _errors: &ErrorMap) {
        let paragraph = Paragraph::new(self.lines(data))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn handle_key(&mut self, key: KeyEvent, _data: &FormData) -> StepInput {
        match key.code {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home => self.scroll = 0,
            _ => return StepInput::Ignored,
        }
        StepInput::Consumed
    }

    fn sync(&mut self, _data: &FormData) {
        self.scroll = 0;
    }
}
