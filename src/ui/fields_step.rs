//! Generic step view: a vertical list of schema-driven fields

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::form_field::FormField;
use super::step_view::{StepInput, StepView};
use crate::form_data::{ErrorMap, FormData};
use crate::forms::schema::FieldSchema;

/// A step made of fields, one focused at a time
pub struct FieldsStep {
    /// Field names in order
    field_order: Vec<String>,
    schemas: HashMap<String, FieldSchema>,
    fields: HashMap<String, FormField>,
    focused_index: usize,
}

impl FieldsStep {
    pub fn new(schemas: Vec<FieldSchema>) -> Self {
        let mut field_order = Vec::new();
        let mut schema_map = HashMap::new();
        let mut fields = HashMap::new();

        for schema in schemas {
            let name = schema.name.clone();
            fields.insert(name.clone(), FormField::from_schema(&schema));
            field_order.push(name.clone());
            schema_map.insert(name, schema);
        }

        Self {
            field_order,
            schemas: schema_map,
            fields,
            focused_index: 0,
        }
    }

    pub fn focused_field_name(&self) -> Option<&str> {
        self.field_order.get(self.focused_index).map(String::as_str)
    }

    fn focused_field(&self) -> Option<&FormField> {
        self.fields.get(self.focused_field_name()?)
    }

    pub fn next_field(&mut self) {
        if self.focused_index < self.field_order.len().saturating_sub(1) {
            self.focused_index += 1;
        }
    }

    pub fn prev_field(&mut self) {
        self.focused_index = self.focused_index.saturating_sub(1);
    }

    /// Rows used by one field: label, widget, then an error or help line
    fn field_height(&self, name: &str) -> u16 {
        self.fields.get(name).map_or(0, |f| f.render_height() + 2)
    }

    /// First field to draw so the focused one fits in `height` rows
    fn scroll_start(&self, height: u16) -> usize {
        let mut start = self.focused_index;
        let mut used = self
            .focused_field_name()
            .map_or(0, |name| self.field_height(name));
        while start > 0 {
            let above = self.field_height(&self.field_order[start - 1]);
            if used + above > height {
                break;
            }
            used += above;
            start -= 1;
        }
        start
    }
}

impl StepView for FieldsStep {
    fn render(&mut self, frame: &mut Frame, area: Rect, _data: &FormData, errors: &ErrorMap) {
        if self.field_order.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Nothing to fill in here.",
                    Style::default().fg(Color::DarkGray),
                )),
                area,
            );
            return;
        }

        let start = self.scroll_start(area.height);
        let mut y = area.y;
        let bottom = area.y + area.height;

        for index in start..self.field_order.len() {
            let name = &self.field_order[index];
            let height = self.field_height(name);
            if y + height > bottom {
                break;
            }
            let (Some(schema), Some(field)) = (self.schemas.get(name), self.fields.get_mut(name))
            else {
                continue;
            };
            let focused = index == self.focused_index;

            let mut label = vec![Span::styled(
                schema.label().to_string(),
                if focused {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                },
            )];
            if schema.required {
                label.push(Span::styled(" *", Style::default().fg(Color::Red)));
            }
            frame.render_widget(
                Paragraph::new(Line::from(label)),
                Rect::new(area.x, y, area.width, 1),
            );

            let widget_height = field.render_height();
            field.render(
                frame,
                Rect::new(area.x + 2, y + 1, area.width.saturating_sub(2), widget_height),
                focused,
            );

            let hint = match (errors.get(name), &schema.description) {
                (Some(error), _) => Line::from(Span::styled(
                    format!("✗ {error}"),
                    Style::default().fg(Color::Red),
                )),
                (None, Some(description)) if focused => Line::from(Span::styled(
                    description.as_str(),
                    Style::default().fg(Color::DarkGray),
                )),
                _ => Line::from(""),
            };
            frame.render_widget(
                Paragraph::new(hint),
                Rect::new(area.x + 2, y + 1 + widget_height, area.width.saturating_sub(2), 1),
            );

            y += height;
        }
    }

    fn handle_key(&mut self, key: KeyEvent, _data: &FormData) -> StepInput {
        match key.code {
            KeyCode::Tab => {
                self.next_field();
                return StepInput::Consumed;
            }
            KeyCode::BackTab => {
                self.prev_field();
                return StepInput::Consumed;
            }
            _ => {}
        }

        let Some(name) = self.field_order.get(self.focused_index).cloned() else {
            return StepInput::Ignored;
        };
        let Some(field) = self.fields.get_mut(&name) else {
            return StepInput::Ignored;
        };

        let before = field.value();
        if !field.handle_key(key) {
            return StepInput::Ignored;
        }
        match field.value() {
            Some(after) if Some(&after) != before.as_ref() => {
                StepInput::Update(FormData::with(name, after))
            }
            _ => StepInput::Consumed,
        }
    }

    fn sync(&mut self, data: &FormData) {
        for (name, field) in &mut self.fields {
            field.set_value(data.get(name));
        }
    }

    fn focus_first_error(&mut self, errors: &ErrorMap) {
        if let Some(index) = self
            .field_order
            .iter()
            .position(|name| errors.contains_key(name))
        {
            self.focused_index = index;
        }
    }

    fn consumes_enter(&self) -> bool {
        self.focused_field().is_some_and(FormField::consumes_enter)
    }

    fn field_order(&self) -> Vec<&str> {
        self.field_order.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn step() -> FieldsStep {
        FieldsStep::new(
            serde_json::from_str(
                r#"[
                    {"name": "title", "label": "Title", "type": "string", "required": true},
                    {"name": "summary", "label": "Summary", "type": "text"},
                    {"name": "public", "label": "Public", "type": "bool"}
                ]"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_typing_produces_single_field_patch() {
        let mut step = step();

        let input = step.handle_key(key(KeyCode::Char('J')), &FormData::new());

        assert_eq!(input, StepInput::Update(FormData::with("title", "J")));
    }

    #[test]
    fn test_cursor_moves_do_not_patch() {
        let mut step = step();

        assert_eq!(
            step.handle_key(key(KeyCode::Left), &FormData::new()),
            StepInput::Consumed
        );
    }

    #[test]
    fn test_tab_moves_focus_and_enter_ownership() {
        let mut step = step();
        assert!(!step.consumes_enter());

        step.handle_key(key(KeyCode::Tab), &FormData::new());
        assert_eq!(step.focused_field_name(), Some("summary"));
        assert!(step.consumes_enter());

        step.handle_key(key(KeyCode::Tab), &FormData::new());
        step.handle_key(key(KeyCode::Tab), &FormData::new());
        assert_eq!(step.focused_field_name(), Some("public"));

        step.handle_key(key(KeyCode::BackTab), &FormData::new());
        assert_eq!(step.focused_field_name(), Some("summary"));
    }

    #[test]
    fn test_sync_loads_values() {
        let mut step = step();
        let data = FormData::from_iter([("title", json!("Jazz")), ("public", json!(true))]);

        step.sync(&data);

        assert_eq!(step.fields["title"].value(), Some(json!("Jazz")));
        assert_eq!(step.fields["public"].value(), Some(json!(true)));
        assert_eq!(step.fields["summary"].value(), Some(json!("")));
    }

    #[test]
    fn test_focus_first_error_uses_field_order() {
        let mut step = step();
        step.focused_index = 0;
        let errors = ErrorMap::from([
            ("public".to_string(), "must be accepted".to_string()),
            ("summary".to_string(), "required".to_string()),
        ]);

        step.focus_first_error(&errors);

        assert_eq!(step.focused_field_name(), Some("summary"));
    }

    #[test]
    fn test_render_shows_labels_and_errors() {
        let mut step = step();
        let errors = ErrorMap::from([("title".to_string(), "Title is required".to_string())]);
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                step.render(frame, area, &FormData::new(), &errors);
            })
            .unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Title *"));
        assert!(rendered.contains("Title is required"));
        assert!(rendered.contains("Summary"));
    }
}
