//! Input widgets for a single form field

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use serde_json::Value;
use tui_textarea::TextArea;

use crate::forms::schema::{parse_bool, FieldSchema, FieldType};

/// Single-line text with a char-indexed cursor
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    value: String,
    cursor: usize,
    max_chars: Option<usize>,
}

impl LineInput {
    fn new(max_chars: Option<usize>) -> Self {
        Self {
            max_chars,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.len();
    }

    fn insert(&mut self, c: char) {
        if self.max_chars.is_some_and(|max| self.len() >= max) {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Shared editing keys; returns true if consumed
    fn handle_edit(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            _ => return false,
        }
        true
    }

    /// Value with a `|` marker at the cursor
    fn with_cursor(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.byte_index(self.cursor), '|');
        text
    }
}

/// A form field widget that can handle different input types
pub enum FormField {
    /// Single-line text input
    TextInput {
        input: LineInput,
        placeholder: String,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
    /// Selection from predefined options; `None` until the user picks one
    EnumSelect {
        options: Vec<String>,
        list_state: ListState,
    },
    /// Boolean toggle
    Toggle { value: bool },
    /// Date input (YYYY-MM-DD format)
    DateInput { input: LineInput },
}

impl FormField {
    /// Create an empty widget for a schema; values arrive through `set_value`
    pub fn from_schema(schema: &FieldSchema) -> Self {
        let placeholder = schema.placeholder.clone().unwrap_or_default();
        match schema.field_type {
            FieldType::String => FormField::TextInput {
                input: LineInput::new(schema.max_length),
                placeholder,
            },
            FieldType::Text => FormField::TextArea {
                textarea: Box::new(TextArea::default()),
                placeholder,
            },
            FieldType::Enum => FormField::EnumSelect {
                options: schema.options.clone(),
                list_state: ListState::default(),
            },
            FieldType::Bool => FormField::Toggle { value: false },
            FieldType::Date => FormField::DateInput {
                input: LineInput::new(Some(10)),
            },
        }
    }

    /// The value as stored in form data; `None` for an unpicked enum
    pub fn value(&self) -> Option<Value> {
        match self {
            FormField::TextInput { input, .. } | FormField::DateInput { input } => {
                Some(Value::String(input.value().to_string()))
            }
            FormField::TextArea { textarea, .. } => Some(Value::String(textarea.lines().join("\n"))),
            FormField::EnumSelect {
                options,
                list_state,
            } => list_state
                .selected()
                .and_then(|i| options.get(i))
                .map(|o| Value::String(o.clone())),
            FormField::Toggle { value } => Some(Value::Bool(*value)),
        }
    }

    /// Load a stored value; missing values reset the widget
    pub fn set_value(&mut self, new_value: Option<&Value>) {
        let text = match new_value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        match self {
            FormField::TextInput { input, .. } | FormField::DateInput { input } => {
                input.set(&text);
            }
            FormField::TextArea { textarea, .. } => {
                let lines: Vec<String> = if text.is_empty() {
                    Vec::new()
                } else {
                    text.lines().map(str::to_string).collect()
                };
                **textarea = TextArea::new(lines);
                textarea.move_cursor(tui_textarea::CursorMove::Bottom);
                textarea.move_cursor(tui_textarea::CursorMove::End);
            }
            FormField::EnumSelect {
                options,
                list_state,
            } => {
                list_state.select(options.iter().position(|o| *o == text));
            }
            FormField::Toggle { value } => {
                *value = match new_value {
                    Some(Value::Bool(b)) => *b,
                    _ => parse_bool(&text),
                };
            }
        }
    }

    /// Multi-line input keeps Enter for itself
    pub fn consumes_enter(&self) -> bool {
        matches!(self, FormField::TextArea { .. })
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match self {
            FormField::TextInput { input, .. } => match key.code {
                KeyCode::Char(c) if plain => {
                    input.insert(c);
                    true
                }
                code => input.handle_edit(code),
            },
            FormField::TextArea { textarea, .. } => {
                if key.code == KeyCode::Tab || key.code == KeyCode::BackTab || !plain {
                    return false;
                }
                textarea.input(key);
                true
            }
            FormField::EnumSelect {
                options,
                list_state,
            } => {
                let last = options.len().saturating_sub(1);
                match (key.code, list_state.selected()) {
                    (KeyCode::Up | KeyCode::Char('k'), Some(i)) => {
                        list_state.select(Some(i.saturating_sub(1)));
                        true
                    }
                    (KeyCode::Down | KeyCode::Char('j'), Some(i)) => {
                        list_state.select(Some((i + 1).min(last)));
                        true
                    }
                    (KeyCode::Up | KeyCode::Down | KeyCode::Char('j' | 'k' | ' '), None)
                        if !options.is_empty() =>
                    {
                        list_state.select(Some(0));
                        true
                    }
                    _ => false,
                }
            }
            FormField::Toggle { value } => match key.code {
                KeyCode::Char(' ') => {
                    *value = !*value;
                    true
                }
                KeyCode::Left | KeyCode::Char('y') => {
                    *value = true;
                    true
                }
                KeyCode::Right | KeyCode::Char('n') => {
                    *value = false;
                    true
                }
                _ => false,
            },
            FormField::DateInput { input } => match key.code {
                KeyCode::Char(c) if plain && (c.is_ascii_digit() || c == '-') => {
                    input.insert(c);
                    true
                }
                code => input.handle_edit(code),
            },
        }
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } | FormField::Toggle { .. } | FormField::DateInput { .. } => 1,
            FormField::TextArea { .. } => 5,
            FormField::EnumSelect { options, .. } => {
                u16::try_from(options.len()).unwrap_or(u16::MAX).clamp(1, 5)
            }
        }
    }

    /// Render the field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };
        let text_style = Style::default().fg(if focused { Color::White } else { Color::Gray });

        match self {
            FormField::TextInput { input, placeholder } => {
                let content = if input.value().is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let text = if focused {
                        input.with_cursor()
                    } else {
                        input.value().to_string()
                    };
                    let suffix = input
                        .max_chars
                        .map(|m| format!(" ({}/{m})", input.len()))
                        .unwrap_or_default();
                    Line::from(vec![
                        Span::raw(text),
                        Span::styled(suffix, Style::default().fg(Color::DarkGray)),
                    ])
                };
                frame.render_widget(Paragraph::new(content).style(text_style), area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
            FormField::EnumSelect {
                options,
                list_state,
            } => {
                if list_state.selected().is_none() {
                    let hint = if focused { "↑/↓ to choose" } else { "(choose)" };
                    frame.render_widget(
                        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
                        area,
                    );
                    return;
                }

                let items: Vec<ListItem> = options
                    .iter()
                    .map(|opt| ListItem::new(Span::styled(opt.as_str(), text_style)))
                    .collect();
                let highlight = if focused {
                    Style::default()
                        .add_modifier(Modifier::REVERSED)
                        .fg(Color::Cyan)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let list = List::new(items)
                    .highlight_style(highlight)
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list, area, list_state);
            }
            FormField::Toggle { value } => {
                let yes_style = if *value {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let no_style = if *value {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                };

                let line = Line::from(vec![
                    Span::styled("[Yes]", yes_style),
                    Span::raw(" / "),
                    Span::styled("[No]", no_style),
                ]);
                frame.render_widget(Paragraph::new(line), area);
            }
            FormField::DateInput { input } => {
                let display = if input.value().is_empty() && !focused {
                    Line::from(Span::styled(
                        "YYYY-MM-DD",
                        Style::default().fg(Color::DarkGray),
                    ))
                } else if focused {
                    Line::from(input.with_cursor())
                } else {
                    Line::from(input.value().to_string())
                };
                frame.render_widget(Paragraph::new(display).style(text_style), area);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn field(json: &str) -> FormField {
        FormField::from_schema(&serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_text_input_handles_chars() {
        let mut field = field(r#"{"name": "t", "type": "string"}"#);

        assert!(field.handle_key(key(KeyCode::Char('h'))));
        assert!(field.handle_key(key(KeyCode::Char('i'))));
        assert_eq!(field.value(), Some(json!("hi")));
    }

    #[test]
    fn test_text_input_respects_max_length() {
        let mut field = field(r#"{"name": "t", "type": "string", "max_length": 3}"#);

        for c in ['a', 'b', 'c', 'd'] {
            field.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(field.value(), Some(json!("abc")));
    }

    #[test]
    fn test_text_input_edits_multibyte_text() {
        let mut field = field(r#"{"name": "t", "type": "string"}"#);
        field.set_value(Some(&json!("Tromsø")));

        field.handle_key(key(KeyCode::Left));
        field.handle_key(key(KeyCode::Backspace));
        field.handle_key(key(KeyCode::Char('s')));

        assert_eq!(field.value(), Some(json!("Tromsø")));
    }

    #[test]
    fn test_ctrl_chars_are_not_typed() {
        let mut field = field(r#"{"name": "t", "type": "string"}"#);

        let consumed = field.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));

        assert!(!consumed);
        assert_eq!(field.value(), Some(json!("")));
    }

    #[test]
    fn test_enum_starts_unpicked() {
        let mut field = field(r#"{"name": "k", "type": "enum", "options": ["a", "b", "c"]}"#);
        assert_eq!(field.value(), None);

        field.handle_key(key(KeyCode::Down));
        assert_eq!(field.value(), Some(json!("a")));
        field.handle_key(key(KeyCode::Down));
        field.handle_key(key(KeyCode::Down));
        field.handle_key(key(KeyCode::Down));
        assert_eq!(field.value(), Some(json!("c")));
        field.handle_key(key(KeyCode::Up));
        assert_eq!(field.value(), Some(json!("b")));
    }

    #[test]
    fn test_enum_set_value_selects_option() {
        let mut field = field(r#"{"name": "k", "type": "enum", "options": ["a", "b"]}"#);

        field.set_value(Some(&json!("b")));

        assert_eq!(field.value(), Some(json!("b")));
    }

    #[test]
    fn test_toggle_ignores_enter() {
        let mut field = field(r#"{"name": "b", "type": "bool"}"#);

        assert!(!field.handle_key(key(KeyCode::Enter)));
        assert!(field.handle_key(key(KeyCode::Char(' '))));
        assert_eq!(field.value(), Some(json!(true)));
        assert!(!field.consumes_enter());
    }

    #[test]
    fn test_text_area_consumes_enter_but_not_tab() {
        let mut field = field(r#"{"name": "notes", "type": "text"}"#);
        assert!(field.consumes_enter());

        field.handle_key(key(KeyCode::Char('a')));
        field.handle_key(key(KeyCode::Enter));
        field.handle_key(key(KeyCode::Char('b')));

        assert_eq!(field.value(), Some(json!("a\nb")));
        assert!(!field.handle_key(key(KeyCode::Tab)));
    }

    #[test]
    fn test_date_input_accepts_only_date_chars() {
        let mut field = field(r#"{"name": "d", "type": "date"}"#);

        for c in "2026-x01-15abc".chars() {
            field.handle_key(key(KeyCode::Char(c)));
        }

        assert_eq!(field.value(), Some(json!("2026-01-15")));
    }
}
