//! Render contract between the wizard screen and per-step content

use std::collections::HashMap;

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::form_data::{ErrorMap, FormData};
use crate::forms::schema::{FormDefinition, StepKind};

use super::fields_step::FieldsStep;
use super::review_step::ReviewStep;

/// What a step view did with a key
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    /// Not handled; the screen may use it
    Ignored,
    /// Handled without changing any value
    Consumed,
    /// Field values changed; merge this patch into the form data
    Update(FormData),
}

/// Caller-supplied renderer for one step.
///
/// Views hold only presentation state (focus, cursors). Values live in the
/// wizard's form data and reach the view through [`sync`](Self::sync).
pub trait StepView {
    fn render(&mut self, frame: &mut Frame, area: Rect, data: &FormData, errors: &ErrorMap);

    fn handle_key(&mut self, key: KeyEvent, data: &FormData) -> StepInput;

    /// Reload widget values from the form data, called whenever the step is entered
    fn sync(&mut self, _data: &FormData) {}

    /// Move focus to the first field in `errors`, in this view's field order
    fn focus_first_error(&mut self, _errors: &ErrorMap) {}

    /// Whether the focused control uses Enter itself
    fn consumes_enter(&self) -> bool {
        false
    }

    /// Field names in display order, used to order the error summary
    fn field_order(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Step views keyed by step id
#[derive(Default)]
pub struct StepRegistry {
    views: HashMap<String, Box<dyn StepView>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Views for every step of a form definition
    pub fn for_form(form: &FormDefinition) -> Self {
        let mut registry = Self::new();
        for step in &form.steps {
            let view: Box<dyn StepView> = match step.kind {
                StepKind::Fields => Box::new(FieldsStep::new(step.fields.clone())),
                StepKind::Review => Box::new(ReviewStep::new(form)),
            };
            registry.register(&step.id, view);
        }
        registry
    }

    pub fn register(&mut self, step_id: impl Into<String>, view: Box<dyn StepView>) {
        self.views.insert(step_id.into(), view);
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.views.contains_key(step_id)
    }

    pub fn get_mut(&mut self, step_id: &str) -> Option<&mut (dyn StepView + 'static)> {
        self.views.get_mut(step_id).map(|view| view.as_mut())
    }
}
