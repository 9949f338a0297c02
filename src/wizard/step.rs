//! Step configuration: identity, validator and skippability of each step

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::form_data::{ErrorMap, FormData};

/// Pure per-step validator. An empty map means the step is valid.
pub type Validator = Arc<dyn Fn(&FormData) -> ErrorMap + Send + Sync>;

/// One wizard step
#[derive(Clone)]
pub struct StepConfig {
    /// Stable identifier, also the render-dispatch key
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub validate: Option<Validator>,
    /// Step may be bypassed without running `validate`
    pub can_skip: bool,
}

impl StepConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            icon: None,
            validate: None,
            can_skip: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&FormData) -> ErrorMap + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    pub fn skippable(mut self, can_skip: bool) -> Self {
        self.can_skip = can_skip;
        self
    }

    /// Run the validator against `data`; steps without one always pass
    pub fn run_validation(&self, data: &FormData) -> ErrorMap {
        self.validate
            .as_ref()
            .map(|validate| validate(data))
            .unwrap_or_default()
    }
}

impl fmt::Debug for StepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepConfig")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("has_validator", &self.validate.is_some())
            .field("can_skip", &self.can_skip)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepConfigError {
    #[error("a wizard needs at least one step")]
    Empty,

    #[error("step at position {0} has an empty id")]
    EmptyId(usize),

    #[error("duplicate step id '{0}'")]
    DuplicateId(String),
}

/// Ordered, immutable list of steps.
///
/// Cloning shares the underlying list; nothing can reorder or edit the steps
/// once constructed.
#[derive(Debug, Clone)]
pub struct StepList {
    steps: Arc<[StepConfig]>,
}

impl StepList {
    pub fn new(steps: Vec<StepConfig>) -> Result<Self, StepConfigError> {
        if steps.is_empty() {
            return Err(StepConfigError::Empty);
        }

        let mut seen = HashSet::new();
        for (i, step) in steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(StepConfigError::EmptyId(i));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(StepConfigError::DuplicateId(step.id.clone()));
            }
        }

        Ok(Self {
            steps: steps.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepConfig> {
        self.steps.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepConfig> {
        self.steps.iter()
    }
}

impl std::ops::Index<usize> for StepList {
    type Output = StepConfig;

    fn index(&self, index: usize) -> &Self::Output {
        &self.steps[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_list() {
        assert_eq!(StepList::new(vec![]).unwrap_err(), StepConfigError::Empty);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = StepList::new(vec![
            StepConfig::new("details", "Details"),
            StepConfig::new("details", "Again"),
        ])
        .unwrap_err();

        assert_eq!(err, StepConfigError::DuplicateId("details".to_string()));
    }

    #[test]
    fn test_rejects_blank_id() {
        let err = StepList::new(vec![
            StepConfig::new("details", "Details"),
            StepConfig::new("  ", "Blank"),
        ])
        .unwrap_err();

        assert_eq!(err, StepConfigError::EmptyId(1));
    }

    #[test]
    fn test_step_without_validator_passes() {
        let step = StepConfig::new("media", "Media");
        assert!(step.run_validation(&FormData::new()).is_empty());
    }

    #[test]
    fn test_lookup_by_id() {
        let steps = StepList::new(vec![
            StepConfig::new("details", "Details"),
            StepConfig::new("media", "Media").skippable(true),
        ])
        .unwrap();

        assert_eq!(steps.position("media"), Some(1));
        assert_eq!(steps.last_index(), 1);
        assert!(steps[1].can_skip);
        assert!(steps.position("missing").is_none());
    }
}
