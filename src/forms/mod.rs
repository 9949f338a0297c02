//! Declarative form definitions and the catalog of available forms.
//!
//! Built-in forms are embedded JSON; user forms are `*.json` files in the
//! configured forms directory and replace a built-in with the same key.

pub mod schema;
pub mod validation;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::wizard::{StepConfig, StepConfigError, StepList};
use schema::{FieldType, FormDefinition, StepKind};
use validation::{validate_fields, FieldRule};

#[derive(Debug, Error)]
pub enum FormDefinitionError {
    #[error("invalid form JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("form key must not be empty")]
    EmptyKey,

    #[error("field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("enum field '{0}' has no options")]
    MissingOptions(String),

    #[error("default for field '{field}' is not one of its options")]
    InvalidDefault { field: String },

    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Steps(#[from] StepConfigError),

    #[error("could not read form definition {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Built-in form sources, in listing order
const BUILTIN_SOURCES: &[&str] = &[
    include_str!("builtin/event.json"),
    include_str!("builtin/business.json"),
    include_str!("builtin/rental.json"),
];

static BUILTIN_FORMS: Lazy<Vec<FormDefinition>> = Lazy::new(|| {
    BUILTIN_SOURCES
        .iter()
        .filter_map(|source| match FormDefinition::from_json(source) {
            Ok(form) => Some(form),
            Err(e) => {
                tracing::error!(error = %e, "Built-in form definition failed to parse");
                None
            }
        })
        .collect()
});

impl FormDefinition {
    /// Check the definition for consistency
    pub fn validate(&self) -> Result<(), FormDefinitionError> {
        if self.key.trim().is_empty() {
            return Err(FormDefinitionError::EmptyKey);
        }

        let mut seen = HashSet::new();
        for field in self.fields() {
            if !seen.insert(field.name.as_str()) {
                return Err(FormDefinitionError::DuplicateField(field.name.clone()));
            }
            if field.field_type == FieldType::Enum {
                if field.options.is_empty() {
                    return Err(FormDefinitionError::MissingOptions(field.name.clone()));
                }
                if let Some(default) = &field.default {
                    if !field.options.contains(default) {
                        return Err(FormDefinitionError::InvalidDefault {
                            field: field.name.clone(),
                        });
                    }
                }
            }
            FieldRule::from_schema(field)?;
        }
        Ok(())
    }

    /// Compile into wizard steps with generated validators
    pub fn to_steps(&self) -> Result<StepList, FormDefinitionError> {
        self.validate()?;

        let mut steps = Vec::with_capacity(self.steps.len());
        for def in &self.steps {
            let mut step = StepConfig::new(&def.id, &def.title).skippable(def.optional);
            if let Some(description) = &def.description {
                step = step.description(description);
            }
            if let Some(icon) = &def.icon {
                step = step.icon(icon);
            }

            if def.kind == StepKind::Fields && !def.fields.is_empty() {
                let rules = def
                    .fields
                    .iter()
                    .map(FieldRule::from_schema)
                    .collect::<Result<Vec<_>, _>>()?;
                step = step.validator(move |data| validate_fields(&rules, data));
            }
            steps.push(step);
        }

        Ok(StepList::new(steps)?)
    }
}

/// Forms available to run, keyed by form key
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    forms: BTreeMap<String, FormDefinition>,
}

impl FormCatalog {
    /// Catalog of the embedded forms only
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for form in BUILTIN_FORMS.iter() {
            catalog.insert(form.clone());
        }
        catalog
    }

    /// Built-in forms plus every valid definition in `dir`.
    ///
    /// Unreadable or invalid user files are logged and skipped; a missing
    /// directory is not an error.
    pub fn load(dir: &Path) -> Self {
        let mut catalog = Self::builtin();
        if !dir.is_dir() {
            return catalog;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = ?dir, error = %e, "Failed to read forms directory");
                return catalog;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            match load_form_file(&path) {
                Ok(form) => {
                    tracing::debug!(form = %form.key, path = ?path, "Loaded form definition");
                    catalog.insert(form);
                }
                Err(e) => tracing::warn!(path = ?path, error = %e, "Skipping form definition"),
            }
        }
        catalog
    }

    /// Add or replace a form by key
    pub fn insert(&mut self, form: FormDefinition) {
        self.forms.insert(form.key.clone(), form);
    }

    pub fn get(&self, key: &str) -> Option<&FormDefinition> {
        self.forms.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.values()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Read, parse and validate one form file
pub fn load_form_file(path: &Path) -> Result<FormDefinition, FormDefinitionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FormDefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let form = FormDefinition::from_json(&contents)?;
    form.validate()?;
    Ok(form)
}
