//! Per-field rules compiled from a form definition into step validators

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use super::schema::{FieldSchema, FieldType};
use super::FormDefinitionError;
use crate::form_data::{ErrorMap, FormData};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation rules for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    label: String,
    field_type: FieldType,
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    pattern_message: Option<String>,
    options: Vec<String>,
}

impl FieldRule {
    pub fn from_schema(schema: &FieldSchema) -> Result<Self, FormDefinitionError> {
        let pattern = schema
            .pattern
            .as_deref()
            .map(|p| {
                // Anchor so the pattern has to match the whole value
                Regex::new(&format!("^(?:{p})$")).map_err(|source| {
                    FormDefinitionError::InvalidPattern {
                        field: schema.name.clone(),
                        source,
                    }
                })
            })
            .transpose()?;

        Ok(Self {
            name: schema.name.clone(),
            label: schema.label().to_string(),
            field_type: schema.field_type,
            required: schema.required,
            min_length: schema.min_length,
            max_length: schema.max_length,
            pattern,
            pattern_message: schema.pattern_message.clone(),
            options: schema.options.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Error message for this field, if the value breaks a rule
    pub fn check(&self, data: &FormData) -> Option<String> {
        let value = data.get(&self.name);

        if self.field_type == FieldType::Bool {
            let checked = value.and_then(Value::as_bool).unwrap_or(false);
            return (self.required && !checked).then(|| format!("{} must be accepted", self.label));
        }

        let text = match value {
            None | Some(Value::Null) => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Some(format!("{} has an unexpected value", self.label)),
        };
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return self.required.then(|| format!("{} is required", self.label));
        }

        let len = trimmed.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Some(format!("{} must be at least {min} characters", self.label));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Some(format!("{} must be at most {max} characters", self.label));
            }
        }

        match self.field_type {
            FieldType::Date if NaiveDate::parse_from_str(trimmed, DATE_FORMAT).is_err() => {
                return Some(format!("{} must be a date (YYYY-MM-DD)", self.label));
            }
            FieldType::Enum if !self.options.iter().any(|o| o == trimmed) => {
                return Some(format!(
                    "{} must be one of: {}",
                    self.label,
                    self.options.join(", ")
                ));
            }
            _ => {}
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(trimmed) {
                return Some(
                    self.pattern_message
                        .clone()
                        .unwrap_or_else(|| format!("{} has an invalid format", self.label)),
                );
            }
        }

        None
    }
}

/// Run every rule and collect the failures keyed by field name
pub fn validate_fields(rules: &[FieldRule], data: &FormData) -> ErrorMap {
    rules
        .iter()
        .filter_map(|rule| rule.check(data).map(|msg| (rule.name.clone(), msg)))
        .collect()
}
