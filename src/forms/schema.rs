//! Schema definitions for declarative forms

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form_data::FormData;
use crate::wizard::SuccessView;

/// A complete form: ordered steps of fields plus the success view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Unique form key, also the draft namespace (e.g. `event`)
    pub key: String,
    /// Display name of the form
    pub name: String,
    /// Brief description shown in form listings
    #[serde(default)]
    pub description: String,
    pub steps: Vec<StepDefinition>,
    /// View shown after a successful submit
    #[serde(default)]
    pub success: SuccessView,
}

/// One wizard step of a form definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step identifier, unique within the form
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Glyph shown in the progress bar
    #[serde(default)]
    pub icon: Option<String>,
    /// Optional steps can be skipped without validation
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub kind: StepKind,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// How a step is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Editable field list
    #[default]
    Fields,
    /// Read-only summary of every answer so far
    Review,
}

/// Schema definition for a single field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Key of the value in the form data
    pub name: String,
    /// Label shown next to the input; defaults to `name`
    #[serde(default)]
    pub label: Option<String>,
    /// Help text for the field
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Default value; `"true"`/`"false"` for bool fields
    #[serde(default)]
    pub default: Option<String>,
    /// Options for enum fields
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regular expression the whole value must match
    #[serde(default)]
    pub pattern: Option<String>,
    /// Message used when `pattern` does not match
    #[serde(default)]
    pub pattern_message: Option<String>,
}

/// Types of fields supported in form schemas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text input
    String,
    /// Multi-line text input
    Text,
    /// Selection from predefined options
    Enum,
    /// Yes/no toggle
    Bool,
    /// Date field (YYYY-MM-DD format)
    Date,
}

impl FormDefinition {
    /// Parse a form definition from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every field across all steps, in step order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields().find(|f| f.name == name)
    }

    /// Form data seeded from field defaults
    pub fn initial_data(&self) -> FormData {
        self.fields()
            .filter_map(|field| field.default_value().map(|v| (field.name.clone(), v)))
            .collect()
    }
}

impl FieldSchema {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// The default converted to the JSON type this field stores
    pub fn default_value(&self) -> Option<Value> {
        let default = self.default.as_ref()?;
        Some(match self.field_type {
            FieldType::Bool => Value::Bool(parse_bool(default)),
            _ => Value::String(default.clone()),
        })
    }
}

pub(crate) fn parse_bool(s: &str) -> bool {
    matches!(s, "true" | "yes")
}
