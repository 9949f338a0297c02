//! Accumulated form values and field error maps

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name -> human readable message
pub type ErrorMap = BTreeMap<String, String>;

/// Partial form data: an ordered map of field names to JSON values.
///
/// Every step contributes a subset of fields; patches are merged shallowly,
/// so a patch replaces whole top-level values and never deep-merges objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single-field patch
    pub fn with(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut data = Self::new();
        data.insert(key, value);
        data
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a field, if it holds a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow-merge `patch` into self.
    ///
    /// Returns the keys whose stored value actually changed. Keys present in
    /// the patch with an identical value are not reported.
    pub fn merge(&mut self, patch: &FormData) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in patch.iter() {
            if self.0.get(key) != Some(value) {
                self.0.insert(key.clone(), value.clone());
                changed.push(key.clone());
            }
        }
        changed
    }

    /// Deserialize the accumulated data into a caller-defined entity shape
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
