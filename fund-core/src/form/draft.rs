use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A record that a multi-step form accumulates.
///
/// The form controller never inspects the record; it only hands patches to
/// [`Draft::apply`]. Implementations must replace the single field named by
/// the patch and leave every other field untouched.
pub trait Draft: Clone + fmt::Debug {
    /// One field update.
    type Patch: FieldPatch;

    fn apply(
        &mut self,
        patch: Self::Patch,
    );
}

/// A single-field update message.
pub trait FieldPatch: fmt::Debug {
    /// Name of the field this patch replaces.
    fn field(&self) -> &str;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("draft record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Open key/value draft for forms whose shape is only known to the caller.
///
/// Field order is insertion order; patching an existing field keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftRecord(IndexMap<String, Value>);

impl DraftRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the record into a JSON object, e.g. to use as a request body.
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DraftRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for DraftRecord {
    type Error = DraftError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            Value::Null => Err(DraftError::NotAnObject("null")),
            Value::Bool(_) => Err(DraftError::NotAnObject("a boolean")),
            Value::Number(_) => Err(DraftError::NotAnObject("a number")),
            Value::String(_) => Err(DraftError::NotAnObject("a string")),
            Value::Array(_) => Err(DraftError::NotAnObject("an array")),
        }
    }
}

/// Patch for a [`DraftRecord`]: set `field` to `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub value: Value,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl FieldPatch for FieldChange {
    fn field(&self) -> &str {
        &self.field
    }
}

impl Draft for DraftRecord {
    type Patch = FieldChange;

    fn apply(
        &mut self,
        patch: FieldChange,
    ) {
        self.0.insert(patch.field, patch.value);
    }
}
