//! Splitting backend validation errors into per-field and general messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_FALLBACK: &str = "An unknown error occurred.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrors {
    pub field_errors: BTreeMap<String, String>,
    pub non_field_error: Option<String>,
}

impl BackendErrors {
    pub fn field(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }

    /// Builds field errors directly, e.g. for client-side validation.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            field_errors: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            non_field_error: None,
        }
    }
}

impl fmt::Display for BackendErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut parts: Vec<String> = self
            .field_errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        if let Some(message) = &self.non_field_error {
            parts.push(message.clone());
        }
        f.write_str(&parts.join("; "))
    }
}

/// Flattens one error value: strings as-is, lists space-joined, anything
/// else as JSON text.
fn message_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(message_of)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

/// Splits an error body into errors for `known_fields` and one combined
/// message for every other key.
///
/// If the body is missing, not an object, or yields nothing, the general
/// message is `fallback`.
pub fn parse_backend_errors(
    body: Option<&Value>,
    known_fields: &[&str],
    fallback: &str,
) -> BackendErrors {
    let mut errors = BackendErrors::default();

    if let Some(Value::Object(map)) = body {
        for (key, value) in map {
            let message = message_of(value);
            if known_fields.contains(&key.as_str()) {
                errors.field_errors.insert(key.clone(), message);
            } else {
                errors.non_field_error = Some(match errors.non_field_error.take() {
                    Some(prev) => format!("{prev} {message}"),
                    None => message,
                });
            }
        }
    }

    if errors.non_field_error.is_none() && errors.field_errors.is_empty() {
        errors.non_field_error = Some(fallback.to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn splits_known_and_unknown_keys() {
        let body = json!({
            "name": ["This field may not be blank."],
            "target": ["Ensure this value is greater than or equal to 0.01."],
            "detail": "Invalid request."
        });
        let errors = parse_backend_errors(Some(&body), &["name", "target"], DEFAULT_FALLBACK);

        assert_eq!(errors.field("name"), Some("This field may not be blank."));
        assert_eq!(
            errors.field("target"),
            Some("Ensure this value is greater than or equal to 0.01.")
        );
        assert_eq!(errors.non_field_error.as_deref(), Some("Invalid request."));
    }

    #[test]
    fn unknown_keys_are_joined() {
        let body = json!({"detail": "Nope.", "non_field_errors": ["Twice.", "Really."]});
        let errors = parse_backend_errors(Some(&body), &[], DEFAULT_FALLBACK);
        assert_eq!(
            errors.non_field_error.as_deref(),
            Some("Nope. Twice. Really.")
        );
    }

    #[test]
    fn falls_back_when_nothing_usable() {
        for body in [None, Some(json!({})), Some(json!("oops"))] {
            let errors = parse_backend_errors(body.as_ref(), &["name"], "Failed to save.");
            assert_eq!(
                errors,
                BackendErrors {
                    field_errors: BTreeMap::new(),
                    non_field_error: Some("Failed to save.".to_string()),
                }
            );
        }
    }

    #[test]
    fn field_errors_alone_need_no_fallback() {
        let body = json!({"city": "Too long."});
        let errors = parse_backend_errors(Some(&body), &["city"], DEFAULT_FALLBACK);
        assert_eq!(errors.non_field_error, None);
        assert_eq!(errors.to_string(), "city: Too long.");
    }
}
