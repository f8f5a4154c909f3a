//! JSON Schema backed [`Schema`] implementation.
//!
//! Documents are compiled once with the `jsonschema` crate (Draft 2020-12).
//! On each validation the form value is serialized to JSON and every
//! reported error becomes an [`Issue`] whose path follows the instance
//! location: object members become key segments and array positions become
//! index segments.

use std::collections::BTreeMap;
use std::fmt;

use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value;

use super::controller::{FormError, FormResult};
use super::key::{FieldKey, PathSegment};
use super::validation::{Issue, Schema};

pub struct JsonSchema {
    validator: Validator,
    messages: BTreeMap<FieldKey, String>,
}

impl JsonSchema {
    /// Compiles `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::SchemaBuild`] if the document is not a valid
    /// schema.
    pub fn new(schema: &Value) -> FormResult<Self> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts
            .build(schema)
            .map_err(|error| FormError::SchemaBuild(error.to_string()))?;
        Ok(Self {
            validator,
            messages: BTreeMap::new(),
        })
    }

    /// Replaces the library message for every error reported at `key`.
    pub fn with_message(mut self, key: impl Into<FieldKey>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    pub fn validate_value(&self, instance: &Value) -> Result<(), Vec<Issue>> {
        let issues = self
            .validator
            .iter_errors(instance)
            .map(|error| {
                let path = instance_path(instance, &error.instance_path.to_string());
                let key = FieldKey::from_path(&path);
                let message = match self.messages.get(&key) {
                    Some(message) => message.clone(),
                    None => error.to_string(),
                };
                Issue { path, message }
            })
            .collect::<Vec<_>>();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl<T> Schema<T> for JsonSchema
where
    T: Serialize,
{
    fn validate(&self, value: &T) -> Result<(), Vec<Issue>> {
        match serde_json::to_value(value) {
            Ok(instance) => self.validate_value(&instance),
            Err(error) => Err(vec![Issue::root(format!(
                "value could not be serialized: {error}"
            ))]),
        }
    }
}

/// Splits a JSON Pointer into path segments, reading the instance to tell
/// array positions from numeric object keys.
fn instance_path(instance: &Value, pointer: &str) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let mut current = Some(instance);
    for raw in pointer.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let segment = match current {
            Some(Value::Array(items)) => match token.parse::<usize>() {
                Ok(index) => {
                    current = items.get(index);
                    PathSegment::Index(index)
                }
                Err(_) => {
                    current = None;
                    PathSegment::Key(token)
                }
            },
            Some(Value::Object(members)) => {
                current = members.get(&token);
                PathSegment::Key(token)
            }
            _ => {
                current = None;
                PathSegment::Key(token)
            }
        };
        path.push(segment);
    }
    path
}
