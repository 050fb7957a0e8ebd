/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiler::naming::snake_case;
use crate::error::EvaluationError;

/// A scalar bound in an evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl ContextValue {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
        }
    }

    /// Numeric view of int and double values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Immutable key/value bindings a config is evaluated against.
///
/// Keys are storage keys (snake_case).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, ContextValue>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Build a context from a JSON object as written by callers.
    ///
    /// camelCase keys become snake_case storage keys. Integral numbers are
    /// stored as ints, other numbers as doubles.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidContext` when `json` is not an object
    /// or holds a non-scalar value.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, EvaluationError> {
        let serde_json::Value::Object(map) = json else {
            return Err(EvaluationError::InvalidContext(
                "context must be a JSON object".to_string(),
            ));
        };
        let mut builder = ContextBuilder::default();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::Bool(b) => ContextValue::Bool(*b),
                serde_json::Value::String(s) => ContextValue::String(s.clone()),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => ContextValue::Int(i),
                    None => ContextValue::Double(n.as_f64().unwrap_or(f64::NAN)),
                },
                other => {
                    return Err(EvaluationError::InvalidContext(format!(
                        "'{key}' must be a boolean, number or string, found {other}"
                    )))
                }
            };
            builder = builder.set(snake_case(key), value);
        }
        Ok(builder.build())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&pairs.join(", "))
    }
}

/// Builder for [`Context`] using explicit storage keys.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    values: BTreeMap<String, ContextValue>,
}

impl ContextBuilder {
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Context {
        Context {
            values: self.values,
        }
    }
}
