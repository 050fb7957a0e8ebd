/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Embed the persisted config schema at compile time
/// This avoids file I/O which is not available in WASM environments
const CONFIG_SCHEMA_JSON: &str = include_str!("../../../schemas/config.schema.v1.json");

/// Load the persisted config schema
///
/// Returns the parsed JSON schema as a `serde_json::Value`.
/// This function never fails at runtime since the schema is embedded at compile time.
///
/// # Panics
///
/// Panics if the embedded schema JSON is invalid (this should never happen).
#[must_use]
pub fn load_config_schema() -> serde_json::Value {
    serde_json::from_str(CONFIG_SCHEMA_JSON)
        .expect("Failed to parse embedded config schema - this should never happen")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    String,
    Double,
    Int64,
}

impl ScalarType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Double => "double",
            Self::Int64 => "int64",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Scalar(ScalarType),
    /// Fully-qualified message name.
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// snake_case field name.
    pub name: String,
    /// 1-based, in declaration order.
    pub number: u32,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Fully-qualified name, `{namespace}.{Name}`.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name without the namespace qualifier.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

/// Last segment of a dotted message name.
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Named message schemas of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    #[serde(default)]
    messages: BTreeMap<String, MessageDescriptor>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message.
    ///
    /// Registering the same shape twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Conflict` if the name is taken by a different shape.
    pub fn register(&mut self, descriptor: MessageDescriptor) -> Result<(), SchemaError> {
        match self.messages.get(&descriptor.name) {
            Some(existing) if *existing == descriptor => Ok(()),
            Some(_) => Err(SchemaError::Conflict {
                name: descriptor.name,
            }),
            None => {
                tracing::trace!(message = %descriptor.name, fields = descriptor.fields.len(), "registered message");
                self.messages.insert(descriptor.name.clone(), descriptor);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.messages.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check that every message-typed field names a registered message.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownReference` for the first dangling reference.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        for message in self.messages.values() {
            for field in &message.fields {
                if let FieldType::Message(reference) = &field.field_type {
                    if !self.messages.contains_key(reference) {
                        return Err(SchemaError::UnknownReference {
                            message: message.name.clone(),
                            reference: reference.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Render the registry as a proto3 file for `package {namespace}`.
    #[must_use]
    pub fn to_proto(&self, namespace: &str) -> String {
        let package = proto_package(namespace);
        let mut out = String::new();
        let _ = writeln!(out, "syntax = \"proto3\";");
        let _ = writeln!(out);
        let _ = writeln!(out, "package {package};");

        for message in self.messages.values() {
            let _ = writeln!(out);
            let _ = writeln!(out, "message {} {{", message.short_name());
            for field in &message.fields {
                let label = if field.repeated {
                    "repeated "
                } else if field.optional {
                    "optional "
                } else {
                    ""
                };
                let type_name = match &field.field_type {
                    FieldType::Scalar(scalar) => scalar.as_str().to_string(),
                    FieldType::Message(reference) => {
                        match reference.strip_prefix(&format!("{namespace}.")) {
                            Some(local) => local.to_string(),
                            None => reference.clone(),
                        }
                    }
                };
                let _ = writeln!(
                    out,
                    "  {label}{type_name} {} = {};",
                    field.name, field.number
                );
            }
            let _ = writeln!(out, "}}");
        }
        out
    }
}

/// Proto package names cannot contain dashes.
fn proto_package(namespace: &str) -> String {
    namespace.replace('-', "_")
}
