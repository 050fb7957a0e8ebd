/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */

pub mod common;
pub mod config;
pub mod error;


use serde_json::Value;

use crate::schemas::{self, SchemaRegistry};
use crate::validator::config::validate_config as validate_config_impl;
use crate::validator::error::{ValidationError, ValidationResult};

/// Validates persisted config documents before they are trusted.
///
/// Runs the embedded JSON Schema and then semantic checks the schema cannot
/// express (type agreement, thresholds, operator arity, message names).
pub struct Validator {
    config_schema: Value,
    registry: Option<SchemaRegistry>,
}

impl Validator {
    /// Create a new Validator instance with the embedded schema.
    pub fn new() -> Self {
        Self {
            config_schema: schemas::load_config_schema(),
            registry: None,
        }
    }

    /// Create a new Validator instance with a custom schema.
    pub fn with_schema(config_schema: Value) -> Self {
        Self {
            config_schema,
            registry: None,
        }
    }

    /// Also require message values to name a message in `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate one persisted config.
    pub fn validate_config(&self, file_path: &str, data: &Value) -> ValidationResult {
        validate_config_impl(&self.config_schema, self.registry.as_ref(), file_path, data)
    }

    /// Format validation errors for display.
    pub fn format_errors(&self, errors: &[ValidationError]) -> String {
        if errors.is_empty() {
            return String::new();
        }

        let mut error_lines = vec!["✗ Validation failed\n".to_string()];

        for error in errors {
            error_lines.push(self.format_error_location(error));
            error_lines.push(format!("  Error: {}", error.message));

            if let Some(path) = &error.path {
                error_lines.push(format!("  Path: {path}"));
            }

            if let Some(suggestion) = &error.suggestion {
                error_lines.push(format!("  Suggestion: {suggestion}"));
            }

            error_lines.push(String::new());
        }

        error_lines.join("\n")
    }

    fn format_error_location(&self, error: &ValidationError) -> String {
        if let Some(line) = error.line {
            let column = error.column.map(|c| format!(":{c}")).unwrap_or_default();
            format!("{}:{line}{column}", error.file)
        } else {
            error.file.clone()
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
