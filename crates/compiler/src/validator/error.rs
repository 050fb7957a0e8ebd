/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

/// One problem found in a persisted config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub file: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
    /// JSON pointer into the validated document.
    pub path: Option<String>,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(file: &str, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            line: None,
            column: None,
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{line}:{column}: ", self.file)?,
            (Some(line), None) => write!(f, "{}:{line}: ", self.file)?,
            _ => write!(f, "{}: ", self.file)?,
        }
        f.write_str(&self.message)?;
        if let Some(path) = &self.path {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a valid result with no errors
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a result from collected errors; valid when there are none.
    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Convert a jsonschema error into a [`ValidationError`].
///
/// `jsonschema` reports instance paths but no line/column information, so
/// `line` and `column` stay `None` for schema errors.
pub fn convert_jsonschema_error(
    file_path: &str,
    error: &jsonschema::ValidationError,
) -> ValidationError {
    let instance_path = error.instance_path.to_string();

    ValidationError {
        file: file_path.to_string(),
        line: None,
        column: None,
        message: error.to_string(),
        path: if instance_path.is_empty() {
            None
        } else {
            Some(instance_path)
        },
        suggestion: generate_suggestion_from_error(error),
    }
}

fn generate_suggestion_from_error(error: &jsonschema::ValidationError) -> Option<String> {
    let keyword = format!("{:?}", error.kind);

    if keyword.contains("Required") {
        Some("Add the missing required field".to_string())
    } else if keyword.contains("AdditionalProperties") {
        Some("Remove fields the config format does not define".to_string())
    } else if keyword.contains("Properties") {
        Some("Tagged values and rules must have exactly one case, e.g. {\"boolValue\": true}".to_string())
    } else if keyword.contains("Enum") {
        Some("Check allowed values in the schema".to_string())
    } else if keyword.contains("Pattern") {
        Some("Config keys are kebab-case, e.g. 'new-checkout'".to_string())
    } else if keyword.contains("Type") {
        Some("Check the field type matches the schema".to_string())
    } else {
        None
    }
}
