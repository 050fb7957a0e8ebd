/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Parser-specific error types.
 */

use thiserror::Error;

use crate::error::SourceLocation;

/// Parser error type for malformed or unsupported source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{location}: unexpected character '{found}'")]
    UnexpectedCharacter { location: SourceLocation, found: char },

    #[error("{location}: unterminated {what}")]
    Unterminated {
        location: SourceLocation,
        what: &'static str,
    },

    #[error("{location}: invalid number literal '{text}'")]
    InvalidNumber { location: SourceLocation, text: String },

    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        location: SourceLocation,
        expected: String,
        found: String,
    },

    #[error("{location}: {construct} is not supported")]
    Unsupported {
        location: SourceLocation,
        construct: String,
    },
}

impl ParseError {
    /// Location of the offending source construct.
    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::UnexpectedCharacter { location, .. }
            | Self::Unterminated { location, .. }
            | Self::InvalidNumber { location, .. }
            | Self::UnexpectedToken { location, .. }
            | Self::Unsupported { location, .. } => location,
        }
    }
}
