/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use std::fmt;

use thiserror::Error;

pub use crate::parser::error::ParseError;

/// Position of a source construct, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Top-level error type for the compiler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Compilation error: {0}")]
    Compilation(#[from] CompilationError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Codegen error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CompilerError {
    /// Source location, when the error points at source text.
    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse(err) => Some(err.location()),
            Self::Compilation(err) => Some(&err.location),
            _ => None,
        }
    }
}

/// A grammar or typing violation in one declaration.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {kind}")]
pub struct CompilationError {
    pub location: SourceLocation,
    /// Function or interface the error belongs to.
    pub declaration: Option<String>,
    pub kind: CompilationErrorKind,
}

impl CompilationError {
    pub fn new(location: SourceLocation, kind: CompilationErrorKind) -> Self {
        Self {
            location,
            declaration: None,
            kind,
        }
    }

    #[must_use]
    pub fn in_declaration(mut self, name: impl Into<String>) -> Self {
        if self.declaration.is_none() {
            self.declaration = Some(name.into());
        }
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilationErrorKind {
    #[error("function name '{0}' must match get[A-Z][A-Za-z]*")]
    InvalidFunctionName(String),

    #[error("an explicit return type is required")]
    MissingReturnType,

    #[error("array return types are not supported")]
    ArrayReturnType,

    #[error("unsupported return type '{0}'")]
    UnsupportedReturnType(String),

    #[error("async functions are not allowed for the sync target")]
    AsyncNotAllowed,

    #[error("the legacy async target requires an async function returning Promise<T>")]
    AsyncRequired,

    #[error("config functions take at most one parameter, found {0}")]
    TooManyParameters(usize),

    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),

    #[error("{0} is not allowed in a config function body")]
    DisallowedStatement(String),

    #[error("if branches must be a block containing exactly one return statement")]
    InvalidIfBody,

    #[error("else blocks are not allowed; use else-if chains and a trailing return")]
    ElseBlockNotAllowed,

    #[error("unreachable {0} after the default return")]
    UnreachableStatement(String),

    #[error("a config function must end with a default return statement")]
    MissingDefault,

    #[error("return statement requires a value")]
    MissingReturnValue,

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("comparisons must have the context reference on the left and the literal on the right")]
    LiteralOnLeft,

    #[error("expected a context reference, found {0}")]
    InvalidContextReference(String),

    #[error("context key '{0}' is not declared by the function parameter")]
    UndeclaredContextKey(String),

    #[error("'{name}' is used as a condition but has type {ty}")]
    NonBooleanIdentifier { name: String, ty: String },

    #[error("bucket percentage must be a number between 0 and 100 with at most three decimals, found {0}")]
    InvalidBucketPercentage(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("array elements must all have the same type")]
    MixedArray,

    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    #[error("message '{message}' has no field '{field}'")]
    UnknownField { message: String, field: String },

    #[error("field '{field}' expects {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("value of type {found} does not match declared type {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("union types not supported: {0}")]
    UnionNotSupported(String),

    #[error("arrays of arrays are not supported")]
    ArrayOfArrayNotSupported,

    #[error("only one level of anonymous nested objects is allowed (field '{0}')")]
    NestingTooDeep(String),

    #[error("{0} members are not supported")]
    UnsupportedMember(String),

    #[error("unsupported type '{0}'")]
    UnsupportedType(String),

    #[error("cannot resolve type '{0}'")]
    UnresolvedType(String),

    #[error("config key '{0}' is produced by more than one function")]
    DuplicateConfigKey(String),

    #[error("invalid namespace name '{0}'")]
    InvalidNamespace(String),
}

/// Schema registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("message '{name}' is already registered with a different shape")]
    Conflict { name: String },

    #[error("message '{message}' references unknown message '{reference}'")]
    UnknownReference { message: String, reference: String },
}

/// Serialization errors for JSON and `MessagePack` artifacts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    #[error("MessagePack serialization failed: {0}")]
    MessagePack(String),

    #[error("JSON serialization failed: {0}")]
    Json(String),

    #[error("Invalid artifact structure: {0}")]
    InvalidArtifact(String),
}

/// Errors raised while rendering source from compiled configs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("config '{key}' has nested constraints, which source functions cannot express")]
    UnsupportedNesting { key: String },

    #[error("config '{key}': {reason}")]
    UnsupportedValue { key: String, reason: String },

    #[error("unknown message type '{0}'")]
    UnknownMessage(String),
}

/// Failures reading or writing persisted configs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("namespace '{0}' not found")]
    NamespaceNotFound(String),
}

/// Runtime evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("type mismatch for context key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("operator {operator} is not supported for context key '{key}'")]
    UnsupportedOperator { key: String, operator: String },

    #[error("logical expression has no operands")]
    EmptyLogicalExpression,

    #[error("context key '{key}' holds a boolean, which cannot be bucketed")]
    UnsupportedBucketValue { key: String },

    #[error("bucket threshold {0} is outside [0, 100000]")]
    InvalidThreshold(i64),

    #[error("invalid context: {0}")]
    InvalidContext(String),
}

/// Errors returned by config clients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("config '{namespace}/{key}' not found")]
    NotFound { namespace: String, key: String },

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("transport failure: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let location = SourceLocation::new("lekko/default.ts", 3, 14);
        assert_eq!(location.to_string(), "lekko/default.ts:3:14");
    }

    #[test]
    fn test_compilation_error_display_includes_location() {
        let error = CompilationError::new(
            SourceLocation::new("a.ts", 2, 5),
            CompilationErrorKind::DisallowedStatement("AssignmentExpression".to_string()),
        );
        let text = error.to_string();
        assert!(text.starts_with("a.ts:2:5: "));
        assert!(text.contains("AssignmentExpression"));
    }

    #[test]
    fn test_in_declaration_keeps_first_name() {
        let error = CompilationError::new(SourceLocation::default(), CompilationErrorKind::MixedArray)
            .in_declaration("getInner")
            .in_declaration("getOuter");
        assert_eq!(error.declaration.as_deref(), Some("getInner"));
    }

    #[test]
    fn test_compiler_error_from_compilation_error() {
        let error: CompilerError = CompilationError::new(
            SourceLocation::new("b.ts", 1, 1),
            CompilationErrorKind::MissingDefault,
        )
        .into();
        match &error {
            CompilerError::Compilation(inner) => {
                assert_eq!(inner.kind, CompilationErrorKind::MissingDefault)
            }
            other => panic!("Expected Compilation variant, got {other:?}"),
        }
        assert_eq!(error.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn test_compiler_error_from_schema_error() {
        let error: CompilerError = SchemaError::Conflict {
            name: "default.Theme".to_string(),
        }
        .into();
        assert!(error.to_string().contains("default.Theme"));
        assert!(error.location().is_none());
    }

    #[test]
    fn test_client_error_from_evaluation_error() {
        let error: ClientError = EvaluationError::EmptyLogicalExpression.into();
        assert!(matches!(error, ClientError::Evaluation(_)));
    }
}
