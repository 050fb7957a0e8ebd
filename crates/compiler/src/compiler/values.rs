//! Value compiler - turns literal return expressions into typed values
//!
//! Only closed-form literals are accepted: booleans, numbers (with an
//! optional unary minus), strings, arrays and object literals. Nothing is
//! ever executed.

use std::collections::BTreeMap;

use crate::ast::{ConfigType, MessageValue, Value};
use crate::compiler::naming::snake_case;
use crate::compiler::source_location;
use crate::error::{CompilationError, CompilationErrorKind};
use crate::parser::{Expr, ExprKind, UnaryOp};
use crate::schemas::{FieldDescriptor, FieldType, ScalarType, SchemaRegistry};

/// The value type a function declares it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Bool,
    String,
    Float,
    Json,
    /// Fully-qualified message name.
    Proto(String),
}

impl DeclaredType {
    #[must_use]
    pub fn config_type(&self) -> ConfigType {
        match self {
            Self::Bool => ConfigType::Bool,
            Self::String => ConfigType::String,
            Self::Float => ConfigType::Float,
            Self::Json => ConfigType::Json,
            Self::Proto(_) => ConfigType::Proto,
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "boolean".to_string(),
            Self::String => "string".to_string(),
            Self::Float => "number".to_string(),
            Self::Json => "JSON object".to_string(),
            Self::Proto(name) => name.clone(),
        }
    }
}

pub struct ValueCompiler<'a> {
    file: &'a str,
    registry: &'a SchemaRegistry,
}

impl<'a> ValueCompiler<'a> {
    pub fn new(file: &'a str, registry: &'a SchemaRegistry) -> Self {
        Self { file, registry }
    }

    /// Compile a return expression against the declared result type.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for non-literal expressions and for values
    /// that do not match the declared type or message schema.
    pub fn compile(&self, expr: &Expr, declared: &DeclaredType) -> Result<Value, CompilationError> {
        match declared {
            DeclaredType::Proto(type_name) => self.compile_message(type_name, expr),
            DeclaredType::Json => to_json(self.file, expr).map(Value::Json),
            scalar => {
                let value = compile_literal(self.file, expr)?;
                if scalar.config_type().accepts(&value) {
                    Ok(value)
                } else {
                    Err(self.error(
                        expr,
                        CompilationErrorKind::TypeMismatch {
                            expected: scalar.describe(),
                            found: literal_kind(expr),
                        },
                    ))
                }
            }
        }
    }

    fn compile_message(&self, type_name: &str, expr: &Expr) -> Result<Value, CompilationError> {
        let ExprKind::Object(properties) = &strip_parens(expr).kind else {
            return Err(self.error(
                expr,
                CompilationErrorKind::TypeMismatch {
                    expected: type_name.to_string(),
                    found: literal_kind(expr),
                },
            ));
        };
        let descriptor = self.registry.get(type_name).ok_or_else(|| {
            self.error(
                expr,
                CompilationErrorKind::UnknownMessageType(type_name.to_string()),
            )
        })?;

        let mut fields = BTreeMap::new();
        for property in properties {
            let field_name = snake_case(&property.key);
            let field = descriptor.field(&field_name).ok_or_else(|| {
                self.error(
                    &property.value,
                    CompilationErrorKind::UnknownField {
                        message: type_name.to_string(),
                        field: property.key.clone(),
                    },
                )
            })?;
            if field.optional && matches!(strip_parens(&property.value).kind, ExprKind::Undefined) {
                continue;
            }
            let value = self.compile_field(field, &property.value)?;
            fields.insert(field_name, value);
        }

        Ok(Value::Message(MessageValue {
            type_name: type_name.to_string(),
            fields,
        }))
    }

    fn compile_field(&self, field: &FieldDescriptor, expr: &Expr) -> Result<Value, CompilationError> {
        if !field.repeated {
            return self.compile_element(&field.field_type, &field.name, expr);
        }
        let ExprKind::Array(elements) = &strip_parens(expr).kind else {
            return Err(self.error(
                expr,
                CompilationErrorKind::FieldTypeMismatch {
                    field: field.name.clone(),
                    expected: "array".to_string(),
                    found: literal_kind(expr),
                },
            ));
        };
        check_homogeneous(self.file, elements)?;
        elements
            .iter()
            .map(|element| self.compile_element(&field.field_type, &field.name, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn compile_element(
        &self,
        field_type: &FieldType,
        field_name: &str,
        expr: &Expr,
    ) -> Result<Value, CompilationError> {
        let scalar = match field_type {
            FieldType::Message(type_name) => return self.compile_message(type_name, expr),
            FieldType::Scalar(scalar) => *scalar,
        };
        let mismatch = || {
            self.error(
                expr,
                CompilationErrorKind::FieldTypeMismatch {
                    field: field_name.to_string(),
                    expected: scalar.as_str().to_string(),
                    found: literal_kind(expr),
                },
            )
        };
        let value = compile_literal(self.file, expr).map_err(|_| mismatch())?;
        match (scalar, value) {
            (ScalarType::Bool, value @ Value::Bool(_))
            | (ScalarType::String, value @ Value::String(_))
            | (ScalarType::Double, value @ Value::Double(_)) => Ok(value),
            (ScalarType::Int64, Value::Double(n)) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Ok(Value::Int(n as i64))
            }
            _ => Err(mismatch()),
        }
    }

    fn error(&self, expr: &Expr, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::new(source_location(self.file, expr.span), kind)
    }
}

pub(crate) fn strip_parens(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Paren(inner) => strip_parens(inner),
        _ => expr,
    }
}

/// Compile a scalar literal: boolean, string, or (signed) number.
pub(crate) fn compile_literal(file: &str, expr: &Expr) -> Result<Value, CompilationError> {
    let expr = strip_parens(expr);
    match &expr.kind {
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::String(s) => Ok(Value::String(s.clone())),
        ExprKind::Number(n) => Ok(Value::Double(*n)),
        ExprKind::Unary {
            op: UnaryOp::Minus,
            operand,
        } => match &strip_parens(operand).kind {
            ExprKind::Number(n) => Ok(Value::Double(-n)),
            _ => Err(unsupported_value(file, expr)),
        },
        _ => Err(unsupported_value(file, expr)),
    }
}

/// Compile an array of scalar literals into a list value.
pub(crate) fn compile_literal_list(file: &str, elements: &[Expr]) -> Result<Value, CompilationError> {
    check_homogeneous(file, elements)?;
    elements
        .iter()
        .map(|element| compile_literal(file, element))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn check_homogeneous(file: &str, elements: &[Expr]) -> Result<(), CompilationError> {
    let Some(first) = elements.first() else {
        return Ok(());
    };
    let kind = literal_kind(first);
    match elements.iter().find(|element| literal_kind(element) != kind) {
        Some(other) => Err(CompilationError::new(
            source_location(file, other.span),
            CompilationErrorKind::MixedArray,
        )),
        None => Ok(()),
    }
}

/// Literal category used for type diagnostics and homogeneity checks.
pub(crate) fn literal_kind(expr: &Expr) -> String {
    let expr = strip_parens(expr);
    match &expr.kind {
        ExprKind::Bool(_) => "boolean".to_string(),
        ExprKind::Number(_) => "number".to_string(),
        ExprKind::Unary {
            op: UnaryOp::Minus,
            operand,
        } if matches!(strip_parens(operand).kind, ExprKind::Number(_)) => "number".to_string(),
        ExprKind::String(_) => "string".to_string(),
        ExprKind::Array(_) => "array".to_string(),
        ExprKind::Object(_) => "object".to_string(),
        ExprKind::Null => "null".to_string(),
        ExprKind::Undefined => "undefined".to_string(),
        other => other.describe(),
    }
}

fn unsupported_value(file: &str, expr: &Expr) -> CompilationError {
    CompilationError::new(
        source_location(file, expr.span),
        CompilationErrorKind::UnsupportedValue(expr.kind.describe()),
    )
}

/// Closed-form JSON literal conversion for `FEATURE_TYPE_JSON` configs.
pub(crate) fn to_json(file: &str, expr: &Expr) -> Result<serde_json::Value, CompilationError> {
    let expr = strip_parens(expr);
    Ok(match &expr.kind {
        ExprKind::Null => serde_json::Value::Null,
        ExprKind::Array(elements) => serde_json::Value::Array(
            elements
                .iter()
                .map(|element| to_json(file, element))
                .collect::<Result<_, _>>()?,
        ),
        ExprKind::Object(properties) => serde_json::Value::Object(
            properties
                .iter()
                .map(|property| Ok((property.key.clone(), to_json(file, &property.value)?)))
                .collect::<Result<_, CompilationError>>()?,
        ),
        _ => match compile_literal(file, expr)? {
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::String(s) => serde_json::Value::String(s),
            Value::Double(n) => json_number(n),
            _ => return Err(unsupported_value(file, expr)),
        },
    })
}

/// Integral numbers stay integers so JSON payloads read back unchanged.
fn json_number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}
