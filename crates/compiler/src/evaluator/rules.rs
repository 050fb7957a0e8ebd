/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use crate::ast::{Atom, Bucket, CallExpression, ComparisonOperator, LogicalOperator, Rule, Value};
use crate::error::EvaluationError;
use crate::evaluator::bucket::{bucket_hash, in_bucket, MAX_THRESHOLD};
use crate::evaluator::context::{Context, ContextValue};

/// Identifies the config a rule belongs to; bucketing salts with it.
#[derive(Debug, Clone, Copy)]
pub struct RuleScope<'a> {
    pub namespace: &'a str,
    pub config_key: &'a str,
}

/// Evaluate a rule against a context.
///
/// Missing context keys fail every test except `PRESENT`. Type mismatches
/// between the rule and the context are errors.
///
/// # Errors
///
/// Returns an `EvaluationError` for type mismatches, empty logical
/// expressions and invalid bucket inputs.
pub fn evaluate_rule(
    rule: &Rule,
    scope: RuleScope<'_>,
    context: &Context,
) -> Result<bool, EvaluationError> {
    match rule {
        Rule::BoolConst(b) => Ok(*b),
        Rule::Not(inner) => Ok(!evaluate_rule(inner, scope, context)?),
        Rule::LogicalExpression(expr) => {
            if expr.rules.is_empty() {
                return Err(EvaluationError::EmptyLogicalExpression);
            }
            match expr.logical_operator {
                LogicalOperator::And => {
                    for rule in &expr.rules {
                        if !evaluate_rule(rule, scope, context)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                LogicalOperator::Or => {
                    for rule in &expr.rules {
                        if evaluate_rule(rule, scope, context)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        }
        Rule::Atom(atom) => evaluate_atom(atom, context),
        Rule::CallExpression(CallExpression::Bucket(bucket)) => {
            evaluate_bucket(bucket, scope, context)
        }
    }
}

fn evaluate_atom(atom: &Atom, context: &Context) -> Result<bool, EvaluationError> {
    let actual = context.get(&atom.context_key);
    if atom.comparison_operator == ComparisonOperator::Present {
        return Ok(actual.is_some());
    }
    let Some(actual) = actual else {
        return Ok(false);
    };
    let expected = atom.comparison_value.as_ref().ok_or_else(|| {
        EvaluationError::UnsupportedOperator {
            key: atom.context_key.clone(),
            operator: format!("{} without a comparison value", atom.comparison_operator),
        }
    })?;

    match atom.comparison_operator {
        ComparisonOperator::Equals => equals(&atom.context_key, expected, actual),
        ComparisonOperator::NotEquals => Ok(!equals(&atom.context_key, expected, actual)?),
        ComparisonOperator::LessThan
        | ComparisonOperator::LessThanOrEquals
        | ComparisonOperator::GreaterThan
        | ComparisonOperator::GreaterThanOrEquals => {
            let expected = number(&atom.context_key, expected)?;
            let actual = actual
                .as_f64()
                .ok_or_else(|| mismatch(&atom.context_key, "number", actual.kind_name()))?;
            Ok(match atom.comparison_operator {
                ComparisonOperator::LessThan => actual < expected,
                ComparisonOperator::LessThanOrEquals => actual <= expected,
                ComparisonOperator::GreaterThan => actual > expected,
                _ => actual >= expected,
            })
        }
        ComparisonOperator::StartsWith
        | ComparisonOperator::EndsWith
        | ComparisonOperator::Contains => {
            let Value::String(expected) = expected else {
                return Err(mismatch(&atom.context_key, "string", expected.kind_name()));
            };
            let ContextValue::String(actual) = actual else {
                return Err(mismatch(&atom.context_key, "string", actual.kind_name()));
            };
            Ok(match atom.comparison_operator {
                ComparisonOperator::StartsWith => actual.starts_with(expected.as_str()),
                ComparisonOperator::EndsWith => actual.ends_with(expected.as_str()),
                _ => actual.contains(expected.as_str()),
            })
        }
        ComparisonOperator::ContainedWithin => {
            let Value::List(items) = expected else {
                return Err(mismatch(&atom.context_key, "list", expected.kind_name()));
            };
            for item in items {
                if equals(&atom.context_key, item, actual)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ComparisonOperator::Present => Ok(true),
    }
}

/// Typed equality between a rule value and a context value.
fn equals(key: &str, expected: &Value, actual: &ContextValue) -> Result<bool, EvaluationError> {
    match (expected, actual) {
        (Value::Bool(a), ContextValue::Bool(b)) => Ok(a == b),
        (Value::String(a), ContextValue::String(b)) => Ok(a == b),
        (Value::Int(a), ContextValue::Int(b)) => Ok(a == b),
        (Value::Int(_) | Value::Double(_), ContextValue::Int(_) | ContextValue::Double(_)) => {
            Ok(Some(number(key, expected)?) == actual.as_f64())
        }
        (Value::Bool(_) | Value::String(_) | Value::Int(_) | Value::Double(_), _) => {
            Err(mismatch(key, expected.kind_name(), actual.kind_name()))
        }
        _ => Err(EvaluationError::UnsupportedOperator {
            key: key.to_string(),
            operator: format!("EQUALS on {}", expected.kind_name()),
        }),
    }
}

fn number(key: &str, value: &Value) -> Result<f64, EvaluationError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Double(n) => Ok(*n),
        other => Err(mismatch(key, "number", other.kind_name())),
    }
}

fn evaluate_bucket(
    bucket: &Bucket,
    scope: RuleScope<'_>,
    context: &Context,
) -> Result<bool, EvaluationError> {
    if bucket.threshold > MAX_THRESHOLD {
        return Err(EvaluationError::InvalidThreshold(i64::from(bucket.threshold)));
    }
    let Some(value) = context.get(&bucket.context_key) else {
        return Ok(false);
    };
    let hash = bucket_hash(scope.namespace, scope.config_key, &bucket.context_key, value)
        .ok_or_else(|| EvaluationError::UnsupportedBucketValue {
            key: bucket.context_key.clone(),
        })?;
    Ok(in_bucket(hash, bucket.threshold))
}

fn mismatch(key: &str, expected: &str, found: &str) -> EvaluationError {
    EvaluationError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
