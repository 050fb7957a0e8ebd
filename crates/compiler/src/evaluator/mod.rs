/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Decision-tree evaluator.
//!
//! Pure and stateless: the same config and context always produce the same
//! value and path.

pub mod bucket;
pub mod context;
pub mod rules;

use serde::{Deserialize, Serialize};

use crate::ast::{Config, Constraint, Value};
use crate::error::EvaluationError;

pub use context::{Context, ContextBuilder, ContextValue};
pub use rules::{evaluate_rule, RuleScope};

/// Value selected for a context, and the constraint indices that led to it.
///
/// An empty path means the default was returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub value: Value,
    pub path: Vec<usize>,
}

/// Evaluate `config` from `namespace` against `context`.
///
/// # Errors
///
/// Propagates rule evaluation errors; nothing is swallowed.
pub fn evaluate(
    config: &Config,
    namespace: &str,
    context: &Context,
) -> Result<EvaluationResult, EvaluationError> {
    let scope = RuleScope {
        namespace,
        config_key: &config.key,
    };
    let result = match traverse(&config.tree.constraints, scope, context)? {
        Some((value, path)) => EvaluationResult {
            value: value.clone(),
            path,
        },
        None => EvaluationResult {
            value: config.tree.default.clone(),
            path: Vec::new(),
        },
    };
    tracing::debug!(namespace, key = %config.key, path = ?result.path, "evaluated config");
    Ok(result)
}

/// First matching constraint among siblings, descending into its children.
fn traverse<'c>(
    constraints: &'c [Constraint],
    scope: RuleScope<'_>,
    context: &Context,
) -> Result<Option<(&'c Value, Vec<usize>)>, EvaluationError> {
    for (index, constraint) in constraints.iter().enumerate() {
        if !evaluate_rule(&constraint.rule, scope, context)? {
            continue;
        }
        let mut path = vec![index];
        let value = match traverse(&constraint.children, scope, context)? {
            Some((value, child_path)) => {
                path.extend(child_path);
                value
            }
            None => &constraint.value,
        };
        return Ok(Some((value, path)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComparisonOperator, ConfigType, Rule, Tree};
    use pretty_assertions::assert_eq;

    fn config(default: Value, constraints: Vec<Constraint>) -> Config {
        Config {
            key: "new-checkout".to_string(),
            description: "test".to_string(),
            config_type: ConfigType::Bool,
            tree: Tree {
                default,
                constraints,
            },
        }
    }

    fn env_is(env: &str) -> Rule {
        Rule::atom(
            "env",
            ComparisonOperator::Equals,
            Value::String(env.to_string()),
        )
    }

    #[test]
    fn test_matching_constraint_and_default() {
        let config = config(
            Value::Bool(false),
            vec![Constraint::new(env_is("prod"), Value::Bool(true))],
        );
        let prod = Context::builder().set("env", "prod").build();
        let dev = Context::builder().set("env", "dev").build();

        assert_eq!(
            evaluate(&config, "default", &prod).unwrap(),
            EvaluationResult {
                value: Value::Bool(true),
                path: vec![0]
            }
        );
        assert_eq!(
            evaluate(&config, "default", &dev).unwrap(),
            EvaluationResult {
                value: Value::Bool(false),
                path: vec![]
            }
        );
    }

    #[test]
    fn test_missing_key_falls_through_to_default() {
        let config = config(
            Value::Bool(false),
            vec![Constraint::new(Rule::present("version"), Value::Bool(true))],
        );
        let result = evaluate(&config, "default", &Context::new()).unwrap();
        assert_eq!(result.value, Value::Bool(false));
        assert!(result.path.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let config = config(
            Value::Bool(false),
            vec![
                Constraint::new(env_is("dev"), Value::Bool(false)),
                Constraint::new(Rule::BoolConst(true), Value::Bool(true)),
                Constraint::new(env_is("prod"), Value::Bool(false)),
            ],
        );
        let prod = Context::builder().set("env", "prod").build();
        assert_eq!(evaluate(&config, "default", &prod).unwrap().path, vec![1]);
    }

    #[test]
    fn test_nested_children_extend_path() {
        let mut parent = Constraint::new(env_is("prod"), Value::String("parent".to_string()));
        parent.children = vec![
            Constraint::new(Rule::present("missing"), Value::String("skipped".to_string())),
            Constraint::new(Rule::present("region"), Value::String("child".to_string())),
        ];
        let config = config(Value::String("default".to_string()), vec![parent]);

        let with_region = Context::builder().set("env", "prod").set("region", "eu").build();
        let result = evaluate(&config, "default", &with_region).unwrap();
        assert_eq!(result.value, Value::String("child".to_string()));
        assert_eq!(result.path, vec![0, 1]);

        let without_region = Context::builder().set("env", "prod").build();
        let result = evaluate(&config, "default", &without_region).unwrap();
        assert_eq!(result.value, Value::String("parent".to_string()));
        assert_eq!(result.path, vec![0]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let config = config(
            Value::Bool(false),
            vec![Constraint::new(Rule::bucket("user_id", 50_000), Value::Bool(true))],
        );
        let context = Context::builder().set("user_id", "user-1").build();
        let first = evaluate(&config, "default", &context).unwrap();
        for _ in 0..10 {
            assert_eq!(evaluate(&config, "default", &context).unwrap(), first);
        }
    }

    #[test]
    fn test_errors_propagate() {
        let config = config(
            Value::Bool(false),
            vec![Constraint::new(env_is("prod"), Value::Bool(true))],
        );
        let context = Context::builder().set("env", true).build();
        assert!(matches!(
            evaluate(&config, "default", &context),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }
}
