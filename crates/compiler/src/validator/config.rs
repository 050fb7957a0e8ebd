/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */

use serde_json::Value as Json;

use crate::ast::{CallExpression, ComparisonOperator, Config, Constraint, Rule, Value};
use crate::evaluator::bucket::MAX_THRESHOLD;
use crate::schemas::SchemaRegistry;
use crate::validator::common::validate_with_schema;
use crate::validator::error::{ValidationError, ValidationResult};

/// Validate one persisted config document.
pub fn validate_config(
    schema: &Json,
    registry: Option<&SchemaRegistry>,
    file_path: &str,
    data: &Json,
) -> ValidationResult {
    validate_with_schema(schema, file_path, data, |file, data| {
        match serde_json::from_value::<Config>(data.clone()) {
            Ok(config) => ConfigChecker {
                file,
                registry,
                errors: Vec::new(),
            }
            .check(&config),
            Err(err) => vec![ValidationError::new(file, format!("Malformed config: {err}"))],
        }
    })
}

struct ConfigChecker<'a> {
    file: &'a str,
    registry: Option<&'a SchemaRegistry>,
    errors: Vec<ValidationError>,
}

impl ConfigChecker<'_> {
    fn check(mut self, config: &Config) -> Vec<ValidationError> {
        self.check_value(config, &config.tree.default, "/tree/default");
        self.check_constraints(config, &config.tree.constraints, "/tree/constraints");
        self.errors
    }

    fn check_constraints(&mut self, config: &Config, constraints: &[Constraint], path: &str) {
        for (index, constraint) in constraints.iter().enumerate() {
            let path = format!("{path}/{index}");
            self.check_rule(&constraint.rule, &format!("{path}/ruleAstNew"));
            self.check_value(config, &constraint.value, &format!("{path}/value"));
            self.check_constraints(config, &constraint.children, &format!("{path}/constraints"));
        }
    }

    fn check_value(&mut self, config: &Config, value: &Value, path: &str) {
        if !config.config_type.accepts(value) {
            self.push(
                ValidationError::new(
                    self.file,
                    format!(
                        "Value of kind {} does not match config type {}",
                        value.kind_name(),
                        config.config_type
                    ),
                )
                .at(path),
            );
        }
        self.check_message_types(value, path);
    }

    fn check_message_types(&mut self, value: &Value, path: &str) {
        match value {
            Value::Message(message) => {
                if let Some(registry) = self.registry {
                    if !registry.contains(&message.type_name) {
                        self.push(
                            ValidationError::new(
                                self.file,
                                format!("Unknown message type '{}'", message.type_name),
                            )
                            .at(format!("{path}/messageValue/typeName"))
                            .suggest("Sync the namespace schema before its configs"),
                        );
                    }
                }
                for (name, field) in &message.fields {
                    self.check_message_types(field, &format!("{path}/messageValue/fields/{name}"));
                }
            }
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.check_message_types(item, &format!("{path}/listValue/{index}"));
                }
            }
            _ => {}
        }
    }

    fn check_rule(&mut self, rule: &Rule, path: &str) {
        match rule {
            Rule::BoolConst(_) => {}
            Rule::Not(inner) => self.check_rule(inner, &format!("{path}/not")),
            Rule::LogicalExpression(expr) => {
                if expr.rules.is_empty() {
                    self.push(
                        ValidationError::new(self.file, "Logical expression has no rules")
                            .at(format!("{path}/logicalExpression/rules")),
                    );
                }
                for (index, rule) in expr.rules.iter().enumerate() {
                    self.check_rule(rule, &format!("{path}/logicalExpression/rules/{index}"));
                }
            }
            Rule::Atom(atom) => {
                let has_value = atom.comparison_value.is_some();
                let path = format!("{path}/atom");
                match (atom.comparison_operator, has_value) {
                    (ComparisonOperator::Present, true) => self.push(
                        ValidationError::new(self.file, "PRESENT takes no comparison value")
                            .at(format!("{path}/comparisonValue")),
                    ),
                    (ComparisonOperator::Present, false) | (_, true) => {}
                    (operator, false) => self.push(
                        ValidationError::new(
                            self.file,
                            format!("{operator} requires a comparison value"),
                        )
                        .at(path),
                    ),
                }
            }
            Rule::CallExpression(CallExpression::Bucket(bucket)) => {
                if bucket.threshold > MAX_THRESHOLD {
                    self.push(
                        ValidationError::new(
                            self.file,
                            format!(
                                "Bucket threshold {} is outside [0, {MAX_THRESHOLD}]",
                                bucket.threshold
                            ),
                        )
                        .at(format!("{path}/callExpression/bucket/threshold"))
                        .suggest("Thresholds are percentages times 1000, e.g. 25% is 25000"),
                    );
                }
            }
        }
    }

    fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}
