/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Typed rule / decision-tree IR.
 *
 * This module defines the compiled representation of config functions. The
 * serde layout is the persisted format: enums are externally tagged with the
 * camelCase case names (`boolValue`, `atom`, `logicalExpression`, ...), and
 * enumerations use their wire constant names (`FEATURE_TYPE_BOOL`,
 * `COMPARISON_OPERATOR_EQUALS`, ...).
 */

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Current bundle format version.
pub const BUNDLE_VERSION: &str = "v1";

/// Declared type of a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigType {
    #[serde(rename = "FEATURE_TYPE_BOOL")]
    Bool,
    #[serde(rename = "FEATURE_TYPE_STRING")]
    String,
    #[serde(rename = "FEATURE_TYPE_INT")]
    Int,
    #[serde(rename = "FEATURE_TYPE_FLOAT")]
    Float,
    #[serde(rename = "FEATURE_TYPE_JSON")]
    Json,
    #[serde(rename = "FEATURE_TYPE_PROTO")]
    Proto,
}

impl ConfigType {
    /// Whether `value` has the variant this type requires.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::String, Value::String(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Double(_))
                | (Self::Json, Value::Json(_))
                | (Self::Proto, Value::Message(_))
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "FEATURE_TYPE_BOOL",
            Self::String => "FEATURE_TYPE_STRING",
            Self::Int => "FEATURE_TYPE_INT",
            Self::Float => "FEATURE_TYPE_FLOAT",
            Self::Json => "FEATURE_TYPE_JSON",
            Self::Proto => "FEATURE_TYPE_PROTO",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured value bound to a schema message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageValue {
    /// Fully-qualified message name, e.g. `default.Theme`.
    pub type_name: String,
    /// Field values keyed by snake_case field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// A typed config value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "intValue")]
    Int(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "listValue")]
    List(Vec<Value>),
    #[serde(rename = "messageValue")]
    Message(MessageValue),
    #[serde(rename = "jsonValue")]
    Json(serde_json::Value),
}

impl Value {
    /// Short type name used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Message(_) => "message",
            Self::Json(_) => "json",
        }
    }

    /// Plain JSON rendering without case tags, as served to callers.
    #[must_use]
    pub fn to_plain_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Double(d) => serde_json::Number::from_f64(*d)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_plain_json).collect())
            }
            Self::Message(message) => serde_json::Value::Object(
                message
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_plain_json()))
                    .collect(),
            ),
            Self::Json(json) => json.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "LOGICAL_OPERATOR_AND")]
    And,
    #[serde(rename = "LOGICAL_OPERATOR_OR")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "COMPARISON_OPERATOR_EQUALS")]
    Equals,
    #[serde(rename = "COMPARISON_OPERATOR_NOT_EQUALS")]
    NotEquals,
    #[serde(rename = "COMPARISON_OPERATOR_LESS_THAN")]
    LessThan,
    #[serde(rename = "COMPARISON_OPERATOR_LESS_THAN_OR_EQUALS")]
    LessThanOrEquals,
    #[serde(rename = "COMPARISON_OPERATOR_GREATER_THAN")]
    GreaterThan,
    #[serde(rename = "COMPARISON_OPERATOR_GREATER_THAN_OR_EQUALS")]
    GreaterThanOrEquals,
    #[serde(rename = "COMPARISON_OPERATOR_CONTAINS")]
    Contains,
    #[serde(rename = "COMPARISON_OPERATOR_STARTS_WITH")]
    StartsWith,
    #[serde(rename = "COMPARISON_OPERATOR_ENDS_WITH")]
    EndsWith,
    #[serde(rename = "COMPARISON_OPERATOR_CONTAINED_WITHIN")]
    ContainedWithin,
    #[serde(rename = "COMPARISON_OPERATOR_PRESENT")]
    Present,
}

impl ComparisonOperator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::LessThan => "LESS_THAN",
            Self::LessThanOrEquals => "LESS_THAN_OR_EQUALS",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterThanOrEquals => "GREATER_THAN_OR_EQUALS",
            Self::Contains => "CONTAINS",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::ContainedWithin => "CONTAINED_WITHIN",
            Self::Present => "PRESENT",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalExpression {
    pub logical_operator: LogicalOperator,
    pub rules: Vec<Rule>,
}

/// A single comparison against one context key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atom {
    pub context_key: String,
    pub comparison_operator: ComparisonOperator,
    /// Absent for `PRESENT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub context_key: String,
    /// Parts per hundred thousand, `0..=100000`.
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallExpression {
    Bucket(Bucket),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    BoolConst(bool),
    Not(Box<Rule>),
    LogicalExpression(LogicalExpression),
    Atom(Atom),
    CallExpression(CallExpression),
}

impl Rule {
    pub fn atom(key: impl Into<String>, operator: ComparisonOperator, value: Value) -> Self {
        Self::Atom(Atom {
            context_key: key.into(),
            comparison_operator: operator,
            comparison_value: Some(value),
        })
    }

    pub fn present(key: impl Into<String>) -> Self {
        Self::Atom(Atom {
            context_key: key.into(),
            comparison_operator: ComparisonOperator::Present,
            comparison_value: None,
        })
    }

    pub fn bucket(key: impl Into<String>, threshold: u32) -> Self {
        Self::CallExpression(CallExpression::Bucket(Bucket {
            context_key: key.into(),
            threshold,
        }))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(rule: Rule) -> Self {
        Self::Not(Box::new(rule))
    }

    /// Build an n-ary logical expression, splicing in operands that already
    /// use the same operator.
    pub fn logical(operator: LogicalOperator, operands: impl IntoIterator<Item = Rule>) -> Self {
        let mut rules = Vec::new();
        for operand in operands {
            match operand {
                Self::LogicalExpression(inner) if inner.logical_operator == operator => {
                    rules.extend(inner.rules);
                }
                other => rules.push(other),
            }
        }
        Self::LogicalExpression(LogicalExpression {
            logical_operator: operator,
            rules,
        })
    }

    /// Context keys referenced anywhere in this rule, in first-use order.
    #[must_use]
    pub fn context_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_context_keys(&mut keys);
        keys
    }

    fn collect_context_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        let key = match self {
            Self::BoolConst(_) => return,
            Self::Not(inner) => return inner.collect_context_keys(keys),
            Self::LogicalExpression(expr) => {
                for rule in &expr.rules {
                    rule.collect_context_keys(keys);
                }
                return;
            }
            Self::Atom(atom) => atom.context_key.as_str(),
            Self::CallExpression(CallExpression::Bucket(bucket)) => bucket.context_key.as_str(),
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
}

/// One guarded override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "ruleAstNew")]
    pub rule: Rule,
    pub value: Value,
    /// Refinements evaluated when `rule` matches.
    #[serde(
        rename = "constraints",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Constraint>,
}

impl Constraint {
    pub fn new(rule: Rule, value: Value) -> Self {
        Self {
            rule,
            value,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub default: Value,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// One compiled config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub key: String,
    pub description: String,
    #[serde(rename = "type")]
    pub config_type: ConfigType,
    pub tree: Tree,
}

impl Config {
    /// Depth of the deepest constraint chain; zero when there are no overrides.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn depth_of(constraints: &[Constraint]) -> usize {
            constraints
                .iter()
                .map(|c| 1 + depth_of(&c.children))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.tree.constraints)
    }
}

/// One source file's compiled configs and schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub configs: Vec<Config>,
    #[serde(default)]
    pub schema: crate::schemas::SchemaRegistry,
}

impl Namespace {
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&Config> {
        self.configs.iter().find(|c| c.key == key)
    }
}

/// Multi-namespace artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub version: String,
    pub namespaces: Vec<Namespace>,
}

impl Bundle {
    pub fn new(namespaces: Vec<Namespace>) -> Self {
        Self {
            version: BUNDLE_VERSION.to_string(),
            namespaces,
        }
    }

    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }
}
