/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Renders compiled configs back into config-function source.
//!
//! Recompiling the output yields structurally equal configs, except that
//! `intValue` numbers come back as doubles.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::ast::{
    CallExpression, ComparisonOperator, Config, ConfigType, LogicalOperator, Namespace, Rule,
    Value,
};
use crate::compiler::naming::{camel_case, function_name};
use crate::compiler::DEFAULT_DESCRIPTION;
use crate::error::CodegenError;
use crate::schemas::{short_name, FieldType, MessageDescriptor, ScalarType};

/// Renderable shape of one namespace file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceModel {
    pub namespace: String,
    pub interfaces: Vec<InterfaceModel>,
    pub functions: Vec<FunctionModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceModel {
    pub name: String,
    pub members: Vec<MemberModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberModel {
    pub name: String,
    pub optional: bool,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionModel {
    pub name: String,
    /// Doc comment lines; empty for the default description.
    pub doc: Vec<String>,
    /// Destructured context bindings.
    pub params: Vec<MemberModel>,
    pub return_type: String,
    pub branches: Vec<BranchModel>,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchModel {
    pub condition: String,
    pub value: String,
}

impl FunctionModel {
    /// `{ a, b }: { a: string; b: number }`, or empty without bindings.
    #[must_use]
    pub fn signature_params(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        let types: Vec<String> = self.params.iter().map(MemberModel::declaration).collect();
        format!("{{ {} }}: {{ {} }}", names.join(", "), types.join("; "))
    }
}

impl MemberModel {
    fn declaration(&self) -> String {
        let optional = if self.optional { "?" } else { "" };
        format!("{}{optional}: {}", self.name, self.ty)
    }
}

/// Build the renderable model of a namespace.
///
/// # Errors
///
/// Returns a `CodegenError` for nested constraints, empty logical
/// expressions and values the source grammar cannot express.
pub fn source_model(namespace: &Namespace) -> Result<SourceModel, CodegenError> {
    let interfaces = namespace.schema.messages().map(interface_model).collect();
    let functions = namespace
        .configs
        .iter()
        .map(function_model)
        .collect::<Result<_, _>>()?;
    Ok(SourceModel {
        namespace: namespace.name.clone(),
        interfaces,
        functions,
    })
}

/// Render a namespace as one source file.
///
/// # Errors
///
/// See [`source_model`].
pub fn generate_namespace_source(namespace: &Namespace) -> Result<String, CodegenError> {
    let model = source_model(namespace)?;
    let mut out = String::new();

    for interface in &model.interfaces {
        let _ = writeln!(out, "export interface {} {{", interface.name);
        for member in &interface.members {
            let _ = writeln!(out, "  {};", member.declaration());
        }
        out.push_str("}\n\n");
    }

    for function in &model.functions {
        match function.doc.as_slice() {
            [] => {}
            [line] => {
                let _ = writeln!(out, "/** {line} */");
            }
            lines => {
                out.push_str("/**\n");
                for line in lines {
                    let _ = writeln!(out, " * {line}");
                }
                out.push_str(" */\n");
            }
        }
        let _ = writeln!(
            out,
            "export function {}({}): {} {{",
            function.name,
            function.signature_params(),
            function.return_type
        );
        for branch in &function.branches {
            let _ = writeln!(out, "  if ({}) {{", branch.condition);
            let _ = writeln!(out, "    return {};", branch.value);
            out.push_str("  }\n");
        }
        let _ = writeln!(out, "  return {};", function.default);
        out.push_str("}\n\n");
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    Ok(out)
}

fn interface_model(message: &MessageDescriptor) -> InterfaceModel {
    InterfaceModel {
        name: message.short_name().to_string(),
        members: message
            .fields
            .iter()
            .map(|field| {
                let element = match &field.field_type {
                    FieldType::Scalar(scalar) => scalar_type(*scalar).to_string(),
                    FieldType::Message(name) => short_name(name).to_string(),
                };
                MemberModel {
                    name: camel_case(&field.name),
                    optional: field.optional,
                    ty: if field.repeated {
                        format!("{element}[]")
                    } else {
                        element
                    },
                }
            })
            .collect(),
    }
}

fn scalar_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "boolean",
        ScalarType::String => "string",
        ScalarType::Double | ScalarType::Int64 => "number",
    }
}

fn function_model(config: &Config) -> Result<FunctionModel, CodegenError> {
    let key = config.key.as_str();
    let unsupported = |reason: String| CodegenError::UnsupportedValue {
        key: key.to_string(),
        reason,
    };

    let return_type = match config.config_type {
        ConfigType::Bool => "boolean".to_string(),
        ConfigType::String => "string".to_string(),
        ConfigType::Int | ConfigType::Float => "number".to_string(),
        ConfigType::Json => "Record<string, unknown>".to_string(),
        ConfigType::Proto => match &config.tree.default {
            Value::Message(message) => short_name(&message.type_name).to_string(),
            other => {
                return Err(unsupported(format!(
                    "proto config with a {} default",
                    other.kind_name()
                )))
            }
        },
    };

    let mut bindings = Bindings::default();
    let mut branches = Vec::with_capacity(config.tree.constraints.len());
    for constraint in &config.tree.constraints {
        if !constraint.children.is_empty() {
            return Err(CodegenError::UnsupportedNesting {
                key: key.to_string(),
            });
        }
        bindings.collect(&constraint.rule);
        branches.push(BranchModel {
            condition: render_rule(key, &constraint.rule)?,
            value: render_value(key, &constraint.value)?,
        });
    }

    let doc = if config.description == DEFAULT_DESCRIPTION {
        Vec::new()
    } else {
        config
            .description
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    };

    Ok(FunctionModel {
        name: function_name(key),
        doc,
        params: bindings.into_members(),
        return_type,
        branches,
        default: render_value(key, &config.tree.default)?,
    })
}

/// Context keys in first-use order with their inferred source types.
#[derive(Default)]
struct Bindings {
    order: Vec<String>,
    types: BTreeMap<String, &'static str>,
    presence_only: BTreeMap<String, bool>,
}

impl Bindings {
    fn collect(&mut self, rule: &Rule) {
        match rule {
            Rule::BoolConst(_) => {}
            Rule::Not(inner) => self.collect(inner),
            Rule::LogicalExpression(expr) => {
                for rule in &expr.rules {
                    self.collect(rule);
                }
            }
            Rule::Atom(atom) => {
                let ty = atom.comparison_value.as_ref().and_then(value_type);
                self.record(&atom.context_key, ty, atom.comparison_operator == ComparisonOperator::Present);
            }
            Rule::CallExpression(CallExpression::Bucket(bucket)) => {
                self.record(&bucket.context_key, None, false);
            }
        }
    }

    fn record(&mut self, key: &str, ty: Option<&'static str>, presence: bool) {
        if !self.order.iter().any(|k| k == key) {
            self.order.push(key.to_string());
        }
        if let Some(ty) = ty {
            self.types.entry(key.to_string()).or_insert(ty);
        }
        let only = self.presence_only.entry(key.to_string()).or_insert(true);
        *only &= presence;
    }

    fn into_members(self) -> Vec<MemberModel> {
        self.order
            .iter()
            .map(|key| MemberModel {
                name: camel_case(key),
                optional: self.presence_only.get(key).copied().unwrap_or(false),
                ty: self.types.get(key).copied().unwrap_or("string").to_string(),
            })
            .collect()
    }
}

fn value_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("boolean"),
        Value::Int(_) | Value::Double(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::List(items) => items.first().and_then(value_type),
        _ => None,
    }
}

/// Render a guard so that recompiling it yields the same rule.
pub fn render_rule(key: &str, rule: &Rule) -> Result<String, CodegenError> {
    Ok(match rule {
        Rule::BoolConst(b) => b.to_string(),
        Rule::Not(inner) => match inner.as_ref() {
            Rule::Atom(atom) if atom.comparison_operator == ComparisonOperator::Present => {
                format!("{} === undefined", camel_case(&atom.context_key))
            }
            other => format!("!({})", render_rule(key, other)?),
        },
        Rule::LogicalExpression(expr) => {
            if expr.rules.is_empty() {
                return Err(CodegenError::UnsupportedValue {
                    key: key.to_string(),
                    reason: "empty logical expression".to_string(),
                });
            }
            let separator = match expr.logical_operator {
                LogicalOperator::And => " && ",
                LogicalOperator::Or => " || ",
            };
            let operands = expr
                .rules
                .iter()
                .map(|rule| {
                    let rendered = render_rule(key, rule)?;
                    Ok(match rule {
                        Rule::LogicalExpression(_) => format!("({rendered})"),
                        _ => rendered,
                    })
                })
                .collect::<Result<Vec<_>, CodegenError>>()?;
            operands.join(separator)
        }
        Rule::Atom(atom) => {
            let name = camel_case(&atom.context_key);
            let Some(value) = atom.comparison_value.as_ref() else {
                return match atom.comparison_operator {
                    ComparisonOperator::Present => Ok(format!("{name} !== undefined")),
                    operator => Err(CodegenError::UnsupportedValue {
                        key: key.to_string(),
                        reason: format!("{operator} without a comparison value"),
                    }),
                };
            };
            let literal = render_value(key, value)?;
            match (atom.comparison_operator, value) {
                (ComparisonOperator::Equals, Value::Bool(true)) => name,
                (ComparisonOperator::Equals, Value::Bool(false)) => format!("!{name}"),
                (ComparisonOperator::Equals, _) => format!("{name} === {literal}"),
                (ComparisonOperator::NotEquals, _) => format!("{name} !== {literal}"),
                (ComparisonOperator::LessThan, _) => format!("{name} < {literal}"),
                (ComparisonOperator::LessThanOrEquals, _) => format!("{name} <= {literal}"),
                (ComparisonOperator::GreaterThan, _) => format!("{name} > {literal}"),
                (ComparisonOperator::GreaterThanOrEquals, _) => format!("{name} >= {literal}"),
                (ComparisonOperator::Contains, _) => format!("{name}.includes({literal})"),
                (ComparisonOperator::StartsWith, _) => format!("{name}.startsWith({literal})"),
                (ComparisonOperator::EndsWith, _) => format!("{name}.endsWith({literal})"),
                (ComparisonOperator::ContainedWithin, _) => format!("{literal}.includes({name})"),
                (ComparisonOperator::Present, _) => format!("{name} !== undefined"),
            }
        }
        Rule::CallExpression(CallExpression::Bucket(bucket)) => format!(
            "bucket({}, {})",
            camel_case(&bucket.context_key),
            percentage(bucket.threshold)
        ),
    })
}

/// `25000` → `25`, `12345` → `12.345`.
fn percentage(threshold: u32) -> String {
    let whole = threshold / 1000;
    let fraction = threshold % 1000;
    if fraction == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{fraction:03}").trim_end_matches('0').to_string()
    }
}

/// Render a value as a source literal.
pub fn render_value(key: &str, value: &Value) -> Result<String, CodegenError> {
    Ok(match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Double(n) => {
            if !n.is_finite() {
                return Err(CodegenError::UnsupportedValue {
                    key: key.to_string(),
                    reason: format!("non-finite number {n}"),
                });
            }
            n.to_string()
        }
        Value::String(s) => string_literal(s),
        Value::List(items) => {
            let items = items
                .iter()
                .map(|item| render_value(key, item))
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        Value::Message(message) => {
            if message.fields.is_empty() {
                return Ok("{}".to_string());
            }
            let fields = message
                .fields
                .iter()
                .map(|(name, value)| Ok(format!("{}: {}", camel_case(name), render_value(key, value)?)))
                .collect::<Result<Vec<_>, CodegenError>>()?;
            format!("{{ {} }}", fields.join(", "))
        }
        Value::Json(json) => serde_json::to_string(json).map_err(|err| {
            CodegenError::UnsupportedValue {
                key: key.to_string(),
                reason: err.to_string(),
            }
        })?,
    })
}

fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}
