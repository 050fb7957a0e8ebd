/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Config clients and the in-process fallback used when a client fails.

use std::collections::BTreeMap;

use crate::ast::{Config, Namespace, Value};
use crate::compiler::expressions::BUCKET_FUNCTION;
use crate::compiler::naming::snake_case;
use crate::compiler::{compile_namespace, CompileOptions};
use crate::error::{ClientError, CompilerError};
use crate::evaluator::bucket::{bucket_hash, in_bucket};
use crate::evaluator::{evaluate, Context, ContextValue};
use crate::parser::{
    parse_source, BinaryOp, Expr, ExprKind, FunctionDecl, ParamPattern, StmtKind, UnaryOp,
};

/// Anything that can resolve a config value for a context.
pub trait ConfigClient {
    /// # Errors
    ///
    /// Returns `ClientError` when the config is unknown, evaluation fails or
    /// the transport is unavailable.
    fn get(&self, namespace: &str, key: &str, context: &Context) -> Result<Value, ClientError>;
}

/// Serves configs from namespaces held in memory.
#[derive(Debug, Clone, Default)]
pub struct LocalClient {
    namespaces: BTreeMap<String, Namespace>,
}

impl LocalClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.insert(namespace);
        self
    }

    /// Add or replace a namespace.
    pub fn insert(&mut self, namespace: Namespace) {
        self.namespaces.insert(namespace.name.clone(), namespace);
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }
}

impl ConfigClient for LocalClient {
    fn get(&self, namespace: &str, key: &str, context: &Context) -> Result<Value, ClientError> {
        let config = self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.config(key))
            .ok_or_else(|| ClientError::NotFound {
                namespace: namespace.to_string(),
                key: key.to_string(),
            })?;
        Ok(evaluate(config, namespace, context)?.value)
    }
}

/// A config function evaluated directly from its source.
///
/// Guards are interpreted with JavaScript semantics: strict equality,
/// missing bindings read as `undefined`, and no type errors. Returned values
/// are the compiled values of the matching branch.
///
/// For present context keys the result matches [`evaluate`]. A missing key
/// is different: the evaluator fails closed on every comparison, while
/// here `undefined !== "dev"` and `!undefined` are true. Guards that negate
/// an optional key can pick another branch than the served config.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFunction {
    name: String,
    key: String,
    /// Name of a non-destructured context parameter.
    param: Option<String>,
    branches: Vec<(Expr, Value)>,
    default: Value,
}

impl StaticFunction {
    /// Build the fallbacks for every function in a source file.
    ///
    /// # Errors
    ///
    /// Returns the first parse or compilation error.
    pub fn from_source(
        text: &str,
        file: &str,
        namespace: &str,
        options: &CompileOptions,
    ) -> Result<Vec<StaticFunction>, CompilerError> {
        let source = parse_source(text, file)?;
        let compiled = compile_namespace(&source, namespace, options)?;
        Ok(source
            .functions()
            .zip(&compiled.configs)
            .map(|(function, config)| Self::new(function, config))
            .collect())
    }

    /// Pair a validated function with its compiled config.
    ///
    /// `config` must be the result of compiling `function`; its constraints
    /// line up with the function's `if` branches.
    #[must_use]
    pub fn new(function: &FunctionDecl, config: &Config) -> Self {
        let mut guards = Vec::new();
        for stmt in &function.body.stmts {
            let mut current = Some(stmt);
            while let Some(StmtKind::If {
                condition,
                else_branch,
                ..
            }) = current.map(|stmt| &stmt.kind)
            {
                guards.push(condition.clone());
                current = else_branch.as_deref();
            }
        }

        let param = match function.params.first().map(|param| &param.pattern) {
            Some(ParamPattern::Identifier(ident)) => Some(ident.name.clone()),
            _ => None,
        };

        Self {
            name: function.name.name.clone(),
            key: config.key.clone(),
            param,
            branches: guards
                .into_iter()
                .zip(config.tree.constraints.iter().map(|c| c.value.clone()))
                .collect(),
            default: config.tree.default.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run the function body for `context`.
    #[must_use]
    pub fn call(&self, namespace: &str, context: &Context) -> Value {
        let interpreter = Interpreter {
            namespace,
            key: &self.key,
            param: self.param.as_deref(),
            context,
        };
        self.branches
            .iter()
            .find(|(guard, _)| interpreter.eval(guard).truthy())
            .map_or_else(|| self.default.clone(), |(_, value)| value.clone())
    }
}

/// Ask `client` first and fall back to the static function on any error.
pub fn get_with_fallback<C: ConfigClient + ?Sized>(
    client: &C,
    namespace: &str,
    fallback: &StaticFunction,
    context: &Context,
) -> Value {
    match client.get(namespace, fallback.key(), context) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                namespace,
                key = fallback.key(),
                error = %err,
                "config client failed, using static fallback"
            );
            fallback.call(namespace, context)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum JsValue {
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<JsValue>),
}

impl JsValue {
    fn truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) => true,
        }
    }

    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&ContextValue> for JsValue {
    fn from(value: &ContextValue) -> Self {
        match value {
            ContextValue::Bool(b) => Self::Bool(*b),
            #[allow(clippy::cast_precision_loss)]
            ContextValue::Int(n) => Self::Number(*n as f64),
            ContextValue::Double(n) => Self::Number(*n),
            ContextValue::String(s) => Self::String(s.clone()),
        }
    }
}

struct Interpreter<'a> {
    namespace: &'a str,
    key: &'a str,
    param: Option<&'a str>,
    context: &'a Context,
}

impl Interpreter<'_> {
    fn eval(&self, expr: &Expr) -> JsValue {
        match &expr.kind {
            ExprKind::Paren(inner) => self.eval(inner),
            ExprKind::Bool(b) => JsValue::Bool(*b),
            ExprKind::Number(n) => JsValue::Number(*n),
            ExprKind::String(s) => JsValue::String(s.clone()),
            ExprKind::Undefined | ExprKind::Null => JsValue::Undefined,
            ExprKind::Identifier(_) | ExprKind::Member { .. } => self
                .binding(expr)
                .map_or(JsValue::Undefined, JsValue::from),
            ExprKind::Array(items) => JsValue::Array(items.iter().map(|e| self.eval(e)).collect()),
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(operand);
                match (op, operand) {
                    (UnaryOp::Not, value) => JsValue::Bool(!value.truthy()),
                    (UnaryOp::Minus, JsValue::Number(n)) => JsValue::Number(-n),
                    (UnaryOp::Plus, JsValue::Number(n)) => JsValue::Number(n),
                    _ => JsValue::Undefined,
                }
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right),
            ExprKind::Call { callee, args } => JsValue::Bool(self.call(callee, args)),
            _ => JsValue::Undefined,
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> JsValue {
        match op {
            BinaryOp::And => {
                let left = self.eval(left);
                if left.truthy() {
                    self.eval(right)
                } else {
                    left
                }
            }
            BinaryOp::Or => {
                let left = self.eval(left);
                if left.truthy() {
                    left
                } else {
                    self.eval(right)
                }
            }
            BinaryOp::StrictEq => JsValue::Bool(self.eval(left).strict_eq(&self.eval(right))),
            BinaryOp::StrictNe => JsValue::Bool(!self.eval(left).strict_eq(&self.eval(right))),
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let ordering = match (self.eval(left), self.eval(right)) {
                    (JsValue::Number(a), JsValue::Number(b)) => a.partial_cmp(&b),
                    (JsValue::String(a), JsValue::String(b)) => Some(a.cmp(&b)),
                    _ => None,
                };
                JsValue::Bool(ordering.is_some_and(|ordering| match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Lte => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            _ => JsValue::Undefined,
        }
    }

    /// Calls allowed in guards: `bucket`, array `includes` and the string
    /// methods. Calling a method on a missing binding yields false.
    fn call(&self, callee: &Expr, args: &[Expr]) -> bool {
        match &callee.kind {
            ExprKind::Identifier(name) if name == BUCKET_FUNCTION => match args {
                [reference, percent] => self.bucket(reference, percent),
                _ => false,
            },
            ExprKind::Member { object, property } => {
                let Some(argument) = args.first().map(|arg| self.eval(arg)) else {
                    return false;
                };
                match (self.eval(object), property.name.as_str(), argument) {
                    (JsValue::Array(items), "includes", needle) => {
                        items.iter().any(|item| item.strict_eq(&needle))
                    }
                    (JsValue::String(s), "includes", JsValue::String(needle)) => {
                        s.contains(needle.as_str())
                    }
                    (JsValue::String(s), "startsWith", JsValue::String(prefix)) => {
                        s.starts_with(prefix.as_str())
                    }
                    (JsValue::String(s), "endsWith", JsValue::String(suffix)) => {
                        s.ends_with(suffix.as_str())
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn bucket(&self, reference: &Expr, percent: &Expr) -> bool {
        let (Some(key), JsValue::Number(percent)) = (context_key(reference), self.eval(percent))
        else {
            return false;
        };
        let Some(value) = self.context.get(&key) else {
            return false;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let threshold = (percent * 1000.0).round().clamp(0.0, f64::from(u32::MAX)) as u32;
        bucket_hash(self.namespace, self.key, &key, value)
            .is_some_and(|hash| in_bucket(hash, threshold))
    }

    fn binding(&self, expr: &Expr) -> Option<&ContextValue> {
        if let ExprKind::Identifier(name) = &expr.kind {
            if self.param == Some(name.as_str()) {
                return None;
            }
        }
        self.context.get(&context_key(expr)?)
    }
}

/// Storage key for `name`, `ctx.name` or `(name)`.
fn context_key(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Paren(inner) => context_key(inner),
        ExprKind::Identifier(name) => Some(snake_case(name)),
        ExprKind::Member { property, .. } => Some(snake_case(&property.name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;

    const SOURCE: &str = r#"
export function getDiscount({ country, plan }: { country: string; plan: string }): number {
  if (country === "US" && plan === "pro") {
    return 0.2;
  } else if (["CA", "MX"].includes(country)) {
    return 0.1;
  }
  return 0;
}

export function getRollout({ userId }: { userId: string }): boolean {
  if (bucket(userId, 25)) {
    return true;
  }
  return false;
}

export function getBeta(ctx: { email?: string; age: number }): boolean {
  if (ctx.email !== undefined && ctx.email.endsWith("@example.com")) {
    return true;
  } else if (ctx.age >= 65) {
    return true;
  }
  return false;
}
"#;

    fn namespace() -> Namespace {
        let source = parse_source(SOURCE, "default.ts").unwrap();
        compile_namespace(&source, "default", &CompileOptions::default()).unwrap()
    }

    fn fallbacks() -> Vec<StaticFunction> {
        StaticFunction::from_source(SOURCE, "default.ts", "default", &CompileOptions::default())
            .unwrap()
    }

    fn contexts() -> Vec<Context> {
        vec![
            Context::new(),
            Context::builder().set("country", "US").set("plan", "pro").build(),
            Context::builder().set("country", "US").set("plan", "free").build(),
            Context::builder().set("country", "MX").build(),
            Context::builder().set("user_id", "user-1").build(),
            Context::builder().set("user_id", "user-2").build(),
            Context::builder().set("user_id", "user-3").build(),
            Context::builder().set("email", "a@example.com").set("age", 30_i64).build(),
            Context::builder().set("email", "a@other.com").set("age", 70_i64).build(),
            Context::builder().set("age", 64.5).build(),
        ]
    }

    struct FailingClient;

    impl ConfigClient for FailingClient {
        fn get(&self, _: &str, _: &str, _: &Context) -> Result<Value, ClientError> {
            Err(ClientError::Transport("connection refused".to_string()))
        }
    }

    #[test]
    fn test_local_client_evaluates_namespace() {
        let client = LocalClient::new().with_namespace(namespace());
        let context = Context::builder().set("country", "CA").build();
        assert_eq!(
            client.get("default", "discount", &context).unwrap(),
            Value::Double(0.1)
        );
        assert_eq!(client.namespaces().count(), 1);
    }

    #[test]
    fn test_local_client_unknown_config() {
        let client = LocalClient::new().with_namespace(namespace());
        let err = client.get("default", "missing", &Context::new()).unwrap_err();
        assert_eq!(
            err,
            ClientError::NotFound {
                namespace: "default".to_string(),
                key: "missing".to_string()
            }
        );
        assert!(client.get("other", "discount", &Context::new()).is_err());
    }

    #[test]
    fn test_local_client_surfaces_evaluation_errors() {
        let client = LocalClient::new().with_namespace(namespace());
        let context = Context::builder().set("country", 7_i64).build();
        assert!(matches!(
            client.get("default", "discount", &context),
            Err(ClientError::Evaluation(EvaluationError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_static_function_agrees_with_compiled_config() {
        let namespace = namespace();
        for function in fallbacks() {
            let config = namespace.config(function.key()).unwrap();
            for context in contexts() {
                let expected = evaluate(config, "default", &context).unwrap().value;
                assert_eq!(
                    function.call("default", &context),
                    expected,
                    "{} with {context}",
                    function.name()
                );
            }
        }
    }

    #[test]
    fn test_static_function_tolerates_type_mismatch() {
        let discount = &fallbacks()[0];
        let context = Context::builder().set("country", 7_i64).build();
        assert_eq!(discount.call("default", &context), Value::Double(0.0));
    }

    #[test]
    fn test_static_function_negation_on_missing_key() {
        let text = "export function getVerbose({ env }: { env: string }): boolean {\n  if (env !== \"dev\") {\n    return true;\n  }\n  return false;\n}\n";
        let source = parse_source(text, "default.ts").unwrap();
        let namespace = compile_namespace(&source, "default", &CompileOptions::default()).unwrap();
        let fallback =
            &StaticFunction::from_source(text, "default.ts", "default", &CompileOptions::default())
                .unwrap()[0];
        let config = namespace.config("verbose").unwrap();

        let empty = Context::new();
        assert_eq!(evaluate(config, "default", &empty).unwrap().value, Value::Bool(false));
        assert_eq!(fallback.call("default", &empty), Value::Bool(true));

        let prod = Context::builder().set("env", "prod").build();
        assert_eq!(evaluate(config, "default", &prod).unwrap().value, Value::Bool(true));
        assert_eq!(fallback.call("default", &prod), Value::Bool(true));
    }

    #[test]
    fn test_get_with_fallback() {
        let discount = &fallbacks()[0];
        let context = Context::builder().set("country", "US").set("plan", "pro").build();

        let value = get_with_fallback(&FailingClient, "default", discount, &context);
        assert_eq!(value, Value::Double(0.2));

        let client = LocalClient::new().with_namespace(namespace());
        let value = get_with_fallback(&client, "default", discount, &context);
        assert_eq!(value, Value::Double(0.2));
    }

    #[test]
    fn test_fallback_used_for_unknown_namespace() {
        let rollout = &fallbacks()[1];
        assert_eq!(rollout.key(), "rollout");
        let value = get_with_fallback(&LocalClient::new(), "default", rollout, &Context::new());
        assert_eq!(value, Value::Bool(false));
    }
}
