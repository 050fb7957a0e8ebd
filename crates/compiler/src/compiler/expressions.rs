//! Rule compiler for guard expressions
//!
//! Translates the condition of an `if` into a typed [`Rule`]. Supported forms:
//! bare (negated) boolean context references, comparisons with the context
//! reference on the left, `&&`/`||` (flattened), `!(...)`, parentheses,
//! `[...].includes(x)`, `x.includes/startsWith/endsWith(lit)` and
//! `bucket(x, percent)`.

use crate::ast::{ComparisonOperator, LogicalOperator, Rule, Value};
use crate::compiler::context::{ContextRef, ContextType, ContextVocabulary};
use crate::compiler::source_location;
use crate::compiler::values::{compile_literal, compile_literal_list, literal_kind, strip_parens};
use crate::error::{CompilationError, CompilationErrorKind};
use crate::parser::{BinaryOp, Expr, ExprKind, UnaryOp};

/// Name of the call that compiles to a bucket rule.
pub const BUCKET_FUNCTION: &str = "bucket";

pub struct RuleCompiler<'a> {
    file: &'a str,
    context: &'a ContextVocabulary,
    check_context_keys: bool,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(file: &'a str, context: &'a ContextVocabulary, check_context_keys: bool) -> Self {
        Self {
            file,
            context,
            check_context_keys,
        }
    }

    /// Compile a guard expression.
    ///
    /// # Errors
    ///
    /// Returns a compilation error naming the unsupported syntax kind.
    pub fn compile(&self, expr: &Expr) -> Result<Rule, CompilationError> {
        match &expr.kind {
            ExprKind::Paren(inner) => self.compile(inner),
            ExprKind::Bool(b) => Ok(Rule::BoolConst(*b)),
            ExprKind::Identifier(_) | ExprKind::Member { .. } => self.boolean_atom(expr, true),
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                if matches!(operand.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
                    self.boolean_atom(operand, false)
                } else {
                    Ok(Rule::not(self.compile(operand)?))
                }
            }
            ExprKind::Binary { op, left, right } => self.compile_binary(expr, *op, left, right),
            ExprKind::Call { callee, args } => self.compile_call(expr, callee, args),
            other => Err(self.error(
                expr,
                CompilationErrorKind::UnsupportedExpression(other.describe()),
            )),
        }
    }

    fn compile_binary(
        &self,
        expr: &Expr,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Rule, CompilationError> {
        let operator = match op {
            BinaryOp::And | BinaryOp::Or => {
                let logical = if op == BinaryOp::And {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };
                return Ok(Rule::logical(
                    logical,
                    [self.compile(left)?, self.compile(right)?],
                ));
            }
            BinaryOp::StrictEq => ComparisonOperator::Equals,
            BinaryOp::StrictNe => ComparisonOperator::NotEquals,
            BinaryOp::Lt => ComparisonOperator::LessThan,
            BinaryOp::Lte => ComparisonOperator::LessThanOrEquals,
            BinaryOp::Gt => ComparisonOperator::GreaterThan,
            BinaryOp::Gte => ComparisonOperator::GreaterThanOrEquals,
            other => {
                return Err(self.error(
                    expr,
                    CompilationErrorKind::UnsupportedOperator(other.token().to_string()),
                ))
            }
        };

        if !ContextVocabulary::is_reference(left) && ContextVocabulary::is_reference(right) {
            return Err(self.error(expr, CompilationErrorKind::LiteralOnLeft));
        }
        let reference = self.resolve(left)?;

        if matches!(strip_parens(right).kind, ExprKind::Undefined) {
            return match operator {
                ComparisonOperator::NotEquals => Ok(Rule::present(reference.key)),
                ComparisonOperator::Equals => Ok(Rule::not(Rule::present(reference.key))),
                _ => Err(self.error(
                    expr,
                    CompilationErrorKind::UnsupportedExpression(format!(
                        "{} comparison with undefined",
                        op.token()
                    )),
                )),
            };
        }

        let value = compile_literal(self.file, right)?;
        let ordering = !matches!(
            operator,
            ComparisonOperator::Equals | ComparisonOperator::NotEquals
        );
        if ordering && !matches!(value, Value::Double(_)) {
            return Err(self.error(
                right,
                CompilationErrorKind::TypeMismatch {
                    expected: "number".to_string(),
                    found: literal_kind(right),
                },
            ));
        }
        self.check_declared_type(&reference, right, &value)?;
        Ok(Rule::atom(reference.key, operator, value))
    }

    fn compile_call(&self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Result<Rule, CompilationError> {
        match &callee.kind {
            ExprKind::Identifier(name) if name == BUCKET_FUNCTION => self.compile_bucket(expr, args),
            ExprKind::Member { object, property } if args.len() == 1 => {
                let method = property.name.as_str();
                if let ExprKind::Array(elements) = &strip_parens(object).kind {
                    if method != "includes" {
                        return Err(self.unsupported_call(expr, method));
                    }
                    let reference = self.resolve(&args[0])?;
                    let list = compile_literal_list(self.file, elements)?;
                    if let (Value::List(items), Some(first)) = (&list, elements.first()) {
                        if let Some(item) = items.first() {
                            self.check_declared_type(&reference, first, item)?;
                        }
                    }
                    return Ok(Rule::atom(
                        reference.key,
                        ComparisonOperator::ContainedWithin,
                        list,
                    ));
                }

                let operator = match method {
                    "includes" => ComparisonOperator::Contains,
                    "startsWith" => ComparisonOperator::StartsWith,
                    "endsWith" => ComparisonOperator::EndsWith,
                    _ => return Err(self.unsupported_call(expr, method)),
                };
                if !ContextVocabulary::is_reference(object) {
                    return Err(self.unsupported_call(expr, method));
                }
                let reference = self.resolve(object)?;
                let value = compile_literal(self.file, &args[0])?;
                if !matches!(value, Value::String(_)) {
                    return Err(self.error(
                        &args[0],
                        CompilationErrorKind::TypeMismatch {
                            expected: "string".to_string(),
                            found: literal_kind(&args[0]),
                        },
                    ));
                }
                self.check_declared_type(&reference, &args[0], &value)?;
                Ok(Rule::atom(reference.key, operator, value))
            }
            ExprKind::Member { property, .. } => Err(self.unsupported_call(expr, &property.name)),
            _ => Err(self.error(
                expr,
                CompilationErrorKind::UnsupportedExpression(format!(
                    "CallExpression of {}",
                    callee.kind.describe()
                )),
            )),
        }
    }

    fn compile_bucket(&self, expr: &Expr, args: &[Expr]) -> Result<Rule, CompilationError> {
        let [reference, percent] = args else {
            return Err(self.error(
                expr,
                CompilationErrorKind::UnsupportedExpression(format!(
                    "{BUCKET_FUNCTION}() takes a context reference and a percentage"
                )),
            ));
        };
        let reference = self.resolve(reference)?;
        let invalid = |text: String| {
            self.error(percent, CompilationErrorKind::InvalidBucketPercentage(text))
        };
        let Value::Double(percent_value) = compile_literal(self.file, percent)
            .map_err(|_| invalid(literal_kind(percent)))?
        else {
            return Err(invalid(literal_kind(percent)));
        };
        let scaled = percent_value * 1000.0;
        let threshold = scaled.round();
        if !(0.0..=100.0).contains(&percent_value) || (scaled - threshold).abs() > 1e-6 {
            return Err(invalid(percent_value.to_string()));
        }
        Ok(Rule::bucket(reference.key, threshold as u32))
    }

    /// `x` or `!x` as a guard.
    fn boolean_atom(&self, expr: &Expr, expected: bool) -> Result<Rule, CompilationError> {
        let reference = self.resolve(expr)?;
        if let Some(ty) = reference.ty {
            if ty != ContextType::Bool {
                return Err(self.error(
                    expr,
                    CompilationErrorKind::NonBooleanIdentifier {
                        name: reference.key,
                        ty: ty.as_str().to_string(),
                    },
                ));
            }
        }
        Ok(Rule::atom(
            reference.key,
            ComparisonOperator::Equals,
            Value::Bool(expected),
        ))
    }

    fn resolve(&self, expr: &Expr) -> Result<ContextRef, CompilationError> {
        self.context
            .resolve(expr, self.check_context_keys)
            .map_err(|kind| self.error(expr, kind))
    }

    /// Literal type must agree with the declared context type, when known.
    fn check_declared_type(
        &self,
        reference: &ContextRef,
        literal: &Expr,
        value: &Value,
    ) -> Result<(), CompilationError> {
        let Some(ty) = reference.ty else {
            return Ok(());
        };
        let compatible = match ty {
            ContextType::Bool => matches!(value, Value::Bool(_)),
            ContextType::Number => matches!(value, Value::Double(_) | Value::Int(_)),
            ContextType::String => matches!(value, Value::String(_)),
            ContextType::Other => true,
        };
        if compatible {
            Ok(())
        } else {
            Err(self.error(
                literal,
                CompilationErrorKind::TypeMismatch {
                    expected: ty.as_str().to_string(),
                    found: literal_kind(literal),
                },
            ))
        }
    }

    fn unsupported_call(&self, expr: &Expr, method: &str) -> CompilationError {
        self.error(
            expr,
            CompilationErrorKind::UnsupportedExpression(format!("CallExpression .{method}()")),
        )
    }

    fn error(&self, expr: &Expr, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::new(source_location(self.file, expr.span), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_source};
    use pretty_assertions::assert_eq;

    const SIGNATURE: &str = "function getA({ env, version, beta, tag, userId, a, b }: { env: string; version: number; beta: boolean; tag: string; userId: string; a: number; b: number }): boolean { return true; }";

    fn vocabulary() -> ContextVocabulary {
        let source = parse_source(SIGNATURE, "r.ts").unwrap();
        let function = source.functions().next().unwrap();
        ContextVocabulary::from_param(function.params.first(), source.interfaces())
    }

    fn compile(text: &str) -> Result<Rule, CompilationError> {
        let vocabulary = vocabulary();
        let expr = parse_expression(text, "r.ts").unwrap();
        RuleCompiler::new("r.ts", &vocabulary, true).compile(&expr)
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_equality_atom() {
        assert_eq!(
            compile("env === \"prod\"").unwrap(),
            Rule::atom("env", ComparisonOperator::Equals, string("prod"))
        );
        assert_eq!(
            compile("version !== 2").unwrap(),
            Rule::atom("version", ComparisonOperator::NotEquals, Value::Double(2.0))
        );
    }

    #[test]
    fn test_ordering_atoms() {
        assert_eq!(
            compile("version >= -1.5").unwrap(),
            Rule::atom(
                "version",
                ComparisonOperator::GreaterThanOrEquals,
                Value::Double(-1.5)
            )
        );
        assert!(matches!(
            compile("env < \"b\"").unwrap_err().kind,
            CompilationErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_bare_and_negated_identifiers() {
        assert_eq!(
            compile("beta").unwrap(),
            Rule::atom("beta", ComparisonOperator::Equals, Value::Bool(true))
        );
        assert_eq!(
            compile("!beta").unwrap(),
            Rule::atom("beta", ComparisonOperator::Equals, Value::Bool(false))
        );
        assert!(matches!(
            compile("env").unwrap_err().kind,
            CompilationErrorKind::NonBooleanIdentifier { .. }
        ));
    }

    #[test]
    fn test_not_of_expression() {
        assert_eq!(
            compile("!(env === \"dev\")").unwrap(),
            Rule::not(Rule::atom("env", ComparisonOperator::Equals, string("dev")))
        );
    }

    #[test]
    fn test_present_and_absent() {
        assert_eq!(compile("version !== undefined").unwrap(), Rule::present("version"));
        assert_eq!(
            compile("version === undefined").unwrap(),
            Rule::not(Rule::present("version"))
        );
        assert!(compile("version > undefined").is_err());
    }

    #[test]
    fn test_logical_flattening() {
        let rule = compile("a === 1 || b === 2 || (env === \"x\" || beta)").unwrap();
        match rule {
            Rule::LogicalExpression(expr) => {
                assert_eq!(expr.logical_operator, LogicalOperator::Or);
                assert_eq!(expr.rules.len(), 4);
            }
            other => panic!("Expected OR, got {other:?}"),
        }

        let rule = compile("a === 1 && (b === 2 || beta)").unwrap();
        match rule {
            Rule::LogicalExpression(expr) => {
                assert_eq!(expr.logical_operator, LogicalOperator::And);
                assert_eq!(expr.rules.len(), 2);
                assert!(matches!(expr.rules[1], Rule::LogicalExpression(_)));
            }
            other => panic!("Expected AND, got {other:?}"),
        }
    }

    #[test]
    fn test_contained_within() {
        assert_eq!(
            compile("[\"x\", \"y\", \"z\"].includes(tag)").unwrap(),
            Rule::atom(
                "tag",
                ComparisonOperator::ContainedWithin,
                Value::List(vec![string("x"), string("y"), string("z")])
            )
        );
        assert_eq!(
            compile("[1, \"y\"].includes(tag)").unwrap_err().kind,
            CompilationErrorKind::MixedArray
        );
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(
            compile("env.includes(\"pro\")").unwrap(),
            Rule::atom("env", ComparisonOperator::Contains, string("pro"))
        );
        assert_eq!(
            compile("userId.startsWith(\"test-\")").unwrap(),
            Rule::atom("user_id", ComparisonOperator::StartsWith, string("test-"))
        );
        assert_eq!(
            compile("tag.endsWith(\"-beta\")").unwrap(),
            Rule::atom("tag", ComparisonOperator::EndsWith, string("-beta"))
        );
        assert!(compile("tag.toUpperCase(\"x\")").is_err());
    }

    #[test]
    fn test_bucket_call() {
        assert_eq!(compile("bucket(userId, 50)").unwrap(), Rule::bucket("user_id", 50_000));
        assert_eq!(compile("bucket(userId, 12.345)").unwrap(), Rule::bucket("user_id", 12_345));
        assert_eq!(compile("bucket(userId, 100)").unwrap(), Rule::bucket("user_id", 100_000));
        assert!(matches!(
            compile("bucket(userId, 101)").unwrap_err().kind,
            CompilationErrorKind::InvalidBucketPercentage(_)
        ));
        assert!(matches!(
            compile("bucket(userId, 1.23456)").unwrap_err().kind,
            CompilationErrorKind::InvalidBucketPercentage(_)
        ));
        assert!(compile("bucket(userId)").is_err());
    }

    #[test]
    fn test_literal_on_left_rejected() {
        assert_eq!(
            compile("\"US\" === env").unwrap_err().kind,
            CompilationErrorKind::LiteralOnLeft
        );
    }

    #[test]
    fn test_loose_equality_rejected() {
        assert_eq!(
            compile("env == \"prod\"").unwrap_err().kind,
            CompilationErrorKind::UnsupportedOperator("==".to_string())
        );
    }

    #[test]
    fn test_undeclared_key_rejected() {
        assert_eq!(
            compile("country === \"US\"").unwrap_err().kind,
            CompilationErrorKind::UndeclaredContextKey("country".to_string())
        );
    }

    #[test]
    fn test_declared_type_mismatch() {
        assert!(matches!(
            compile("env === 3").unwrap_err().kind,
            CompilationErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_unsupported_forms_name_syntax_kind() {
        let err = compile("version > 1 ? beta : beta").unwrap_err();
        assert_eq!(
            err.kind,
            CompilationErrorKind::UnsupportedExpression("ConditionalExpression".to_string())
        );
        assert_eq!(err.location.file, "r.ts");
    }
}
