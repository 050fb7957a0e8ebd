//! Compiler module - compiles parsed config functions into typed decision trees
//!
//! This module handles:
//! - Schema compilation (interfaces to message descriptors)
//! - Guard compilation (if conditions to rules)
//! - Value compilation (return expressions to typed values)
//! - Function compilation (one function to one config)

pub mod context;
pub mod expressions;
pub mod naming;
pub mod schema;
pub mod values;

use std::collections::BTreeMap;

use crate::ast::{Config, Constraint, Namespace, Tree};
use crate::compiler::context::ContextVocabulary;
use crate::compiler::expressions::RuleCompiler;
use crate::compiler::schema::{array_element, SchemaCompiler};
use crate::compiler::values::{DeclaredType, ValueCompiler};
use crate::error::{CompilationError, CompilationErrorKind, CompilerError, SourceLocation};
use crate::parser::{FunctionDecl, SourceFile, Span, Stmt, StmtKind, TypeKind, TypeNode};
use crate::schemas::SchemaRegistry;

/// Description used when a function carries no doc comment.
pub const DEFAULT_DESCRIPTION: &str = "Generated from TypeScript";

/// Which function shape the compiler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Synchronous functions; `async` is rejected.
    #[default]
    Sync,
    /// Older call sites: functions must be `async` and return `Promise<T>`.
    LegacyAsync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub target: Target,
    /// Require every referenced context key to be declared by the parameter.
    pub check_context_keys: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::Sync,
            check_context_keys: true,
        }
    }
}

/// Outcome of compiling a namespace without stopping at the first error.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileReport {
    /// Every declaration that compiled.
    pub namespace: Namespace,
    /// One entry per failed declaration, in source order.
    pub errors: Vec<CompilerError>,
}

impl CompileReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub(crate) fn source_location(file: &str, span: Span) -> SourceLocation {
    SourceLocation::new(file, span.line, span.column)
}

/// Compile one namespace, failing on the first error.
///
/// # Errors
///
/// Returns the first parse, compilation or schema error.
pub fn compile_namespace(
    source: &SourceFile,
    namespace: &str,
    options: &CompileOptions,
) -> Result<Namespace, CompilerError> {
    let mut first_error = None;
    let report = compile_with(source, namespace, options, &mut |err| {
        if first_error.is_none() {
            first_error = Some(err);
        }
        false
    });
    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

/// Compile one namespace, collecting every per-declaration error.
#[must_use]
pub fn compile_namespace_report(
    source: &SourceFile,
    namespace: &str,
    options: &CompileOptions,
) -> CompileReport {
    let mut errors = Vec::new();
    let namespace = compile_with(source, namespace, options, &mut |err| {
        errors.push(err);
        true
    });
    CompileReport { namespace, errors }
}

/// Shared driver. `on_error` returns whether compilation continues.
fn compile_with(
    source: &SourceFile,
    namespace: &str,
    options: &CompileOptions,
    on_error: &mut dyn FnMut(CompilerError) -> bool,
) -> Namespace {
    let mut compiled = Namespace {
        name: namespace.to_string(),
        configs: Vec::new(),
        schema: SchemaRegistry::new(),
    };

    if !naming::is_valid_namespace(namespace) {
        on_error(
            CompilationError::new(
                SourceLocation::new(&source.file, 1, 1),
                CompilationErrorKind::InvalidNamespace(namespace.to_string()),
            )
            .into(),
        );
        return compiled;
    }

    let schema_compiler = SchemaCompiler::new(&source.file, namespace, source.interfaces());
    for interface in source.interfaces() {
        if let Err(err) = schema_compiler.compile_interface(interface, &mut compiled.schema) {
            if !on_error(err) {
                return compiled;
            }
        }
    }
    if let Err(err) = compiled.schema.check_references() {
        if !on_error(err.into()) {
            return compiled;
        }
    }

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for function in source.functions() {
        let compiler = FunctionCompiler {
            source,
            schema_compiler: &schema_compiler,
            registry: &compiled.schema,
            options,
        };
        let result = compiler.compile(function).and_then(|config| {
            if seen.contains_key(&config.key) {
                return Err(CompilationError::new(
                    source_location(&source.file, function.name.span),
                    CompilationErrorKind::DuplicateConfigKey(config.key),
                )
                .in_declaration(&function.name.name));
            }
            seen.insert(config.key.clone(), function.name.name.clone());
            Ok(config)
        });
        match result {
            Ok(config) => {
                tracing::debug!(namespace, key = %config.key, constraints = config.tree.constraints.len(), "compiled config");
                compiled.configs.push(config);
            }
            Err(err) => {
                if !on_error(err.into()) {
                    return compiled;
                }
            }
        }
    }

    tracing::debug!(
        namespace,
        configs = compiled.configs.len(),
        messages = compiled.schema.len(),
        "compiled namespace"
    );
    compiled
}

/// Compiles one function declaration into a config.
struct FunctionCompiler<'a> {
    source: &'a SourceFile,
    schema_compiler: &'a SchemaCompiler<'a>,
    registry: &'a SchemaRegistry,
    options: &'a CompileOptions,
}

impl<'a> FunctionCompiler<'a> {
    fn file(&self) -> &'a str {
        &self.source.file
    }

    fn compile(&self, function: &FunctionDecl) -> Result<Config, CompilationError> {
        self.compile_inner(function)
            .map_err(|err| err.in_declaration(&function.name.name))
    }

    fn compile_inner(&self, function: &FunctionDecl) -> Result<Config, CompilationError> {
        let name_location = source_location(self.file(), function.name.span);
        let key = naming::config_key(&function.name.name).ok_or_else(|| {
            CompilationError::new(
                name_location.clone(),
                CompilationErrorKind::InvalidFunctionName(function.name.name.clone()),
            )
        })?;

        let declared = self.declared_type(function)?;

        if function.params.len() > 1 {
            return Err(CompilationError::new(
                source_location(self.file(), function.params[1].span),
                CompilationErrorKind::TooManyParameters(function.params.len()),
            ));
        }
        let vocabulary =
            ContextVocabulary::from_param(function.params.first(), self.source.interfaces());

        let rules = RuleCompiler::new(self.file(), &vocabulary, self.options.check_context_keys);
        let values = ValueCompiler::new(self.file(), self.registry);

        let mut constraints = Vec::new();
        let mut default = None;
        for stmt in &function.body.stmts {
            if default.is_some() {
                if matches!(stmt.kind, StmtKind::Empty) {
                    continue;
                }
                return Err(self.stmt_error(
                    stmt,
                    CompilationErrorKind::UnreachableStatement(stmt.kind.describe().to_string()),
                ));
            }
            match &stmt.kind {
                StmtKind::If { .. } => {
                    self.compile_if_chain(stmt, &rules, &values, &declared, &mut constraints)?;
                }
                StmtKind::Return(Some(expr)) => default = Some(values.compile(expr, &declared)?),
                StmtKind::Return(None) => {
                    return Err(self.stmt_error(stmt, CompilationErrorKind::MissingReturnValue))
                }
                StmtKind::Empty => {}
                other => {
                    return Err(self.stmt_error(
                        stmt,
                        CompilationErrorKind::DisallowedStatement(other.describe().to_string()),
                    ))
                }
            }
        }

        let default = default.ok_or_else(|| {
            CompilationError::new(name_location, CompilationErrorKind::MissingDefault)
        })?;

        Ok(Config {
            key,
            description: function
                .doc
                .as_deref()
                .map(str::trim)
                .filter(|doc| !doc.is_empty())
                .unwrap_or(DEFAULT_DESCRIPTION)
                .to_string(),
            config_type: declared.config_type(),
            tree: Tree {
                default,
                constraints,
            },
        })
    }

    /// Flatten an `if` / `else if` chain into sibling constraints.
    fn compile_if_chain(
        &self,
        stmt: &Stmt,
        rules: &RuleCompiler<'_>,
        values: &ValueCompiler<'_>,
        declared: &DeclaredType,
        constraints: &mut Vec<Constraint>,
    ) -> Result<(), CompilationError> {
        let mut current = stmt;
        loop {
            let StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } = &current.kind
            else {
                return Err(self.stmt_error(current, CompilationErrorKind::ElseBlockNotAllowed));
            };

            let rule = rules.compile(condition)?;
            let returned = single_return(then_branch)
                .ok_or_else(|| self.stmt_error(then_branch, CompilationErrorKind::InvalidIfBody))?;
            let value = values.compile(returned, declared)?;
            constraints.push(Constraint::new(rule, value));

            match else_branch {
                None => return Ok(()),
                Some(next) => current = next,
            }
        }
    }

    fn declared_type(&self, function: &FunctionDecl) -> Result<DeclaredType, CompilationError> {
        let name_location = || source_location(self.file(), function.name.span);
        let return_type = function.return_type.as_ref().ok_or_else(|| {
            CompilationError::new(name_location(), CompilationErrorKind::MissingReturnType)
        })?;

        let value_type = match self.options.target {
            Target::Sync => {
                if function.is_async {
                    return Err(CompilationError::new(
                        name_location(),
                        CompilationErrorKind::AsyncNotAllowed,
                    ));
                }
                return_type
            }
            Target::LegacyAsync => match &return_type.kind {
                TypeKind::Reference { name, args } if function.is_async && name == "Promise" && args.len() == 1 => {
                    &args[0]
                }
                _ => {
                    return Err(CompilationError::new(
                        name_location(),
                        CompilationErrorKind::AsyncRequired,
                    ))
                }
            },
        };
        self.map_type(value_type)
    }

    fn map_type(&self, ty: &TypeNode) -> Result<DeclaredType, CompilationError> {
        let error = |kind| CompilationError::new(source_location(self.file(), ty.span), kind);
        if array_element(ty).is_some() {
            return Err(error(CompilationErrorKind::ArrayReturnType));
        }
        match &ty.kind {
            TypeKind::Boolean => Ok(DeclaredType::Bool),
            TypeKind::String => Ok(DeclaredType::String),
            TypeKind::Number => Ok(DeclaredType::Float),
            TypeKind::Reference { name, args } if args.is_empty() && self.schema_compiler.is_known(name) => {
                Ok(DeclaredType::Proto(self.schema_compiler.qualify(name)))
            }
            TypeKind::Reference { name, .. } if name == "Record" => Ok(DeclaredType::Json),
            TypeKind::Reference { name, args } if name == "object" && args.is_empty() => {
                Ok(DeclaredType::Json)
            }
            TypeKind::Union(_) => Err(error(CompilationErrorKind::UnionNotSupported(
                ty.kind.describe(),
            ))),
            other => Err(error(CompilationErrorKind::UnsupportedReturnType(
                other.describe(),
            ))),
        }
    }

    fn stmt_error(&self, stmt: &Stmt, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::new(source_location(self.file(), stmt.span), kind)
    }
}

/// The returned expression of `{ return x; }` or `return x;`.
fn single_return(stmt: &Stmt) -> Option<&crate::parser::Expr> {
    match &stmt.kind {
        StmtKind::Return(Some(expr)) => Some(expr),
        StmtKind::Block(block) => match block.stmts.as_slice() {
            [only] => match &only.kind {
                StmtKind::Return(Some(expr)) => Some(expr),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}
