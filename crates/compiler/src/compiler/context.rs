//! Context vocabulary declared by a config function's parameter

use std::collections::{BTreeMap, BTreeSet};

use crate::compiler::naming::snake_case;
use crate::error::CompilationErrorKind;
use crate::parser::{Expr, ExprKind, InterfaceDecl, MemberKind, Param, ParamPattern, TypeKind, TypeNode};

/// Source type of a context binding, when declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextType {
    Bool,
    Number,
    String,
    Other,
}

impl ContextType {
    fn of(ty: &TypeNode) -> Self {
        match &ty.kind {
            TypeKind::Boolean | TypeKind::BoolLiteral(_) => Self::Bool,
            TypeKind::Number | TypeKind::NumberLiteral(_) => Self::Number,
            TypeKind::String | TypeKind::StringLiteral(_) => Self::String,
            TypeKind::Union(members) => {
                let kinds: Vec<Self> = members
                    .iter()
                    .filter(|m| !matches!(m.kind, TypeKind::Undefined | TypeKind::Null))
                    .map(Self::of)
                    .collect();
                match kinds.first() {
                    Some(first) if kinds.iter().all(|k| k == first) => *first,
                    _ => Self::Other,
                }
            }
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Other => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Binding {
    None,
    Destructured(BTreeSet<String>),
    Identifier(String),
}

/// A resolved context reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextRef {
    /// snake_case storage key.
    pub key: String,
    pub ty: Option<ContextType>,
}

/// What a function body may read from its context parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextVocabulary {
    binding: Binding,
    /// Declared keys with their types; `None` when the parameter is untyped
    /// and the vocabulary cannot be known.
    keys: Option<BTreeMap<String, Option<ContextType>>>,
}

impl ContextVocabulary {
    /// Vocabulary of a function with the given (at most one) parameter.
    pub fn from_param<'i>(
        param: Option<&Param>,
        interfaces: impl IntoIterator<Item = &'i InterfaceDecl>,
    ) -> Self {
        let Some(param) = param else {
            return Self {
                binding: Binding::None,
                keys: Some(BTreeMap::new()),
            };
        };
        let member_types = param
            .ty
            .as_ref()
            .and_then(|ty| declared_members(ty, interfaces));

        match &param.pattern {
            ParamPattern::Object(names) => {
                let keys = names
                    .iter()
                    .map(|ident| {
                        let ty = member_types
                            .as_ref()
                            .and_then(|types| types.get(&ident.name).copied());
                        (snake_case(&ident.name), ty)
                    })
                    .collect();
                Self {
                    binding: Binding::Destructured(
                        names.iter().map(|ident| ident.name.clone()).collect(),
                    ),
                    keys: Some(keys),
                }
            }
            ParamPattern::Identifier(ident) => Self {
                binding: Binding::Identifier(ident.name.clone()),
                keys: member_types.map(|types| {
                    types
                        .into_iter()
                        .map(|(name, ty)| (snake_case(&name), Some(ty)))
                        .collect()
                }),
            },
        }
    }

    /// Declared keys, when known.
    pub fn keys(&self) -> Option<impl Iterator<Item = &str>> {
        self.keys.as_ref().map(|keys| keys.keys().map(String::as_str))
    }

    /// Whether `expr` has the shape of a context reference.
    #[must_use]
    pub fn is_reference(expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Identifier(_) => true,
            ExprKind::Member { object, .. } => matches!(object.kind, ExprKind::Identifier(_)),
            ExprKind::Paren(inner) => Self::is_reference(inner),
            _ => false,
        }
    }

    /// Resolve a context reference to its storage key.
    ///
    /// With `check`, the key must be declared by the parameter (when the
    /// declaration is known).
    ///
    /// # Errors
    ///
    /// Returns the error kind for non-reference shapes and undeclared keys.
    pub fn resolve(&self, expr: &Expr, check: bool) -> Result<ContextRef, CompilationErrorKind> {
        match &expr.kind {
            ExprKind::Paren(inner) => self.resolve(inner, check),
            ExprKind::Identifier(name) => {
                if let Binding::Identifier(param) = &self.binding {
                    if param == name {
                        return Err(CompilationErrorKind::InvalidContextReference(format!(
                            "the context parameter '{name}' itself"
                        )));
                    }
                }
                let declared = match &self.binding {
                    Binding::Destructured(names) => Some(names.contains(name)),
                    _ => self.keys.as_ref().map(|_| false),
                };
                self.lookup(snake_case(name), declared, check)
            }
            ExprKind::Member { object, property } => {
                let ExprKind::Identifier(object) = &object.kind else {
                    return Err(CompilationErrorKind::InvalidContextReference(
                        expr.kind.describe(),
                    ));
                };
                let key = snake_case(&property.name);
                match &self.binding {
                    Binding::Identifier(param) if param == object => {
                        let declared = self.keys.as_ref().map(|keys| keys.contains_key(&key));
                        self.lookup(key, declared, check)
                    }
                    _ if check => Err(CompilationErrorKind::InvalidContextReference(format!(
                        "'{object}.{}' (not a property of the context parameter)",
                        property.name
                    ))),
                    _ => Ok(ContextRef { key, ty: None }),
                }
            }
            other => Err(CompilationErrorKind::InvalidContextReference(other.describe())),
        }
    }

    fn lookup(
        &self,
        key: String,
        declared: Option<bool>,
        check: bool,
    ) -> Result<ContextRef, CompilationErrorKind> {
        if check && declared == Some(false) {
            return Err(CompilationErrorKind::UndeclaredContextKey(key));
        }
        let ty = self
            .keys
            .as_ref()
            .and_then(|keys| keys.get(&key).copied().flatten());
        Ok(ContextRef { key, ty })
    }
}

/// Member name → type for an object type literal or a named interface.
fn declared_members<'i>(
    ty: &TypeNode,
    interfaces: impl IntoIterator<Item = &'i InterfaceDecl>,
) -> Option<BTreeMap<String, ContextType>> {
    let members = match &ty.kind {
        TypeKind::Object(members) => members.as_slice(),
        TypeKind::Reference { name, args } if args.is_empty() => {
            interfaces
                .into_iter()
                .find(|interface| &interface.name.name == name)?
                .members
                .as_slice()
        }
        _ => return None,
    };
    Some(
        members
            .iter()
            .filter_map(|member| match &member.kind {
                MemberKind::Property { name, ty, .. } => Some((name.clone(), ContextType::of(ty))),
                _ => None,
            })
            .collect(),
    )
}
