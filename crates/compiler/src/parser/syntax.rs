/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Syntax tree for the restricted config-function source language.
 */

/// Byte range plus the 1-based line/column of its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// Span covering `self` through `other`.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file: String,
    pub text: String,
    pub items: Vec<Item>,
}

impl SourceFile {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Interface(interface) => Some(interface),
            _ => None,
        })
    }

    /// Source text covered by `span`.
    #[must_use]
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(Span),
    Function(FunctionDecl),
    Interface(InterfaceDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub exported: bool,
    pub is_async: bool,
    /// JSDoc text preceding the declaration, gutters stripped.
    pub doc: Option<String>,
    pub params: Vec<Param>,
    /// Span of the parameter list, parentheses excluded.
    pub params_span: Span,
    pub return_type: Option<TypeNode>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: ParamPattern,
    pub ty: Option<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamPattern {
    Identifier(Ident),
    /// `{a, b}`; renamed or defaulted bindings are rejected by the parser.
    Object(Vec<Ident>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub exported: bool,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: MemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Property {
        name: String,
        optional: bool,
        ty: TypeNode,
    },
    Method {
        name: String,
    },
    IndexSignature,
}

impl MemberKind {
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Property { .. } => "PropertySignature",
            Self::Method { .. } => "MethodSignature",
            Self::IndexSignature => "IndexSignature",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    String,
    Number,
    Boolean,
    Undefined,
    Null,
    BoolLiteral(bool),
    StringLiteral(String),
    NumberLiteral(f64),
    Reference { name: String, args: Vec<TypeNode> },
    Array(Box<TypeNode>),
    Object(Vec<Member>),
    Union(Vec<TypeNode>),
}

impl TypeKind {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::BoolLiteral(b) => b.to_string(),
            Self::StringLiteral(s) => format!("{s:?}"),
            Self::NumberLiteral(n) => n.to_string(),
            Self::Reference { name, args } if args.is_empty() => name.clone(),
            Self::Reference { name, args } => format!(
                "{name}<{}>",
                args.iter()
                    .map(|arg| arg.kind.describe())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Array(inner) => format!("{}[]", inner.kind.describe()),
            Self::Object(_) => "object literal type".to_string(),
            Self::Union(members) => members
                .iter()
                .map(|member| member.kind.describe())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Includes the braces.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Return(Option<Expr>),
    Block(Block),
    Empty,
    /// Statements outside the config grammar. They are recognised only so
    /// the compiler can reject them by name.
    Disallowed(DisallowedStmt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisallowedStmt {
    Variable,
    Assignment,
    Update,
    Expression,
    Loop,
    Throw,
    Switch,
    Try,
    Function,
    Break,
}

impl StmtKind {
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::If { .. } => "IfStatement",
            Self::Return(_) => "ReturnStatement",
            Self::Block(_) => "Block",
            Self::Empty => "EmptyStatement",
            Self::Disallowed(kind) => match kind {
                DisallowedStmt::Variable => "VariableStatement",
                DisallowedStmt::Assignment => "AssignmentExpression",
                DisallowedStmt::Update => "UpdateExpression",
                DisallowedStmt::Expression => "ExpressionStatement",
                DisallowedStmt::Loop => "IterationStatement",
                DisallowedStmt::Throw => "ThrowStatement",
                DisallowedStmt::Switch => "SwitchStatement",
                DisallowedStmt::Try => "TryStatement",
                DisallowedStmt::Function => "FunctionDeclaration",
                DisallowedStmt::Break => "JumpStatement",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Bool(bool),
    Number(f64),
    String(String),
    Undefined,
    Null,
    Identifier(String),
    Member {
        object: Box<Expr>,
        property: Ident,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Nullish,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::StrictEq => "===",
            Self::StrictNe => "!==",
            Self::LooseEq => "==",
            Self::LooseNe => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Nullish => "??",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

impl ExprKind {
    /// Syntax kind name used in compile errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bool(_) => "BooleanLiteral".to_string(),
            Self::Number(_) => "NumericLiteral".to_string(),
            Self::String(_) => "StringLiteral".to_string(),
            Self::Undefined => "UndefinedKeyword".to_string(),
            Self::Null => "NullKeyword".to_string(),
            Self::Identifier(_) => "Identifier".to_string(),
            Self::Member { .. } => "PropertyAccessExpression".to_string(),
            Self::Index { .. } => "ElementAccessExpression".to_string(),
            Self::Call { .. } => "CallExpression".to_string(),
            Self::Array(_) => "ArrayLiteralExpression".to_string(),
            Self::Object(_) => "ObjectLiteralExpression".to_string(),
            Self::Unary { op, .. } => format!("PrefixUnaryExpression({op:?})"),
            Self::Binary { op, .. } => format!("BinaryExpression({})", op.token()),
            Self::Conditional { .. } => "ConditionalExpression".to_string(),
            Self::Paren(_) => "ParenthesizedExpression".to_string(),
        }
    }
}
