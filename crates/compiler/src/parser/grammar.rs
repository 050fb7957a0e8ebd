/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Recursive-descent grammar over the token stream.
 */

use super::error::ParseError;
use super::lexer::{Token, TokenKind};
use super::syntax::*;
use crate::error::SourceLocation;

/// Keywords that begin a new statement; used to recover statement
/// boundaries when a skipped statement omits its semicolon.
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "if", "const", "let", "var", "for", "while", "do", "throw", "switch", "try",
    "function", "break", "continue",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "??=", "&&=", "||=",
];

pub struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, file: &'a str) -> Self {
        Self {
            file,
            tokens,
            current: 0,
        }
    }

    pub fn parse_items(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        while !self.is_at_end() {
            if self.eat_punct(";") {
                continue;
            }
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    pub fn parse_standalone_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    // ---- token helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current + ahead).min(last)].kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn check_punct(&self, punct: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == keyword)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn location_of(&self, span: Span) -> SourceLocation {
        SourceLocation::new(self.file, span.line, span.column)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::UnexpectedToken {
            location: self.location_of(token.span),
            expected: expected.to_string(),
            found: token.kind.describe(),
        }
    }

    fn unsupported(&self, span: Span, construct: impl Into<String>) -> ParseError {
        ParseError::Unsupported {
            location: self.location_of(span),
            construct: construct.into(),
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<Token, ParseError> {
        if self.check_punct(punct) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{punct}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let ident = Ident {
                    name: name.clone(),
                    span: self.peek().span,
                };
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Span from `start` through the last consumed token.
    fn span_since(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }

    // ---- items ---------------------------------------------------------

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        let start = self.peek().span;
        let doc = self.peek().doc.clone();

        if self.eat_keyword("import") {
            self.skip_import();
            return Ok(Item::Import(self.span_since(start)));
        }

        let exported = self.eat_keyword("export");
        if exported && self.check_keyword("default") {
            return Err(self.unsupported(self.peek().span, "default export"));
        }
        let is_async = self.eat_keyword("async");

        if self.eat_keyword("function") {
            return self
                .parse_function(start, doc, exported, is_async)
                .map(Item::Function);
        }
        if is_async {
            return Err(self.unexpected("'function'"));
        }
        if self.eat_keyword("interface") {
            return self.parse_interface(start, exported).map(Item::Interface);
        }
        if self.check_keyword("type") {
            self.advance();
            return self.parse_type_alias(start, exported).map(Item::Interface);
        }

        let token = self.peek();
        Err(self.unsupported(
            token.span,
            format!("top-level {}", token.kind.describe()),
        ))
    }

    /// Consume an import declaration through its module specifier.
    fn skip_import(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            let token = self.advance();
            match token.kind {
                TokenKind::Punct("{") => depth += 1,
                TokenKind::Punct("}") => depth = depth.saturating_sub(1),
                TokenKind::String(_) if depth == 0 => {
                    self.eat_punct(";");
                    return;
                }
                _ => {}
            }
        }
    }

    fn parse_function(
        &mut self,
        start: Span,
        doc: Option<String>,
        exported: bool,
        is_async: bool,
    ) -> Result<FunctionDecl, ParseError> {
        let name = self.expect_ident()?;
        if self.check_punct("<") {
            return Err(self.unsupported(self.peek().span, "generic type parameters"));
        }
        let open = self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.check_punct(")") {
            params.push(self.parse_param()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        let close = self.expect_punct(")")?;
        let params_span = Span {
            start: open.span.end,
            end: close.span.start,
            line: open.span.line,
            column: open.span.column + 1,
        };

        let return_type = if self.eat_punct(":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            exported,
            is_async,
            doc,
            params,
            params_span,
            return_type,
            body,
            span: self.span_since(start),
        })
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let start = self.peek().span;
        let pattern = if self.eat_punct("{") {
            let mut names = Vec::new();
            while !self.check_punct("}") {
                let ident = self.expect_ident()?;
                if self.check_punct(":") {
                    return Err(self.unsupported(self.peek().span, "renamed binding"));
                }
                if self.check_punct("=") {
                    return Err(self.unsupported(self.peek().span, "default binding value"));
                }
                names.push(ident);
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct("}")?;
            ParamPattern::Object(names)
        } else if self.check_punct("[") {
            return Err(self.unsupported(start, "array binding pattern"));
        } else if self.check_punct("...") {
            return Err(self.unsupported(start, "rest parameter"));
        } else {
            ParamPattern::Identifier(self.expect_ident()?)
        };

        self.eat_punct("?");
        let ty = if self.eat_punct(":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        if self.check_punct("=") {
            return Err(self.unsupported(self.peek().span, "default parameter value"));
        }
        Ok(Param {
            pattern,
            ty,
            span: self.span_since(start),
        })
    }

    fn parse_interface(&mut self, start: Span, exported: bool) -> Result<InterfaceDecl, ParseError> {
        let name = self.expect_ident()?;
        if self.check_keyword("extends") || self.check_punct("<") {
            return Err(self.unsupported(self.peek().span, "interface heritage or type parameters"));
        }
        self.expect_punct("{")?;
        let members = self.parse_members()?;
        Ok(InterfaceDecl {
            name,
            exported,
            members,
            span: self.span_since(start),
        })
    }

    fn parse_type_alias(&mut self, start: Span, exported: bool) -> Result<InterfaceDecl, ParseError> {
        let name = self.expect_ident()?;
        self.expect_punct("=")?;
        let ty = self.parse_type()?;
        self.eat_punct(";");
        match ty.kind {
            TypeKind::Object(members) => Ok(InterfaceDecl {
                name,
                exported,
                members,
                span: self.span_since(start),
            }),
            other => Err(self.unsupported(
                ty.span,
                format!("type alias of {}", other.describe()),
            )),
        }
    }

    /// Members of an object type, after the opening brace.
    fn parse_members(&mut self) -> Result<Vec<Member>, ParseError> {
        let mut members = Vec::new();
        while !self.check_punct("}") {
            if self.is_at_end() {
                return Err(self.unexpected("'}'"));
            }
            let start = self.peek().span;
            let before = self.current;
            if self.check_keyword("readonly")
                && matches!(self.peek_at(1), TokenKind::Ident(_) | TokenKind::String(_))
            {
                self.advance();
            }

            let kind = if self.check_punct("[") {
                self.skip_balanced("[", "]")?;
                self.expect_punct(":")?;
                self.parse_type()?;
                MemberKind::IndexSignature
            } else {
                let name = match self.advance().kind {
                    TokenKind::Ident(name) | TokenKind::String(name) => name,
                    _ => {
                        self.current = before;
                        return Err(self.unexpected("member name"));
                    }
                };
                let optional = self.eat_punct("?");
                if self.check_punct("(") || self.check_punct("<") {
                    if self.check_punct("<") {
                        self.skip_balanced("<", ">")?;
                    }
                    self.skip_balanced("(", ")")?;
                    if self.eat_punct(":") {
                        self.parse_type()?;
                    }
                    MemberKind::Method { name }
                } else {
                    self.expect_punct(":")?;
                    MemberKind::Property {
                        name,
                        optional,
                        ty: self.parse_type()?,
                    }
                }
            };
            members.push(Member {
                kind,
                span: self.span_since(start),
            });
            if !self.eat_punct(";") {
                self.eat_punct(",");
            }
        }
        self.expect_punct("}")?;
        Ok(members)
    }

    // ---- types ---------------------------------------------------------

    pub(crate) fn parse_type(&mut self) -> Result<TypeNode, ParseError> {
        let start = self.peek().span;
        self.eat_punct("|");
        let mut members = vec![self.parse_array_type()?];
        while self.eat_punct("|") {
            members.push(self.parse_array_type()?);
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }
        Ok(TypeNode {
            kind: TypeKind::Union(members),
            span: self.span_since(start),
        })
    }

    fn parse_array_type(&mut self) -> Result<TypeNode, ParseError> {
        let start = self.peek().span;
        let mut ty = self.parse_primary_type()?;
        while self.check_punct("[") && matches!(self.peek_at(1), TokenKind::Punct("]")) {
            self.advance();
            self.advance();
            ty = TypeNode {
                kind: TypeKind::Array(Box::new(ty)),
                span: self.span_since(start),
            };
        }
        Ok(ty)
    }

    fn parse_primary_type(&mut self) -> Result<TypeNode, ParseError> {
        let start = self.peek().span;
        let before = self.current;
        let kind = match self.advance().kind {
            TokenKind::Ident(name) => match name.as_str() {
                "string" => TypeKind::String,
                "number" => TypeKind::Number,
                "boolean" => TypeKind::Boolean,
                "undefined" | "void" => TypeKind::Undefined,
                "null" => TypeKind::Null,
                "true" => TypeKind::BoolLiteral(true),
                "false" => TypeKind::BoolLiteral(false),
                _ => {
                    let mut name = name;
                    while self.check_punct(".") {
                        self.advance();
                        name.push('.');
                        name.push_str(&self.expect_ident()?.name);
                    }
                    let mut args = Vec::new();
                    if self.eat_punct("<") {
                        loop {
                            args.push(self.parse_type()?);
                            if !self.eat_punct(",") {
                                break;
                            }
                        }
                        self.expect_punct(">")?;
                    }
                    TypeKind::Reference { name, args }
                }
            },
            TokenKind::String(value) => TypeKind::StringLiteral(value),
            TokenKind::Number(value) => TypeKind::NumberLiteral(value),
            TokenKind::Punct("-") => match self.advance().kind {
                TokenKind::Number(value) => TypeKind::NumberLiteral(-value),
                _ => {
                    self.current = before;
                    return Err(self.unexpected("number"));
                }
            },
            TokenKind::Punct("{") => TypeKind::Object(self.parse_members()?),
            TokenKind::Punct("(") => {
                let inner = self.parse_type()?;
                self.expect_punct(")")?;
                return Ok(inner);
            }
            _ => {
                self.current = before;
                return Err(self.unexpected("type"));
            }
        };
        Ok(TypeNode {
            kind,
            span: self.span_since(start),
        })
    }

    // ---- statements ----------------------------------------------------

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect_punct("{")?.span;
        let mut stmts = Vec::new();
        while !self.check_punct("}") {
            if self.is_at_end() {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.parse_statement()?);
        }
        self.advance();
        Ok(Block {
            stmts,
            span: self.span_since(start),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().span;
        let kind = match &self.peek().kind {
            TokenKind::Punct("{") => StmtKind::Block(self.parse_block()?),
            TokenKind::Punct(";") => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::Ident(keyword) => match keyword.as_str() {
                "if" => self.parse_if()?,
                "return" => {
                    self.advance();
                    let value = if self.check_punct(";")
                        || self.check_punct("}")
                        || self.is_at_end()
                    {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.eat_punct(";");
                    StmtKind::Return(value)
                }
                "const" | "let" | "var" => {
                    self.skip_statement();
                    StmtKind::Disallowed(DisallowedStmt::Variable)
                }
                "throw" => {
                    self.skip_statement();
                    StmtKind::Disallowed(DisallowedStmt::Throw)
                }
                "break" | "continue" => {
                    self.skip_statement();
                    StmtKind::Disallowed(DisallowedStmt::Break)
                }
                "for" | "while" => {
                    self.advance();
                    self.eat_keyword("await");
                    self.skip_balanced("(", ")")?;
                    self.parse_statement()?;
                    StmtKind::Disallowed(DisallowedStmt::Loop)
                }
                "do" => {
                    self.advance();
                    self.parse_statement()?;
                    if self.eat_keyword("while") {
                        self.skip_balanced("(", ")")?;
                    }
                    self.eat_punct(";");
                    StmtKind::Disallowed(DisallowedStmt::Loop)
                }
                "switch" => {
                    self.advance();
                    self.skip_balanced("(", ")")?;
                    self.skip_balanced("{", "}")?;
                    StmtKind::Disallowed(DisallowedStmt::Switch)
                }
                "try" => {
                    self.advance();
                    self.parse_block()?;
                    if self.eat_keyword("catch") {
                        if self.check_punct("(") {
                            self.skip_balanced("(", ")")?;
                        }
                        self.parse_block()?;
                    }
                    if self.eat_keyword("finally") {
                        self.parse_block()?;
                    }
                    StmtKind::Disallowed(DisallowedStmt::Try)
                }
                "function" => {
                    self.advance();
                    self.expect_ident()?;
                    self.skip_balanced("(", ")")?;
                    while !self.check_punct("{") && !self.is_at_end() {
                        self.advance();
                    }
                    self.skip_balanced("{", "}")?;
                    StmtKind::Disallowed(DisallowedStmt::Function)
                }
                _ => self.skip_expression_statement(),
            },
            _ => self.skip_expression_statement(),
        };
        Ok(Stmt {
            kind,
            span: self.span_since(start),
        })
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.advance();
        self.expect_punct("(")?;
        let condition = self.parse_expression()?;
        self.expect_punct(")")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat_keyword("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Skip an expression statement, classifying it by its top-level operators.
    fn skip_expression_statement(&mut self) -> StmtKind {
        let start = self.current;
        self.skip_statement();
        let mut depth = 0i32;
        let mut kind = DisallowedStmt::Expression;
        for token in &self.tokens[start..self.current] {
            if let TokenKind::Punct(p) = token.kind {
                match p {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth -= 1,
                    _ if depth == 0 && ASSIGNMENT_OPERATORS.contains(&p) => {
                        kind = DisallowedStmt::Assignment;
                        break;
                    }
                    "++" | "--" if depth == 0 => kind = DisallowedStmt::Update,
                    _ => {}
                }
            }
        }
        StmtKind::Disallowed(kind)
    }

    /// Consume tokens through the end of the current statement: a top-level
    /// `;`, a closing brace of the enclosing block (not consumed), or a
    /// statement keyword starting a new line.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        let first = self.current;
        while !self.is_at_end() {
            let token = self.peek();
            if depth == 0 && self.current > first {
                let new_line = token.span.line > self.previous().span.line;
                if new_line
                    && matches!(&token.kind, TokenKind::Ident(k) if STATEMENT_KEYWORDS.contains(&k.as_str()))
                {
                    return;
                }
            }
            match token.kind {
                TokenKind::Punct(";") if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Punct("}") if depth == 0 => return,
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_balanced(&mut self, open: &str, close: &str) -> Result<(), ParseError> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.unexpected(&format!("'{close}'")));
            }
            if self.check_punct(open) {
                depth += 1;
            } else if self.check_punct(close) {
                depth -= 1;
            }
            self.advance();
        }
        Ok(())
    }

    // ---- expressions ---------------------------------------------------

    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_logical_or()?;
        if !self.eat_punct("?") {
            return Ok(condition);
        }
        let then_value = self.parse_expression()?;
        self.expect_punct(":")?;
        let else_value = self.parse_expression()?;
        let span = self.span_since(condition.span);
        Ok(Expr {
            kind: ExprKind::Conditional {
                condition: Box::new(condition),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            },
            span,
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[("||", BinaryOp::Or), ("??", BinaryOp::Nullish)],
            Self::parse_logical_and,
        )
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(&[("&&", BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                ("===", BinaryOp::StrictEq),
                ("!==", BinaryOp::StrictNe),
                ("==", BinaryOp::LooseEq),
                ("!=", BinaryOp::LooseNe),
            ],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                ("<=", BinaryOp::Lte),
                (">=", BinaryOp::Gte),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("%", BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    /// Left-associative binary level.
    fn parse_binary_level(
        &mut self,
        operators: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat_punct(token) {
                    let right = next(self)?;
                    let span = left.span.to(right.span);
                    left = Expr {
                        kind: ExprKind::Binary {
                            op: *op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        span,
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let op = match &self.peek().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Minus),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Ident(name) if name == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Ident(name) if name == "await" => {
                return Err(self.unsupported(start, "await expression"));
            }
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr {
            span: start.to(operand.span),
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(".") || self.eat_punct("?.") {
                let property = self.expect_ident()?;
                expr = Expr {
                    span: expr.span.to(property.span),
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                };
            } else if self.eat_punct("(") {
                let mut args = Vec::new();
                while !self.check_punct(")") {
                    args.push(self.parse_expression()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct(")")?;
                expr = Expr {
                    span: self.span_since(expr.span),
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                };
            } else if self.eat_punct("[") {
                let index = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = Expr {
                    span: self.span_since(expr.span),
                    kind: ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let before = self.current;
        let kind = match self.advance().kind {
            TokenKind::Number(value) => ExprKind::Number(value),
            TokenKind::String(value) => ExprKind::String(value),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => ExprKind::Bool(true),
                "false" => ExprKind::Bool(false),
                "null" => ExprKind::Null,
                "undefined" => ExprKind::Undefined,
                "function" | "new" | "class" | "this" => {
                    return Err(self.unsupported(start, format!("'{name}' expression")));
                }
                _ => ExprKind::Identifier(name),
            },
            TokenKind::Punct("(") => {
                let inner = self.parse_expression()?;
                self.expect_punct(")")?;
                if self.check_punct("=>") {
                    return Err(self.unsupported(start, "arrow function"));
                }
                ExprKind::Paren(Box::new(inner))
            }
            TokenKind::Punct("[") => {
                let mut elements = Vec::new();
                while !self.check_punct("]") {
                    if self.check_punct("...") {
                        return Err(self.unsupported(self.peek().span, "spread element"));
                    }
                    elements.push(self.parse_expression()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                ExprKind::Array(elements)
            }
            TokenKind::Punct("{") => ExprKind::Object(self.parse_object_literal()?),
            _ => {
                self.current = before;
                return Err(self.unexpected("expression"));
            }
        };
        Ok(Expr {
            kind,
            span: self.span_since(start),
        })
    }

    fn parse_object_literal(&mut self) -> Result<Vec<Property>, ParseError> {
        let mut properties = Vec::new();
        while !self.check_punct("}") {
            let start = self.peek().span;
            let before = self.current;
            let key = match self.advance().kind {
                TokenKind::Ident(name) | TokenKind::String(name) => name,
                TokenKind::Number(value) => format_number_key(value),
                TokenKind::Punct("...") => {
                    return Err(self.unsupported(start, "spread property"));
                }
                TokenKind::Punct("[") => {
                    return Err(self.unsupported(start, "computed property name"));
                }
                _ => {
                    self.current = before;
                    return Err(self.unexpected("property name"));
                }
            };
            let value = if self.eat_punct(":") {
                self.parse_expression()?
            } else if self.check_punct("(") {
                return Err(self.unsupported(start, "method property"));
            } else {
                Expr {
                    kind: ExprKind::Identifier(key.clone()),
                    span: start,
                }
            };
            properties.push(Property {
                key,
                value,
                span: self.span_since(start),
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(properties)
    }
}

fn format_number_key(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
