/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Parser module for the restricted TypeScript subset config functions are written in.
 * This module works only with in-memory data (no file I/O).
 */

pub mod error;
mod grammar;
mod lexer;
pub mod syntax;

pub use error::ParseError;
pub use syntax::*;

/// Parse one source file into its syntax tree.
///
/// # Errors
///
/// Returns `ParseError` for malformed text and for top-level constructs
/// outside the supported subset.
pub fn parse_source(text: &str, file: &str) -> Result<SourceFile, ParseError> {
    let tokens = lexer::Lexer::new(text, file).tokenize()?;
    let items = grammar::Parser::new(tokens, file).parse_items()?;
    tracing::trace!(file, items = items.len(), "parsed source");
    Ok(SourceFile {
        file: file.to_string(),
        text: text.to_string(),
        items,
    })
}

/// Parse a standalone expression, e.g. a guard typed into a REPL or test.
///
/// # Errors
///
/// Returns `ParseError` if the text is not exactly one expression.
pub fn parse_expression(text: &str, file: &str) -> Result<Expr, ParseError> {
    let tokens = lexer::Lexer::new(text, file).tokenize()?;
    let mut parser = grammar::Parser::new(tokens, file);
    parser.parse_standalone_expression()
}

#[cfg(test)]
mod tests;
