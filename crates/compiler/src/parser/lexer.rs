/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Tokenizer for the restricted config-function source language.
 */

use super::error::ParseError;
use super::syntax::Span;
use crate::error::SourceLocation;

/// Punctuators, longest first so that the first match wins.
/// `>>` and `<<` are deliberately absent so nested generics close cleanly.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "...", "??=", "&&=", "||=", "**=", "==", "!=", "<=", ">=", "&&", "||", "??",
    "?.", "=>", "+=", "-=", "*=", "/=", "%=", "++", "--", "**", "{", "}", "(", ")", "[", "]", ";",
    ",", "<", ">", "+", "-", "*", "/", "%", "!", "=", "?", ":", ".", "&", "|", "^", "~", "@",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers and keywords alike.
    Ident(String),
    String(String),
    Number(f64),
    Punct(&'static str),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("'{name}'"),
            Self::String(value) => format!("string {value:?}"),
            Self::Number(value) => format!("number {value}"),
            Self::Punct(punct) => format!("'{punct}'"),
            Self::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// JSDoc block immediately preceding this token.
    pub doc: Option<String>,
}

pub struct Lexer<'a> {
    file: &'a str,
    text: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, file: &'a str) -> Self {
        Self {
            file,
            text,
            chars: text.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut doc = None;

        loop {
            self.skip_whitespace();
            let Some(c) = self.current() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: self.span_from(self.offset(), self.line, self.column),
                    doc: None,
                });
                return Ok(tokens);
            };

            if c == '/' && self.peek_char(1) == Some('/') {
                while self.current().is_some_and(|c| c != '\n') {
                    self.bump();
                }
                continue;
            }
            if c == '/' && self.peek_char(1) == Some('*') {
                let comment = self.block_comment()?;
                doc = if comment.starts_with("/**") && comment != "/**/" {
                    Some(strip_doc(comment))
                } else {
                    None
                };
                continue;
            }

            let (start, line, column) = (self.offset(), self.line, self.column);
            let kind = if c == '"' || c == '\'' || c == '`' {
                self.string(c)?
            } else if c.is_ascii_digit()
                || (c == '.' && self.peek_char(1).is_some_and(|n| n.is_ascii_digit()))
            {
                self.number()?
            } else if c.is_alphabetic() || c == '_' || c == '$' {
                let mut name = String::new();
                while let Some(c) = self.current() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(name)
            } else {
                self.punctuator(c)?
            };

            tokens.push(Token {
                kind,
                span: self.span_from(start, line, column),
                doc: doc.take(),
            });
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.text.len(), |(offset, _)| *offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn span_from(&self, start: usize, line: u32, column: u32) -> Span {
        Span {
            start,
            end: self.offset(),
            line,
            column,
        }
    }

    fn location(&self, line: u32, column: u32) -> SourceLocation {
        SourceLocation::new(self.file, line, column)
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn block_comment(&mut self) -> Result<&'a str, ParseError> {
        let (start, line, column) = (self.offset(), self.line, self.column);
        self.bump();
        self.bump();
        loop {
            match self.current() {
                Some('*') if self.peek_char(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    return Ok(&self.text[start..self.offset()]);
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    return Err(ParseError::Unterminated {
                        location: self.location(line, column),
                        what: "block comment",
                    })
                }
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::Unterminated {
                    location: self.location(line, column),
                    what: "string literal",
                });
            };
            match c {
                c if c == quote => return Ok(TokenKind::String(value)),
                '\n' if quote != '`' => {
                    return Err(ParseError::Unterminated {
                        location: self.location(line, column),
                        what: "string literal",
                    })
                }
                '$' if quote == '`' && self.current() == Some('{') => {
                    return Err(ParseError::Unsupported {
                        location: self.location(line, column),
                        construct: "template literal interpolation".to_string(),
                    })
                }
                '\\' => value.push(self.escape(line, column)?),
                c => value.push(c),
            }
        }
    }

    fn escape(&mut self, line: u32, column: u32) -> Result<char, ParseError> {
        let unterminated = |lexer: &Self| ParseError::Unterminated {
            location: lexer.location(line, column),
            what: "string literal",
        };
        let c = self.bump().ok_or_else(|| unterminated(self))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'u' => {
                let mut hex = String::new();
                if self.current() == Some('{') {
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                } else {
                    for _ in 0..4 {
                        hex.push(self.bump().ok_or_else(|| unterminated(self))?);
                    }
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| ParseError::InvalidNumber {
                        location: self.location(line, column),
                        text: format!("\\u{hex}"),
                    })?
            }
            other => other,
        })
    }

    fn number(&mut self) -> Result<TokenKind, ParseError> {
        let (start, line, column) = (self.offset(), self.line, self.column);
        let invalid = |lexer: &Self, text: &str| ParseError::InvalidNumber {
            location: lexer.location(line, column),
            text: text.to_string(),
        };

        if self.current() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.current() {
                if c.is_ascii_hexdigit() || c == '_' {
                    if c != '_' {
                        digits.push(c);
                    }
                    self.bump();
                } else {
                    break;
                }
            }
            let raw = &self.text[start..self.offset()];
            return u64::from_str_radix(&digits, 16)
                .map(|n| TokenKind::Number(n as f64))
                .map_err(|_| invalid(self, raw));
        }

        let mut digits = String::new();
        let mut seen_exponent = false;
        while let Some(c) = self.current() {
            match c {
                '0'..='9' | '.' => digits.push(c),
                '_' => {}
                'e' | 'E' if !seen_exponent => {
                    seen_exponent = true;
                    digits.push(c);
                    if matches!(self.peek_char(1), Some('+' | '-')) {
                        self.bump();
                        digits.push(self.current().unwrap_or('+'));
                    }
                }
                _ => break,
            }
            self.bump();
        }
        if let Some(c) = self.current().filter(|c| c.is_alphabetic() || *c == '_') {
            let raw = format!("{}{c}", &self.text[start..self.offset()]);
            return Err(invalid(self, &raw));
        }
        let raw = &self.text[start..self.offset()];
        digits
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| invalid(self, raw))
    }

    fn punctuator(&mut self, c: char) -> Result<TokenKind, ParseError> {
        let rest = &self.text[self.offset()..];
        for punct in PUNCTUATORS {
            if rest.starts_with(punct) {
                for _ in 0..punct.chars().count() {
                    self.bump();
                }
                return Ok(TokenKind::Punct(punct));
            }
        }
        Err(ParseError::UnexpectedCharacter {
            location: self.location(self.line, self.column),
            found: c,
        })
    }
}

/// Strip the `/** */` delimiters and `*` gutters of a JSDoc block.
fn strip_doc(comment: &str) -> String {
    let inner = comment
        .trim_start_matches("/**")
        .trim_end_matches("*/");
    inner
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new(text, "test.ts")
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("a !== b === c"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Punct("!=="),
                TokenKind::Ident("b".to_string()),
                TokenKind::Punct("==="),
                TokenKind::Ident("c".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_nested_generics_close_separately() {
        let tokens = kinds("Promise<Array<string>>");
        assert_eq!(tokens[tokens.len() - 3], TokenKind::Punct(">"));
        assert_eq!(tokens[tokens.len() - 2], TokenKind::Punct(">"));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb" `xA`"#),
            vec![
                TokenKind::String("it's".to_string()),
                TokenKind::String("a\nb".to_string()),
                TokenKind::String("xA".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1_000 0.25 .5 1e3 0xff"),
            vec![
                TokenKind::Number(1000.0),
                TokenKind::Number(0.25),
                TokenKind::Number(0.5),
                TokenKind::Number(1000.0),
                TokenKind::Number(255.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = Lexer::new("12abc", "n.ts").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_template_interpolation_rejected() {
        let err = Lexer::new("`a${b}`", "t.ts").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc", "u.ts").tokenize().unwrap_err();
        assert_eq!(err.location().line, 1);
        assert_eq!(err.location().column, 1);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = Lexer::new("a\n  b", "p.ts").tokenize().unwrap();
        assert_eq!((tokens[1].span.line, tokens[1].span.column), (2, 3));
        assert_eq!(tokens[1].span.start, 4);
    }

    #[test]
    fn test_jsdoc_attached_to_next_token() {
        let tokens = Lexer::new(
            "// ignored\n/**\n * Dark mode toggle.\n * Second line.\n */\nexport function",
            "d.ts",
        )
        .tokenize()
        .unwrap();
        assert_eq!(
            tokens[0].doc.as_deref(),
            Some("Dark mode toggle.\nSecond line.")
        );
        assert_eq!(tokens[1].doc, None);
    }

    #[test]
    fn test_plain_block_comment_is_not_doc() {
        let tokens = Lexer::new("/* note */ x", "c.ts").tokenize().unwrap();
        assert_eq!(tokens[0].doc, None);
    }
}
