/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Call-site rewriter.
//!
//! Each config function becomes a remote lookup through an explicit client
//! parameter, with the original body kept as the `catch` fallback:
//!
//! ```text
//! export function getX(<params>, client: ConfigClient): T {
//!   try {
//!     return get("<namespace>", "<key>", <context>, client);
//!   } catch (e) {
//!     <original body>
//!   }
//! }
//! ```

use std::fmt::Write as _;

use crate::compiler::{compile_namespace, CompileOptions};
use crate::error::CompilerError;
use crate::parser::{parse_source, FunctionDecl, ParamPattern, SourceFile};

pub const DEFAULT_RUNTIME_MODULE: &str = "@controlpath/runtime";
pub const DEFAULT_CLIENT_TYPE: &str = "ConfigClient";

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOptions {
    /// Module that exports `get` and the client type.
    pub runtime_module: String,
    pub client_type: String,
    /// Name of the appended client parameter.
    pub client_param: String,
    pub compile: CompileOptions,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            client_type: DEFAULT_CLIENT_TYPE.to_string(),
            client_param: "client".to_string(),
            compile: CompileOptions::default(),
        }
    }
}

/// Validate `text` as a namespace and rewrite every config function.
///
/// Imports and interfaces are copied through unchanged.
///
/// # Errors
///
/// Returns the first parse or compilation error; nothing is rewritten
/// unless every function compiles.
pub fn rewrite_source(
    text: &str,
    file: &str,
    namespace: &str,
    options: &RewriteOptions,
) -> Result<String, CompilerError> {
    let source = parse_source(text, file)?;
    let compiled = compile_namespace(&source, namespace, &options.compile)?;

    let mut out = String::with_capacity(text.len() * 2);
    let _ = writeln!(
        out,
        "import {{ get, type {} }} from {};",
        options.client_type,
        quote(&options.runtime_module)
    );

    let mut cursor = 0;
    for (function, config) in source.functions().zip(&compiled.configs) {
        out.push_str(text.get(cursor..function.span.start).unwrap_or_default());
        rewrite_function(&mut out, &source, function, namespace, &config.key, options);
        cursor = function.span.end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());

    tracing::debug!(namespace, functions = compiled.configs.len(), "rewrote call sites");
    Ok(out)
}

fn rewrite_function(
    out: &mut String,
    source: &SourceFile,
    function: &FunctionDecl,
    namespace: &str,
    key: &str,
    options: &RewriteOptions,
) {
    let original_params = source.slice(function.params_span).trim();
    let client = format!("{}: {}", options.client_param, options.client_type);
    let params = if original_params.is_empty() {
        client
    } else {
        format!("{original_params}, {client}")
    };
    let return_type = function
        .return_type
        .as_ref()
        .map(|ty| format!(": {}", source.slice(ty.span)))
        .unwrap_or_default();
    let export = if function.exported { "export " } else { "" };
    let asynchronous = if function.is_async { "async " } else { "" };

    let _ = writeln!(
        out,
        "{export}{asynchronous}function {}({params}){return_type} {{",
        function.name.name
    );
    out.push_str("  try {\n");
    let _ = writeln!(
        out,
        "    return get({}, {}, {}, {});",
        quote(namespace),
        quote(key),
        context_object(function),
        options.client_param
    );
    out.push_str("  } catch (e) {\n");
    for line in original_body(source, function) {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "    {line}");
        }
    }
    out.push_str("  }\n}");
}

/// The context argument: re-packed bindings, the parameter itself, or `{}`.
fn context_object(function: &FunctionDecl) -> String {
    match function.params.first().map(|param| &param.pattern) {
        Some(ParamPattern::Object(names)) if !names.is_empty() => {
            let names: Vec<&str> = names.iter().map(|ident| ident.name.as_str()).collect();
            format!("{{ {} }}", names.join(", "))
        }
        Some(ParamPattern::Identifier(ident)) => ident.name.clone(),
        _ => "{}".to_string(),
    }
}

/// Body lines between the braces, dedented to column zero.
fn original_body(source: &SourceFile, function: &FunctionDecl) -> Vec<String> {
    let span = function.body.span;
    let inner = source
        .text
        .get(span.start + 1..span.end.saturating_sub(1))
        .unwrap_or_default();
    let mut lines = inner.lines();
    // Text on the line of the opening brace has no indentation of its own.
    let inline = lines
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string);
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut body: Vec<String> = inline.into_iter().collect();
    body.extend(rest.iter().map(|line| {
        if line.trim().is_empty() {
            String::new()
        } else {
            line.get(indent..)
                .unwrap_or_else(|| line.trim_start())
                .trim_end()
                .to_string()
        }
    }));
    while body.last().is_some_and(String::is_empty) {
        body.pop();
    }
    let leading = body.iter().take_while(|line| line.is_empty()).count();
    body.drain(..leading);
    body
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{text:?}"))
}
