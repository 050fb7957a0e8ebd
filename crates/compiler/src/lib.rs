//! Control Path Native Compiler Library
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.
//!
//! This library compiles config functions, written in a restricted subset of
//! TypeScript, into typed decision trees and evaluates them against a context.
//! It works only with in-memory data (no file I/O); storage is reached through
//! the [`sync::Repository`] trait.
//!
//! # Example
//!
//! ```rust
//! use controlpath_native::{compile_source, evaluate, Context, Value};
//!
//! let source = r#"
//! export function getDiscount({ country }: { country: string }): number {
//!   if (country === "US") {
//!     return 0.1;
//!   }
//!   return 0;
//! }
//! "#;
//!
//! let namespace = compile_source(source, "lekko/default.ts", "default")?;
//! let config = namespace.config("discount").expect("compiled");
//! let context = Context::builder().set("country", "US").build();
//! let result = evaluate(config, "default", &context)?;
//! assert_eq!(result.value, Value::Double(0.1));
//! assert_eq!(result.path, vec![0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod runtime;
pub mod schemas;
pub mod sync;
pub mod validator;

use ast::Bundle;

// Re-export the public API
pub use ast::{Config, ConfigType, Namespace, Value};
pub use codegen::{generate_namespace_source, rewrite_source, RewriteOptions};
pub use compiler::{compile_namespace, compile_namespace_report, CompileOptions, Target};
pub use error::{
    ClientError, CompilationError, CompilerError, EvaluationError, RepositoryError,
    SerializationError,
};
pub use evaluator::{evaluate, Context, EvaluationResult};
pub use parser::parse_source;
pub use runtime::{get_with_fallback, ConfigClient, LocalClient, StaticFunction};
pub use sync::{sync_namespace, MemoryRepository, Repository, SyncOptions, SyncReport};

/// Parse and compile one namespace source file with default options.
///
/// # Errors
///
/// Returns the first parse or compilation error.
pub fn compile_source(text: &str, file: &str, namespace: &str) -> Result<Namespace, CompilerError> {
    let source = parse_source(text, file)?;
    compile_namespace(&source, namespace, &CompileOptions::default())
}

/// Serialize a bundle to MessagePack bytes.
///
/// # Errors
///
/// Returns `SerializationError` if encoding fails.
pub fn serialize_bundle(bundle: &Bundle) -> Result<Vec<u8>, CompilerError> {
    rmp_serde::to_vec_named(bundle)
        .map_err(|e| SerializationError::MessagePack(e.to_string()).into())
}

/// Read a bundle written by [`serialize_bundle`].
///
/// # Errors
///
/// Returns `SerializationError` for malformed bytes or an unknown version.
pub fn deserialize_bundle(bytes: &[u8]) -> Result<Bundle, CompilerError> {
    let bundle: Bundle = rmp_serde::from_slice(bytes)
        .map_err(|e| SerializationError::MessagePack(e.to_string()))?;
    if bundle.version != ast::BUNDLE_VERSION {
        return Err(SerializationError::InvalidArtifact(format!(
            "unsupported bundle version '{}'",
            bundle.version
        ))
        .into());
    }
    Ok(bundle)
}
