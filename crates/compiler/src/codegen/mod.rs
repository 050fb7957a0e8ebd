/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Source generation: compiled namespaces back to config functions, and
 * config functions to client-backed call sites.
 */

pub mod rewrite;
pub mod source;

pub use rewrite::{rewrite_source, RewriteOptions};
pub use source::{generate_namespace_source, render_rule, render_value, source_model, SourceModel};
