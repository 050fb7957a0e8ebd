//! Source generators
//!
//! Render persisted namespaces back into editable source files.

pub mod typescript;


use crate::error::{CliError, CliResult};
use controlpath_native::Namespace;
use std::path::{Path, PathBuf};

/// Trait for source generators
pub trait Generator {
    /// Write the source file for `namespace` into `output_dir`, returning its path.
    fn generate(&self, namespace: &Namespace, output_dir: &Path) -> CliResult<PathBuf>;
}

/// Generate source for the specified language
pub fn generate_source(
    language: &str,
    namespace: &Namespace,
    output_dir: &Path,
) -> CliResult<PathBuf> {
    match language {
        "typescript" | "ts" => {
            let generator = typescript::TypeScriptGenerator::new()?;
            generator.generate(namespace, output_dir)
        }
        _ => Err(CliError::Message(format!(
            "Unsupported language: {language}. Supported languages: typescript"
        ))),
    }
}
