//! Compile command implementation

use crate::error::{CliError, CliResult};
use crate::ops::sync::discover_namespaces;
use crate::utils::config::ProjectConfig;
use controlpath_native::ast::Bundle;
use controlpath_native::{compile_namespace, parse_source, serialize_bundle, CompileOptions, Namespace};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = ".controlpath/configs.msgpack";

pub struct Options {
    pub dir: Option<String>,
    pub output: Option<String>,
}

fn determine_output_path(options: &Options) -> PathBuf {
    options
        .output
        .as_ref()
        .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), PathBuf::from)
}

fn compile_file(path: &Path, namespace: &str, options: &CompileOptions) -> CliResult<Namespace> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Message(format!("Failed to read {}: {e}", path.display())))?;
    let source = parse_source(&text, &path.display().to_string())?;
    Ok(compile_namespace(&source, namespace, options)?)
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Compilation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<()> {
    let config = ProjectConfig::load()?;
    let source_dir = config.source_dir(options.dir.as_deref());
    let compile_options = config.compile_options();

    let mut namespaces = Vec::new();
    let mut failures = 0;
    for (namespace, path) in discover_namespaces(&source_dir)? {
        match compile_file(&path, &namespace, &compile_options) {
            Ok(compiled) => namespaces.push(compiled),
            Err(e) => {
                eprintln!("✗ Failed to compile {}", path.display());
                eprintln!("  Error: {e}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(CliError::Message(format!(
            "{failures} namespace file(s) failed to compile"
        )));
    }

    let config_count: usize = namespaces.iter().map(|ns| ns.configs.len()).sum();
    let namespace_count = namespaces.len();
    let bytes = serialize_bundle(&Bundle::new(namespaces))?;

    let output_path = determine_output_path(options);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output_path, bytes)?;

    println!(
        "✓ Compiled {config_count} configs in {namespace_count} namespaces to {}",
        output_path.display()
    );
    Ok(())
}
