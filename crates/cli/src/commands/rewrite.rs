//! Rewrite command implementation
//!
//! Turns a namespace source file into one whose functions call the runtime
//! client, keeping the original bodies as the static fallback.

use crate::error::{CliError, CliResult};
use crate::utils::config::ProjectConfig;
use controlpath_native::rewrite_source;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Options {
    pub file: String,
    /// Defaults to the file stem.
    pub namespace: Option<String>,
    /// Print to stdout when absent.
    pub out: Option<String>,
}

fn determine_namespace(options: &Options) -> CliResult<String> {
    if let Some(namespace) = &options.namespace {
        return Ok(namespace.clone());
    }
    Path::new(&options.file)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::Message(format!(
                "Cannot derive a namespace from {}; pass --namespace",
                options.file
            ))
        })
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(Some(path)) => {
            println!("✓ Rewrote {} to {}", options.file, path.display());
            0
        }
        Ok(None) => 0,
        Err(e) => {
            eprintln!("✗ Rewrite failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<Option<PathBuf>> {
    let config = ProjectConfig::load()?;
    let namespace = determine_namespace(options)?;

    let text = fs::read_to_string(&options.file)
        .map_err(|e| CliError::Message(format!("Failed to read {}: {e}", options.file)))?;
    let rewritten = rewrite_source(&text, &options.file, &namespace, &config.rewrite_options())?;

    match &options.out {
        Some(out) => {
            let path = PathBuf::from(out);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(&path, rewritten)?;
            Ok(Some(path))
        }
        None => {
            print!("{rewritten}");
            Ok(None)
        }
    }
}
