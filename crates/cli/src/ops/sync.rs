//! Sync namespace source files into the config repository

use crate::error::{CliError, CliResult};
use crate::ops::toolchain;
use crate::repository::FsRepository;
use controlpath_native::{parse_source, sync_namespace, SyncOptions, SyncReport};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const NAMESPACE_PATTERN: &str = r"^[a-z][a-z0-9-]*$";

/// Settings shared by every namespace in one sync run
pub struct SyncSettings<'a> {
    pub options: SyncOptions,
    pub post_sync: &'a [String],
}

/// Result of syncing one namespace file
pub struct NamespaceOutcome {
    pub namespace: String,
    pub path: PathBuf,
    pub result: CliResult<SyncReport>,
}

/// Namespace files in `dir` as `(namespace, path)`, sorted by namespace.
///
/// A file counts when it has a `.ts` extension and its stem is a valid
/// namespace name; everything else is ignored.
pub fn discover_namespaces(dir: &Path) -> CliResult<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(CliError::Message(format!(
            "Source directory not found: {}",
            dir.display()
        )));
    }

    let pattern = namespace_pattern()?;
    let mut namespaces = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("ts") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if pattern.is_match(stem) {
                namespaces.push((stem.to_string(), path.clone()));
            } else {
                tracing::debug!(path = %path.display(), "skipping file with invalid namespace name");
            }
        }
    }
    namespaces.sort();
    Ok(namespaces)
}

/// Namespace name for a source file, if the file name is a valid one.
pub fn namespace_for(path: &Path) -> CliResult<Option<String>> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("ts") {
        return Ok(None);
    }
    let pattern = namespace_pattern()?;
    Ok(path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|stem| pattern.is_match(stem))
        .map(str::to_string))
}

fn namespace_pattern() -> CliResult<Regex> {
    Regex::new(NAMESPACE_PATTERN).map_err(|e| CliError::Message(format!("Invalid pattern: {e}")))
}

/// Sync one namespace file, then run the post-sync hooks.
pub fn sync_file(
    repository: &mut FsRepository,
    path: &Path,
    namespace: &str,
    settings: &SyncSettings<'_>,
) -> CliResult<SyncReport> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Message(format!("Failed to read {}: {e}", path.display())))?;
    let source = parse_source(&text, &path.display().to_string())?;
    let report = sync_namespace(repository, &source, namespace, &settings.options)?;

    toolchain::run_post_sync(settings.post_sync, namespace, &repository.proto_path(namespace))?;
    Ok(report)
}

/// Sync every namespace file in `dir`, in sorted order.
///
/// A failing namespace does not stop the others; each outcome is returned.
pub fn sync_dir(
    repository: &mut FsRepository,
    dir: &Path,
    settings: &SyncSettings<'_>,
) -> CliResult<Vec<NamespaceOutcome>> {
    let mut outcomes = Vec::new();
    for (namespace, path) in discover_namespaces(dir)? {
        let result = sync_file(repository, &path, &namespace, settings);
        if let Err(e) = &result {
            tracing::warn!(namespace = %namespace, error = %e, "namespace sync failed");
        }
        outcomes.push(NamespaceOutcome {
            namespace,
            path,
            result,
        });
    }
    Ok(outcomes)
}
