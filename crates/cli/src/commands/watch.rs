//! Watch command implementation

use crate::commands::sync::report_outcome;
use crate::error::{CliError, CliResult};
use crate::ops::sync::{namespace_for, sync_dir, sync_file, NamespaceOutcome, SyncSettings};
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use controlpath_native::SyncOptions;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

pub struct Options {
    pub dir: Option<String>,
    pub repo: Option<String>,
    pub verify: bool,
}

const DEBOUNCE: Duration = Duration::from_millis(300);
const POLL: Duration = Duration::from_millis(100);

/// Namespace files among `paths`, keyed and ordered by namespace.
///
/// Paths that no longer exist are dropped; removing a source file does not
/// remove its persisted configs.
fn changed_namespaces(paths: &HashSet<PathBuf>) -> CliResult<BTreeMap<String, PathBuf>> {
    let mut namespaces = BTreeMap::new();
    for path in paths {
        if !path.is_file() {
            continue;
        }
        if let Some(namespace) = namespace_for(path)? {
            namespaces.insert(namespace, path.clone());
        }
    }
    Ok(namespaces)
}

/// Runs the watch command, re-syncing namespaces whose source files change.
pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Watch mode failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<()> {
    let config = ProjectConfig::load()?;
    let source_dir = config.source_dir(options.dir.as_deref());
    let mut repository = FsRepository::new(config.repository(options.repo.as_deref()));
    let settings = SyncSettings {
        options: SyncOptions {
            verify: options.verify,
            compile: config.compile_options(),
        },
        post_sync: &config.toolchain.post_sync,
    };

    // Initial sync
    println!("Starting watch mode...");
    for outcome in sync_dir(&mut repository, &source_dir, &settings)? {
        report_outcome(&outcome);
    }

    println!(
        "\nWatching {} for changes... (Press Ctrl+C to stop)",
        source_dir.display()
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())
        .map_err(|e| CliError::Message(format!("Failed to create file watcher: {e}")))?;
    watcher
        .watch(&source_dir, RecursiveMode::NonRecursive)
        .map_err(|e| {
            CliError::Message(format!("Failed to watch {}: {e}", source_dir.display()))
        })?;

    let mut last_change = Instant::now();
    let mut pending_changes: HashSet<PathBuf> = HashSet::new();

    loop {
        match rx.recv_timeout(POLL) {
            Ok(Ok(event)) => {
                if matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    pending_changes.extend(event.paths);
                    last_change = Instant::now();
                }
            }
            Ok(Err(e)) => {
                eprintln!("  Warning: File watcher error: {e}");
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if pending_changes.is_empty() || last_change.elapsed() < DEBOUNCE {
                    continue;
                }
                for (namespace, path) in changed_namespaces(&pending_changes)? {
                    println!("\nSource changed: {}", path.display());
                    let result = sync_file(&mut repository, &path, &namespace, &settings);
                    report_outcome(&NamespaceOutcome {
                        namespace,
                        path,
                        result,
                    });
                }
                pending_changes.clear();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(CliError::Message("File watcher stopped unexpectedly".to_string()));
            }
        }
    }
}
