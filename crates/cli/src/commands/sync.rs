//! Sync command implementation

use crate::error::{CliError, CliResult};
use crate::ops::sync::{sync_dir, NamespaceOutcome, SyncSettings};
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use controlpath_native::SyncOptions;

pub struct Options {
    pub dir: Option<String>,
    pub repo: Option<String>,
    pub verify: bool,
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Sync failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

/// Print one namespace outcome; returns whether it counts as a failure.
pub fn report_outcome(outcome: &NamespaceOutcome) -> bool {
    match &outcome.result {
        Ok(report) => {
            println!(
                "✓ Synced {} ({} written, {} removed)",
                report.namespace,
                report.written.len(),
                report.removed.len()
            );
            for (key, reason) in &report.removal_failures {
                eprintln!("  Warning: could not remove stale config {key}: {reason}");
            }
            for key in &report.divergent {
                eprintln!("  ✗ {key} does not survive regeneration from the repository");
            }
            !report.divergent.is_empty()
        }
        Err(e) => {
            eprintln!("✗ Failed to sync {}", outcome.path.display());
            eprintln!("  Error: {e}");
            true
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

    let outcomes = sync_dir(&mut repository, &source_dir, &settings)?;
    if outcomes.is_empty() {
        println!("No namespace files found in {}", source_dir.display());
        return Ok(());
    }

    let failures = outcomes.iter().filter(|o| report_outcome(o)).count();
    if failures > 0 {
        return Err(CliError::Message(format!(
            "{failures} of {} namespaces failed",
            outcomes.len()
        )));
    }
    Ok(())
}
