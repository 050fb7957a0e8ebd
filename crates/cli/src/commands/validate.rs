//! Validate command implementation

use crate::error::{CliError, CliResult};
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use controlpath_native::sync::Repository;
use controlpath_native::validator::Validator;
use std::fs;

pub struct Options {
    pub repo: Option<String>,
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(count) => {
            println!("✓ Validation passed ({count} configs)");
            0
        }
        Err(e) => {
            eprintln!("✗ Validation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

/// Validate one namespace; returns the number of configs checked and
/// the number that failed.
fn validate_namespace(repository: &FsRepository, namespace: &str) -> CliResult<(usize, usize)> {
    let validator = match repository.read_schema(namespace)? {
        Some(registry) => Validator::new().with_registry(registry),
        None => Validator::new(),
    };

    let keys = repository.list_configs(namespace)?;
    let mut failed = 0;
    for key in &keys {
        let path = repository.config_path(namespace, key);
        let file = path.display().to_string();
        let content = fs::read_to_string(&path)?;

        let data: serde_json::Value = match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("✗ {file}");
                eprintln!("  Error: invalid JSON: {e}");
                failed += 1;
                continue;
            }
        };

        let result = validator.validate_config(&file, &data);
        if !result.valid {
            eprintln!("{}", validator.format_errors(&result.errors));
            failed += 1;
        }
    }
    Ok((keys.len(), failed))
}

fn run_inner(options: &Options) -> CliResult<usize> {
    let config = ProjectConfig::load()?;
    let repository = FsRepository::new(config.repository(options.repo.as_deref()));

    let namespaces = repository.list_namespaces()?;
    if namespaces.is_empty() {
        return Err(CliError::Message(format!(
            "No namespaces found in {}. Run `controlpath-native sync` first",
            repository.root().display()
        )));
    }

    let mut total = 0;
    let mut failed = 0;
    for namespace in &namespaces {
        let (checked, namespace_failed) = validate_namespace(&repository, namespace)?;
        total += checked;
        failed += namespace_failed;
    }

    if failed > 0 {
        return Err(CliError::Message(format!(
            "{failed} of {total} configs are invalid"
        )));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::DirGuard;
    use controlpath_native::compile_source;
    use serial_test::serial;
    use tempfile::TempDir;

    const SOURCE: &str = r#"
interface Theme {
  accent: string;
}

export function getNewCheckout({ env }: { env: string }): boolean {
  if (env === "prod") {
    return true;
  }
  return false;
}

export function getTheme(): Theme {
  return { accent: "blue" };
}
"#;

    fn setup() -> FsRepository {
        let mut repository = FsRepository::new(".controlpath/repo");
        repository
            .write_namespace(&compile_source(SOURCE, "default.ts", "default").unwrap())
            .unwrap();
        repository
    }

    #[test]
    #[serial]
    fn test_validate_synced_repository() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();
        setup();

        assert_eq!(run_inner(&Options { repo: None }).unwrap(), 2);
        assert_eq!(run(&Options { repo: None }), 0);
    }

    #[test]
    #[serial]
    fn test_validate_reports_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();
        let repository = setup();

        fs::write(
            repository.config_path("default", "broken"),
            r#"{"key": "broken", "type": "FEATURE_TYPE_BOOL"}"#,
        )
        .unwrap();
        fs::write(repository.config_path("default", "garbled"), "{ nope").unwrap();

        let err = run_inner(&Options { repo: None }).unwrap_err();
        assert!(err.to_string().contains("2 of 4 configs are invalid"));
    }

    #[test]
    #[serial]
    fn test_validate_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();
        assert_eq!(run(&Options { repo: None }), 1);
    }
}
