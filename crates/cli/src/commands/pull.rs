//! Pull command implementation
//!
//! Regenerates namespace source files from the persisted repository.

use crate::error::{CliError, CliResult};
use crate::generator::generate_source;
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use controlpath_native::sync::Repository;
use controlpath_native::RepositoryError;
use std::path::PathBuf;

pub struct Options {
    pub repo: Option<String>,
    pub out: Option<String>,
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(written) => {
            for path in &written {
                println!("✓ Generated {}", path.display());
            }
            0
        }
        Err(e) => {
            eprintln!("✗ Pull failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<Vec<PathBuf>> {
    let config = ProjectConfig::load()?;
    let repository = FsRepository::new(config.repository(options.repo.as_deref()));
    let out_dir = config.source_dir(options.out.as_deref());

    let namespaces = repository.list_namespaces()?;
    if namespaces.is_empty() {
        return Err(CliError::Message(format!(
            "No namespaces found in {}",
            repository.root().display()
        )));
    }

    let mut written = Vec::with_capacity(namespaces.len());
    for name in &namespaces {
        let namespace = repository
            .read_namespace(name)?
            .ok_or_else(|| RepositoryError::NamespaceNotFound(name.clone()))?;
        written.push(generate_source("typescript", &namespace, &out_dir)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::DirGuard;
    use controlpath_native::compile_source;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = r#"
export function getNewCheckout({ env }: { env: string }): boolean {
  if (env === "prod") {
    return true;
  }
  return false;
}
"#;

    #[test]
    #[serial]
    fn test_pull_regenerates_sources() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        let namespace = compile_source(SOURCE, "default.ts", "default").unwrap();
        FsRepository::new(".controlpath/repo")
            .write_namespace(&namespace)
            .unwrap();

        let written = run_inner(&Options {
            repo: None,
            out: Some("pulled".to_string()),
        })
        .unwrap();
        assert_eq!(written, vec![PathBuf::from("pulled/default.ts")]);

        let text = fs::read_to_string("pulled/default.ts").unwrap();
        assert_eq!(compile_source(&text, "default.ts", "default").unwrap(), namespace);
    }

    #[test]
    #[serial]
    fn test_pull_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();
        assert_eq!(
            run(&Options {
                repo: None,
                out: None
            }),
            1
        );
    }
}
