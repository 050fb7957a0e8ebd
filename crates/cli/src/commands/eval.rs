//! Eval command implementation
//!
//! Evaluates one persisted config against a JSON context and prints the
//! selected value together with the constraint path that produced it.

use crate::error::{CliError, CliResult};
use crate::ops::evaluate::{evaluate_persisted, suggest_keys, Evaluation};
use crate::repository::FsRepository;
use crate::utils::config::ProjectConfig;
use controlpath_native::ClientError;

pub struct Options {
    pub namespace: String,
    pub key: String,
    /// Context as a JSON object; `{}` when absent.
    pub context: Option<String>,
    pub repo: Option<String>,
}

fn format_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "default".to_string();
    }
    let indices: Vec<String> = path.iter().map(ToString::to_string).collect();
    format!("[{}]", indices.join(", "))
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(evaluation) => {
            println!("✓ Evaluated {}/{}", evaluation.namespace, evaluation.key);
            println!("  Value: {}", evaluation.value);
            println!("  Path: {}", format_path(&evaluation.path));
            0
        }
        Err(e) => {
            eprintln!("✗ Evaluation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<Evaluation> {
    let config = ProjectConfig::load()?;
    let repository = FsRepository::new(config.repository(options.repo.as_deref()));

    let context: serde_json::Value = match options.context.as_deref() {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| CliError::Message(format!("--context is not valid JSON: {e}")))?,
        None => serde_json::json!({}),
    };

    match evaluate_persisted(&repository, &options.namespace, &options.key, &context) {
        Err(err @ ClientError::NotFound { .. }) => {
            let suggestions = suggest_keys(&repository, &options.namespace, &options.key);
            if suggestions.is_empty() {
                Err(err.into())
            } else {
                Err(CliError::Message(format!(
                    "{err}. Did you mean: {}?",
                    suggestions.join(", ")
                )))
            }
        }
        result => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::DirGuard;
    use controlpath_native::compile_source;
    use controlpath_native::sync::Repository;
    use serial_test::serial;
    use tempfile::TempDir;

    const SOURCE: &str = r#"
export function getDiscount({ country }: { country: string }): number {
  if (country === "US") {
    return 0.1;
  }
  return 0;
}
"#;

    fn setup(root: &std::path::Path) {
        let mut repository = FsRepository::new(root.join(".controlpath/repo"));
        repository
            .write_namespace(&compile_source(SOURCE, "default.ts", "default").unwrap())
            .unwrap();
    }

    fn options(key: &str, context: Option<&str>) -> Options {
        Options {
            namespace: "default".to_string(),
            key: key.to_string(),
            context: context.map(str::to_string),
            repo: None,
        }
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path(&[]), "default");
        assert_eq!(format_path(&[0]), "[0]");
        assert_eq!(format_path(&[1, 0]), "[1, 0]");
    }

    #[test]
    #[serial]
    fn test_eval_matching_branch() {
        let temp_dir = TempDir::new().unwrap();
        setup(temp_dir.path());
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        let evaluation = run_inner(&options("discount", Some(r#"{"country":"US"}"#))).unwrap();
        assert_eq!(evaluation.value, serde_json::json!(0.1));
        assert_eq!(evaluation.path, vec![0]);
        assert_eq!(run(&options("discount", None)), 0);
    }

    #[test]
    #[serial]
    fn test_eval_unknown_key_suggests() {
        let temp_dir = TempDir::new().unwrap();
        setup(temp_dir.path());
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        let err = run_inner(&options("discont", None)).unwrap_err();
        assert!(err.to_string().contains("Did you mean: discount?"));

        let err = run_inner(&options("checkout", None)).unwrap_err();
        assert!(matches!(err, CliError::Client(ClientError::NotFound { .. })));
    }

    #[test]
    #[serial]
    fn test_eval_rejects_bad_context() {
        let temp_dir = TempDir::new().unwrap();
        setup(temp_dir.path());
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        assert!(run_inner(&options("discount", Some("{not json"))).is_err());
        let err = run_inner(&options("discount", Some(r#"{"country":["US"]}"#))).unwrap_err();
        assert!(matches!(err, CliError::Client(ClientError::Evaluation(_))));
    }
}
