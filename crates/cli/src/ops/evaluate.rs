//! Evaluate persisted configs, shared by `eval` and `serve`

use controlpath_native::sync::Repository;
use controlpath_native::{evaluate, ClientError, Config, Context};
use serde::Serialize;

/// Largest edit distance for a key to be offered as a suggestion
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Outcome of evaluating one persisted config
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub namespace: String,
    pub key: String,
    pub value: serde_json::Value,
    /// Constraint indices taken; empty when the default was returned.
    pub path: Vec<usize>,
}

fn load_config<R: Repository + ?Sized>(
    repository: &R,
    namespace: &str,
    key: &str,
) -> Result<Config, ClientError> {
    repository
        .read_config(namespace, key)
        .map_err(|e| ClientError::Transport(e.to_string()))?
        .ok_or_else(|| ClientError::NotFound {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
}

/// Evaluate `namespace/key` from the repository against a JSON context.
///
/// Missing configs are `NotFound`, malformed contexts and rule failures are
/// `Evaluation`, and repository failures are `Transport`.
pub fn evaluate_persisted<R: Repository + ?Sized>(
    repository: &R,
    namespace: &str,
    key: &str,
    context: &serde_json::Value,
) -> Result<Evaluation, ClientError> {
    let context = Context::from_json(context)?;
    let config = load_config(repository, namespace, key)?;
    let result = evaluate(&config, namespace, &context)?;

    Ok(Evaluation {
        namespace: namespace.to_string(),
        key: key.to_string(),
        value: result.value.to_plain_json(),
        path: result.path,
    })
}

/// Persisted keys in `namespace` close to `key`, nearest first.
pub fn suggest_keys<R: Repository + ?Sized>(repository: &R, namespace: &str, key: &str) -> Vec<String> {
    let Ok(keys) = repository.list_configs(namespace) else {
        return Vec::new();
    };
    let mut scored: Vec<(usize, String)> = keys
        .into_iter()
        .map(|candidate| (strsim::levenshtein(key, &candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use controlpath_native::{compile_source, EvaluationError, MemoryRepository};
    use serde_json::json;

    const SOURCE: &str = r#"
export function getDiscount({ country }: { country: string }): number {
  if (country === "US") {
    return 0.1;
  }
  return 0;
}

export function getDiscountCap({ plan }: { plan: string }): number {
  if (plan === "pro") {
    return 50;
  }
  return 10;
}
"#;

    fn repository() -> MemoryRepository {
        let mut repository = MemoryRepository::new();
        repository
            .write_namespace(&compile_source(SOURCE, "default.ts", "default").unwrap())
            .unwrap();
        repository
    }

    #[test]
    fn test_evaluate_persisted() {
        let repository = repository();
        let result =
            evaluate_persisted(&repository, "default", "discount", &json!({"country": "US"}))
                .unwrap();
        assert_eq!(result.value, json!(0.1));
        assert_eq!(result.path, vec![0]);

        let result = evaluate_persisted(&repository, "default", "discount", &json!({})).unwrap();
        assert_eq!(result.value, json!(0.0));
        assert!(result.path.is_empty());
    }

    #[test]
    fn test_evaluate_missing_config() {
        let repository = repository();
        let err = evaluate_persisted(&repository, "default", "discunt", &json!({})).unwrap_err();
        assert_eq!(
            err,
            ClientError::NotFound {
                namespace: "default".to_string(),
                key: "discunt".to_string()
            }
        );
        assert!(matches!(
            evaluate_persisted(&repository, "other", "discount", &json!({})),
            Err(ClientError::NotFound { .. })
        ));
    }

    #[test]
    fn test_evaluate_invalid_context() {
        let repository = repository();
        let err = evaluate_persisted(&repository, "default", "discount", &json!([1])).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Evaluation(EvaluationError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_evaluate_type_mismatch() {
        let repository = repository();
        let err = evaluate_persisted(&repository, "default", "discount", &json!({"country": 1}))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Evaluation(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_suggest_keys() {
        let repository = repository();
        assert_eq!(
            suggest_keys(&repository, "default", "discunt"),
            vec!["discount"]
        );
        assert_eq!(
            suggest_keys(&repository, "default", "discount-cp"),
            vec!["discount-cap", "discount"]
        );
        assert!(suggest_keys(&repository, "default", "checkout").is_empty());
        assert!(suggest_keys(&repository, "absent", "discount").is_empty());
    }
}
