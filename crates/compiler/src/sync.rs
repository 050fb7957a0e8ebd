/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Keeps persisted configs in step with their source namespace.
//!
//! The library only plans and applies changes through [`Repository`]; where
//! and how configs are stored is up to the implementation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::ast::{Config, Namespace};
use crate::codegen::generate_namespace_source;
use crate::compiler::{compile_namespace, CompileOptions, Target};
use crate::error::{CompilerError, RepositoryError};
use crate::parser::{parse_source, SourceFile};
use crate::schemas::SchemaRegistry;

/// Storage for persisted configs and schemas, grouped by namespace.
pub trait Repository {
    fn list_namespaces(&self) -> Result<Vec<String>, RepositoryError>;

    /// Config keys persisted for `namespace`, sorted.
    fn list_configs(&self, namespace: &str) -> Result<Vec<String>, RepositoryError>;

    fn read_config(&self, namespace: &str, key: &str) -> Result<Option<Config>, RepositoryError>;

    fn read_schema(&self, namespace: &str) -> Result<Option<SchemaRegistry>, RepositoryError>;

    /// Write every config of `namespace` and its schema.
    ///
    /// Each file is replaced as a whole; configs absent from `namespace`
    /// are left alone.
    fn write_namespace(&mut self, namespace: &Namespace) -> Result<(), RepositoryError>;

    fn remove_config(&mut self, namespace: &str, key: &str) -> Result<(), RepositoryError>;

    /// Assemble a persisted namespace, or `None` if nothing is stored.
    fn read_namespace(&self, namespace: &str) -> Result<Option<Namespace>, RepositoryError> {
        let keys = self.list_configs(namespace)?;
        let schema = self.read_schema(namespace)?;
        if keys.is_empty() && schema.is_none() {
            return Ok(None);
        }
        let mut configs = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(config) = self.read_config(namespace, &key)? {
                configs.push(config);
            }
        }
        Ok(Some(Namespace {
            name: namespace.to_string(),
            configs,
            schema: schema.unwrap_or_default(),
        }))
    }
}

/// In-memory repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    namespaces: BTreeMap<String, Namespace>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }
}

impl Repository for MemoryRepository {
    fn list_namespaces(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.namespaces.keys().cloned().collect())
    }

    fn list_configs(&self, namespace: &str) -> Result<Vec<String>, RepositoryError> {
        let mut keys: Vec<String> = self
            .namespaces
            .get(namespace)
            .map(|ns| ns.configs.iter().map(|c| c.key.clone()).collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn read_config(&self, namespace: &str, key: &str) -> Result<Option<Config>, RepositoryError> {
        Ok(self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.config(key))
            .cloned())
    }

    fn read_schema(&self, namespace: &str) -> Result<Option<SchemaRegistry>, RepositoryError> {
        Ok(self.namespaces.get(namespace).map(|ns| ns.schema.clone()))
    }

    fn write_namespace(&mut self, namespace: &Namespace) -> Result<(), RepositoryError> {
        let stored = self
            .namespaces
            .entry(namespace.name.clone())
            .or_insert_with(|| Namespace {
                name: namespace.name.clone(),
                configs: Vec::new(),
                schema: SchemaRegistry::default(),
            });
        for config in &namespace.configs {
            match stored.configs.iter_mut().find(|c| c.key == config.key) {
                Some(existing) => *existing = config.clone(),
                None => stored.configs.push(config.clone()),
            }
        }
        stored.schema = namespace.schema.clone();
        Ok(())
    }

    fn remove_config(&mut self, namespace: &str, key: &str) -> Result<(), RepositoryError> {
        let stored = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| RepositoryError::NamespaceNotFound(namespace.to_string()))?;
        stored.configs.retain(|c| c.key != key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Regenerate source from the persisted configs and recompile it.
    pub verify: bool,
    pub compile: CompileOptions,
}

/// What one namespace sync changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    pub namespace: String,
    /// Keys written, in source order.
    pub written: Vec<String>,
    /// Stale keys that were removed.
    pub removed: Vec<String>,
    /// Stale keys that could not be removed, with the reason.
    pub removal_failures: Vec<(String, String)>,
    /// Keys whose regenerated source no longer compiles to the persisted config.
    pub divergent: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.removal_failures.is_empty() && self.divergent.is_empty()
    }
}

/// Compile `source` and bring the repository's copy of `namespace` in line.
///
/// # Errors
///
/// A compile error aborts before anything is written. Repository write
/// errors are returned; failures removing stale configs are not.
pub fn sync_namespace<R: Repository + ?Sized>(
    repository: &mut R,
    source: &SourceFile,
    namespace: &str,
    options: &SyncOptions,
) -> Result<SyncReport, CompilerError> {
    let compiled = compile_namespace(source, namespace, &options.compile)?;
    let existing = repository.list_configs(namespace)?;

    repository.write_namespace(&compiled)?;
    let mut report = SyncReport {
        namespace: namespace.to_string(),
        written: compiled.configs.iter().map(|c| c.key.clone()).collect(),
        ..SyncReport::default()
    };

    let current: BTreeSet<&str> = compiled.configs.iter().map(|c| c.key.as_str()).collect();
    for key in existing.iter().filter(|key| !current.contains(key.as_str())) {
        match repository.remove_config(namespace, key) {
            Ok(()) => report.removed.push(key.clone()),
            Err(err) => {
                tracing::warn!(namespace, key = %key, error = %err, "failed to remove stale config");
                report.removal_failures.push((key.clone(), err.to_string()));
            }
        }
    }

    if options.verify {
        report.divergent = verify_namespace(repository, namespace, &options.compile)?;
    }

    tracing::info!(
        namespace,
        written = report.written.len(),
        removed = report.removed.len(),
        divergent = report.divergent.len(),
        "synced namespace"
    );
    Ok(report)
}

/// Keys whose persisted config does not survive a regenerate and recompile.
///
/// Regenerated source is always synchronous, so it is recompiled for
/// [`Target::Sync`] whatever `options.target` says.
///
/// # Errors
///
/// Returns repository errors and errors from rendering the persisted
/// namespace.
pub fn verify_namespace<R: Repository + ?Sized>(
    repository: &R,
    namespace: &str,
    options: &CompileOptions,
) -> Result<Vec<String>, CompilerError> {
    let Some(persisted) = repository.read_namespace(namespace)? else {
        return Ok(Vec::new());
    };
    let text = generate_namespace_source(&persisted)?;
    let file = format!("{namespace}.ts");
    let options = CompileOptions {
        target: Target::Sync,
        ..*options
    };
    let regenerated = match parse_source(&text, &file)
        .map_err(CompilerError::from)
        .and_then(|source| compile_namespace(&source, namespace, &options))
    {
        Ok(regenerated) => regenerated,
        Err(err) => {
            tracing::warn!(namespace, error = %err, "regenerated source does not compile");
            return Ok(persisted.configs.iter().map(|c| c.key.clone()).collect());
        }
    };

    Ok(persisted
        .configs
        .iter()
        .filter(|config| regenerated.config(&config.key) != Some(*config))
        .map(|config| config.key.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Tree, Value};
    use crate::error::CompilationErrorKind;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
export interface Banner {
  title: string;
}

/** Show the new checkout flow */
export function getNewCheckout({ env }: { env: string }): boolean {
  if (env === "prod") {
    return true;
  }
  return false;
}

export function getBanner(): Banner {
  return { title: "Welcome" };
}
"#;

    fn source(text: &str) -> SourceFile {
        parse_source(text, "default.ts").unwrap()
    }

    fn stale_config(key: &str) -> Config {
        Config {
            key: key.to_string(),
            description: "old".to_string(),
            config_type: crate::ast::ConfigType::Bool,
            tree: Tree {
                default: Value::Bool(false),
                constraints: Vec::new(),
            },
        }
    }

    /// Rejects every removal.
    struct StickyRepository(MemoryRepository);

    impl Repository for StickyRepository {
        fn list_namespaces(&self) -> Result<Vec<String>, RepositoryError> {
            self.0.list_namespaces()
        }
        fn list_configs(&self, namespace: &str) -> Result<Vec<String>, RepositoryError> {
            self.0.list_configs(namespace)
        }
        fn read_config(&self, namespace: &str, key: &str) -> Result<Option<Config>, RepositoryError> {
            self.0.read_config(namespace, key)
        }
        fn read_schema(&self, namespace: &str) -> Result<Option<SchemaRegistry>, RepositoryError> {
            self.0.read_schema(namespace)
        }
        fn write_namespace(&mut self, namespace: &Namespace) -> Result<(), RepositoryError> {
            self.0.write_namespace(namespace)
        }
        fn remove_config(&mut self, _: &str, key: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::Io {
                path: format!("{key}.json"),
                message: "permission denied".to_string(),
            })
        }
    }

    fn seeded() -> MemoryRepository {
        let mut repository = MemoryRepository::new();
        repository
            .write_namespace(&Namespace {
                name: "default".to_string(),
                configs: vec![stale_config("old-flag"), stale_config("new-checkout")],
                schema: SchemaRegistry::default(),
            })
            .unwrap();
        repository
    }

    #[test]
    fn test_sync_writes_and_removes_stale() {
        let mut repository = seeded();
        let report = sync_namespace(
            &mut repository,
            &source(SOURCE),
            "default",
            &SyncOptions::default(),
        )
        .unwrap();

        assert_eq!(report.written, vec!["new-checkout", "banner"]);
        assert_eq!(report.removed, vec!["old-flag"]);
        assert!(report.is_clean());
        assert_eq!(
            repository.list_configs("default").unwrap(),
            vec!["banner", "new-checkout"]
        );
        let stored = repository.read_config("default", "new-checkout").unwrap().unwrap();
        assert_eq!(stored.description, "Show the new checkout flow");
        assert!(repository
            .read_schema("default")
            .unwrap()
            .unwrap()
            .contains("default.Banner"));
    }

    #[test]
    fn test_compile_error_writes_nothing() {
        let mut repository = seeded();
        let err = sync_namespace(
            &mut repository,
            &source("export function getBroken(): boolean {\n  if (true) { return true; }\n}"),
            "default",
            &SyncOptions::default(),
        )
        .unwrap_err();
        match err {
            CompilerError::Compilation(err) => {
                assert_eq!(err.kind, CompilationErrorKind::MissingDefault)
            }
            other => panic!("Expected compilation error, got {other:?}"),
        }
        assert_eq!(
            repository.list_configs("default").unwrap(),
            vec!["new-checkout", "old-flag"]
        );
    }

    #[test]
    fn test_removal_failure_is_reported() {
        let mut repository = StickyRepository(seeded());
        let report = sync_namespace(
            &mut repository,
            &source(SOURCE),
            "default",
            &SyncOptions::default(),
        )
        .unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.removal_failures.len(), 1);
        assert_eq!(report.removal_failures[0].0, "old-flag");
        assert!(report.removal_failures[0].1.contains("permission denied"));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_verify_round_trip() {
        let mut repository = MemoryRepository::new();
        let report = sync_namespace(
            &mut repository,
            &source(SOURCE),
            "default",
            &SyncOptions {
                verify: true,
                ..SyncOptions::default()
            },
        )
        .unwrap();
        assert!(report.divergent.is_empty(), "{:?}", report.divergent);
    }

    #[test]
    fn test_verify_round_trip_legacy_async() {
        let mut repository = MemoryRepository::new();
        let report = sync_namespace(
            &mut repository,
            &source(
                "export async function getCheckout({ env }: { env: string }): Promise<boolean> {\n  if (env === \"prod\") {\n    return true;\n  }\n  return false;\n}\n",
            ),
            "default",
            &SyncOptions {
                verify: true,
                compile: CompileOptions {
                    target: Target::LegacyAsync,
                    ..CompileOptions::default()
                },
            },
        )
        .unwrap();
        assert_eq!(report.written, vec!["checkout"]);
        assert!(report.divergent.is_empty(), "{:?}", report.divergent);
    }

    #[test]
    fn test_verify_flags_int_values() {
        let mut repository = MemoryRepository::new();
        let mut config = stale_config("limit");
        config.config_type = crate::ast::ConfigType::Int;
        config.tree.default = Value::Int(3);
        repository
            .write_namespace(&Namespace {
                name: "default".to_string(),
                configs: vec![config],
                schema: SchemaRegistry::default(),
            })
            .unwrap();

        let divergent =
            verify_namespace(&repository, "default", &CompileOptions::default()).unwrap();
        assert_eq!(divergent, vec!["limit"]);
    }

    #[test]
    fn test_read_namespace() {
        let repository = seeded();
        let namespace = repository.read_namespace("default").unwrap().unwrap();
        assert_eq!(namespace.configs.len(), 2);
        assert!(repository.read_namespace("missing").unwrap().is_none());
        assert_eq!(repository.list_namespaces().unwrap(), vec!["default"]);
    }
}
