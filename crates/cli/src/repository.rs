//! Filesystem-backed config repository
//!
//! Layout under the repository root:
//!
//! ```text
//! <namespace>/gen/json/<key>.json
//! proto/<namespace>/<namespace>.proto
//! proto/<namespace>/schema.json
//! ```

use controlpath_native::schemas::SchemaRegistry;
use controlpath_native::sync::Repository;
use controlpath_native::{Config, Namespace, RepositoryError};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const PROTO_DIR: &str = "proto";
const SCHEMA_FILE: &str = "schema.json";

pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn config_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace).join("gen").join("json")
    }

    pub fn config_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.config_dir(namespace).join(format!("{key}.json"))
    }

    fn proto_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(PROTO_DIR).join(namespace)
    }

    pub fn proto_path(&self, namespace: &str) -> PathBuf {
        self.proto_dir(namespace).join(format!("{namespace}.proto"))
    }

    fn schema_path(&self, namespace: &str) -> PathBuf {
        self.proto_dir(namespace).join(SCHEMA_FILE)
    }
}

fn io_error(path: &Path, err: &io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Replace `path` with `contents` through a sibling temporary file.
fn write_atomic(path: &Path, contents: &str) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    fs::write(&temp, contents).map_err(|e| io_error(&temp, &e))?;
    fs::rename(&temp, path).map_err(|e| io_error(path, &e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RepositoryError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

fn to_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Sorted names of the entries in `dir` accepted by `select`.
fn list_dir(
    dir: &Path,
    select: impl Fn(&Path) -> Option<String>,
) -> Result<Vec<String>, RepositoryError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, &e))? {
        let entry = entry.map_err(|e| io_error(dir, &e))?;
        if let Some(name) = select(&entry.path()) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

impl Repository for FsRepository {
    fn list_namespaces(&self) -> Result<Vec<String>, RepositoryError> {
        list_dir(&self.root, |path| {
            let name = path.file_name()?.to_str()?;
            (name != PROTO_DIR && path.join("gen").join("json").is_dir()).then(|| name.to_string())
        })
    }

    fn list_configs(&self, namespace: &str) -> Result<Vec<String>, RepositoryError> {
        list_dir(&self.config_dir(namespace), |path| {
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                return None;
            }
            path.file_stem()?.to_str().map(str::to_string)
        })
    }

    fn read_config(&self, namespace: &str, key: &str) -> Result<Option<Config>, RepositoryError> {
        read_json(&self.config_path(namespace, key))
    }

    fn read_schema(&self, namespace: &str) -> Result<Option<SchemaRegistry>, RepositoryError> {
        read_json(&self.schema_path(namespace))
    }

    fn write_namespace(&mut self, namespace: &Namespace) -> Result<(), RepositoryError> {
        for config in &namespace.configs {
            let path = self.config_path(&namespace.name, &config.key);
            write_atomic(&path, &to_json(&path, config)?)?;
        }

        let schema_path = self.schema_path(&namespace.name);
        write_atomic(&schema_path, &to_json(&schema_path, &namespace.schema)?)?;
        write_atomic(
            &self.proto_path(&namespace.name),
            &namespace.schema.to_proto(&namespace.name),
        )?;

        tracing::debug!(
            namespace = %namespace.name,
            configs = namespace.configs.len(),
            root = %self.root.display(),
            "wrote namespace"
        );
        Ok(())
    }

    fn remove_config(&mut self, namespace: &str, key: &str) -> Result<(), RepositoryError> {
        let path = self.config_path(namespace, key);
        fs::remove_file(&path).map_err(|e| io_error(&path, &e))
    }
}
