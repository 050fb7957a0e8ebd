//! Project config file reading utilities

use crate::error::{CliError, CliResult};
use controlpath_native::codegen::rewrite::{DEFAULT_CLIENT_TYPE, DEFAULT_RUNTIME_MODULE};
use controlpath_native::{CompileOptions, RewriteOptions, Target};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "controlpath-native.yaml";

pub const CONFIG_VERSION: &str = "v1";

/// Which function shape config sources are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetName {
    #[default]
    Sync,
    LegacyAsync,
}

impl From<TargetName> for Target {
    fn from(name: TargetName) -> Self {
        match name {
            TargetName::Sync => Target::Sync,
            TargetName::LegacyAsync => Target::LegacyAsync,
        }
    }
}

/// External commands run around a sync
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Run after each namespace is written; `{namespace}` and `{proto}`
    /// are substituted.
    pub post_sync: Vec<String>,
}

/// Full config file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub version: String,
    /// Directory holding one `<namespace>.ts` file per namespace
    pub source_dir: PathBuf,
    /// Root of the persisted config repository
    pub repository: PathBuf,
    pub target: TargetName,
    pub runtime_module: String,
    pub client_type: String,
    pub toolchain: ToolchainConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            source_dir: PathBuf::from("./lekko"),
            repository: PathBuf::from(".controlpath/repo"),
            target: TargetName::default(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            client_type: DEFAULT_CLIENT_TYPE.to_string(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Read the project config in the working directory, or defaults if absent.
    pub fn load() -> CliResult<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Message(format!("Failed to read {}: {e}", path.display())))?;
        let config: Self = serde_yaml::from_str(&content)?;

        if config.version != CONFIG_VERSION {
            return Err(CliError::Message(format!(
                "Unsupported config version '{}' in {} (expected {CONFIG_VERSION})",
                config.version,
                path.display()
            )));
        }
        Ok(config)
    }

    pub fn to_yaml(&self) -> CliResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Source directory, overridden by a command-line flag.
    pub fn source_dir(&self, flag: Option<&str>) -> PathBuf {
        flag.map_or_else(|| self.source_dir.clone(), PathBuf::from)
    }

    /// Repository root, overridden by a command-line flag.
    pub fn repository(&self, flag: Option<&str>) -> PathBuf {
        flag.map_or_else(|| self.repository.clone(), PathBuf::from)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            target: self.target.into(),
            ..CompileOptions::default()
        }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            runtime_module: self.runtime_module.clone(),
            client_type: self.client_type.clone(),
            compile: self.compile_options(),
            ..RewriteOptions::default()
        }
    }
}
