//! Test helpers for integration tests

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// Set by Cargo when running integration tests
const BINARY_NAME: &str = env!("CARGO_BIN_EXE_controlpath-native");

/// Test project setup helper
pub struct TestProject {
    #[allow(dead_code)] // Keeps the temp directory alive during tests
    pub temp_dir: TempDir,
    pub project_path: PathBuf,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            project_path,
        }
    }

    /// Create a project with one namespace file in `lekko/`
    #[allow(dead_code)] // Used across multiple test files
    pub fn with_namespace(namespace: &str, source: &str) -> Self {
        let project = Self::new();
        project.write_file(&format!("lekko/{namespace}.ts"), source);
        project
    }

    /// Get path to a file in the project
    #[allow(dead_code)] // Used across multiple test files
    pub fn path(&self, relative_path: &str) -> PathBuf {
        self.project_path.join(relative_path)
    }

    /// Check if a file exists
    #[allow(dead_code)] // Used across multiple test files
    pub fn file_exists(&self, relative_path: &str) -> bool {
        self.path(relative_path).exists()
    }

    /// Read file content
    #[allow(dead_code)] // Used across multiple test files
    pub fn read_file(&self, relative_path: &str) -> String {
        fs::read_to_string(self.path(relative_path)).unwrap()
    }

    /// Write file content
    #[allow(dead_code)] // Used across multiple test files
    pub fn write_file(&self, relative_path: &str, content: &str) {
        let path = self.path(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Run the CLI and return its output
    pub fn run_command(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(BINARY_NAME);
        cmd.current_dir(&self.project_path);
        cmd.env_remove("CONTROLPATH_LOG");
        cmd.args(args);
        cmd.output().unwrap()
    }

    /// Run the CLI, assert success and return stdout
    #[allow(dead_code)] // Used across multiple test files
    pub fn run_command_success(&self, args: &[&str]) -> String {
        let output = self.run_command(args);
        if !output.status.success() {
            eprintln!("Command failed: controlpath-native {}", args.join(" "));
            eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
            eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
            panic!("Command failed with exit code: {:?}", output.status.code());
        }
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run the CLI, assert failure and return stderr
    #[allow(dead_code)] // Used across multiple test files
    pub fn run_command_failure(&self, args: &[&str]) -> String {
        let output = self.run_command(args);
        assert!(!output.status.success(), "Command should have failed");
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    /// Path of a persisted config in the default repository
    #[allow(dead_code)] // Used across multiple test files
    pub fn config_file(namespace: &str, key: &str) -> String {
        format!(".controlpath/repo/{namespace}/gen/json/{key}.json")
    }
}

/// A namespace with a targeted rollout, a numeric config and a message config
#[allow(dead_code)] // Used across multiple test files
pub const CHECKOUT_SOURCE: &str = r#"export interface Banner {
  title: string;
  dismissible: boolean;
}

/** Roll the new checkout out to production and staging. */
export function getNewCheckout({ env, userId }: { env: string; userId: string }): boolean {
  if (env === "prod" && bucket(userId, 100)) {
    return true;
  } else if (env === "staging") {
    return true;
  }
  return false;
}

export function getDiscount({ country }: { country: string }): number {
  if (["CA", "MX"].includes(country)) {
    return 0.15;
  }
  return 0;
}

export function getBanner({ plan }: { plan: string }): Banner {
  if (plan === "pro") {
    return { title: "Welcome back", dismissible: true };
  }
  return { title: "Upgrade today", dismissible: false };
}
"#;
