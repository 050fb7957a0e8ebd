//! Init command implementation

use crate::error::{CliError, CliResult};
use crate::utils::config::{ProjectConfig, CONFIG_FILE};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Options {
    pub force: bool,
}

const EXAMPLE_NAMESPACE: &str = "default";

const EXAMPLE_SOURCE: &str = r##"export interface CheckoutTheme {
  primaryColor: string;
  showBanner: boolean;
}

/** Roll the new checkout out to a quarter of production users. */
export function getNewCheckout({ env, userId }: { env: string; userId: string }): boolean {
  if (env === "prod" && bucket(userId, 25)) {
    return true;
  } else if (env === "staging") {
    return true;
  }
  return false;
}

export function getCheckoutTheme({ plan }: { plan: string }): CheckoutTheme {
  if (plan === "pro") {
    return { primaryColor: "#111827", showBanner: false };
  }
  return { primaryColor: "#2563eb", showBanner: true };
}
"##;

fn example_path(config: &ProjectConfig) -> PathBuf {
    config.source_dir.join(format!("{EXAMPLE_NAMESPACE}.ts"))
}

fn check_existing_project(config: &ProjectConfig) -> bool {
    Path::new(CONFIG_FILE).exists() || example_path(config).exists()
}

pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(example) => {
            println!("✓ Project initialized");
            println!("  Created {CONFIG_FILE}");
            println!("  Created {}", example.display());
            println!();
            println!("Next steps:");
            println!("  1. Edit config functions in {}", example.display());
            println!("  2. Sync them into the repository: controlpath-native sync");
            println!("  3. Try one out: controlpath-native eval --namespace default --key new-checkout --context '{{\"env\":\"staging\"}}'");
            0
        }
        Err(e) => {
            eprintln!("✗ Initialization failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<PathBuf> {
    let config = ProjectConfig::default();

    if check_existing_project(&config) && !options.force {
        return Err(CliError::Message(
            "Project already initialized. Use --force to overwrite existing files".to_string(),
        ));
    }

    fs::write(CONFIG_FILE, config.to_yaml()?)?;

    let example = example_path(&config);
    fs::create_dir_all(&config.source_dir)?;
    fs::write(&example, EXAMPLE_SOURCE)?;

    Ok(example)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::DirGuard;
    use controlpath_native::compile_source;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_example_source_compiles() {
        let namespace = compile_source(EXAMPLE_SOURCE, "default.ts", EXAMPLE_NAMESPACE).unwrap();
        let keys: Vec<&str> = namespace.configs.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["new-checkout", "checkout-theme"]);
    }

    #[test]
    fn test_example_source_keeps_hex_colors() {
        assert!(EXAMPLE_SOURCE.ends_with("  return { primaryColor: \"#2563eb\", showBanner: true };\n}\n"));

        let namespace = compile_source(EXAMPLE_SOURCE, "default.ts", EXAMPLE_NAMESPACE).unwrap();
        let theme = namespace.config("checkout-theme").unwrap();
        assert_eq!(
            theme.tree.default.to_plain_json(),
            serde_json::json!({"primary_color": "#2563eb", "show_banner": true})
        );
        assert_eq!(
            theme.tree.constraints[0].value.to_plain_json(),
            serde_json::json!({"primary_color": "#111827", "show_banner": false})
        );
    }

    #[test]
    #[serial]
    fn test_init_command_success() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        let exit_code = run(&Options { force: false });
        assert_eq!(exit_code, 0);
        assert!(Path::new(CONFIG_FILE).exists());
        assert!(Path::new("lekko/default.ts").exists());

        let config = ProjectConfig::load().unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    #[serial]
    fn test_init_refuses_existing_project() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        fs::write(CONFIG_FILE, "version: v1\n").unwrap();
        assert_eq!(run(&Options { force: false }), 1);
        assert!(!Path::new("lekko/default.ts").exists());
    }

    #[test]
    #[serial]
    fn test_init_force_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path()).unwrap();

        fs::create_dir_all("lekko").unwrap();
        fs::write("lekko/default.ts", "stale").unwrap();
        assert_eq!(run(&Options { force: true }), 0);
        assert_eq!(fs::read_to_string("lekko/default.ts").unwrap(), EXAMPLE_SOURCE);
    }
}
