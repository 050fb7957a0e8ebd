//! Shell completion command implementation

use crate::error::{CliError, CliResult};
use crate::{get_cli_command, BIN_NAME};
use clap_complete::{generate, Shell};
use std::io;

pub struct Options {
    pub shell: String,
}

fn parse_shell(name: &str) -> CliResult<Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "" => Err(CliError::Message(
            "Shell name is required. Supported shells: bash, zsh, fish".to_string(),
        )),
        _ => Err(CliError::Message(format!(
            "Unsupported shell: {name}. Supported shells: bash, zsh, fish"
        ))),
    }
}

/// Generate shell completion script
pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Completion generation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<()> {
    let shell = parse_shell(&options.shell)?;
    let mut cmd = get_cli_command();
    generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cli_command() {
        let cmd = get_cli_command();
        assert_eq!(cmd.get_name(), BIN_NAME);
        let subcommands: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
        for expected in ["init", "sync", "compile", "eval", "validate", "pull", "rewrite", "serve", "watch", "completion"] {
            assert!(subcommands.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_parse_shell() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("ZSH").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("fish").unwrap(), Shell::Fish);
        assert!(parse_shell("").is_err());
        assert!(parse_shell("powershell").unwrap_err().to_string().contains("Unsupported shell"));
    }

    #[test]
    fn test_completion_generation() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let mut cmd = get_cli_command();
            let mut output = Vec::new();
            generate(shell, &mut cmd, BIN_NAME, &mut output);
            assert!(!output.is_empty());
        }
    }
}
