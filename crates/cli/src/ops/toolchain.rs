//! External toolchain hooks run after a namespace is synced

use crate::error::{CliError, CliResult};
use std::path::Path;
use std::process::Command;

/// Substitute `{namespace}` and `{proto}` in a hook command.
pub fn expand(command: &str, namespace: &str, proto: &Path) -> String {
    command
        .replace("{namespace}", namespace)
        .replace("{proto}", &proto.display().to_string())
}

fn shell(command: &str) -> Command {
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
}

/// Run each post-sync hook in order, stopping at the first failure.
///
/// Hooks block until they exit; no timeout is applied.
pub fn run_post_sync(commands: &[String], namespace: &str, proto: &Path) -> CliResult<()> {
    for command in commands {
        let command = expand(command, namespace, proto);
        tracing::debug!(namespace, command = %command, "running post-sync hook");

        let output = shell(&command)
            .output()
            .map_err(|e| CliError::Message(format!("Failed to run `{command}`: {e}")))?;

        if !output.status.success() {
            return Err(CliError::Toolchain {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
    }
    Ok(())
}
