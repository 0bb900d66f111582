use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{trace_outcome, CommandOutcome, CommandRunner};

/// Runs commands as `<shell> -c <command>` and waits for them to exit.
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, cwd: Option<&Path>) -> CommandOutcome {
        tracing::debug!(command, cwd = ?cwd, shell = %self.shell, "Running command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let outcome = match cmd.output().await {
            Ok(output) => CommandOutcome {
                command: command.to_string(),
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
            },
            Err(e) => CommandOutcome::launch_failure(
                command,
                format!("Failed to launch `{}`: {e}", self.shell),
            ),
        };

        trace_outcome(&outcome);
        outcome
    }
}
