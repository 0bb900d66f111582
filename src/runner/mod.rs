pub mod dry_run;
pub mod shell;

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

pub use dry_run::DryRunRunner;
pub use shell::ShellRunner;

/// Result of a single external command.
///
/// `success` is true only when the process exited with status 0. A command
/// that could not be launched at all is reported as a failure with empty
/// stdout and the launch error in `stderr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never started or was killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutcome {
    pub fn launch_failure(command: &str, error: impl std::fmt::Display) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            stdout: String::new(),
            stderr: error.to_string(),
            exit_code: None,
        }
    }

    pub fn succeeded(command: &str, stdout: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn failed(command: &str, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }
}

/// Runs one command string through a shell.
///
/// Implementations never return an error: every failure mode is folded into
/// the returned [`CommandOutcome`] so callers branch on data.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: Option<&Path>) -> CommandOutcome;

    /// True when commands are only logged, so callers skip their own side
    /// effects too.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Emit the diagnostic trace for a finished command.
pub(crate) fn trace_outcome(outcome: &CommandOutcome) {
    tracing::info!(
        command = %outcome.command,
        stdout = %outcome.stdout.trim_end(),
        exit_code = ?outcome.exit_code,
        "Command finished"
    );
    if !outcome.stderr.is_empty() {
        if outcome.success {
            // git reports progress on stderr even when it succeeds
            tracing::info!(command = %outcome.command, stderr = %outcome.stderr.trim_end(), "Command stderr");
        } else {
            tracing::warn!(command = %outcome.command, stderr = %outcome.stderr.trim_end(), "Command failed");
        }
    } else if !outcome.success {
        tracing::warn!(command = %outcome.command, exit_code = ?outcome.exit_code, "Command failed");
    }
}
