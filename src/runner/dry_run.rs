use std::path::Path;

use async_trait::async_trait;

use super::{CommandOutcome, CommandRunner};

/// Logs each command instead of running it. Every command "succeeds" with
/// empty output.
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, command: &str, cwd: Option<&Path>) -> CommandOutcome {
        tracing::info!(command, cwd = ?cwd, "Dry run, not executing");
        CommandOutcome::succeeded(command, "")
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
