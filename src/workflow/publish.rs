use std::path::Path;
use std::time::Instant;

use chrono::Utc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::runner::{CommandOutcome, CommandRunner};
use crate::workflow::commands;
use crate::workflow::types::{Step, StepRecord, WorkflowReport};
use crate::workspace::ScratchFiles;

/// Branch, stage, commit, push and open a pull request.
///
/// Steps run strictly in order. A failed step is logged and recorded but never
/// stops the workflow. Two conditionals exist: branch creation is skipped when
/// `git branch --show-current` already names the target branch, and a single
/// checkout fallback runs when `git checkout -b` reports the branch already
/// exists.
///
/// Under a dry-run runner the scratch files are left untouched.
pub struct PublishWorkflow<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a AppConfig,
    scratch: ScratchFiles,
    commit_message: String,
    pr_body: String,
}

impl<'a> PublishWorkflow<'a> {
    /// Resolves the commit message and PR body up front so a missing text
    /// file is reported before any command runs.
    pub fn new(runner: &'a dyn CommandRunner, config: &'a AppConfig) -> Result<Self> {
        Ok(Self {
            runner,
            config,
            scratch: ScratchFiles::new(&config.scratch)?,
            commit_message: config.commit_message()?,
            pr_body: config.pull_request_body()?,
        })
    }

    pub async fn run(&self) -> WorkflowReport {
        let branch = &self.config.branch;
        let mut report = WorkflowReport::new(&branch.name);

        tracing::info!(
            repo = %self.config.repository.path.display(),
            branch = %branch.name,
            base = %branch.base,
            "Starting publish workflow"
        );

        let current = self
            .execute(&mut report, Step::CheckBranch, commands::current_branch())
            .await;

        if current.success && current.stdout.trim() == branch.name {
            tracing::info!(branch = %branch.name, "Already on target branch, skipping branch creation");
        } else {
            let created = self
                .execute(
                    &mut report,
                    Step::CreateBranch,
                    commands::create_branch(&branch.name),
                )
                .await;

            if !created.success && commands::is_branch_already_exists(&created.stderr) {
                self.execute(
                    &mut report,
                    Step::CheckoutExisting,
                    commands::checkout(&branch.name),
                )
                .await;
            }
        }

        self.execute(
            &mut report,
            Step::Stage,
            commands::stage(&self.config.commit.paths),
        )
        .await;

        let commit_cmd = commands::commit(self.scratch.commit_message_path());
        match self
            .write_scratch(self.scratch.write_commit_message(&self.commit_message))
            .await
        {
            Ok(()) => {
                self.execute(&mut report, Step::Commit, commit_cmd).await;
            }
            Err(e) => self.record_scratch_failure(
                &mut report,
                Step::Commit,
                &commit_cmd,
                self.scratch.commit_message_path(),
                &e,
            ),
        }

        self.execute(
            &mut report,
            Step::Push,
            commands::push(&branch.remote, &branch.name),
        )
        .await;

        let pr_cmd = commands::create_pull_request(
            &self.config.pull_request.title,
            self.scratch.pr_body_path(),
            &branch.base,
        );
        match self
            .write_scratch(self.scratch.write_pr_body(&self.pr_body))
            .await
        {
            Ok(()) => {
                self.execute(&mut report, Step::OpenPullRequest, pr_cmd).await;
            }
            Err(e) => self.record_scratch_failure(
                &mut report,
                Step::OpenPullRequest,
                &pr_cmd,
                self.scratch.pr_body_path(),
                &e,
            ),
        }

        let failed = report.failed_steps();
        if failed.is_empty() {
            tracing::info!(steps = report.steps.len(), "Publish workflow finished");
        } else {
            tracing::warn!(
                steps = report.steps.len(),
                failed = ?failed,
                "Publish workflow finished with failures"
            );
        }

        report
    }

    async fn write_scratch(
        &self,
        write: impl std::future::Future<Output = Result<()>>,
    ) -> Result<()> {
        if self.runner.is_dry_run() {
            tracing::info!("Dry run, not writing scratch file");
            return Ok(());
        }
        write.await
    }

    async fn execute(
        &self,
        report: &mut WorkflowReport,
        step: Step,
        command: String,
    ) -> CommandOutcome {
        tracing::info!(step = ?step, "=== {} ===", step.banner());

        let started_at = Utc::now();
        let timer = Instant::now();
        let outcome = self
            .runner
            .run(&command, Some(&self.config.repository.path))
            .await;

        if !outcome.success {
            tracing::warn!(step = ?step, "Step failed, continuing");
        }

        report.steps.push(StepRecord {
            step,
            outcome: outcome.clone(),
            started_at,
            duration_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
        outcome
    }

    /// The command depending on a scratch file is not issued when the file
    /// could not be written.
    fn record_scratch_failure(
        &self,
        report: &mut WorkflowReport,
        step: Step,
        command: &str,
        path: &Path,
        error: &crate::error::AppError,
    ) {
        tracing::warn!(
            step = ?step,
            path = %path.display(),
            error = %error,
            "Failed to write scratch file, skipping command"
        );
        report.steps.push(StepRecord {
            step,
            outcome: CommandOutcome::launch_failure(
                command,
                format!("Failed to write {}: {error}", path.display()),
            ),
            started_at: Utc::now(),
            duration_ms: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Returns canned outcomes keyed by command prefix and records every call.
    struct ScriptedRunner {
        responses: Mutex<VecDeque<(String, CommandOutcome)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn respond(self, prefix: &str, outcome: CommandOutcome) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back((prefix.to_string(), outcome));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &str, _cwd: Option<&Path>) -> CommandOutcome {
            self.calls.lock().unwrap().push(command.to_string());
            let mut responses = self.responses.lock().unwrap();
            let pos = responses.iter().position(|(p, _)| command.starts_with(p));
            match pos.and_then(|i| responses.remove(i)) {
                Some((_, outcome)) => CommandOutcome {
                    command: command.to_string(),
                    ..outcome
                },
                None => CommandOutcome::succeeded(command, ""),
            }
        }
    }

    fn test_config(dir: &Path) -> AppConfig {
        let source = format!(
            r###"
[repository]
path = "{repo}"

[branch]
name = "feature/docs"

[commit]
paths = ["docs/product/"]
message = "docs: product vision"

[pull_request]
title = "docs: product vision"
body = "## Summary\nVision docs"

[scratch]
commit_message = "{scratch}/commit_msg.txt"
pr_body = "{scratch}/pr_body.txt"
"###,
            repo = dir.display(),
            scratch = dir.display(),
        );
        AppConfig::from_toml_str(&source).unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_runs_every_step_once() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new()
            .respond("git branch --show-current", CommandOutcome::succeeded("", "main\n"));

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        assert_eq!(
            report.executed_steps(),
            vec![
                Step::CheckBranch,
                Step::CreateBranch,
                Step::Stage,
                Step::Commit,
                Step::Push,
                Step::OpenPullRequest,
            ]
        );
        let calls = runner.calls();
        assert_eq!(calls[1], "git checkout -b 'feature/docs'");
        assert_eq!(calls[2], "git add -- 'docs/product/'");
        assert_eq!(calls[4], "git push -u 'origin' 'feature/docs'");
        assert!(calls[5].starts_with("gh pr create --title 'docs: product vision'"));
        assert!(calls[5].ends_with("--base 'main'"));
    }

    #[tokio::test]
    async fn test_already_exists_triggers_single_checkout() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new().respond(
            "git checkout -b",
            CommandOutcome::failed(
                "",
                128,
                "fatal: a branch named 'feature/docs' already exists\n",
            ),
        );

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        let calls = runner.calls();
        let fallbacks: Vec<&String> = calls
            .iter()
            .filter(|c| c.as_str() == "git checkout 'feature/docs'")
            .collect();
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(calls[2], "git checkout 'feature/docs'");
        assert_eq!(calls[3], "git add -- 'docs/product/'");
        assert_eq!(calls.len(), 7);
        assert_eq!(report.failed_steps(), vec![Step::CreateBranch]);
    }

    #[tokio::test]
    async fn test_other_create_failure_skips_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new().respond(
            "git checkout -b",
            CommandOutcome::failed("", 128, "fatal: not a git repository\n"),
        );

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        let calls = runner.calls();
        assert_eq!(calls[1], "git checkout -b 'feature/docs'");
        assert_eq!(calls[2], "git add -- 'docs/product/'");
        assert!(report.outcome(Step::CheckoutExisting).is_none());
    }

    #[tokio::test]
    async fn test_already_on_branch_skips_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new().respond(
            "git branch --show-current",
            CommandOutcome::succeeded("", "feature/docs\n"),
        );

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        assert_eq!(
            report.executed_steps(),
            vec![
                Step::CheckBranch,
                Step::Stage,
                Step::Commit,
                Step::Push,
                Step::OpenPullRequest,
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new()
            .respond("git add", CommandOutcome::failed("", 128, "pathspec did not match"))
            .respond("git commit", CommandOutcome::failed("", 1, "nothing to commit"))
            .respond("git push", CommandOutcome::failed("", 1, "rejected"));

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        assert_eq!(
            report.failed_steps(),
            vec![Step::Stage, Step::Commit, Step::Push]
        );
        assert!(report.outcome(Step::OpenPullRequest).unwrap().success);
    }

    #[tokio::test]
    async fn test_scratch_files_written_before_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let runner = ScriptedRunner::new();

        PublishWorkflow::new(&runner, &config).unwrap().run().await;

        let message = std::fs::read_to_string(tmp.path().join("commit_msg.txt")).unwrap();
        let body = std::fs::read_to_string(tmp.path().join("pr_body.txt")).unwrap();
        assert_eq!(message, "docs: product vision");
        assert_eq!(body, "## Summary\nVision docs");

        let commit_call = format!(
            "git commit -F '{}'",
            tmp.path().join("commit_msg.txt").display()
        );
        assert!(runner.calls().contains(&commit_call));
    }

    #[tokio::test]
    async fn test_unwritable_scratch_file_skips_only_that_command() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let mut config = test_config(tmp.path());
        config.scratch.commit_message = blocker.join("commit_msg.txt");
        let runner = ScriptedRunner::new();

        let report = PublishWorkflow::new(&runner, &config).unwrap().run().await;

        assert!(!runner.calls().iter().any(|c| c.starts_with("git commit")));
        let commit = report.outcome(Step::Commit).unwrap();
        assert!(!commit.success);
        assert!(commit.stderr.contains("Failed to write"));
        assert!(report.outcome(Step::Push).is_some());
        assert!(report.outcome(Step::OpenPullRequest).is_some());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_scratch_files_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let report = PublishWorkflow::new(&crate::runner::DryRunRunner, &config)
            .unwrap()
            .run()
            .await;

        assert!(report.failed_steps().is_empty());
        assert!(report.outcome(Step::Commit).is_some());
        assert!(!tmp.path().join("commit_msg.txt").exists());
        assert!(!tmp.path().join("pr_body.txt").exists());
    }

    #[test]
    fn test_missing_message_file_fails_before_running() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.commit.message = None;
        config.commit.message_file = Some(tmp.path().join("missing.txt"));
        let runner = ScriptedRunner::new();

        assert!(PublishWorkflow::new(&runner, &config).is_err());
        assert!(runner.calls().is_empty());
    }
}
