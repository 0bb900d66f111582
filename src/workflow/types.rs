use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::runner::CommandOutcome;

/// One step of the publish workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CheckBranch,
    CreateBranch,
    /// Fallback after `CreateBranch` reported the branch already exists.
    CheckoutExisting,
    Stage,
    Commit,
    Push,
    OpenPullRequest,
}

impl Step {
    pub fn banner(self) -> &'static str {
        match self {
            Step::CheckBranch => "Checking current branch",
            Step::CreateBranch => "Creating and checking out feature branch",
            Step::CheckoutExisting => "Branch already exists, checking it out",
            Step::Stage => "Staging files",
            Step::Commit => "Committing changes",
            Step::Push => "Pushing to remote",
            Step::OpenPullRequest => "Creating pull request",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: CommandOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Everything the workflow did, in order. Informational only.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub branch: String,
    pub steps: Vec<StepRecord>,
}

impl WorkflowReport {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn outcome(&self, step: Step) -> Option<&CommandOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    pub fn executed_steps(&self) -> Vec<Step> {
        self.steps.iter().map(|r| r.step).collect()
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|r| !r.outcome.success)
            .map(|r| r.step)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable one-line-per-step summary.
    pub fn summary(&self) -> String {
        let mut out = format!("Branch: {}\n", self.branch);
        for record in &self.steps {
            let status = if record.outcome.success { "ok" } else { "FAILED" };
            out.push_str(&format!(
                "  [{status:>6}] {} ({} ms)\n",
                record.step.banner(),
                record.duration_ms
            ));
        }
        let failed = self.failed_steps().len();
        if failed > 0 {
            out.push_str(&format!("{failed} step(s) failed\n"));
        }
        out
    }
}
