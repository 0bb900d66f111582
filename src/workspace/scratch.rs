use std::path::{Path, PathBuf};

use crate::config::ScratchConfig;
use crate::error::Result;

/// Temporary files that carry multi-line text to `git` and `gh` so the text
/// never passes through shell quoting.
pub struct ScratchFiles {
    commit_message: PathBuf,
    pr_body: PathBuf,
}

impl ScratchFiles {
    /// Relative paths resolve against the current directory, not the
    /// repository the commands run in.
    pub fn new(config: &ScratchConfig) -> Result<Self> {
        Ok(Self {
            commit_message: std::path::absolute(&config.commit_message)?,
            pr_body: std::path::absolute(&config.pr_body)?,
        })
    }

    pub fn commit_message_path(&self) -> &Path {
        &self.commit_message
    }

    pub fn pr_body_path(&self) -> &Path {
        &self.pr_body
    }

    /// Overwrite the commit message file.
    pub async fn write_commit_message(&self, message: &str) -> Result<()> {
        write_text(&self.commit_message, message).await
    }

    /// Overwrite the pull request body file.
    pub async fn write_pr_body(&self, body: &str) -> Result<()> {
        write_text(&self.pr_body, body).await
    }
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, text).await?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Wrote scratch file");
    Ok(())
}
