use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
    pub branch: BranchConfig,
    pub commit: CommitConfig,
    pub pull_request: PullRequestConfig,
    #[serde(default)]
    pub scratch: ScratchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoryConfig {
    /// Working directory for every command.
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
    /// Shell program, invoked as `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
            shell: default_shell(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BranchConfig {
    pub name: String,
    #[serde(default = "default_base_branch")]
    pub base: String,
    #[serde(default = "default_remote")]
    pub remote: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CommitConfig {
    /// Paths handed to `git add`, relative to the repository.
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PullRequestConfig {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_file: Option<PathBuf>,
}

/// Well-known paths the multi-line texts are written to before use.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScratchConfig {
    #[serde(default = "default_commit_message_path")]
    pub commit_message: PathBuf,
    #[serde(default = "default_pr_body_path")]
    pub pr_body: PathBuf,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message_path(),
            pr_body: default_pr_body_path(),
        }
    }
}

fn default_repository_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_commit_message_path() -> PathBuf {
    PathBuf::from("/tmp/commit_msg.txt")
}

fn default_pr_body_path() -> PathBuf {
    PathBuf::from("/tmp/pr_body.txt")
}

/// Reject names git would parse as an option.
fn validate_ref_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Config(format!("{kind} name must not be empty")));
    }
    if name.starts_with('-') {
        return Err(AppError::Config(format!(
            "Invalid {kind} name (starts with '-'): {name}"
        )));
    }
    Ok(())
}

/// Exactly one of an inline text or a file holding it must be set.
fn resolve_text(what: &str, inline: Option<&str>, file: Option<&PathBuf>) -> Result<String> {
    match (inline, file) {
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {what} from {}: {e}", path.display()))
        }),
        (Some(_), Some(_)) => Err(AppError::Config(format!(
            "{what} is set both inline and as a file; pick one"
        ))),
        (None, None) => Err(AppError::Config(format!("{what} is not configured"))),
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("docship").required(false));
        }

        // Environment variable overrides with DOCSHIP_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("DOCSHIP")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_ref_name("branch", &self.branch.name)?;
        validate_ref_name("base branch", &self.branch.base)?;
        validate_ref_name("remote", &self.branch.remote)?;

        if self.commit.paths.is_empty() {
            return Err(AppError::Config(
                "commit.paths must list at least one path to stage".to_string(),
            ));
        }
        if self.pull_request.title.trim().is_empty() {
            return Err(AppError::Config(
                "pull_request.title must not be empty".to_string(),
            ));
        }
        if self.repository.shell.trim().is_empty() {
            return Err(AppError::Config("repository.shell must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn commit_message(&self) -> Result<String> {
        resolve_text(
            "commit message",
            self.commit.message.as_deref(),
            self.commit.message_file.as_ref(),
        )
    }

    pub fn pull_request_body(&self) -> Result<String> {
        resolve_text(
            "pull request body",
            self.pull_request.body.as_deref(),
            self.pull_request.body_file.as_ref(),
        )
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
