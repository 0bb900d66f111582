//! Shell command strings issued by the publish workflow.

use std::path::Path;

/// Single-quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

pub fn current_branch() -> String {
    "git branch --show-current".to_string()
}

pub fn create_branch(branch: &str) -> String {
    format!("git checkout -b {}", shell_quote(branch))
}

pub fn checkout(branch: &str) -> String {
    format!("git checkout {}", shell_quote(branch))
}

pub fn stage(paths: &[String]) -> String {
    let quoted: Vec<String> = paths.iter().map(|p| shell_quote(p)).collect();
    format!("git add -- {}", quoted.join(" "))
}

pub fn commit(message_file: &Path) -> String {
    format!("git commit -F {}", quote_path(message_file))
}

pub fn push(remote: &str, branch: &str) -> String {
    format!("git push -u {} {}", shell_quote(remote), shell_quote(branch))
}

pub fn create_pull_request(title: &str, body_file: &Path, base: &str) -> String {
    format!(
        "gh pr create --title {} --body-file {} --base {}",
        shell_quote(title),
        quote_path(body_file),
        shell_quote(base)
    )
}

/// Whether a failed `git checkout -b` means the branch is already there.
pub fn is_branch_already_exists(stderr: &str) -> bool {
    stderr.contains("already exists")
}
