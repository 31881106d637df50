// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper over the git CLI for worktree and branch plumbing.
//!
//! Every invocation runs as `git -C <repo_root> ...` with `GIT_DIR` and
//! `GIT_WORK_TREE` removed so an inherited environment cannot redirect it.
//! Failures never surface as `Err`: spawn errors and timeouts are folded
//! into an unsuccessful [`GitOutput`] so callers can treat every step as
//! best-effort.

use crate::subprocess::run_with_timeout;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Result of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Stderr trimmed, or a generic message when git printed nothing.
    pub fn error_message(&self, description: &str) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("{description} failed")
        } else {
            stderr.to_string()
        }
    }
}

/// Whether `stderr` from `git branch -D` means the branch was already gone.
pub fn is_branch_not_found(stderr: &str) -> bool {
    stderr.contains("not found")
}

/// Git CLI bound to one repository.
#[derive(Debug, Clone)]
pub struct Git {
    repo_root: PathBuf,
    timeout: Duration,
}

impl Git {
    pub fn new(repo_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { repo_root: repo_root.into(), timeout }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    async fn run(&self, args: &[&str], description: &str) -> GitOutput {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        tracing::debug!(repo = %self.repo_root.display(), ?args, "running git");

        match run_with_timeout(cmd, self.timeout, description).await {
            Ok(output) => GitOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(message) => GitOutput { success: false, stdout: String::new(), stderr: message },
        }
    }

    /// `git worktree add -b <branch> <path> <start_point>`
    pub async fn worktree_add(&self, path: &Path, branch: &str, start_point: &str) -> GitOutput {
        let path = path.display().to_string();
        self.run(&["worktree", "add", "-b", branch, &path, start_point], "git worktree add").await
    }

    /// `git worktree remove --force <path>`
    pub async fn worktree_remove_force(&self, path: &Path) -> GitOutput {
        let path = path.display().to_string();
        self.run(&["worktree", "remove", "--force", &path], "git worktree remove").await
    }

    /// `git worktree prune`
    pub async fn worktree_prune(&self) -> GitOutput {
        self.run(&["worktree", "prune"], "git worktree prune").await
    }

    /// `git branch -D <branch>`
    pub async fn branch_delete_force(&self, branch: &str) -> GitOutput {
        self.run(&["branch", "-D", branch], "git branch delete").await
    }

    /// Whether a local branch named `branch` exists.
    pub async fn branch_exists(&self, branch: &str) -> bool {
        let refname = format!("refs/heads/{branch}");
        self.run(&["rev-parse", "--verify", "--quiet", &refname], "git rev-parse").await.success
    }

    /// Local branch names matching `pattern` (`git branch --list`).
    pub async fn branch_list(&self, pattern: &str) -> Vec<String> {
        let output = self
            .run(&["branch", "--list", "--format=%(refname:short)", pattern], "git branch list")
            .await;
        if !output.success {
            return Vec::new();
        }
        output.stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
