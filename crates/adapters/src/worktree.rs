// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane worktree provisioning and teardown.
//!
//! Paths and branch names are pure functions of the repository root and the
//! lane id, so crash recovery and reconciliation can re-derive them without
//! any stored state. Both provisioning and removal tolerate a missing
//! directory, branch, or worktree registration at every step.

use crate::git::{is_branch_not_found, Git};
use crate::subprocess::GIT_WORKTREE_TIMEOUT;
use async_trait::async_trait;
use helios_core::{Clock, LaneId, SystemClock};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Directory under the repository root holding lane worktrees
pub const WORKTREES_DIR: &str = ".helios-worktrees";

/// Prefix of every lane branch
pub const BRANCH_PREFIX: &str = "helios/lane/";

/// `<repo_root>/.helios-worktrees`
pub fn worktrees_root(repo_root: &Path) -> PathBuf {
    repo_root.join(WORKTREES_DIR)
}

/// `<repo_root>/.helios-worktrees/<lane_id>`
pub fn compute_worktree_path(repo_root: &Path, lane_id: &str) -> PathBuf {
    worktrees_root(repo_root).join(lane_id)
}

/// `helios/lane/<lane_id>`
pub fn compute_branch_name(lane_id: &str) -> String {
    format!("{BRANCH_PREFIX}{lane_id}")
}

/// Lane id a worktree path was computed from (its final component).
pub fn lane_id_for(worktree_path: &Path) -> Option<&str> {
    worktree_path.file_name().and_then(|name| name.to_str())
}

/// Repository root a worktree path was computed from.
pub fn repo_root_for(worktree_path: &Path) -> Option<PathBuf> {
    let parent = worktree_path.parent()?;
    if parent.file_name()? != WORKTREES_DIR {
        return None;
    }
    parent.parent().map(Path::to_path_buf)
}

/// Errors from worktree operations. Raised only after local rollback ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorktreeError {
    #[error("failed to provision worktree for lane {lane_id}: {stderr}")]
    Provision { lane_id: LaneId, stderr: String },
    #[error("failed to clean up worktree {}: {reason}", worktree_path.display())]
    Cleanup { worktree_path: PathBuf, reason: String },
}

/// Parameters for provisioning a lane worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub repo_root: PathBuf,
    pub lane_id: LaneId,
    pub base_branch: String,
}

/// A successfully provisioned worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeResult {
    pub worktree_path: PathBuf,
    pub branch_name: String,
    pub created_at_ms: u64,
}

/// Adapter for creating and destroying lane worktrees.
#[async_trait]
pub trait WorktreeAdapter: Send + Sync {
    /// Create the lane's worktree and branch.
    ///
    /// On failure, any partial state has already been removed.
    async fn provision(&self, req: ProvisionRequest) -> Result<WorktreeResult, WorktreeError>;

    /// Remove a worktree directory, its registration, and its lane branch.
    ///
    /// Safe to call on a path that never fully existed.
    async fn remove(&self, worktree_path: &Path, repo_root: &Path) -> Result<(), WorktreeError>;
}

/// Worktree adapter backed by the local git CLI.
#[derive(Debug, Clone)]
pub struct LocalWorktreeAdapter {
    git_timeout: Duration,
}

impl Default for LocalWorktreeAdapter {
    fn default() -> Self {
        Self { git_timeout: GIT_WORKTREE_TIMEOUT }
    }
}

impl LocalWorktreeAdapter {
    pub fn new(git_timeout: Duration) -> Self {
        Self { git_timeout }
    }

    /// Clear leftovers from a previous attempt at the same lane.
    async fn clear_stale(&self, git: &Git, path: &Path, branch: &str) {
        if path.exists() {
            tracing::warn!(path = %path.display(), "removing stale worktree remnant");
            let _ = git.worktree_remove_force(path).await;
            remove_dir_best_effort(path).await;
        }
        // A registration whose directory vanished still holds the branch
        let _ = git.worktree_prune().await;
        if git.branch_exists(branch).await {
            tracing::warn!(branch, "removing stale lane branch");
            let output = git.branch_delete_force(branch).await;
            if !output.success {
                tracing::warn!(branch, stderr = %output.stderr.trim(), "failed to delete stale branch");
            }
        }
    }

    /// Undo a failed `worktree add`: directory, branch, then registration.
    async fn rollback(&self, git: &Git, path: &Path, branch: &str) {
        remove_dir_best_effort(path).await;
        let output = git.branch_delete_force(branch).await;
        if !output.success && !is_branch_not_found(&output.stderr) {
            tracing::warn!(branch, stderr = %output.stderr.trim(), "rollback: branch delete failed");
        }
        let _ = git.worktree_prune().await;
    }

    pub async fn provision_worktree(
        &self,
        req: ProvisionRequest,
    ) -> Result<WorktreeResult, WorktreeError> {
        let start = Instant::now();
        let git = Git::new(&req.repo_root, self.git_timeout);
        let path = compute_worktree_path(&req.repo_root, &req.lane_id);
        let branch = compute_branch_name(&req.lane_id);

        self.clear_stale(&git, &path, &branch).await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| WorktreeError::Provision {
                lane_id: req.lane_id.clone(),
                stderr: format!("failed to create worktree parent dir: {e}"),
            })?;
        }

        let output = git.worktree_add(&path, &branch, &req.base_branch).await;
        if !output.success {
            self.rollback(&git, &path, &branch).await;
            return Err(WorktreeError::Provision {
                lane_id: req.lane_id,
                stderr: output.error_message("git worktree add"),
            });
        }

        if !path.is_dir() {
            self.rollback(&git, &path, &branch).await;
            return Err(WorktreeError::Provision {
                lane_id: req.lane_id,
                stderr: "directory not found after creation".to_string(),
            });
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            lane_id = %req.lane_id,
            path = %path.display(),
            branch,
            elapsed_ms,
            "worktree provisioned"
        );

        Ok(WorktreeResult {
            worktree_path: path,
            branch_name: branch,
            created_at_ms: SystemClock.epoch_ms(),
        })
    }

    pub async fn remove_worktree(
        &self,
        worktree_path: &Path,
        repo_root: &Path,
    ) -> Result<(), WorktreeError> {
        let start = Instant::now();
        let git = Git::new(repo_root, self.git_timeout);

        let output = git.worktree_remove_force(worktree_path).await;
        if !output.success {
            tracing::debug!(
                path = %worktree_path.display(),
                stderr = %output.stderr.trim(),
                "git worktree remove failed, falling back to directory removal"
            );
        }

        remove_dir_best_effort(worktree_path).await;
        let _ = git.worktree_prune().await;

        if let Some(lane_id) = lane_id_for(worktree_path) {
            let branch = compute_branch_name(lane_id);
            let output = git.branch_delete_force(&branch).await;
            if !output.success && !is_branch_not_found(&output.stderr) {
                tracing::warn!(branch, stderr = %output.stderr.trim(), "failed to delete lane branch");
            }
        }

        // Last resort before giving up: something may have recreated files
        // while git was running.
        if worktree_path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(worktree_path).await {
                return Err(WorktreeError::Cleanup {
                    worktree_path: worktree_path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
        if worktree_path.exists() {
            return Err(WorktreeError::Cleanup {
                worktree_path: worktree_path.to_path_buf(),
                reason: "directory still exists after removal".to_string(),
            });
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(path = %worktree_path.display(), elapsed_ms, "worktree removed");
        Ok(())
    }
}

#[async_trait]
impl WorktreeAdapter for LocalWorktreeAdapter {
    async fn provision(&self, req: ProvisionRequest) -> Result<WorktreeResult, WorktreeError> {
        self.provision_worktree(req).await
    }

    async fn remove(&self, worktree_path: &Path, repo_root: &Path) -> Result<(), WorktreeError> {
        self.remove_worktree(worktree_path, repo_root).await
    }
}

async fn remove_dir_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove worktree directory (best-effort)"
        );
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{
        compute_branch_name, compute_worktree_path, ProvisionRequest, WorktreeAdapter,
        WorktreeError, WorktreeResult,
    };
    use async_trait::async_trait;
    use helios_core::LaneId;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeWorktreeState {
        provisions: Vec<LaneId>,
        removals: Vec<PathBuf>,
        fail_provision: Option<String>,
        fail_remove: Option<String>,
    }

    /// Fake worktree adapter: plain directories at the real computed paths,
    /// no git.
    #[derive(Clone, Default)]
    pub struct FakeWorktreeAdapter {
        inner: Arc<Mutex<FakeWorktreeState>>,
    }

    impl FakeWorktreeAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent provisions fail with `stderr` (None to succeed).
        pub fn set_fail_provision(&self, stderr: Option<&str>) {
            self.inner.lock().fail_provision = stderr.map(String::from);
        }

        /// Make subsequent removals fail with `reason` (None to succeed).
        pub fn set_fail_remove(&self, reason: Option<&str>) {
            self.inner.lock().fail_remove = reason.map(String::from);
        }

        pub fn provisions(&self) -> Vec<LaneId> {
            self.inner.lock().provisions.clone()
        }

        pub fn removals(&self) -> Vec<PathBuf> {
            self.inner.lock().removals.clone()
        }
    }

    #[async_trait]
    impl WorktreeAdapter for FakeWorktreeAdapter {
        async fn provision(&self, req: ProvisionRequest) -> Result<WorktreeResult, WorktreeError> {
            let fail = {
                let mut inner = self.inner.lock();
                inner.provisions.push(req.lane_id.clone());
                inner.fail_provision.clone()
            };
            if let Some(stderr) = fail {
                return Err(WorktreeError::Provision { lane_id: req.lane_id, stderr });
            }
            let path = compute_worktree_path(&req.repo_root, &req.lane_id);
            std::fs::create_dir_all(&path).map_err(|e| WorktreeError::Provision {
                lane_id: req.lane_id.clone(),
                stderr: e.to_string(),
            })?;
            Ok(WorktreeResult {
                worktree_path: path,
                branch_name: compute_branch_name(&req.lane_id),
                created_at_ms: 0,
            })
        }

        async fn remove(
            &self,
            worktree_path: &Path,
            _repo_root: &Path,
        ) -> Result<(), WorktreeError> {
            let fail = {
                let mut inner = self.inner.lock();
                inner.removals.push(worktree_path.to_path_buf());
                inner.fail_remove.clone()
            };
            if let Some(reason) = fail {
                return Err(WorktreeError::Cleanup {
                    worktree_path: worktree_path.to_path_buf(),
                    reason,
                });
            }
            if worktree_path.exists() {
                std::fs::remove_dir_all(worktree_path).map_err(|e| WorktreeError::Cleanup {
                    worktree_path: worktree_path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorktreeAdapter;

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
