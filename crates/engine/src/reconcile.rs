// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan reconciliation between the registry and the worktrees directory.
//!
//! Two passes, both bounded by one deadline:
//!
//! 1. Disk to registry: every directory under the worktrees root that does
//!    not belong to an active lane is removed.
//! 2. Registry to disk: every active lane whose worktree directory has
//!    vanished is force-closed.
//!
//! Each repair takes the lane lock and re-checks its condition before
//! acting, so a lane provisioned mid-pass is never mistaken for an orphan.

use crate::lifecycle::{close_path, LaneStore, StateChange};
use crate::{sharing, LaneError, LaneLocks};
use helios_adapters::{worktrees_root, WorktreeAdapter};
use helios_core::{Clock, LaneId, LaneRecord, ReconciliationResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Default bound on one reconciliation pass
pub const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a pass plus the lanes it force-closed.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub result: ReconciliationResult,
    pub closed: Vec<LaneRecord>,
    pub changes: Vec<StateChange>,
}

pub struct Reconciler<'a, C: Clock> {
    pub store: &'a LaneStore<C>,
    pub locks: &'a LaneLocks,
    pub worktrees: &'a dyn WorktreeAdapter,
}

impl<C: Clock> Reconciler<'_, C> {
    pub async fn run(&self, repo_root: &Path, timeout: Duration) -> ReconcileReport {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut report = ReconcileReport::default();

        let finished = self.remove_orphaned_worktrees(repo_root, deadline, &mut report).await
            && self.close_orphaned_records(deadline, &mut report).await;
        report.result.timed_out = !finished;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if report.result.timed_out {
            tracing::warn!(
                repo_root = %repo_root.display(),
                orphaned_worktrees = report.result.orphaned_worktrees,
                orphaned_records = report.result.orphaned_records,
                total_cleaned = report.result.total_cleaned,
                elapsed_ms,
                "reconciliation timed out, returning partial result"
            );
        } else if report.result.is_clean() {
            tracing::debug!(repo_root = %repo_root.display(), elapsed_ms, "reconciliation found nothing");
        } else {
            tracing::info!(
                repo_root = %repo_root.display(),
                orphaned_worktrees = report.result.orphaned_worktrees,
                orphaned_records = report.result.orphaned_records,
                total_cleaned = report.result.total_cleaned,
                elapsed_ms,
                "reconciliation complete"
            );
        }
        report
    }

    /// Returns false if the deadline passed before the pass finished.
    async fn remove_orphaned_worktrees(
        &self,
        repo_root: &Path,
        deadline: Instant,
        report: &mut ReconcileReport,
    ) -> bool {
        for (name, path) in list_worktree_dirs(&worktrees_root(repo_root)).await {
            if self.is_active(&name) {
                continue;
            }
            let Some(remaining) = remaining(deadline) else {
                return false;
            };

            let lane_id = LaneId::from(name);
            let repair = self.remove_worktree(&lane_id, &path, repo_root);
            match tokio::time::timeout(remaining, repair).await {
                Ok(Ok(false)) => {}
                Ok(Ok(true)) => {
                    report.result.orphaned_worktrees += 1;
                    report.result.total_cleaned += 1;
                    tracing::info!(lane_id = %lane_id, path = %path.display(), "removed orphaned worktree");
                }
                Ok(Err(e)) => {
                    report.result.orphaned_worktrees += 1;
                    tracing::warn!(lane_id = %lane_id, path = %path.display(), error = %e, "failed to remove orphaned worktree");
                }
                Err(_) => return false,
            }
        }
        true
    }

    async fn close_orphaned_records(&self, deadline: Instant, report: &mut ReconcileReport) -> bool {
        for record in self.store.registry().get_active() {
            let Some(path) = record.worktree_path.as_deref() else {
                continue;
            };
            if path.exists() {
                continue;
            }
            let Some(remaining) = remaining(deadline) else {
                return false;
            };

            let lane_id = record.lane_id;
            let repair = self.close_record(&lane_id);
            match tokio::time::timeout(remaining, repair).await {
                Ok(Ok(None)) => {}
                Ok(Ok(Some((changes, closed)))) => {
                    report.result.orphaned_records += 1;
                    report.result.total_cleaned += 1;
                    tracing::info!(lane_id = %lane_id, "closed lane with missing worktree");
                    report.changes.extend(changes);
                    report.closed.push(closed);
                }
                Ok(Err(e)) => {
                    tracing::warn!(lane_id = %lane_id, error = %e, "failed to close orphaned lane");
                }
                Err(_) => return false,
            }
        }
        true
    }

    /// Remove one orphaned directory. False if its lane became active.
    async fn remove_worktree(
        &self,
        lane_id: &LaneId,
        path: &Path,
        repo_root: &Path,
    ) -> Result<bool, LaneError> {
        let _guard = self.locks.acquire(lane_id).await?;
        if self.is_active(lane_id) {
            return Ok(false);
        }
        self.worktrees.remove(path, repo_root).await?;
        Ok(true)
    }

    /// Force-close one lane whose worktree vanished. `None` if it no longer
    /// qualifies once the lock is held.
    async fn close_record(
        &self,
        lane_id: &LaneId,
    ) -> Result<Option<(Vec<StateChange>, LaneRecord)>, LaneError> {
        let _guard = self.locks.acquire(lane_id).await?;
        let current = self.store.require(lane_id)?;
        let vanished = current.state.is_active()
            && current.worktree_path.as_deref().is_some_and(|p| !p.exists());
        if !vanished {
            return Ok(None);
        }
        force_close(self.store, lane_id).map(Some)
    }

    fn is_active(&self, lane_id: &str) -> bool {
        self.store.registry().get(lane_id).is_some_and(|r| r.state.is_active())
    }
}

/// Drive a lane to `closed` through the state machine without touching disk.
///
/// Attached agents are force-detached first. Caller holds the lane lock.
pub fn force_close<C: Clock>(
    store: &LaneStore<C>,
    lane_id: &LaneId,
) -> Result<(Vec<StateChange>, LaneRecord), LaneError> {
    let detached = sharing::force_detach_all(store, lane_id)?;
    let mut changes: Vec<StateChange> = detached.change.into_iter().collect();
    let mut record = detached.record;
    for event in close_path(record.state) {
        let (change, updated) = store.apply(lane_id, *event)?;
        changes.push(change);
        record = updated;
    }
    Ok((changes, record))
}

fn remaining(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    (now < deadline).then(|| deadline - now)
}

/// Subdirectories of `root` as (name, path), sorted by name.
///
/// A missing root yields nothing.
async fn list_worktree_dirs(root: &Path) -> Vec<(String, PathBuf)> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "failed to read worktrees directory");
            return Vec::new();
        }
    };

    let mut dirs = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
                if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                    dirs.push((name.to_string(), entry.path()));
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "error listing worktrees directory");
                break;
            }
        }
    }
    dirs.sort();
    dirs
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
