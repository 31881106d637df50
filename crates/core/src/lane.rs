// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane records and lifecycle states.
//!
//! A lane is one agent's isolated working copy: a git worktree, the branch
//! checked out in it, and the lifecycle state tracked by the registry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a lane.
    ///
    /// Also names the lane's worktree directory and branch, so it must stay
    /// stable for the lifetime of the lane.
    pub struct LaneId("lane-");
}

crate::define_id! {
    /// Identifier of the externally owned workspace a lane belongs to.
    pub struct WorkspaceId("ws-");
}

/// Lifecycle state of a lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneState {
    #[default]
    New,
    Provisioning,
    Ready,
    Running,
    Blocked,
    Shared,
    Cleaning,
    Closed,
}

impl LaneState {
    pub const ALL: [LaneState; 8] = [
        LaneState::New,
        LaneState::Provisioning,
        LaneState::Ready,
        LaneState::Running,
        LaneState::Blocked,
        LaneState::Shared,
        LaneState::Cleaning,
        LaneState::Closed,
    ];

    /// Whether this state is terminal (no further transitions accepted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaneState::Closed)
    }

    /// Whether a lane in this state counts against registry capacity
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

crate::simple_display! {
    LaneState {
        New => "new",
        Provisioning => "provisioning",
        Ready => "ready",
        Running => "running",
        Blocked => "blocked",
        Shared => "shared",
        Cleaning => "cleaning",
        Closed => "closed",
    }
}

/// A lane as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneRecord {
    pub lane_id: LaneId,
    pub workspace_id: WorkspaceId,
    pub state: LaneState,
    /// Set once provisioning succeeds. Kept on closed records for audit.
    #[serde(default)]
    pub worktree_path: Option<PathBuf>,
    #[serde(default)]
    pub branch_name: Option<String>,
    /// Pid of an externally managed background task bound to the lane
    #[serde(default)]
    pub par_task_pid: Option<u32>,
    /// Attached agent ids, in attach order, without duplicates
    #[serde(default)]
    pub attached_agents: Vec<String>,
    pub base_branch: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl LaneRecord {
    /// Create a fresh record in the `new` state.
    pub fn new(
        lane_id: LaneId,
        workspace_id: WorkspaceId,
        base_branch: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            lane_id,
            workspace_id,
            state: LaneState::New,
            worktree_path: None,
            branch_name: None,
            par_task_pid: None,
            attached_agents: Vec::new(),
            base_branch: base_branch.into(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn is_attached(&self, agent_id: &str) -> bool {
        self.attached_agents.iter().any(|a| a == agent_id)
    }
}

crate::builder! {
    pub struct LaneRecordBuilder => LaneRecord {
        into {
            lane_id: LaneId = "lane-test",
            workspace_id: WorkspaceId = "ws-test",
            base_branch: String = "main",
        }
        set {
            state: LaneState = LaneState::Provisioning,
            attached_agents: Vec<String> = Vec::new(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            worktree_path: PathBuf = None,
            branch_name: String = None,
            par_task_pid: u32 = None,
        }
    }
}

/// Partial update merged into a stored record by the registry.
///
/// Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneUpdate {
    pub workspace_id: Option<WorkspaceId>,
    pub state: Option<LaneState>,
    pub worktree_path: Option<PathBuf>,
    pub branch_name: Option<String>,
    /// `Some(None)` clears the bound task
    pub par_task_pid: Option<Option<u32>>,
    pub attached_agents: Option<Vec<String>>,
}

impl LaneUpdate {
    crate::setters! {
        option {
            workspace_id: WorkspaceId,
            state: LaneState,
            worktree_path: PathBuf,
            branch_name: String,
            attached_agents: Vec<String>,
        }
    }

    pub fn par_task_pid(mut self, pid: Option<u32>) -> Self {
        self.par_task_pid = Some(pid);
        self
    }

    /// Merge this update into `record`, returning whether the workspace changed.
    pub fn apply_to(self, record: &mut LaneRecord) -> bool {
        let mut workspace_changed = false;
        if let Some(workspace_id) = self.workspace_id {
            workspace_changed = workspace_id != record.workspace_id;
            record.workspace_id = workspace_id;
        }
        if let Some(state) = self.state {
            record.state = state;
        }
        if let Some(path) = self.worktree_path {
            record.worktree_path = Some(path);
        }
        if let Some(branch) = self.branch_name {
            record.branch_name = Some(branch);
        }
        if let Some(pid) = self.par_task_pid {
            record.par_task_pid = pid;
        }
        if let Some(agents) = self.attached_agents {
            record.attached_agents = agents;
        }
        workspace_changed
    }
}

/// Outcome of one orphan-reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Worktree directories found on disk with no active lane
    pub orphaned_worktrees: usize,
    /// Active lanes whose worktree directory has vanished
    pub orphaned_records: usize,
    pub total_cleaned: usize,
    pub timed_out: bool,
}

impl ReconciliationResult {
    /// True when the pass found nothing to heal.
    pub fn is_clean(&self) -> bool {
        self.orphaned_worktrees == 0 && self.orphaned_records == 0
    }
}

#[cfg(test)]
#[path = "lane_tests.rs"]
mod tests;
