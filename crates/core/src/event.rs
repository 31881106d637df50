// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events published to the external event bus.

use crate::lane::{LaneId, LaneState, ReconciliationResult, WorkspaceId};
use crate::transition::LaneEvent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events published by the lane manager.
///
/// Serializes with `{"type": "<topic>", ...fields}` format. Every lane-scoped
/// event carries both the lane and workspace ids for correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "lane.created")]
    LaneCreated {
        lane_id: LaneId,
        workspace_id: WorkspaceId,
        from_state: LaneState,
        to_state: LaneState,
    },

    #[serde(rename = "lane.state.changed")]
    LaneStateChanged {
        lane_id: LaneId,
        workspace_id: WorkspaceId,
        event: LaneEvent,
        from_state: LaneState,
        to_state: LaneState,
    },

    #[serde(rename = "lane.shared")]
    LaneShared {
        lane_id: LaneId,
        workspace_id: WorkspaceId,
        from_state: LaneState,
        to_state: LaneState,
    },

    #[serde(rename = "lane.cleaning")]
    LaneCleaning { lane_id: LaneId, workspace_id: WorkspaceId, from_state: LaneState },

    #[serde(rename = "lane.closed")]
    LaneClosed {
        lane_id: LaneId,
        workspace_id: WorkspaceId,
        #[serde(default)]
        worktree_path: Option<PathBuf>,
    },

    #[serde(rename = "reconciliation.completed")]
    ReconciliationCompleted {
        repo_root: PathBuf,
        #[serde(flatten)]
        result: ReconciliationResult,
    },
}

impl Event {
    /// Bus topic this event is published under.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::LaneCreated { .. } => "lane.created",
            Event::LaneStateChanged { .. } => "lane.state.changed",
            Event::LaneShared { .. } => "lane.shared",
            Event::LaneCleaning { .. } => "lane.cleaning",
            Event::LaneClosed { .. } => "lane.closed",
            Event::ReconciliationCompleted { .. } => "reconciliation.completed",
        }
    }

    /// Lane this event concerns, if it is lane-scoped.
    pub fn lane_id(&self) -> Option<&LaneId> {
        match self {
            Event::LaneCreated { lane_id, .. }
            | Event::LaneStateChanged { lane_id, .. }
            | Event::LaneShared { lane_id, .. }
            | Event::LaneCleaning { lane_id, .. }
            | Event::LaneClosed { lane_id, .. } => Some(lane_id),
            Event::ReconciliationCompleted { .. } => None,
        }
    }

    /// One-line summary for logs.
    pub fn log_summary(&self) -> String {
        let t = self.topic();
        match self {
            Event::LaneCreated { lane_id, workspace_id, .. }
            | Event::LaneCleaning { lane_id, workspace_id, .. }
            | Event::LaneClosed { lane_id, workspace_id, .. } => {
                format!("{t} lane={lane_id} workspace={workspace_id}")
            }
            Event::LaneStateChanged { lane_id, from_state, to_state, .. }
            | Event::LaneShared { lane_id, from_state, to_state, .. } => {
                format!("{t} lane={lane_id} {from_state}->{to_state}")
            }
            Event::ReconciliationCompleted { result, .. } => format!(
                "{t} worktrees={} records={} cleaned={} timed_out={}",
                result.orphaned_worktrees,
                result.orphaned_records,
                result.total_cleaned,
                result.timed_out
            ),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
