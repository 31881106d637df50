// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane operation errors

use helios_adapters::WorktreeError;
use helios_core::{InvalidLaneTransition, LaneEvent, LaneId, LaneState};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by registry, sharing, and manager operations
#[derive(Debug, Error)]
pub enum LaneError {
    #[error("lane already registered: {0}")]
    DuplicateLane(LaneId),
    #[error("lane not found: {0}")]
    LaneNotFound(LaneId),
    #[error("lane capacity exceeded: {active} active lanes (limit {limit})")]
    LaneCapacityExceeded { active: usize, limit: usize },
    #[error(transparent)]
    InvalidTransition(#[from] InvalidLaneTransition),
    #[error("lane {0} is closed")]
    LaneClosed(LaneId),
    #[error("lane {lane_id} is not shared (state '{state}')")]
    LaneNotShared { lane_id: LaneId, state: LaneState },
    #[error("cannot clean up shared lane {lane_id}: {agent_count} agent(s) still attached")]
    SharedLaneCleanup { lane_id: LaneId, agent_count: usize },
    #[error("event '{event}' on lane {lane_id} must go through its dedicated operation")]
    NotRuntimeEvent { lane_id: LaneId, event: LaneEvent },
    #[error(transparent)]
    Worktree(#[from] WorktreeError),
    #[error("timed out after {}ms waiting for lock on lane {lane_id}", timeout.as_millis())]
    LaneLockTimeout { lane_id: LaneId, timeout: Duration },
}
