// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane state machine.
//!
//! [`transition`] is a pure function over the lane transition table. It
//! knows nothing about the registry; callers apply the returned state and
//! record it in a [`TransitionHistory`] for diagnostics.

use crate::lane::{LaneId, LaneState};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Maximum transition records kept per lane
pub const HISTORY_LIMIT: usize = 20;

/// Input to the lane state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneEvent {
    Create,
    ProvisionComplete,
    ProvisionFailed,
    StartRunning,
    Share,
    Unshare,
    RequestCleanup,
    CommandComplete,
    Block,
    Unblock,
    CleanupComplete,
}

impl LaneEvent {
    pub const ALL: [LaneEvent; 11] = [
        LaneEvent::Create,
        LaneEvent::ProvisionComplete,
        LaneEvent::ProvisionFailed,
        LaneEvent::StartRunning,
        LaneEvent::Share,
        LaneEvent::Unshare,
        LaneEvent::RequestCleanup,
        LaneEvent::CommandComplete,
        LaneEvent::Block,
        LaneEvent::Unblock,
        LaneEvent::CleanupComplete,
    ];

    /// Events that only move a lane between its working states and carry
    /// no disk, sharing, or bus side effects of their own.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            LaneEvent::StartRunning | LaneEvent::CommandComplete | LaneEvent::Block | LaneEvent::Unblock
        )
    }
}

crate::simple_display! {
    LaneEvent {
        Create => "create",
        ProvisionComplete => "provision_complete",
        ProvisionFailed => "provision_failed",
        StartRunning => "start_running",
        Share => "share",
        Unshare => "unshare",
        RequestCleanup => "request_cleanup",
        CommandComplete => "command_complete",
        Block => "block",
        Unblock => "unblock",
        CleanupComplete => "cleanup_complete",
    }
}

/// An event was applied to a lane in a state that does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lane transition for {lane_id}: cannot apply '{attempted_event}' in state '{current_state}'")]
pub struct InvalidLaneTransition {
    pub lane_id: LaneId,
    pub current_state: LaneState,
    pub attempted_event: LaneEvent,
}

/// Compute the next state for `event` applied in `state`.
pub fn transition(
    state: LaneState,
    event: LaneEvent,
    lane_id: &LaneId,
) -> Result<LaneState, InvalidLaneTransition> {
    use LaneEvent as E;
    use LaneState as S;

    let next = match (state, event) {
        (S::New, E::Create) => S::Provisioning,
        (S::Provisioning, E::ProvisionComplete) => S::Ready,
        (S::Provisioning, E::ProvisionFailed) => S::Closed,
        (S::Ready, E::StartRunning) => S::Running,
        (S::Ready, E::Share) => S::Shared,
        (S::Ready, E::RequestCleanup) => S::Cleaning,
        (S::Running, E::CommandComplete) => S::Ready,
        (S::Running, E::Block) => S::Blocked,
        (S::Running, E::RequestCleanup) => S::Cleaning,
        (S::Blocked, E::Unblock) => S::Running,
        (S::Blocked, E::RequestCleanup) => S::Cleaning,
        (S::Shared, E::Unshare) => S::Ready,
        (S::Shared, E::RequestCleanup) => S::Cleaning,
        (S::Cleaning, E::CleanupComplete) => S::Closed,
        (S::Cleaning, E::RequestCleanup) => S::Cleaning,
        _ => {
            return Err(InvalidLaneTransition {
                lane_id: lane_id.clone(),
                current_state: state,
                attempted_event: event,
            })
        }
    };
    Ok(next)
}

/// One applied transition, kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from_state: LaneState,
    pub event: LaneEvent,
    pub to_state: LaneState,
    pub timestamp_ms: u64,
}

/// Bounded per-lane transition log. Oldest entries are dropped first.
#[derive(Debug, Default)]
pub struct TransitionHistory {
    entries: Mutex<HashMap<LaneId, VecDeque<TransitionRecord>>>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, lane_id: &LaneId, record: TransitionRecord) {
        let mut entries = self.entries.lock();
        let log = entries.entry(lane_id.clone()).or_default();
        if log.len() == HISTORY_LIMIT {
            log.pop_front();
        }
        log.push_back(record);
    }

    /// Transitions for `lane_id`, oldest first.
    pub fn get(&self, lane_id: &str) -> Vec<TransitionRecord> {
        self.entries.lock().get(lane_id).map(|log| log.iter().cloned().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
