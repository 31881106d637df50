// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-agent lane sharing.
//!
//! A shared lane accepts any number of attached agents. The free functions
//! here assume the caller already holds the lane lock; [`SharingProtocol`]
//! wraps each one in its own lock acquisition for standalone use.

use crate::lifecycle::{LaneStore, StateChange};
use crate::{LaneError, LaneLocks};
use helios_core::{Clock, LaneEvent, LaneId, LaneRecord, LaneState, LaneUpdate};

/// Result of sharing a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOutcome {
    pub from_state: LaneState,
    pub to_state: LaneState,
    /// `None` when the lane was already shared
    pub change: Option<StateChange>,
    pub record: LaneRecord,
}

/// Result of detaching one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachOutcome {
    /// True when the last agent left and the lane returned to `ready`
    pub transitioned: bool,
    pub from_state: LaneState,
    pub to_state: LaneState,
    pub change: Option<StateChange>,
    pub record: LaneRecord,
}

/// Result of detaching every agent at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceDetachOutcome {
    /// Agents that were attached, in attach order
    pub detached: Vec<String>,
    pub change: Option<StateChange>,
    pub record: LaneRecord,
}

/// Move a lane to `shared`. Already-shared lanes are left untouched.
pub fn share_lane<C: Clock>(
    store: &LaneStore<C>,
    lane_id: &LaneId,
) -> Result<ShareOutcome, LaneError> {
    let record = store.require(lane_id)?;
    match record.state {
        LaneState::Closed => Err(LaneError::LaneClosed(lane_id.clone())),
        LaneState::Shared => Ok(ShareOutcome {
            from_state: LaneState::Shared,
            to_state: LaneState::Shared,
            change: None,
            record,
        }),
        _ => {
            let (change, record) = store.apply(lane_id, LaneEvent::Share)?;
            tracing::info!(lane_id = %lane_id, from = %change.from_state, "lane shared");
            Ok(ShareOutcome {
                from_state: change.from_state,
                to_state: change.to_state,
                change: Some(change),
                record,
            })
        }
    }
}

/// Attach `agent_id` to a shared lane. Attaching twice is a no-op.
pub fn attach_agent<C: Clock>(
    store: &LaneStore<C>,
    lane_id: &LaneId,
    agent_id: &str,
) -> Result<LaneRecord, LaneError> {
    let record = store.require(lane_id)?;
    match record.state {
        LaneState::Closed => return Err(LaneError::LaneClosed(lane_id.clone())),
        LaneState::Shared => {}
        state => return Err(LaneError::LaneNotShared { lane_id: lane_id.clone(), state }),
    }
    if record.is_attached(agent_id) {
        return Ok(record);
    }

    let mut agents = record.attached_agents;
    agents.push(agent_id.to_string());
    let updated = store.registry().update(lane_id, LaneUpdate::default().attached_agents(agents))?;
    tracing::info!(
        lane_id = %lane_id,
        agent_id,
        agents = updated.attached_agents.len(),
        "agent attached"
    );
    Ok(updated)
}

/// Detach `agent_id`. The lane unshares once its last agent leaves.
///
/// Detaching an agent that is not attached is a no-op.
pub fn detach_agent<C: Clock>(
    store: &LaneStore<C>,
    lane_id: &LaneId,
    agent_id: &str,
) -> Result<DetachOutcome, LaneError> {
    let record = store.require(lane_id)?;
    if !record.is_attached(agent_id) {
        return Ok(DetachOutcome {
            transitioned: false,
            from_state: record.state,
            to_state: record.state,
            change: None,
            record,
        });
    }

    let from_state = record.state;
    let agents: Vec<String> =
        record.attached_agents.into_iter().filter(|a| a != agent_id).collect();
    let now_empty = agents.is_empty();
    let mut updated =
        store.registry().update(lane_id, LaneUpdate::default().attached_agents(agents))?;
    tracing::info!(lane_id = %lane_id, agent_id, "agent detached");

    let mut change = None;
    if now_empty && from_state == LaneState::Shared {
        let (applied, record) = store.apply(lane_id, LaneEvent::Unshare)?;
        updated = record;
        change = Some(applied);
    }
    Ok(DetachOutcome {
        transitioned: change.is_some(),
        from_state,
        to_state: updated.state,
        change,
        record: updated,
    })
}

/// Clear every attached agent and unshare the lane if it was shared.
pub fn force_detach_all<C: Clock>(
    store: &LaneStore<C>,
    lane_id: &LaneId,
) -> Result<ForceDetachOutcome, LaneError> {
    let record = store.require(lane_id)?;
    let detached = record.attached_agents.clone();
    let mut updated = if detached.is_empty() {
        record
    } else {
        store.registry().update(lane_id, LaneUpdate::default().attached_agents(Vec::new()))?
    };

    let mut change = None;
    if updated.state == LaneState::Shared {
        let (applied, record) = store.apply(lane_id, LaneEvent::Unshare)?;
        updated = record;
        change = Some(applied);
    }
    if !detached.is_empty() {
        tracing::warn!(lane_id = %lane_id, agents = ?detached, "force-detached agents");
    }
    Ok(ForceDetachOutcome { detached, change, record: updated })
}

/// Sharing operations that take the lane lock themselves.
pub struct SharingProtocol<C: Clock> {
    store: LaneStore<C>,
    locks: LaneLocks,
}

impl<C: Clock> SharingProtocol<C> {
    pub fn new(store: LaneStore<C>, locks: LaneLocks) -> Self {
        Self { store, locks }
    }

    pub async fn share_lane(&self, lane_id: &LaneId) -> Result<ShareOutcome, LaneError> {
        self.locks.with_lock(lane_id, || async { share_lane(&self.store, lane_id) }).await
    }

    pub async fn attach_agent(
        &self,
        lane_id: &LaneId,
        agent_id: &str,
    ) -> Result<LaneRecord, LaneError> {
        self.locks.with_lock(lane_id, || async { attach_agent(&self.store, lane_id, agent_id) }).await
    }

    pub async fn detach_agent(
        &self,
        lane_id: &LaneId,
        agent_id: &str,
    ) -> Result<DetachOutcome, LaneError> {
        self.locks.with_lock(lane_id, || async { detach_agent(&self.store, lane_id, agent_id) }).await
    }

    pub async fn force_detach_all(&self, lane_id: &LaneId) -> Result<ForceDetachOutcome, LaneError> {
        self.locks.with_lock(lane_id, || async { force_detach_all(&self.store, lane_id) }).await
    }
}

#[cfg(test)]
#[path = "sharing_tests.rs"]
mod tests;
