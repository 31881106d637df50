// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying state-machine events to stored lanes.
//!
//! [`LaneStore`] pairs the registry with the transition history so every
//! applied event is validated, stored, and logged in one place. Callers are
//! expected to hold the lane lock.

use crate::{LaneError, LaneRegistry};
use helios_core::{
    transition, Clock, Event, LaneEvent, LaneId, LaneRecord, LaneState, LaneUpdate,
    TransitionHistory, TransitionRecord, WorkspaceId,
};
use std::sync::Arc;

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub lane_id: LaneId,
    pub workspace_id: WorkspaceId,
    pub event: LaneEvent,
    pub from_state: LaneState,
    pub to_state: LaneState,
}

impl StateChange {
    pub fn to_event(&self) -> Event {
        Event::LaneStateChanged {
            lane_id: self.lane_id.clone(),
            workspace_id: self.workspace_id.clone(),
            event: self.event,
            from_state: self.from_state,
            to_state: self.to_state,
        }
    }
}

pub struct LaneStore<C: Clock> {
    registry: Arc<LaneRegistry<C>>,
    history: Arc<TransitionHistory>,
}

impl<C: Clock> Clone for LaneStore<C> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry), history: Arc::clone(&self.history) }
    }
}

impl<C: Clock> LaneStore<C> {
    pub fn new(registry: Arc<LaneRegistry<C>>, history: Arc<TransitionHistory>) -> Self {
        Self { registry, history }
    }

    pub fn registry(&self) -> &LaneRegistry<C> {
        &self.registry
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// Fetch a record or fail with [`LaneError::LaneNotFound`].
    pub fn require(&self, lane_id: &LaneId) -> Result<LaneRecord, LaneError> {
        self.registry.get(lane_id).ok_or_else(|| LaneError::LaneNotFound(lane_id.clone()))
    }

    /// Validate `event` against the lane's current state, store the result,
    /// and append it to the history.
    pub fn apply(
        &self,
        lane_id: &LaneId,
        event: LaneEvent,
    ) -> Result<(StateChange, LaneRecord), LaneError> {
        let current = self.require(lane_id)?;
        let to_state = transition(current.state, event, lane_id)?;
        let updated = self.registry.update(lane_id, LaneUpdate::default().state(to_state))?;
        self.record(lane_id, current.state, event, to_state, updated.updated_at_ms);

        tracing::debug!(
            lane_id = %lane_id,
            event = event.as_str(),
            from = current.state.as_str(),
            to = to_state.as_str(),
            "lane transition"
        );
        let change = StateChange {
            lane_id: lane_id.clone(),
            workspace_id: updated.workspace_id.clone(),
            event,
            from_state: current.state,
            to_state,
        };
        Ok((change, updated))
    }

    /// Append a transition to the history without touching the registry.
    pub fn record(
        &self,
        lane_id: &LaneId,
        from_state: LaneState,
        event: LaneEvent,
        to_state: LaneState,
        timestamp_ms: u64,
    ) {
        self.history.record(lane_id, TransitionRecord { from_state, event, to_state, timestamp_ms });
    }
}

/// Events that drive a lane in `state` to `closed` without touching disk.
pub fn close_path(state: LaneState) -> &'static [LaneEvent] {
    match state {
        LaneState::Provisioning => &[LaneEvent::ProvisionFailed],
        LaneState::Ready | LaneState::Running | LaneState::Blocked | LaneState::Shared => {
            &[LaneEvent::RequestCleanup, LaneEvent::CleanupComplete]
        }
        LaneState::Cleaning => &[LaneEvent::CleanupComplete],
        LaneState::New | LaneState::Closed => &[],
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
