// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{LaneId, LaneRecord, LaneState, WorkspaceId};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for lane state machine types.
pub mod strategies {
    use crate::{LaneEvent, LaneState};
    use proptest::prelude::*;

    pub fn arb_lane_state() -> impl Strategy<Value = LaneState> {
        proptest::sample::select(LaneState::ALL.to_vec())
    }

    pub fn arb_lane_event() -> impl Strategy<Value = LaneEvent> {
        proptest::sample::select(LaneEvent::ALL.to_vec())
    }
}

// ── Record factory functions ─────────────────────────────────────────────

/// A record for `lane_id` in `workspace_id` with the given state.
pub fn lane_record(lane_id: &str, workspace_id: &str, state: LaneState) -> LaneRecord {
    LaneRecord::builder()
        .lane_id(LaneId::from(lane_id))
        .workspace_id(WorkspaceId::from(workspace_id))
        .state(state)
        .build()
}
