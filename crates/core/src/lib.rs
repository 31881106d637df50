// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! helios-core: lane records, the lane state machine, and bus events

pub mod macros;

pub mod clock;
pub mod event;
pub mod id;
pub mod lane;
pub mod transition;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use lane::{LaneId, LaneRecord, LaneState, LaneUpdate, ReconciliationResult, WorkspaceId};
#[cfg(any(test, feature = "test-support"))]
pub use lane::LaneRecordBuilder;
pub use transition::{
    transition, InvalidLaneTransition, LaneEvent, TransitionHistory, TransitionRecord,
    HISTORY_LIMIT,
};
