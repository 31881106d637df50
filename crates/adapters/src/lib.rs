// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: git worktrees and the event bus

pub mod bus;
pub mod git;
pub mod subprocess;
pub mod worktree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bus::{BusError, ChannelEventBus, EventBus, NoopEventBus};
pub use git::{Git, GitOutput};
pub use worktree::{
    compute_branch_name, compute_worktree_path, lane_id_for, repo_root_for, worktrees_root,
    LocalWorktreeAdapter, ProvisionRequest, WorktreeAdapter, WorktreeError, WorktreeResult,
    BRANCH_PREFIX, WORKTREES_DIR,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use bus::{FailingEventBus, FailureMode, FakeEventBus};
#[cfg(any(test, feature = "test-support"))]
pub use worktree::FakeWorktreeAdapter;
