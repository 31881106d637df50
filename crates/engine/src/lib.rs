// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! helios-engine: lane registry, locking, sharing, reconciliation, and the
//! [`LaneManager`] that ties them together

pub mod config;
mod env;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod manager;
pub mod publish;
pub mod reconcile;
pub mod registry;
pub mod sharing;

#[cfg(test)]
mod test_helpers;

pub use config::{ConfigError, LaneConfig};
pub use error::LaneError;
pub use lifecycle::{LaneStore, StateChange};
pub use lock::{LaneGuard, LaneLocks, DEFAULT_LOCK_TIMEOUT};
pub use manager::{LaneDeps, LaneManager};
pub use publish::{Publisher, PUBLISH_TIMEOUT};
pub use reconcile::{ReconcileReport, Reconciler, DEFAULT_RECONCILE_TIMEOUT};
pub use registry::{LaneRegistry, DEFAULT_CAPACITY};
pub use sharing::{DetachOutcome, ForceDetachOutcome, ShareOutcome, SharingProtocol};
