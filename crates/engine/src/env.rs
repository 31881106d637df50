// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.
//!
//! Unset or unparsable values yield `None` so the caller's default applies.

use std::time::Duration;

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn millis_var(name: &str) -> Option<Duration> {
    parse_var::<u64>(name).map(Duration::from_millis)
}

/// Maximum number of active lanes (`HELIOS_LANE_CAPACITY`)
pub fn lane_capacity() -> Option<usize> {
    parse_var("HELIOS_LANE_CAPACITY")
}

/// How long a lane operation waits for the lane lock (`HELIOS_LOCK_TIMEOUT_MS`)
pub fn lock_timeout() -> Option<Duration> {
    millis_var("HELIOS_LOCK_TIMEOUT_MS")
}

/// Per-invocation timeout for git commands (`HELIOS_GIT_TIMEOUT_MS`)
pub fn git_timeout() -> Option<Duration> {
    millis_var("HELIOS_GIT_TIMEOUT_MS")
}

/// Default bound on one reconciliation pass (`HELIOS_RECONCILE_TIMEOUT_MS`)
pub fn reconcile_timeout() -> Option<Duration> {
    millis_var("HELIOS_RECONCILE_TIMEOUT_MS")
}
