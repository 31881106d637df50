// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine unit tests.

use crate::{LaneConfig, LaneDeps, LaneManager};
use helios_adapters::{FakeEventBus, FakeWorktreeAdapter};
use helios_core::{Event, FakeClock};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Route engine logs to the test harness. `RUST_LOG` controls verbosity.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `bus` until it has recorded at least `count` events.
pub(crate) async fn wait_for_events(bus: &FakeEventBus, count: usize) -> Vec<Event> {
    for _ in 0..200 {
        let events = bus.events();
        if events.len() >= count {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} events, got {:?}", bus.topics());
}

pub(crate) struct TestContext {
    pub manager: LaneManager<FakeClock>,
    pub bus: FakeEventBus,
    pub worktrees: FakeWorktreeAdapter,
    pub clock: FakeClock,
    pub repo: TempDir,
}

pub(crate) fn setup() -> TestContext {
    setup_with_config(LaneConfig::default())
}

pub(crate) fn setup_with_config(config: LaneConfig) -> TestContext {
    init_tracing();
    let bus = FakeEventBus::new();
    let worktrees = FakeWorktreeAdapter::new();
    let clock = FakeClock::new();
    let deps = LaneDeps { worktrees: Arc::new(worktrees.clone()), bus: Arc::new(bus.clone()) };
    TestContext {
        manager: LaneManager::new(deps, &config, clock.clone()),
        bus,
        worktrees,
        clock,
        repo: TempDir::new().unwrap(),
    }
}
