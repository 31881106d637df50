// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared setup for lane scenarios.

pub use helios_adapters::test_support::{branches, init_repo};
pub use helios_adapters::{compute_branch_name, compute_worktree_path, FakeEventBus};
pub use helios_core::{Event, LaneEvent, LaneId, LaneRecord, LaneState, LaneUpdate};
pub use helios_engine::{LaneConfig, LaneError, LaneManager};
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use std::time::Duration;
use tempfile::TempDir;

/// A scratch repository with a git-backed lane manager.
pub struct Scenario {
    pub manager: LaneManager,
    pub bus: FakeEventBus,
    _dir: TempDir,
    repo: PathBuf,
}

impl Scenario {
    pub fn new() -> Self {
        Self::with_config(LaneConfig::default())
    }

    pub fn with_config(config: LaneConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repo");
        init_repo(&repo).unwrap();
        let bus = FakeEventBus::new();
        let manager = LaneManager::local(&config, Arc::new(bus.clone()));
        Self { manager, bus, _dir: dir, repo }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Create and provision a lane off `main`.
    pub async fn ready_lane(&self) -> LaneRecord {
        let lane = self.manager.create("ws-1", "main").unwrap();
        self.manager.provision(&lane.lane_id, self.repo()).await.unwrap()
    }

    pub fn lane_branches(&self) -> Vec<String> {
        branches(self.repo(), "helios/lane/*").unwrap()
    }

    /// Poll the bus until `topic` has been published.
    pub async fn wait_for_topic(&self, topic: &str) -> Vec<Event> {
        for _ in 0..200 {
            let events = self.bus.events();
            if events.iter().any(|e| e.topic() == topic) {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{topic} never published; saw {:?}", self.bus.topics());
    }
}
