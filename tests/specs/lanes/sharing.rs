// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[tokio::test]
async fn last_detach_returns_lane_to_ready() {
    let s = Scenario::new();
    let lane = s.ready_lane().await;
    let id = &lane.lane_id;

    s.manager.share(id).await.unwrap();
    s.manager.attach(id, "agent-a").await.unwrap();
    s.manager.attach(id, "agent-b").await.unwrap();

    let first = s.manager.detach(id, "agent-a").await.unwrap();
    assert!(!first.transitioned);
    let last = s.manager.detach(id, "agent-b").await.unwrap();
    assert!(last.transitioned);

    let record = s.manager.get(id).unwrap();
    assert_eq!(record.state, LaneState::Ready);
    assert!(record.attached_agents.is_empty());
    s.wait_for_topic("lane.shared").await;
}

#[tokio::test]
async fn shared_lane_cleanup_requires_force() {
    let s = Scenario::new();
    let lane = s.ready_lane().await;
    let id = &lane.lane_id;
    s.manager.share(id).await.unwrap();
    s.manager.attach(id, "agent-a").await.unwrap();

    let err = s.manager.cleanup(id, false).await.unwrap_err();
    assert!(matches!(err, LaneError::SharedLaneCleanup { agent_count: 1, .. }));
    assert!(lane.worktree_path.as_ref().unwrap().exists());

    let closed = s.manager.cleanup(id, true).await.unwrap();
    assert_eq!(closed.state, LaneState::Closed);
    assert!(closed.attached_agents.is_empty());
    assert!(!lane.worktree_path.as_ref().unwrap().exists());
}
