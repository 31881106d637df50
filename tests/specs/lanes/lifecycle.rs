// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[tokio::test]
async fn provision_creates_worktree_and_branch() {
    let s = Scenario::new();

    let lane = s.manager.create("ws-1", "main").unwrap();
    assert_eq!(lane.state, LaneState::Provisioning);

    let ready = s.manager.provision(&lane.lane_id, s.repo()).await.unwrap();

    let path = compute_worktree_path(s.repo(), &lane.lane_id);
    assert_eq!(ready.state, LaneState::Ready);
    assert_eq!(ready.worktree_path.as_deref(), Some(path.as_path()));
    assert!(path.join("README.md").is_file(), "worktree should be checked out");
    assert_eq!(s.lane_branches(), vec![compute_branch_name(&lane.lane_id)]);
}

#[tokio::test]
async fn provision_from_missing_base_closes_lane_without_leftovers() {
    let s = Scenario::new();
    let lane = s.manager.create("ws-1", "no-such-branch").unwrap();

    let err = s.manager.provision(&lane.lane_id, s.repo()).await.unwrap_err();

    assert!(matches!(err, LaneError::Worktree(_)));
    assert_eq!(s.manager.get(&lane.lane_id).unwrap().state, LaneState::Closed);
    assert!(!compute_worktree_path(s.repo(), &lane.lane_id).exists());
    assert!(s.lane_branches().is_empty());
}

#[tokio::test]
async fn cleanup_removes_worktree_and_branch() {
    let s = Scenario::new();
    let lane = s.ready_lane().await;
    let path = lane.worktree_path.clone().unwrap();

    let closed = s.manager.cleanup(&lane.lane_id, false).await.unwrap();

    assert_eq!(closed.state, LaneState::Closed);
    assert!(!path.exists());
    assert!(s.lane_branches().is_empty());

    let topics: Vec<_> =
        s.wait_for_topic("lane.closed").await.iter().map(Event::topic).collect();
    assert_eq!(topics, vec!["lane.created", "lane.state.changed", "lane.cleaning", "lane.closed"]);
}

#[tokio::test]
async fn cleanup_of_never_provisioned_ready_lane_succeeds() {
    let s = Scenario::new();
    let lane = s.manager.create("ws-1", "main").unwrap();
    s.manager
        .registry()
        .update(&lane.lane_id, LaneUpdate::default().state(LaneState::Ready))
        .unwrap();

    let closed = s.manager.cleanup(&lane.lane_id, false).await.unwrap();
    assert_eq!(closed.state, LaneState::Closed);
}

#[tokio::test]
async fn cleanup_tolerates_worktree_that_never_existed() {
    let s = Scenario::new();
    let lane = s.manager.create("ws-1", "main").unwrap();
    let phantom = compute_worktree_path(s.repo(), &lane.lane_id);
    s.manager
        .registry()
        .update(
            &lane.lane_id,
            LaneUpdate::default().state(LaneState::Ready).worktree_path(phantom.clone()),
        )
        .unwrap();

    let closed = s.manager.cleanup(&lane.lane_id, false).await.unwrap();

    assert_eq!(closed.state, LaneState::Closed);
    assert!(!phantom.exists());
}

#[tokio::test]
async fn runtime_transitions_then_cleanup() {
    let s = Scenario::new();
    let lane = s.ready_lane().await;

    s.manager.transition(&lane.lane_id, LaneEvent::StartRunning).await.unwrap();
    s.manager.transition(&lane.lane_id, LaneEvent::Block).await.unwrap();
    let closed = s.manager.cleanup(&lane.lane_id, false).await.unwrap();

    assert_eq!(closed.state, LaneState::Closed);
    let events: Vec<_> = s.manager.history(&lane.lane_id).iter().map(|r| r.event).collect();
    assert_eq!(
        events,
        vec![
            LaneEvent::Create,
            LaneEvent::ProvisionComplete,
            LaneEvent::StartRunning,
            LaneEvent::Block,
            LaneEvent::RequestCleanup,
            LaneEvent::CleanupComplete,
        ]
    );
}

#[tokio::test]
async fn lanes_get_independent_worktrees() {
    let s = Scenario::new();
    let a = s.ready_lane().await;
    let b = s.ready_lane().await;

    std::fs::write(a.worktree_path.as_ref().unwrap().join("scratch.txt"), "a").unwrap();

    assert_ne!(a.worktree_path, b.worktree_path);
    assert!(!b.worktree_path.as_ref().unwrap().join("scratch.txt").exists());
    assert_eq!(s.lane_branches().len(), 2);

    s.manager.cleanup(&a.lane_id, false).await.unwrap();
    assert!(b.worktree_path.as_ref().unwrap().is_dir());
    assert_eq!(s.lane_branches(), vec![compute_branch_name(&b.lane_id)]);
}
