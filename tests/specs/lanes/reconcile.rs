// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[tokio::test]
async fn deleted_worktree_closes_its_lane() {
    let s = Scenario::new();
    let lane = s.ready_lane().await;
    std::fs::remove_dir_all(lane.worktree_path.as_ref().unwrap()).unwrap();

    let result = s.manager.reconcile_orphans(s.repo(), None).await;

    assert_eq!(result.orphaned_records, 1);
    assert_eq!(result.orphaned_worktrees, 0);
    assert!(!result.timed_out);
    assert_eq!(s.manager.get(&lane.lane_id).unwrap().state, LaneState::Closed);

    let events = s.wait_for_topic("reconciliation.completed").await;
    let completed = events.iter().find(|e| e.topic() == "reconciliation.completed").unwrap();
    let json = serde_json::to_value(completed).unwrap();
    assert_eq!(json["type"], "reconciliation.completed");
    assert_eq!(json["orphaned_records"], 1);
    assert_eq!(json["timed_out"], false);
}

#[tokio::test]
async fn worktree_of_unknown_lane_is_removed() {
    let s = Scenario::new();
    let foreign = Scenario::new();
    // Provision through a second manager so the first has no record of it
    let stray = foreign.manager.create("ws-9", "main").unwrap();
    let stray = foreign.manager.provision(&stray.lane_id, s.repo()).await.unwrap();
    let keep = s.ready_lane().await;

    let result = s.manager.reconcile_orphans(s.repo(), Some(Duration::from_secs(30))).await;

    assert_eq!(result.orphaned_worktrees, 1);
    assert_eq!(result.total_cleaned, 1);
    assert!(!stray.worktree_path.as_ref().unwrap().exists());
    assert!(keep.worktree_path.as_ref().unwrap().exists());
    assert_eq!(s.lane_branches(), vec![compute_branch_name(&keep.lane_id)]);
}

#[tokio::test]
async fn clean_repository_reports_nothing() {
    let s = Scenario::new();
    s.ready_lane().await;

    let result = s.manager.reconcile_orphans(s.repo(), None).await;

    assert!(result.is_clean());
    assert_eq!(result.total_cleaned, 0);
}
