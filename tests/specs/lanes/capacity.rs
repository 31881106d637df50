// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[tokio::test]
async fn fifty_first_lane_waits_for_a_cleanup() {
    let s = Scenario::new();
    let mut lanes = Vec::new();
    for _ in 0..50 {
        lanes.push(s.manager.create("ws-1", "main").unwrap());
    }

    let err = s.manager.create("ws-1", "main").unwrap_err();
    assert!(err.to_string().contains("capacity"), "unexpected message: {err}");

    s.manager.cleanup(&lanes[0].lane_id, false).await.unwrap();
    let lane = s.manager.create("ws-1", "main").unwrap();
    assert_eq!(lane.state, LaneState::Provisioning);
}

#[tokio::test]
async fn configured_capacity_is_enforced() {
    let s = Scenario::with_config(LaneConfig::from_toml_str("[lanes]\ncapacity = 2\n").unwrap());
    s.ready_lane().await;
    s.ready_lane().await;

    let err = s.manager.create("ws-1", "main").unwrap_err();
    assert!(matches!(err, LaneError::LaneCapacityExceeded { active: 2, limit: 2 }));
}
