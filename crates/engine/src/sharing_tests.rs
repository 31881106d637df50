// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::registry::{LaneRegistry, DEFAULT_CAPACITY};
use helios_core::test_support::lane_record;
use helios_core::{FakeClock, TransitionHistory};
use std::sync::Arc;
use yare::parameterized;

fn store_with(state: LaneState) -> (LaneStore<FakeClock>, LaneId) {
    let registry = Arc::new(LaneRegistry::new(DEFAULT_CAPACITY, FakeClock::new()));
    registry.register(lane_record("lane-a", "ws-1", state)).unwrap();
    (LaneStore::new(registry, Arc::new(TransitionHistory::new())), LaneId::from("lane-a"))
}

fn agents(store: &LaneStore<FakeClock>, lane_id: &LaneId) -> Vec<String> {
    store.require(lane_id).unwrap().attached_agents
}

#[test]
fn share_ready_lane() {
    let (store, id) = store_with(LaneState::Ready);

    let outcome = share_lane(&store, &id).unwrap();
    assert_eq!(outcome.from_state, LaneState::Ready);
    assert_eq!(outcome.to_state, LaneState::Shared);
    assert!(outcome.change.is_some());
    assert_eq!(store.require(&id).unwrap().state, LaneState::Shared);
}

#[test]
fn share_is_idempotent() {
    let (store, id) = store_with(LaneState::Shared);

    let outcome = share_lane(&store, &id).unwrap();
    assert_eq!(outcome.from_state, LaneState::Shared);
    assert_eq!(outcome.to_state, LaneState::Shared);
    assert!(outcome.change.is_none());
    assert!(store.history().get("lane-a").is_empty());
}

#[test]
fn share_closed_lane_fails() {
    let (store, id) = store_with(LaneState::Closed);
    assert!(matches!(share_lane(&store, &id), Err(LaneError::LaneClosed(_))));
}

#[parameterized(
    provisioning = { LaneState::Provisioning },
    running = { LaneState::Running },
    blocked = { LaneState::Blocked },
    cleaning = { LaneState::Cleaning },
)]
fn share_from_non_ready_state_is_invalid(state: LaneState) {
    let (store, id) = store_with(state);
    assert!(matches!(share_lane(&store, &id), Err(LaneError::InvalidTransition(_))));
    assert_eq!(store.require(&id).unwrap().state, state);
}

#[test]
fn attach_keeps_order_and_ignores_duplicates() {
    let (store, id) = store_with(LaneState::Shared);

    attach_agent(&store, &id, "agent-1").unwrap();
    attach_agent(&store, &id, "agent-2").unwrap();
    let record = attach_agent(&store, &id, "agent-1").unwrap();

    assert_eq!(record.attached_agents, vec!["agent-1", "agent-2"]);
    assert_eq!(agents(&store, &id), vec!["agent-1", "agent-2"]);
}

#[test]
fn attach_requires_shared_lane() {
    let (store, id) = store_with(LaneState::Ready);

    let err = attach_agent(&store, &id, "agent-1").unwrap_err();
    assert!(matches!(err, LaneError::LaneNotShared { state: LaneState::Ready, .. }));
    assert!(agents(&store, &id).is_empty());
}

#[test]
fn attach_to_closed_lane_fails() {
    let (store, id) = store_with(LaneState::Closed);
    assert!(matches!(attach_agent(&store, &id, "agent-1"), Err(LaneError::LaneClosed(_))));
}

#[test]
fn detach_last_agent_unshares() {
    let (store, id) = store_with(LaneState::Shared);
    attach_agent(&store, &id, "agent-1").unwrap();
    attach_agent(&store, &id, "agent-2").unwrap();

    let first = detach_agent(&store, &id, "agent-1").unwrap();
    assert!(!first.transitioned);
    assert_eq!(first.to_state, LaneState::Shared);
    assert_eq!(first.record.attached_agents, vec!["agent-2"]);

    let last = detach_agent(&store, &id, "agent-2").unwrap();
    assert!(last.transitioned);
    assert_eq!(last.from_state, LaneState::Shared);
    assert_eq!(last.to_state, LaneState::Ready);
    assert_eq!(last.change.unwrap().event, LaneEvent::Unshare);
    assert_eq!(store.require(&id).unwrap().state, LaneState::Ready);
}

#[test]
fn detach_unknown_agent_is_noop() {
    let (store, id) = store_with(LaneState::Shared);
    attach_agent(&store, &id, "agent-1").unwrap();

    let outcome = detach_agent(&store, &id, "agent-9").unwrap();
    assert!(!outcome.transitioned);
    assert_eq!(outcome.to_state, LaneState::Shared);
    assert_eq!(agents(&store, &id), vec!["agent-1"]);
}

#[test]
fn force_detach_all_clears_agents_and_unshares() {
    let (store, id) = store_with(LaneState::Shared);
    attach_agent(&store, &id, "agent-1").unwrap();
    attach_agent(&store, &id, "agent-2").unwrap();

    let outcome = force_detach_all(&store, &id).unwrap();
    assert_eq!(outcome.detached, vec!["agent-1", "agent-2"]);
    assert_eq!(outcome.record.state, LaneState::Ready);
    assert!(outcome.record.attached_agents.is_empty());
    assert!(outcome.change.is_some());
}

#[test]
fn force_detach_all_on_unshared_lane_is_noop() {
    let (store, id) = store_with(LaneState::Running);

    let outcome = force_detach_all(&store, &id).unwrap();
    assert!(outcome.detached.is_empty());
    assert!(outcome.change.is_none());
    assert_eq!(outcome.record.state, LaneState::Running);
}

#[test]
fn operations_on_unknown_lane_fail() {
    let (store, _) = store_with(LaneState::Ready);
    let missing = LaneId::from("lane-missing");

    assert!(matches!(share_lane(&store, &missing), Err(LaneError::LaneNotFound(_))));
    assert!(matches!(attach_agent(&store, &missing, "a"), Err(LaneError::LaneNotFound(_))));
    assert!(matches!(detach_agent(&store, &missing, "a"), Err(LaneError::LaneNotFound(_))));
    assert!(matches!(force_detach_all(&store, &missing), Err(LaneError::LaneNotFound(_))));
}

#[tokio::test]
async fn protocol_serializes_concurrent_attaches() {
    let (store, id) = store_with(LaneState::Shared);
    let protocol = Arc::new(SharingProtocol::new(store.clone(), LaneLocks::default()));

    let mut handles = Vec::new();
    for i in 0..10 {
        let protocol = Arc::clone(&protocol);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            protocol.attach_agent(&id, &format!("agent-{i}")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(agents(&store, &id).len(), 10);
}

#[tokio::test]
async fn protocol_round_trip() {
    let (store, id) = store_with(LaneState::Ready);
    let protocol = SharingProtocol::new(store.clone(), LaneLocks::default());

    protocol.share_lane(&id).await.unwrap();
    protocol.attach_agent(&id, "agent-1").await.unwrap();
    let outcome = protocol.detach_agent(&id, "agent-1").await.unwrap();
    assert!(outcome.transitioned);

    protocol.share_lane(&id).await.unwrap();
    protocol.attach_agent(&id, "agent-2").await.unwrap();
    let forced = protocol.force_detach_all(&id).await.unwrap();
    assert_eq!(forced.detached, vec!["agent-2"]);
    assert_eq!(store.require(&id).unwrap().state, LaneState::Ready);
}
