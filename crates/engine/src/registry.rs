// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory lane registry.
//!
//! The registry is the single source of truth for lane records. Every read
//! returns a clone, so callers can never mutate stored state behind the
//! registry's back. Capacity is enforced on registration only, counting
//! lanes that are not yet closed.

use crate::LaneError;
use helios_core::{Clock, LaneId, LaneRecord, LaneUpdate, SystemClock, WorkspaceId};
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default maximum number of active lanes
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Default)]
struct RegistryInner {
    lanes: IndexMap<LaneId, LaneRecord>,
    by_workspace: HashMap<WorkspaceId, IndexSet<LaneId>>,
}

impl RegistryInner {
    fn active_count(&self) -> usize {
        self.lanes.values().filter(|r| r.state.is_active()).count()
    }

    fn unindex(&mut self, workspace_id: &WorkspaceId, lane_id: &LaneId) {
        if let Some(set) = self.by_workspace.get_mut(workspace_id) {
            set.shift_remove(lane_id);
            if set.is_empty() {
                self.by_workspace.remove(workspace_id);
            }
        }
    }
}

pub struct LaneRegistry<C: Clock = SystemClock> {
    inner: Mutex<RegistryInner>,
    capacity: usize,
    clock: C,
}

impl<C: Clock> LaneRegistry<C> {
    pub fn new(capacity: usize, clock: C) -> Self {
        Self { inner: Mutex::new(RegistryInner::default()), capacity, clock }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fail fast when no capacity is left.
    ///
    /// Advisory only: [`register`](Self::register) re-checks atomically.
    pub fn check_capacity(&self) -> Result<(), LaneError> {
        let active = self.inner.lock().active_count();
        if active >= self.capacity {
            return Err(LaneError::LaneCapacityExceeded { active, limit: self.capacity });
        }
        Ok(())
    }

    /// Store a new record. Returns a copy of what was stored.
    pub fn register(&self, mut record: LaneRecord) -> Result<LaneRecord, LaneError> {
        let mut inner = self.inner.lock();
        if inner.lanes.contains_key(&record.lane_id) {
            return Err(LaneError::DuplicateLane(record.lane_id));
        }
        let active = inner.active_count();
        if active >= self.capacity {
            return Err(LaneError::LaneCapacityExceeded { active, limit: self.capacity });
        }

        record.updated_at_ms = self.clock.epoch_ms();
        inner
            .by_workspace
            .entry(record.workspace_id.clone())
            .or_default()
            .insert(record.lane_id.clone());
        inner.lanes.insert(record.lane_id.clone(), record.clone());
        Ok(record)
    }

    pub fn get(&self, lane_id: &str) -> Option<LaneRecord> {
        self.inner.lock().lanes.get(lane_id).cloned()
    }

    pub fn contains(&self, lane_id: &str) -> bool {
        self.inner.lock().lanes.contains_key(lane_id)
    }

    /// Lanes belonging to `workspace_id`, in registration order.
    pub fn get_by_workspace(&self, workspace_id: &str) -> Vec<LaneRecord> {
        let inner = self.inner.lock();
        let Some(ids) = inner.by_workspace.get(workspace_id) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| inner.lanes.get(id).cloned()).collect()
    }

    /// Merge `update` into the stored record and refresh its `updated_at_ms`.
    pub fn update(&self, lane_id: &str, update: LaneUpdate) -> Result<LaneRecord, LaneError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let Some(record) = inner.lanes.get_mut(lane_id) else {
            return Err(LaneError::LaneNotFound(LaneId::from(lane_id)));
        };

        let old_workspace = record.workspace_id.clone();
        let workspace_changed = update.apply_to(record);
        record.updated_at_ms = now;
        let updated = record.clone();

        if workspace_changed {
            inner.unindex(&old_workspace, &updated.lane_id);
            inner
                .by_workspace
                .entry(updated.workspace_id.clone())
                .or_default()
                .insert(updated.lane_id.clone());
        }
        Ok(updated)
    }

    /// Remove a record. No-op when absent.
    pub fn remove(&self, lane_id: &str) -> Option<LaneRecord> {
        let mut inner = self.inner.lock();
        let record = inner.lanes.shift_remove(lane_id)?;
        inner.unindex(&record.workspace_id, &record.lane_id);
        Some(record)
    }

    /// All records, in registration order.
    pub fn list(&self) -> Vec<LaneRecord> {
        self.inner.lock().lanes.values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().lanes.len()
    }

    /// Records not yet closed.
    pub fn get_active(&self) -> Vec<LaneRecord> {
        self.inner.lock().lanes.values().filter(|r| r.state.is_active()).cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
