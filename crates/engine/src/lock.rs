// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-lane mutual exclusion.
//!
//! Each lane id maps to a fair async mutex created on first use, so waiters
//! on the same lane are served in arrival order while distinct lanes never
//! block each other. Entries are pruned once the last holder or waiter lets
//! go, keeping the table bounded by the number of lanes in flight.

use crate::LaneError;
use helios_core::LaneId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Default time a lane operation waits for its lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type LockTable = Arc<Mutex<HashMap<LaneId, Arc<tokio::sync::Mutex<()>>>>>;

#[derive(Clone)]
pub struct LaneLocks {
    table: LockTable,
    timeout: Duration,
}

impl Default for LaneLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl LaneLocks {
    pub fn new(timeout: Duration) -> Self {
        Self { table: Arc::default(), timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for exclusive access to `lane_id`.
    ///
    /// Fails with [`LaneError::LaneLockTimeout`] if the lock is not granted
    /// within the configured timeout. The lock is released when the
    /// returned guard drops, including on error paths and panics.
    pub async fn acquire(&self, lane_id: &LaneId) -> Result<LaneGuard, LaneError> {
        let mutex = Arc::clone(self.table.lock().entry(lane_id.clone()).or_default());

        let acquired = tokio::time::timeout(self.timeout, mutex.lock_owned()).await;
        match acquired {
            Ok(guard) => Ok(LaneGuard {
                guard: Some(guard),
                lane_id: lane_id.clone(),
                table: Arc::clone(&self.table),
            }),
            Err(_) => {
                prune(&self.table, lane_id);
                tracing::warn!(
                    lane_id = %lane_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "timed out waiting for lane lock"
                );
                Err(LaneError::LaneLockTimeout { lane_id: lane_id.clone(), timeout: self.timeout })
            }
        }
    }

    /// Run `f` while holding the lock for `lane_id`.
    pub async fn with_lock<T, F, Fut>(&self, lane_id: &LaneId, f: F) -> Result<T, LaneError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LaneError>>,
    {
        let _guard = self.acquire(lane_id).await?;
        f().await
    }

    /// Number of lanes with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.table.lock().len()
    }
}

/// Held lock on one lane.
pub struct LaneGuard {
    guard: Option<OwnedMutexGuard<()>>,
    lane_id: LaneId,
    table: LockTable,
}

impl LaneGuard {
    pub fn lane_id(&self) -> &LaneId {
        &self.lane_id
    }
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        // Release before pruning so the strong count reflects only waiters.
        drop(self.guard.take());
        prune(&self.table, &self.lane_id);
    }
}

fn prune(table: &LockTable, lane_id: &LaneId) {
    let mut table = table.lock();
    if table.get(lane_id).is_some_and(|m| Arc::strong_count(m) == 1) {
        table.remove(lane_id);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
