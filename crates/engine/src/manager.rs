// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane manager: the single entry point for lane lifecycle operations.
//!
//! Every mutating operation runs under the lane's lock, validates against
//! the state machine before any external work, and publishes its bus events
//! fire-and-forget once the registry reflects the change.

use crate::config::LaneConfig;
use crate::lifecycle::{LaneStore, StateChange};
use crate::publish::Publisher;
use crate::reconcile::Reconciler;
use crate::sharing::{self, DetachOutcome, ForceDetachOutcome, ShareOutcome, SharingProtocol};
use crate::{LaneError, LaneLocks, LaneRegistry};
use helios_adapters::{
    repo_root_for, EventBus, LocalWorktreeAdapter, ProvisionRequest, WorktreeAdapter, WorktreeError,
};
use helios_core::{
    transition, Clock, Event, LaneEvent, LaneId, LaneRecord, LaneState, LaneUpdate,
    ReconciliationResult, SystemClock, TransitionHistory, TransitionRecord, WorkspaceId,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// External collaborators of the manager.
#[derive(Clone)]
pub struct LaneDeps {
    pub worktrees: Arc<dyn WorktreeAdapter>,
    pub bus: Arc<dyn EventBus>,
}

impl LaneDeps {
    /// Git-backed worktrees with the configured git timeout.
    pub fn local(config: &LaneConfig, bus: Arc<dyn EventBus>) -> Self {
        Self { worktrees: Arc::new(LocalWorktreeAdapter::new(config.git_timeout)), bus }
    }
}

pub struct LaneManager<C: Clock = SystemClock> {
    store: LaneStore<C>,
    locks: LaneLocks,
    sharing: SharingProtocol<C>,
    worktrees: Arc<dyn WorktreeAdapter>,
    publisher: Publisher,
    reconcile_timeout: Duration,
}

impl LaneManager<SystemClock> {
    /// Manager over local git worktrees.
    pub fn local(config: &LaneConfig, bus: Arc<dyn EventBus>) -> Self {
        Self::new(LaneDeps::local(config, bus), config, SystemClock)
    }
}

impl<C: Clock> LaneManager<C> {
    /// Safe to call outside a tokio runtime; events published before one is
    /// available are forwarded once an operation runs inside it.
    pub fn new(deps: LaneDeps, config: &LaneConfig, clock: C) -> Self {
        let registry = Arc::new(LaneRegistry::new(config.capacity, clock));
        let store = LaneStore::new(registry, Arc::new(TransitionHistory::new()));
        let locks = LaneLocks::new(config.lock_timeout);
        Self {
            sharing: SharingProtocol::new(store.clone(), locks.clone()),
            store,
            locks,
            worktrees: deps.worktrees,
            publisher: Publisher::new(deps.bus),
            reconcile_timeout: config.reconcile_timeout,
        }
    }

    pub fn registry(&self) -> &LaneRegistry<C> {
        self.store.registry()
    }

    /// Register a new lane in `provisioning`. No disk or git work happens.
    pub fn create(
        &self,
        workspace_id: impl Into<WorkspaceId>,
        base_branch: impl Into<String>,
    ) -> Result<LaneRecord, LaneError> {
        let registry = self.store.registry();
        registry.check_capacity()?;

        let lane_id = LaneId::new();
        let now = registry.clock().epoch_ms();
        let mut record = LaneRecord::new(lane_id.clone(), workspace_id.into(), base_branch, now);
        let from_state = record.state;
        record.state = transition(from_state, LaneEvent::Create, &lane_id)?;

        let record = registry.register(record)?;
        self.store.record(&lane_id, from_state, LaneEvent::Create, record.state, now);
        tracing::info!(
            lane_id = %lane_id,
            workspace_id = %record.workspace_id,
            base_branch = %record.base_branch,
            "lane created"
        );
        self.publisher.publish(Event::LaneCreated {
            lane_id,
            workspace_id: record.workspace_id.clone(),
            from_state,
            to_state: record.state,
        });
        Ok(record)
    }

    /// Create the lane's worktree and move it to `ready`.
    ///
    /// On adapter failure the lane is closed via `provision_failed` and the
    /// adapter error is returned.
    pub async fn provision(
        &self,
        lane_id: &LaneId,
        repo_root: &Path,
    ) -> Result<LaneRecord, LaneError> {
        let _guard = self.locks.acquire(lane_id).await?;
        let record = self.store.require(lane_id)?;
        transition(record.state, LaneEvent::ProvisionComplete, lane_id)?;

        let start = Instant::now();
        let request = ProvisionRequest {
            repo_root: repo_root.to_path_buf(),
            lane_id: lane_id.clone(),
            base_branch: record.base_branch.clone(),
        };
        match self.worktrees.provision(request).await {
            Ok(worktree) => {
                self.store.registry().update(
                    lane_id,
                    LaneUpdate::default()
                        .worktree_path(worktree.worktree_path)
                        .branch_name(worktree.branch_name),
                )?;
                let (change, record) = self.store.apply(lane_id, LaneEvent::ProvisionComplete)?;
                tracing::info!(
                    lane_id = %lane_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "lane provisioned"
                );
                self.publish_change(&change);
                Ok(record)
            }
            Err(e) => {
                tracing::error!(lane_id = %lane_id, error = %e, "lane provisioning failed");
                match self.store.apply(lane_id, LaneEvent::ProvisionFailed) {
                    Ok((change, record)) => {
                        self.publish_change(&change);
                        self.publish_closed(&record);
                    }
                    Err(te) => tracing::warn!(lane_id = %lane_id, error = %te, "could not close failed lane"),
                }
                Err(e.into())
            }
        }
    }

    /// Tear the lane down and close it. Closing a closed lane is a no-op.
    ///
    /// A shared lane with attached agents is refused unless `force`, which
    /// detaches them first. If worktree removal fails the lane stays in
    /// `cleaning` and a later call retries.
    pub async fn cleanup(&self, lane_id: &LaneId, force: bool) -> Result<LaneRecord, LaneError> {
        let _guard = self.locks.acquire(lane_id).await?;
        let record = self.store.require(lane_id)?;

        if record.state == LaneState::Closed {
            tracing::debug!(lane_id = %lane_id, "cleanup of closed lane is a no-op");
            return Ok(record);
        }
        if !record.attached_agents.is_empty() {
            if !force {
                return Err(LaneError::SharedLaneCleanup {
                    lane_id: lane_id.clone(),
                    agent_count: record.attached_agents.len(),
                });
            }
            sharing::force_detach_all(&self.store, lane_id)?;
        }

        let record = self.store.require(lane_id)?;
        let start = Instant::now();
        if record.state == LaneState::Provisioning {
            let (change, closed) = self.store.apply(lane_id, LaneEvent::ProvisionFailed)?;
            self.publish_cleaning(&change);
            self.publish_closed(&closed);
            tracing::info!(lane_id = %lane_id, "closed lane that never finished provisioning");
            return Ok(closed);
        }

        let (change, cleaning) = self.store.apply(lane_id, LaneEvent::RequestCleanup)?;
        self.publish_cleaning(&change);

        if let Some(path) = cleaning.worktree_path.as_deref() {
            let repo_root = repo_root_for(path).ok_or_else(|| WorktreeError::Cleanup {
                worktree_path: path.to_path_buf(),
                reason: "cannot derive repository root from worktree path".to_string(),
            })?;
            if let Err(e) = self.worktrees.remove(path, &repo_root).await {
                tracing::error!(lane_id = %lane_id, error = %e, "lane teardown failed, lane left in cleaning");
                return Err(e.into());
            }
        }

        let (_, closed) = self.store.apply(lane_id, LaneEvent::CleanupComplete)?;
        tracing::info!(
            lane_id = %lane_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lane closed"
        );
        self.publish_closed(&closed);
        Ok(closed)
    }

    /// Move a `ready` lane to `shared`. Publishes `lane.shared` on change.
    pub async fn share(&self, lane_id: &LaneId) -> Result<ShareOutcome, LaneError> {
        let outcome = self.sharing.share_lane(lane_id).await?;
        if let Some(change) = &outcome.change {
            self.publisher.publish(Event::LaneShared {
                lane_id: change.lane_id.clone(),
                workspace_id: change.workspace_id.clone(),
                from_state: change.from_state,
                to_state: change.to_state,
            });
        }
        Ok(outcome)
    }

    pub async fn attach(&self, lane_id: &LaneId, agent_id: &str) -> Result<LaneRecord, LaneError> {
        self.sharing.attach_agent(lane_id, agent_id).await
    }

    pub async fn detach(&self, lane_id: &LaneId, agent_id: &str) -> Result<DetachOutcome, LaneError> {
        self.sharing.detach_agent(lane_id, agent_id).await
    }

    pub async fn force_detach_all(&self, lane_id: &LaneId) -> Result<ForceDetachOutcome, LaneError> {
        self.sharing.force_detach_all(lane_id).await
    }

    /// Apply a runtime event: `start_running`, `command_complete`, `block`
    /// or `unblock`.
    ///
    /// Any other event fails with [`LaneError::NotRuntimeEvent`]; those go
    /// through `provision`, `share`, `detach` or `cleanup` so their side
    /// effects run.
    pub async fn transition(
        &self,
        lane_id: &LaneId,
        event: LaneEvent,
    ) -> Result<LaneRecord, LaneError> {
        if !event.is_runtime() {
            return Err(LaneError::NotRuntimeEvent { lane_id: lane_id.clone(), event });
        }
        let _guard = self.locks.acquire(lane_id).await?;
        let (change, record) = self.store.apply(lane_id, event)?;
        self.publish_change(&change);
        Ok(record)
    }

    /// Bind (or with `None`, clear) the pid of a background task run in the lane.
    pub async fn bind_task(
        &self,
        lane_id: &LaneId,
        pid: Option<u32>,
    ) -> Result<LaneRecord, LaneError> {
        let _guard = self.locks.acquire(lane_id).await?;
        let record = self.store.require(lane_id)?;
        if record.state == LaneState::Closed {
            return Err(LaneError::LaneClosed(lane_id.clone()));
        }
        let record = self.store.registry().update(lane_id, LaneUpdate::default().par_task_pid(pid))?;
        tracing::debug!(lane_id = %lane_id, pid = ?pid, "lane task binding updated");
        Ok(record)
    }

    /// Heal drift between the registry and `repo_root`'s worktrees directory.
    ///
    /// Never fails; problems are logged and reflected in the counts.
    /// Publishes `lane.closed` for each lane it closes, then
    /// `reconciliation.completed` with the result.
    pub async fn reconcile_orphans(
        &self,
        repo_root: &Path,
        timeout: Option<Duration>,
    ) -> ReconciliationResult {
        let reconciler = Reconciler {
            store: &self.store,
            locks: &self.locks,
            worktrees: self.worktrees.as_ref(),
        };
        let report = reconciler.run(repo_root, timeout.unwrap_or(self.reconcile_timeout)).await;

        for record in &report.closed {
            self.publish_closed(record);
        }
        self.publisher.publish(Event::ReconciliationCompleted {
            repo_root: repo_root.to_path_buf(),
            result: report.result,
        });
        report.result
    }

    /// All lanes, or only those of `workspace_id`, in creation order.
    pub fn list(&self, workspace_id: Option<&str>) -> Vec<LaneRecord> {
        match workspace_id {
            Some(ws) => self.store.registry().get_by_workspace(ws),
            None => self.store.registry().list(),
        }
    }

    pub fn get(&self, lane_id: &str) -> Option<LaneRecord> {
        self.store.registry().get(lane_id)
    }

    /// Recent transitions for `lane_id`, oldest first.
    pub fn history(&self, lane_id: &str) -> Vec<TransitionRecord> {
        self.store.history().get(lane_id)
    }

    fn publish_change(&self, change: &StateChange) {
        self.publisher.publish(change.to_event());
    }

    fn publish_cleaning(&self, change: &StateChange) {
        self.publisher.publish(Event::LaneCleaning {
            lane_id: change.lane_id.clone(),
            workspace_id: change.workspace_id.clone(),
            from_state: change.from_state,
        });
    }

    fn publish_closed(&self, record: &LaneRecord) {
        self.publisher.publish(Event::LaneClosed {
            lane_id: record.lane_id.clone(),
            workspace_id: record.workspace_id.clone(),
            worktree_path: record.worktree_path.clone(),
        });
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
