//! Server Update Service
//!
//! Main service implementing `ServerUpdateApi`.
//!
//! Every write follows the same pipeline:
//! 1. Validate the request
//! 2. Take a snapshot and plan a change set against it
//! 3. Check the plan against the domain invariants
//! 4. Commit atomically; on a revision conflict replan from a fresh snapshot

use crate::algorithms::{
    ancestor_groups, compute_update_status, plan_propagation, PropagationPlan,
};
use crate::config::UpdateStatusConfig;
use crate::domain::entities::{
    CacheGroupQueueResult, QueueUpdateResult, Server, ServerChange, ServerUpdateStatus,
    TopologyQueueResult, UpdateTimesReport,
};
use crate::domain::errors::{StoreError, UpdateError};
use crate::domain::invariants::{
    invariant_acting_server_untouched, invariant_no_upward_targets, invariant_reason_present,
    invariant_same_cdn,
};
use crate::domain::inventory::{ChangeSet, Inventory};
use crate::domain::value_objects::{CacheGroupId, CdnId, QueueAction, ServerId, StatusRef};
use crate::ports::inbound::ServerUpdateApi;
use crate::ports::outbound::{InventoryStore, SystemTimeSource, TimeSource};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tc_telemetry::{
    HistogramTimer, APPLY_REPORTS, COMMIT_RETRIES, PROPAGATION_FANOUT, QUEUE_ACTIONS,
    STATUS_CHANGES, UPDATE_ERRORS,
};
use tracing::{debug, info, warn};

/// Server Update Service
///
/// Orchestrates status transitions, queueing and update-status reads over
/// an [`InventoryStore`].
pub struct ServerUpdateService<S: InventoryStore, T: TimeSource = SystemTimeSource> {
    store: Arc<S>,
    clock: T,
    config: UpdateStatusConfig,
}

impl<S: InventoryStore> ServerUpdateService<S, SystemTimeSource> {
    /// Create a service with default config and the system clock.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: SystemTimeSource,
            config: UpdateStatusConfig::default(),
        }
    }
}

impl<S: InventoryStore, T: TimeSource> ServerUpdateService<S, T> {
    /// Create a service with a custom clock and config.
    pub fn with_config(
        store: Arc<S>,
        clock: T,
        config: UpdateStatusConfig,
    ) -> Result<Self, UpdateError> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &UpdateStatusConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Plan against a snapshot and commit, replanning on conflicts.
    ///
    /// Returns the snapshot that includes the commit (or the planning
    /// snapshot if there was nothing to write) and the planner's output.
    async fn commit_planned<R, F>(
        &self,
        operation: &'static str,
        mut plan: F,
    ) -> Result<(Arc<Inventory>, R), UpdateError>
    where
        F: FnMut(&Inventory) -> Result<(ChangeSet, R), UpdateError> + Send,
        R: Send,
    {
        let _timer = HistogramTimer::commit(operation);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let snapshot = self.store.snapshot().await?;
            let (changes, outcome) = plan(&snapshot)?;
            if changes.is_empty() {
                return Ok((snapshot, outcome));
            }

            match self.store.commit(changes).await {
                Ok(published) => return Ok((published, outcome)),
                Err(err @ StoreError::RevisionConflict { .. })
                | Err(err @ StoreError::MissingServer(_)) => {
                    if attempts > self.config.max_commit_retries {
                        return Err(match err {
                            StoreError::RevisionConflict { server_id, .. } => {
                                UpdateError::Conflict {
                                    server_id,
                                    attempts,
                                }
                            }
                            other => UpdateError::Propagation(other.to_string()),
                        });
                    }
                    COMMIT_RETRIES.inc();
                    warn!(
                        operation,
                        attempt = attempts,
                        error = %err,
                        "[tc-updates] Commit raced a concurrent writer, replanning"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    async fn change_status(
        &self,
        server_id: ServerId,
        status: StatusRef,
        offline_reason: Option<String>,
    ) -> Result<Server, UpdateError> {
        // 1. Validate input
        let status = status.resolve()?;
        let reason = invariant_reason_present(status, offline_reason.as_deref())?;
        let now = self.clock.now();
        let max_groups = self.config.max_topology_nodes;

        // 2-4. Plan, check, commit
        let (published, plan) = self
            .commit_planned("set_status", |inventory| {
                let server = inventory
                    .server(server_id)
                    .ok_or(UpdateError::ServerNotFound(server_id))?;
                let plan = plan_propagation(inventory, server, status, max_groups)?;

                let mut changes = ChangeSet::new();
                changes.push(
                    server,
                    ServerChange::SetStatus {
                        status,
                        offline_reason: reason.clone(),
                        at: now,
                    },
                );
                for target in plan.queued_servers.iter().filter_map(|id| inventory.server(*id)) {
                    changes.push(target, ServerChange::QueueUpdate { at: now });
                }

                check_plan(inventory, server, &plan, &changes, max_groups)?;
                Ok((changes, plan))
            })
            .await?;

        let server = published
            .server(server_id)
            .cloned()
            .ok_or(UpdateError::ServerNotFound(server_id))?;

        STATUS_CHANGES.with_label_values(&[status.name()]).inc();
        PROPAGATION_FANOUT.observe(plan.queued_servers.len() as f64);
        info!(
            server_id,
            host_name = %server.host_name,
            status = %status,
            descendant_groups = plan.descendant_groups.len(),
            queued = plan.queued_servers.len(),
            "[tc-updates] Server status changed"
        );

        Ok(server)
    }

    async fn queue_server(
        &self,
        server_id: ServerId,
        action: QueueAction,
    ) -> Result<QueueUpdateResult, UpdateError> {
        let now = self.clock.now();
        self.commit_planned("queue_update", |inventory| {
            let server = inventory
                .server(server_id)
                .ok_or(UpdateError::ServerNotFound(server_id))?;
            let mut changes = ChangeSet::new();
            changes.push(server, ServerChange::config_queue(action, now));
            Ok((changes, ()))
        })
        .await?;

        QUEUE_ACTIONS
            .with_label_values(&["server", action.as_str()])
            .inc();
        info!(server_id, action = %action, "[tc-updates] Server updates queued");

        Ok(QueueUpdateResult { server_id, action })
    }

    /// Queue or dequeue every `cdn_id` server in `groups`; returns hostnames.
    fn plan_bulk_queue(
        inventory: &Inventory,
        groups: &BTreeSet<CacheGroupId>,
        cdn_id: CdnId,
        change: &ServerChange,
    ) -> (ChangeSet, Vec<String>) {
        let mut changes = ChangeSet::new();
        let mut names = Vec::new();
        for server in inventory
            .servers()
            .filter(|s| s.cdn_id == cdn_id && groups.contains(&s.cache_group))
        {
            changes.push(server, change.clone());
            names.push(server.host_name.clone());
        }
        (changes, names)
    }

    async fn queue_cache_group(
        &self,
        cache_group_id: CacheGroupId,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<CacheGroupQueueResult, UpdateError> {
        let change = ServerChange::config_queue(action, self.clock.now());
        let (_, (cache_group_name, server_names)) = self
            .commit_planned("queue_cache_group", |inventory| {
                let group = inventory
                    .cache_group(cache_group_id)
                    .ok_or(UpdateError::CacheGroupNotFound(cache_group_id))?;
                let groups = BTreeSet::from([cache_group_id]);
                let (changes, names) = Self::plan_bulk_queue(inventory, &groups, cdn_id, &change);
                Ok((changes, (group.name.clone(), names)))
            })
            .await?;

        QUEUE_ACTIONS
            .with_label_values(&["cachegroup", action.as_str()])
            .inc();
        info!(
            cache_group_id,
            cdn_id,
            action = %action,
            servers = server_names.len(),
            "[tc-updates] Cache group updates queued"
        );

        Ok(CacheGroupQueueResult {
            cache_group_id,
            cache_group_name,
            cdn_id,
            action,
            server_names,
        })
    }

    async fn queue_topology(
        &self,
        topology: &str,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<TopologyQueueResult, UpdateError> {
        let change = ServerChange::config_queue(action, self.clock.now());
        let (_, server_names) = self
            .commit_planned("queue_topology", |inventory| {
                let found = inventory
                    .topology(topology)
                    .ok_or_else(|| UpdateError::TopologyNotFound(topology.to_string()))?;
                let groups: BTreeSet<_> = found.cache_groups().collect();
                Ok(Self::plan_bulk_queue(inventory, &groups, cdn_id, &change))
            })
            .await?;

        QUEUE_ACTIONS
            .with_label_values(&["topology", action.as_str()])
            .inc();
        info!(
            topology,
            cdn_id,
            action = %action,
            servers = server_names.len(),
            "[tc-updates] Topology updates queued"
        );

        Ok(TopologyQueueResult {
            topology: topology.to_string(),
            cdn_id,
            action,
            server_names,
        })
    }

    async fn change_reval(&self, server_id: ServerId, pending: bool) -> Result<Server, UpdateError> {
        let action = QueueAction::from_flag(pending);
        let now = self.clock.now();
        let (published, ()) = self
            .commit_planned("reval", |inventory| {
                let server = inventory
                    .server(server_id)
                    .ok_or(UpdateError::ServerNotFound(server_id))?;
                let mut changes = ChangeSet::new();
                changes.push(server, ServerChange::reval_queue(action, now));
                Ok((changes, ()))
            })
            .await?;

        QUEUE_ACTIONS
            .with_label_values(&["reval", action.as_str()])
            .inc();
        debug!(server_id, action = %action, "[tc-updates] Revalidation flag set");

        published
            .server(server_id)
            .cloned()
            .ok_or(UpdateError::ServerNotFound(server_id))
    }

    async fn record_update_times(
        &self,
        host_name: &str,
        report: UpdateTimesReport,
    ) -> Result<Vec<Server>, UpdateError> {
        if report.is_empty() {
            return Err(UpdateError::Validation(
                "one of configApplyTime, revalApplyTime, configUpdateFailed or revalUpdateFailed must be provided"
                    .to_string(),
            ));
        }

        let report_changes = report.changes();
        let (published, ids) = self
            .commit_planned("update_times", |inventory| {
                let mut changes = ChangeSet::new();
                let mut ids = Vec::new();
                for server in inventory.servers_by_host_name(host_name) {
                    for change in &report_changes {
                        changes.push(server, change.clone());
                    }
                    ids.push(server.id);
                }
                if ids.is_empty() {
                    return Err(UpdateError::HostNameNotFound(host_name.to_string()));
                }
                Ok((changes, ids))
            })
            .await?;

        if report.config_apply_time.is_some() {
            APPLY_REPORTS.with_label_values(&["config"]).inc();
        }
        if report.reval_apply_time.is_some() {
            APPLY_REPORTS.with_label_values(&["reval"]).inc();
        }
        if report.config_update_failed == Some(true) || report.reval_update_failed == Some(true) {
            APPLY_REPORTS.with_label_values(&["failure"]).inc();
        }
        debug!(
            host_name,
            servers = ids.len(),
            "[tc-updates] Update times recorded"
        );

        Ok(ids
            .iter()
            .filter_map(|id| published.server(*id).cloned())
            .collect())
    }

    async fn read_update_status(
        &self,
        host_name: &str,
    ) -> Result<Vec<ServerUpdateStatus>, UpdateError> {
        let snapshot = self.store.snapshot().await?;
        let statuses = snapshot
            .servers_by_host_name(host_name)
            .map(|server| {
                compute_update_status(
                    &snapshot,
                    server,
                    self.config.use_reval_pending,
                    self.config.max_topology_nodes,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if statuses.is_empty() {
            return Err(UpdateError::HostNameNotFound(host_name.to_string()));
        }
        Ok(statuses)
    }
}

/// Reject a status-change plan that breaks a domain invariant.
fn check_plan(
    inventory: &Inventory,
    acting: &Server,
    plan: &PropagationPlan,
    changes: &ChangeSet,
    max_groups: usize,
) -> Result<(), UpdateError> {
    if !invariant_acting_server_untouched(acting.id, changes) {
        return Err(UpdateError::Propagation(format!(
            "plan for server #{} writes its own flags",
            acting.id
        )));
    }

    let targets: Vec<&Server> = plan
        .queued_servers
        .iter()
        .filter_map(|id| inventory.server(*id))
        .collect();
    if !invariant_same_cdn(acting.cdn_id, &targets) {
        return Err(UpdateError::Propagation(format!(
            "plan for server #{} crosses CDN #{}",
            acting.id, acting.cdn_id
        )));
    }

    // A group above the origin in one hierarchy may sit below it in another
    let queued: BTreeSet<ServerId> = plan.queued_servers.iter().copied().collect();
    let mut upward = ancestor_groups(inventory, acting.cache_group, max_groups)?;
    upward.insert(acting.cache_group);
    let excluded: BTreeSet<CacheGroupId> =
        upward.difference(&plan.descendant_groups).copied().collect();
    if !invariant_no_upward_targets(inventory, &queued, &excluded) {
        return Err(UpdateError::Propagation(format!(
            "plan for server #{} targets its own cache group or an ancestor",
            acting.id
        )));
    }

    Ok(())
}

/// Count and log a failed operation, then hand the result back.
fn record_outcome<R>(operation: &'static str, result: Result<R, UpdateError>) -> Result<R, UpdateError> {
    if let Err(err) = &result {
        UPDATE_ERRORS.with_label_values(&[err.kind()]).inc();
        warn!(operation, kind = err.kind(), error = %err, "[tc-updates] Operation failed");
    }
    result
}

#[async_trait]
impl<S: InventoryStore, T: TimeSource> ServerUpdateApi for ServerUpdateService<S, T> {
    async fn set_server_status(
        &self,
        server_id: ServerId,
        status: StatusRef,
        offline_reason: Option<String>,
    ) -> Result<Server, UpdateError> {
        let result = self.change_status(server_id, status, offline_reason).await;
        record_outcome("set_server_status", result)
    }

    async fn set_queue_update(
        &self,
        server_id: ServerId,
        queue: bool,
    ) -> Result<QueueUpdateResult, UpdateError> {
        let result = self
            .queue_server(server_id, QueueAction::from_flag(queue))
            .await;
        record_outcome("set_queue_update", result)
    }

    async fn get_server_update_status(
        &self,
        host_name: &str,
    ) -> Result<Vec<ServerUpdateStatus>, UpdateError> {
        let result = self.read_update_status(host_name).await;
        record_outcome("get_server_update_status", result)
    }

    async fn queue_cache_group_updates(
        &self,
        cache_group_id: CacheGroupId,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<CacheGroupQueueResult, UpdateError> {
        let result = self.queue_cache_group(cache_group_id, cdn_id, action).await;
        record_outcome("queue_cache_group_updates", result)
    }

    async fn queue_topology_updates(
        &self,
        topology: &str,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<TopologyQueueResult, UpdateError> {
        let result = self.queue_topology(topology, cdn_id, action).await;
        record_outcome("queue_topology_updates", result)
    }

    async fn set_reval_pending(
        &self,
        server_id: ServerId,
        pending: bool,
    ) -> Result<Server, UpdateError> {
        let result = self.change_reval(server_id, pending).await;
        record_outcome("set_reval_pending", result)
    }

    async fn set_update_times(
        &self,
        host_name: &str,
        report: UpdateTimesReport,
    ) -> Result<Vec<Server>, UpdateError> {
        let result = self.record_update_times(host_name, report).await;
        record_outcome("set_update_times", result)
    }
}
