//! Core domain entities for server update status.

use super::value_objects::{CacheGroupId, CdnId, QueueAction, ServerId, ServerStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cache server.
///
/// `update_pending` and `reval_pending` are not stored; they are derived from
/// the update/apply timestamp pairs, so a cache reporting an apply time at or
/// after the last queue time clears the flag without a separate write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Unique id
    pub id: ServerId,
    /// Hostname; not unique across CDNs
    pub host_name: String,
    /// Owning cache group
    pub cache_group: CacheGroupId,
    /// Owning CDN
    pub cdn_id: CdnId,
    /// Operational status
    pub status: ServerStatus,
    /// Why the server was taken out of service
    pub offline_reason: Option<String>,
    /// When the status last changed
    pub status_last_updated: DateTime<Utc>,
    /// Last time configuration updates were queued
    pub config_update_time: DateTime<Utc>,
    /// Last time the cache reported applying configuration
    pub config_apply_time: DateTime<Utc>,
    /// Last time content revalidation was queued
    pub reval_update_time: DateTime<Utc>,
    /// Last time the cache reported applying revalidation
    pub reval_apply_time: DateTime<Utc>,
    /// The last configuration run on the cache failed
    pub config_update_failed: bool,
    /// The last revalidation run on the cache failed
    pub reval_update_failed: bool,
    /// Bumped on every committed change to this record
    pub revision: u64,
}

impl Server {
    /// A freshly provisioned server with nothing pending.
    pub fn new(
        id: ServerId,
        host_name: impl Into<String>,
        cache_group: CacheGroupId,
        cdn_id: CdnId,
        status: ServerStatus,
    ) -> Self {
        let epoch = DateTime::<Utc>::default();
        Self {
            id,
            host_name: host_name.into(),
            cache_group,
            cdn_id,
            status,
            offline_reason: None,
            status_last_updated: epoch,
            config_update_time: epoch,
            config_apply_time: epoch,
            reval_update_time: epoch,
            reval_apply_time: epoch,
            config_update_failed: false,
            reval_update_failed: false,
            revision: 0,
        }
    }

    /// Configuration updates are queued and not yet applied.
    pub fn update_pending(&self) -> bool {
        self.config_update_time > self.config_apply_time
    }

    /// Content revalidation is queued and not yet applied.
    pub fn reval_pending(&self) -> bool {
        self.reval_update_time > self.reval_apply_time
    }

    /// Apply one change in place. Revision bookkeeping is the store's job.
    pub fn apply(&mut self, change: &ServerChange) {
        match change {
            ServerChange::SetStatus {
                status,
                offline_reason,
                at,
            } => {
                self.status = *status;
                self.offline_reason = offline_reason.clone();
                self.status_last_updated = *at;
            }
            ServerChange::QueueUpdate { at } => {
                self.config_update_time = queued_time(*at, self.config_apply_time);
            }
            ServerChange::DequeueUpdate => {
                self.config_update_time = self.config_apply_time;
            }
            ServerChange::QueueReval { at } => {
                self.reval_update_time = queued_time(*at, self.reval_apply_time);
            }
            ServerChange::DequeueReval => {
                self.reval_update_time = self.reval_apply_time;
            }
            ServerChange::ApplyConfig { at } => {
                self.config_apply_time = *at;
            }
            ServerChange::ApplyReval { at } => {
                self.reval_apply_time = *at;
            }
            ServerChange::SetConfigFailed(failed) => {
                self.config_update_failed = *failed;
            }
            ServerChange::SetRevalFailed(failed) => {
                self.reval_update_failed = *failed;
            }
        }
    }
}

/// Queue time strictly after the apply time, even with a lagging clock.
fn queued_time(now: DateTime<Utc>, applied: DateTime<Utc>) -> DateTime<Utc> {
    if now > applied {
        now
    } else {
        applied + Duration::microseconds(1)
    }
}

/// A single field-level change to a server record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerChange {
    /// Persist a new status and reason.
    SetStatus {
        /// New status
        status: ServerStatus,
        /// Reason, `None` for statuses that do not carry one
        offline_reason: Option<String>,
        /// Transition time
        at: DateTime<Utc>,
    },
    /// Mark configuration updates pending.
    QueueUpdate {
        /// Queue time
        at: DateTime<Utc>,
    },
    /// Clear pending configuration updates.
    DequeueUpdate,
    /// Mark revalidation pending.
    QueueReval {
        /// Queue time
        at: DateTime<Utc>,
    },
    /// Clear pending revalidation.
    DequeueReval,
    /// Cache applied configuration at this time.
    ApplyConfig {
        /// Apply time
        at: DateTime<Utc>,
    },
    /// Cache applied revalidation at this time.
    ApplyReval {
        /// Apply time
        at: DateTime<Utc>,
    },
    /// Record the outcome of the last configuration run.
    SetConfigFailed(bool),
    /// Record the outcome of the last revalidation run.
    SetRevalFailed(bool),
}

impl ServerChange {
    /// Queue or dequeue configuration updates.
    pub fn config_queue(action: QueueAction, at: DateTime<Utc>) -> Self {
        match action {
            QueueAction::Queue => ServerChange::QueueUpdate { at },
            QueueAction::Dequeue => ServerChange::DequeueUpdate,
        }
    }

    /// Queue or dequeue revalidation.
    pub fn reval_queue(action: QueueAction, at: DateTime<Utc>) -> Self {
        match action {
            QueueAction::Queue => ServerChange::QueueReval { at },
            QueueAction::Dequeue => ServerChange::DequeueReval,
        }
    }
}

/// A group of co-located caches sharing a place in the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheGroup {
    /// Unique id
    pub id: CacheGroupId,
    /// Unique name
    pub name: String,
    /// Legacy primary parent
    pub parent: Option<CacheGroupId>,
    /// Legacy secondary parent
    pub secondary_parent: Option<CacheGroupId>,
}

impl CacheGroup {
    /// A cache group with no legacy parents.
    pub fn new(id: CacheGroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            secondary_parent: None,
        }
    }

    /// Set the legacy primary parent.
    pub fn with_parent(mut self, parent: CacheGroupId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the legacy secondary parent.
    pub fn with_secondary_parent(mut self, parent: CacheGroupId) -> Self {
        self.secondary_parent = Some(parent);
        self
    }

    /// Legacy parents, primary first.
    pub fn legacy_parents(&self) -> impl Iterator<Item = CacheGroupId> + '_ {
        self.parent.into_iter().chain(self.secondary_parent)
    }
}

/// One placement of a cache group inside a topology.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    /// Cache group placed at this node
    pub cache_group: CacheGroupId,
    /// Indices of parent nodes within the same topology
    pub parents: Vec<usize>,
}

/// A named DAG of cache groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    /// Unique name
    pub name: String,
    /// Nodes; parent links are indices into this list
    pub nodes: Vec<TopologyNode>,
}

impl Topology {
    /// An empty topology.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node and return the topology.
    pub fn with_node(mut self, cache_group: CacheGroupId, parents: &[usize]) -> Self {
        self.nodes.push(TopologyNode {
            cache_group,
            parents: parents.to_vec(),
        });
        self
    }

    /// Whether a cache group is placed in this topology.
    pub fn contains(&self, cache_group: CacheGroupId) -> bool {
        self.nodes.iter().any(|n| n.cache_group == cache_group)
    }

    /// Every cache group placed in this topology, in node order.
    pub fn cache_groups(&self) -> impl Iterator<Item = CacheGroupId> + '_ {
        self.nodes.iter().map(|n| n.cache_group)
    }
}

/// Update status of one server as reported to caches and operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdateStatus {
    /// Hostname
    pub host_name: String,
    /// Server id
    pub host_id: ServerId,
    /// Current status
    pub status: ServerStatus,
    /// Configuration updates pending on this server
    pub update_pending: bool,
    /// An ancestor in the same CDN has configuration updates pending
    pub parent_pending: bool,
    /// Revalidation pending on this server
    pub reval_pending: bool,
    /// An ancestor in the same CDN has revalidation pending
    pub parent_reval_pending: bool,
    /// Whether caches should honour the revalidation flags
    pub use_reval_pending: bool,
    /// Last configuration queue time
    pub config_update_time: DateTime<Utc>,
    /// Last configuration apply time
    pub config_apply_time: DateTime<Utc>,
    /// Last revalidation queue time
    pub reval_update_time: DateTime<Utc>,
    /// Last revalidation apply time
    pub reval_apply_time: DateTime<Utc>,
    /// Last configuration run failed
    pub config_update_failed: bool,
    /// Last revalidation run failed
    pub reval_update_failed: bool,
}

/// Outcome of a per-server queue/dequeue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueUpdateResult {
    /// Server acted on
    pub server_id: ServerId,
    /// Action performed
    pub action: QueueAction,
}

/// Outcome of queueing every server of a cache group in one CDN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheGroupQueueResult {
    /// Cache group acted on
    pub cache_group_id: CacheGroupId,
    /// Cache group name
    pub cache_group_name: String,
    /// CDN the action was restricted to
    pub cdn_id: CdnId,
    /// Action performed
    pub action: QueueAction,
    /// Hostnames of affected servers
    pub server_names: Vec<String>,
}

/// Outcome of queueing every server of a topology in one CDN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyQueueResult {
    /// Topology acted on
    pub topology: String,
    /// CDN the action was restricted to
    pub cdn_id: CdnId,
    /// Action performed
    pub action: QueueAction,
    /// Hostnames of affected servers
    pub server_names: Vec<String>,
}

/// A cache's report of what it applied and whether it worked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimesReport {
    /// Configuration applied at
    pub config_apply_time: Option<DateTime<Utc>>,
    /// Revalidation applied at
    pub reval_apply_time: Option<DateTime<Utc>>,
    /// Configuration run failed
    pub config_update_failed: Option<bool>,
    /// Revalidation run failed
    pub reval_update_failed: Option<bool>,
}

impl UpdateTimesReport {
    /// Nothing to record.
    pub fn is_empty(&self) -> bool {
        self.config_apply_time.is_none()
            && self.reval_apply_time.is_none()
            && self.config_update_failed.is_none()
            && self.reval_update_failed.is_none()
    }

    /// The changes this report implies, in a fixed order.
    pub fn changes(&self) -> Vec<ServerChange> {
        let mut changes = Vec::with_capacity(4);
        if let Some(at) = self.config_apply_time {
            changes.push(ServerChange::ApplyConfig { at });
        }
        if let Some(at) = self.reval_apply_time {
            changes.push(ServerChange::ApplyReval { at });
        }
        if let Some(failed) = self.config_update_failed {
            changes.push(ServerChange::SetConfigFailed(failed));
        }
        if let Some(failed) = self.reval_update_failed {
            changes.push(ServerChange::SetRevalFailed(failed));
        }
        changes
    }
}
