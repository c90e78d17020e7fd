//! Error types for server update status.

use super::value_objects::{CacheGroupId, ServerId};
use thiserror::Error;

/// All errors that can occur while changing or reading update status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// No server with this id
    #[error("server #{0} not found")]
    ServerNotFound(ServerId),

    /// No server with this hostname
    #[error("no server found with hostname '{0}'")]
    HostNameNotFound(String),

    /// No cache group with this id
    #[error("cache group #{0} not found")]
    CacheGroupNotFound(CacheGroupId),

    /// No topology with this name
    #[error("topology '{0}' not found")]
    TopologyNotFound(String),

    /// Request failed validation
    #[error("{0}")]
    Validation(String),

    /// Status name or id is not a known status
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Queue action is neither `queue` nor `dequeue`
    #[error("action must be 'queue' or 'dequeue', got '{0}'")]
    InvalidAction(String),

    /// A cycle was found while walking cache-group parentage
    #[error("cycle detected in {graph} at cache group #{cache_group}")]
    TopologyCycle {
        /// Graph the walk was performed on
        graph: String,
        /// Cache group closing the cycle
        cache_group: CacheGroupId,
    },

    /// Concurrent writers kept invalidating the plan
    #[error("server #{server_id} was modified concurrently; gave up after {attempts} attempts")]
    Conflict {
        /// Server whose revision moved
        server_id: ServerId,
        /// Commit attempts made
        attempts: u32,
    },

    /// A change set could not be applied
    #[error("propagation failed: {0}")]
    Propagation(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl UpdateError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::ServerNotFound(_)
            | UpdateError::HostNameNotFound(_)
            | UpdateError::CacheGroupNotFound(_)
            | UpdateError::TopologyNotFound(_) => "not_found",
            UpdateError::Validation(_) => "validation",
            UpdateError::InvalidStatus(_) => "invalid_status",
            UpdateError::InvalidAction(_) => "invalid_action",
            UpdateError::TopologyCycle { .. } => "topology_cycle",
            UpdateError::Conflict { .. } => "conflict",
            UpdateError::Propagation(_) => "propagation",
            UpdateError::Config(_) => "config",
        }
    }
}

/// Failure while walking a cache-group graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Back edge found during traversal or Kahn's sort left nodes unprocessed
    #[error("cycle detected in {graph} at cache group #{cache_group}")]
    Cycle {
        /// Graph name
        graph: String,
        /// Cache group closing the cycle
        cache_group: CacheGroupId,
    },

    /// Traversal visited more groups than allowed
    #[error("walk over {graph} exceeded {max} cache groups")]
    TooLarge {
        /// Graph name
        graph: String,
        /// Configured bound
        max: usize,
    },

    /// A cache group is placed at more than one node of a topology
    #[error("topology '{topology}' places cache group #{cache_group} more than once")]
    DuplicateCacheGroup {
        /// Topology name
        topology: String,
        /// Repeated cache group
        cache_group: CacheGroupId,
    },

    /// A topology node names a parent index that does not exist
    #[error("topology '{topology}' node {node} references missing parent index {parent}")]
    DanglingParent {
        /// Topology name
        topology: String,
        /// Child node index
        node: usize,
        /// Missing parent index
        parent: usize,
    },
}

impl From<GraphError> for UpdateError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Cycle { graph, cache_group } => {
                UpdateError::TopologyCycle { graph, cache_group }
            }
            other => UpdateError::Propagation(other.to_string()),
        }
    }
}

/// Outbound inventory store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Record revision moved since the change set was planned
    #[error("server #{server_id} is at revision {actual}, expected {expected}")]
    RevisionConflict {
        /// Server whose revision moved
        server_id: ServerId,
        /// Revision the planner saw
        expected: u64,
        /// Revision in the store
        actual: u64,
    },

    /// Target server no longer exists
    #[error("server #{0} no longer exists")]
    MissingServer(ServerId),

    /// Referenced cache group does not exist
    #[error("cache group #{0} does not exist")]
    UnknownCacheGroup(CacheGroupId),

    /// Graph registration rejected
    #[error(transparent)]
    InvalidGraph(#[from] GraphError),

    /// Backend unavailable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for UpdateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RevisionConflict { server_id, .. } => UpdateError::Conflict {
                server_id,
                attempts: 1,
            },
            StoreError::UnknownCacheGroup(id) => UpdateError::CacheGroupNotFound(id),
            StoreError::InvalidGraph(graph) => graph.into(),
            other => UpdateError::Propagation(other.to_string()),
        }
    }
}
