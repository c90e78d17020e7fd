//! Inbound Ports (Driving Ports / API)
//!
//! What operators and caches can ask of the subsystem.

use crate::domain::entities::{
    CacheGroupQueueResult, QueueUpdateResult, Server, ServerUpdateStatus, TopologyQueueResult,
    UpdateTimesReport,
};
use crate::domain::errors::UpdateError;
use crate::domain::value_objects::{CacheGroupId, CdnId, QueueAction, ServerId, StatusRef};
use async_trait::async_trait;

/// Server update-status API.
#[async_trait]
pub trait ServerUpdateApi: Send + Sync {
    /// Change a server's status and propagate to descendants.
    ///
    /// `offline_reason` is mandatory for OFFLINE and ADMIN_DOWN and dropped
    /// for every other status. The acting server's own pending flags are
    /// left as they were.
    async fn set_server_status(
        &self,
        server_id: ServerId,
        status: StatusRef,
        offline_reason: Option<String>,
    ) -> Result<Server, UpdateError>;

    /// Queue (`true`) or dequeue (`false`) configuration updates on one server.
    async fn set_queue_update(
        &self,
        server_id: ServerId,
        queue: bool,
    ) -> Result<QueueUpdateResult, UpdateError>;

    /// Update status of every server with this hostname, ordered by id.
    async fn get_server_update_status(
        &self,
        host_name: &str,
    ) -> Result<Vec<ServerUpdateStatus>, UpdateError>;

    /// Queue or dequeue every server of a cache group within one CDN.
    async fn queue_cache_group_updates(
        &self,
        cache_group_id: CacheGroupId,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<CacheGroupQueueResult, UpdateError>;

    /// Queue or dequeue every server placed in a topology within one CDN.
    async fn queue_topology_updates(
        &self,
        topology: &str,
        cdn_id: CdnId,
        action: QueueAction,
    ) -> Result<TopologyQueueResult, UpdateError>;

    /// Set or clear content revalidation on one server.
    async fn set_reval_pending(
        &self,
        server_id: ServerId,
        pending: bool,
    ) -> Result<Server, UpdateError>;

    /// Record what a cache reports having applied.
    async fn set_update_times(
        &self,
        host_name: &str,
        report: UpdateTimesReport,
    ) -> Result<Vec<Server>, UpdateError>;
}
