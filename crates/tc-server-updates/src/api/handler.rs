//! API Handler for server update status
//!
//! Maps typed requests onto the [`ServerUpdateApi`] and every outcome onto
//! an [`ApiResponse`]: 404 for unknown servers, cache groups, topologies and
//! hostnames; 400 for validation, status and action errors; 409 for commit
//! conflicts; 500 otherwise.

use crate::api::payloads::{
    ApiResponse, QueueUpdateRequest, RevalPendingRequest, ScopedQueueRequest,
    ServerStatusRequest,
};
use crate::domain::entities::{
    CacheGroupQueueResult, QueueUpdateResult, Server, ServerUpdateStatus, TopologyQueueResult,
    UpdateTimesReport,
};
use crate::domain::errors::UpdateError;
use crate::domain::value_objects::{CacheGroupId, QueueAction, ServerId};
use crate::ports::inbound::ServerUpdateApi;
use tracing::debug;

/// Transport-agnostic handler for the update-status routes.
pub struct ServerUpdateHandler<A: ServerUpdateApi> {
    api: A,
}

impl<A: ServerUpdateApi> ServerUpdateHandler<A> {
    /// Wrap an API implementation.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The wrapped API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// `PUT /servers/{id}/status`
    pub async fn put_server_status(
        &self,
        server_id: ServerId,
        request: ServerStatusRequest,
    ) -> ApiResponse<Server> {
        debug!(server_id, "[tc-updates] PUT server status");
        match self
            .api
            .set_server_status(server_id, request.status, request.offline_reason)
            .await
        {
            Ok(server) => {
                let text = match &server.offline_reason {
                    Some(reason) => format!(
                        "Updated status [{}] for {} [{}]",
                        server.status, server.host_name, reason
                    ),
                    None => format!(
                        "Updated status [{}] for {}",
                        server.status, server.host_name
                    ),
                };
                ApiResponse::success(server, text)
            }
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// `POST /servers/{id}/queue_update`
    pub async fn post_queue_update(
        &self,
        server_id: ServerId,
        request: QueueUpdateRequest,
    ) -> ApiResponse<QueueUpdateResult> {
        debug!(server_id, action = %request.action, "[tc-updates] POST queue update");
        let action = match request.action.parse::<QueueAction>() {
            Ok(action) => action,
            Err(err) => return ApiResponse::from_error(&err),
        };
        respond(self.api.set_queue_update(server_id, action.is_queue()).await)
    }

    /// `GET /servers/{hostname}/update_status`
    pub async fn get_update_status(&self, host_name: &str) -> ApiResponse<Vec<ServerUpdateStatus>> {
        respond(self.api.get_server_update_status(host_name).await)
    }

    /// `POST /cachegroups/{id}/queue_update`
    pub async fn post_cache_group_queue_update(
        &self,
        cache_group_id: CacheGroupId,
        request: ScopedQueueRequest,
    ) -> ApiResponse<CacheGroupQueueResult> {
        debug!(cache_group_id, cdn_id = request.cdn_id, "[tc-updates] POST cache group queue update");
        let action = match request.action.parse::<QueueAction>() {
            Ok(action) => action,
            Err(err) => return ApiResponse::from_error(&err),
        };
        match self
            .api
            .queue_cache_group_updates(cache_group_id, request.cdn_id, action)
            .await
        {
            Ok(done) => {
                let text = format!(
                    "{} servers in cache group {} ({})",
                    past_tense(done.action),
                    done.cache_group_name,
                    done.server_names.len()
                );
                ApiResponse::success(done, text)
            }
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// `POST /topologies/{name}/queue_update`
    pub async fn post_topology_queue_update(
        &self,
        topology: &str,
        request: ScopedQueueRequest,
    ) -> ApiResponse<TopologyQueueResult> {
        debug!(topology, cdn_id = request.cdn_id, "[tc-updates] POST topology queue update");
        let action = match request.action.parse::<QueueAction>() {
            Ok(action) => action,
            Err(err) => return ApiResponse::from_error(&err),
        };
        match self
            .api
            .queue_topology_updates(topology, request.cdn_id, action)
            .await
        {
            Ok(done) => {
                let text = format!(
                    "{} servers in topology {} ({})",
                    past_tense(done.action),
                    done.topology,
                    done.server_names.len()
                );
                ApiResponse::success(done, text)
            }
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// `POST /servers/{hostname}/update`
    pub async fn post_update_times(
        &self,
        host_name: &str,
        request: UpdateTimesReport,
    ) -> ApiResponse<Vec<Server>> {
        match self.api.set_update_times(host_name, request).await {
            Ok(servers) => ApiResponse::success(
                servers,
                format!("successfully set server '{}' update times", host_name),
            ),
            Err(err) => ApiResponse::from_error(&err),
        }
    }

    /// `POST /servers/{id}/reval`
    pub async fn post_reval_pending(
        &self,
        server_id: ServerId,
        request: RevalPendingRequest,
    ) -> ApiResponse<Server> {
        respond(
            self.api
                .set_reval_pending(server_id, request.reval_pending)
                .await,
        )
    }
}

fn respond<T>(result: Result<T, UpdateError>) -> ApiResponse<T> {
    match result {
        Ok(value) => ApiResponse::ok(value),
        Err(err) => ApiResponse::from_error(&err),
    }
}

fn past_tense(action: QueueAction) -> &'static str {
    match action {
        QueueAction::Queue => "Queued",
        QueueAction::Dequeue => "Dequeued",
    }
}
