//! Update-pending propagation planning.
//!
//! Given a server whose status changed, work out which servers below it
//! must have configuration updates queued. Planning is pure: it reads one
//! inventory snapshot and yields a [`PropagationPlan`] the service turns
//! into a change set.

use super::topology_walk::descendant_groups;
use crate::domain::entities::Server;
use crate::domain::errors::UpdateError;
use crate::domain::inventory::Inventory;
use crate::domain::value_objects::{CacheGroupId, CdnId, ServerId, ServerStatus};
use std::collections::BTreeSet;

/// Servers to queue after one status transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationPlan {
    /// Server whose status changed
    pub origin: ServerId,
    /// Cache group of the origin
    pub origin_group: CacheGroupId,
    /// CDN the plan is confined to
    pub cdn_id: CdnId,
    /// Status that triggered the plan
    pub trigger: ServerStatus,
    /// Strict descendants of the origin group
    pub descendant_groups: BTreeSet<CacheGroupId>,
    /// Servers to queue, ordered by id
    pub queued_servers: Vec<ServerId>,
}

impl PropagationPlan {
    /// Nothing to write besides the status itself.
    pub fn is_empty(&self) -> bool {
        self.queued_servers.is_empty()
    }
}

/// Plan propagation for `origin` transitioning into `status`.
///
/// The walk always runs, so a cyclic hierarchy is reported even for
/// statuses that queue nothing.
pub fn plan_propagation(
    inventory: &Inventory,
    origin: &Server,
    status: ServerStatus,
    max_groups: usize,
) -> Result<PropagationPlan, UpdateError> {
    let descendants = descendant_groups(inventory, origin.cache_group, max_groups)?;

    let queued_servers = if status.rule().queues_descendants {
        inventory
            .servers()
            .filter(|s| s.id != origin.id)
            .filter(|s| s.cdn_id == origin.cdn_id)
            .filter(|s| descendants.contains(&s.cache_group))
            .map(|s| s.id)
            .collect()
    } else {
        Vec::new()
    };

    Ok(PropagationPlan {
        origin: origin.id,
        origin_group: origin.cache_group,
        cdn_id: origin.cdn_id,
        trigger: status,
        descendant_groups: descendants,
        queued_servers,
    })
}
