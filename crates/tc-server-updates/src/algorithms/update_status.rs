//! Update status computation.
//!
//! `parent_pending` and `parent_reval_pending` are derived on every read from
//! the ancestors of the server's cache group, restricted to the server's CDN.

use super::topology_walk::ancestor_groups;
use crate::domain::entities::{Server, ServerUpdateStatus};
use crate::domain::errors::UpdateError;
use crate::domain::inventory::Inventory;

/// Pending flags aggregated over a server's ancestors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParentFlags {
    /// Some ancestor server has configuration updates pending
    pub update_pending: bool,
    /// Some ancestor server has revalidation pending
    pub reval_pending: bool,
}

/// Aggregate ancestor flags for `server`.
pub fn parent_flags(
    inventory: &Inventory,
    server: &Server,
    max_groups: usize,
) -> Result<ParentFlags, UpdateError> {
    let ancestors = ancestor_groups(inventory, server.cache_group, max_groups)?;
    if ancestors.is_empty() {
        return Ok(ParentFlags::default());
    }

    let mut flags = ParentFlags::default();
    for parent in inventory
        .servers()
        .filter(|s| s.cdn_id == server.cdn_id && ancestors.contains(&s.cache_group))
    {
        flags.update_pending |= parent.update_pending();
        flags.reval_pending |= parent.reval_pending();
        if flags.update_pending && flags.reval_pending {
            break;
        }
    }
    Ok(flags)
}

/// Full update status for one server.
pub fn compute_update_status(
    inventory: &Inventory,
    server: &Server,
    use_reval_pending: bool,
    max_groups: usize,
) -> Result<ServerUpdateStatus, UpdateError> {
    let parents = parent_flags(inventory, server, max_groups)?;
    Ok(ServerUpdateStatus {
        host_name: server.host_name.clone(),
        host_id: server.id,
        status: server.status,
        update_pending: server.update_pending(),
        parent_pending: parents.update_pending,
        reval_pending: server.reval_pending(),
        parent_reval_pending: parents.reval_pending,
        use_reval_pending,
        config_update_time: server.config_update_time,
        config_apply_time: server.config_apply_time,
        reval_update_time: server.reval_update_time,
        reval_apply_time: server.reval_apply_time,
        config_update_failed: server.config_update_failed,
        reval_update_failed: server.reval_update_failed,
    })
}
