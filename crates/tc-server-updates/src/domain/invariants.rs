//! # Domain Invariants
//!
//! Rules every status transition and propagation plan must satisfy. The
//! service checks them before committing; a violation aborts the commit.

use super::entities::{Server, ServerChange};
use super::errors::UpdateError;
use super::inventory::{ChangeSet, Inventory};
use super::value_objects::{CacheGroupId, CdnId, ServerId, ServerStatus};
use std::collections::BTreeSet;

/// Invariant: OFFLINE and ADMIN_DOWN carry a non-empty reason.
///
/// Returns the reason to persist: trimmed for statuses that require one,
/// `None` otherwise.
pub fn invariant_reason_present(
    status: ServerStatus,
    offline_reason: Option<&str>,
) -> Result<Option<String>, UpdateError> {
    if !status.rule().reason_required {
        return Ok(None);
    }
    match offline_reason.map(str::trim) {
        Some(reason) if !reason.is_empty() => Ok(Some(reason.to_string())),
        _ => Err(UpdateError::Validation(format!(
            "offlineReason is required for {} status",
            status
        ))),
    }
}

/// Invariant: a status change never writes the acting server's flags.
///
/// Only the `SetStatus` mutation may target the acting server.
pub fn invariant_acting_server_untouched(acting: ServerId, changes: &ChangeSet) -> bool {
    changes.iter().all(|m| {
        m.server_id != acting || matches!(m.change, ServerChange::SetStatus { .. })
    })
}

/// Invariant: propagation stays inside one CDN.
pub fn invariant_same_cdn(cdn_id: CdnId, targets: &[&Server]) -> bool {
    targets.iter().all(|s| s.cdn_id == cdn_id)
}

/// Invariant: no target sits in the acting group or one of its ancestors.
///
/// `excluded_groups` holds those groups; the caller drops any that are also
/// descendants through another hierarchy.
pub fn invariant_no_upward_targets(
    inventory: &Inventory,
    targets: &BTreeSet<ServerId>,
    excluded_groups: &BTreeSet<CacheGroupId>,
) -> bool {
    targets.iter().all(|id| {
        inventory
            .server(*id)
            .map_or(true, |s| !excluded_groups.contains(&s.cache_group))
    })
}
