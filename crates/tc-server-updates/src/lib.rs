//! # TC Server Updates
//!
//! Update-pending propagation and update status for CDN cache servers.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! When an operator takes a cache server OFFLINE or ADMIN_DOWN, every server
//! of the same CDN in a descendant cache group must fetch new configuration.
//! This crate:
//! - validates status transitions against a per-status rule table
//! - walks cache-group topologies and legacy parent links to find descendants
//! - commits the status change and every cascaded queue as one change set
//! - answers "does this cache (or one of its parents) have updates pending?"
//!
//! ## Derived Flags
//!
//! | Flag | Meaning |
//! |------|---------|
//! | `updatePending` | `config_update_time > config_apply_time` |
//! | `revalPending` | `reval_update_time > reval_apply_time` |
//! | `parentPending` | a same-CDN server in an ancestor group has `updatePending` |
//! | `parentRevalPending` | a same-CDN server in an ancestor group has `revalPending` |
//!
//! ## Module Structure
//!
//! ```text
//! tc-server-updates/
//! ├── domain/          # Server, CacheGroup, Topology, Inventory, ChangeSet, errors
//! ├── algorithms/      # Graph walks, Kahn's sort, propagation planning, status
//! ├── ports/           # ServerUpdateApi, InventoryStore, TimeSource
//! ├── adapters/        # In-memory copy-on-write store, manual clock
//! ├── application/     # ServerUpdateService
//! ├── api/             # Route handler and payloads
//! └── config.rs        # UpdateStatusConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryInventory, ManualTimeSource};
pub use algorithms::{
    ancestor_groups, compute_update_status, descendant_groups, plan_propagation,
    topology_order, GroupGraph, PropagationPlan,
};
pub use api::{
    Alert, AlertLevel, ApiResponse, QueueUpdateRequest, RevalPendingRequest, ScopedQueueRequest,
    ServerStatusRequest, ServerUpdateHandler,
};
pub use application::ServerUpdateService;
pub use config::UpdateStatusConfig;
pub use domain::entities::*;
pub use domain::errors::{GraphError, StoreError, UpdateError};
pub use domain::inventory::{ChangeSet, Inventory, ServerMutation};
pub use domain::value_objects::*;
pub use ports::{InventoryStore, ServerUpdateApi, SystemTimeSource, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
