//! Algorithms module for server update status
//!
//! Contains:
//! - Cache-group graph walks (three-colour DFS)
//! - Kahn's topological sort for topology registration
//! - Propagation planning
//! - Update status computation

pub mod kahn;
pub mod propagation;
pub mod topology_walk;
pub mod update_status;

pub use kahn::topology_order;
pub use propagation::{plan_propagation, PropagationPlan};
pub use topology_walk::{ancestor_groups, descendant_groups, reachable, Direction, GroupGraph};
pub use update_status::{compute_update_status, parent_flags, ParentFlags};
