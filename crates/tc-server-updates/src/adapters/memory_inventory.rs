//! In-memory Inventory Adapter
//!
//! Implements the `InventoryStore` port with copy-on-write snapshots.
//! A commit clones the current inventory, applies the change set to the
//! clone and swaps it in under the write lock, so readers holding an older
//! `Arc` never see a partial write.

use crate::algorithms::{reachable, topology_order, Direction, GroupGraph};
use crate::domain::entities::{CacheGroup, Server, Topology};
use crate::domain::errors::StoreError;
use crate::domain::inventory::{ChangeSet, Inventory};
use crate::domain::value_objects::ServerId;
use crate::ports::outbound::InventoryStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// In-memory inventory for tests and single-process deployments.
pub struct InMemoryInventory {
    current: RwLock<Arc<Inventory>>,
}

impl InMemoryInventory {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_inventory(Inventory::new())
    }

    /// Create a store seeded with an inventory.
    pub fn from_inventory(inventory: Inventory) -> Self {
        Self {
            current: RwLock::new(Arc::new(inventory)),
        }
    }

    /// Latest snapshot without going through the async port.
    pub fn current(&self) -> Arc<Inventory> {
        self.current.read().clone()
    }

    /// Insert or replace a cache group.
    ///
    /// Rejects unknown legacy parents and legacy parent cycles.
    pub fn upsert_cache_group(&self, group: CacheGroup) -> Result<(), StoreError> {
        let id = group.id;
        self.mutate(|next| {
            next.insert_cache_group(group)?;
            let graph = GroupGraph::legacy(next.cache_groups());
            let bound = next.cache_groups().count();
            reachable(&graph, id, Direction::Up, bound)?;
            Ok(())
        })
    }

    /// Insert or replace a topology after validating it is acyclic and
    /// places each cache group once.
    pub fn upsert_topology(&self, topology: Topology) -> Result<(), StoreError> {
        topology_order(&topology)?;
        self.mutate(|next| next.insert_topology(topology))
    }

    /// Insert or replace a server.
    pub fn upsert_server(&self, server: Server) -> Result<(), StoreError> {
        self.mutate(|next| next.insert_server(server))
    }

    /// Remove a server, returning it if it existed.
    pub fn remove_server(&self, id: ServerId) -> Option<Server> {
        let mut removed = None;
        let result = self.mutate(|next| {
            removed = next.remove_server(id);
            Ok(())
        });
        result.ok().and(removed)
    }

    /// Clone, edit, swap. The edit is discarded on error.
    fn mutate<F>(&self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Inventory) -> Result<(), StoreError>,
    {
        let mut current = self.current.write();
        let mut next = Inventory::clone(&current);
        edit(&mut next)?;
        *current = Arc::new(next);
        Ok(())
    }
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    async fn snapshot(&self) -> Result<Arc<Inventory>, StoreError> {
        Ok(self.current())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Arc<Inventory>, StoreError> {
        let mut current = self.current.write();
        let mut next = Inventory::clone(&current);
        let touched = next.apply(&changes)?;
        let published = Arc::new(next);
        *current = published.clone();

        debug!(
            revision = published.revision(),
            mutations = changes.len(),
            servers = touched.len(),
            "[tc-updates] Change set committed"
        );
        Ok(published)
    }
}
