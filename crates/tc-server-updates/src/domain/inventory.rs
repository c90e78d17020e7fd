//! Inventory snapshot and change sets.
//!
//! An [`Inventory`] is an immutable view of servers, cache groups and
//! topologies at one store revision. Writers never mutate a published
//! snapshot; they describe their intent as a [`ChangeSet`] which the store
//! applies to a private copy and publishes atomically.

use super::entities::{CacheGroup, Server, ServerChange, Topology};
use super::errors::StoreError;
use super::value_objects::{CacheGroupId, CdnId, ServerId};
use std::collections::{BTreeMap, BTreeSet};

/// Point-in-time view of everything update status depends on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    servers: BTreeMap<ServerId, Server>,
    cache_groups: BTreeMap<CacheGroupId, CacheGroup>,
    topologies: BTreeMap<String, Topology>,
    revision: u64,
}

impl Inventory {
    /// An empty inventory at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store-wide revision, bumped on every commit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Server by id.
    pub fn server(&self, id: ServerId) -> Option<&Server> {
        self.servers.get(&id)
    }

    /// All servers ordered by id.
    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.values()
    }

    /// Servers sharing a hostname, ordered by id.
    pub fn servers_by_host_name<'a>(
        &'a self,
        host_name: &'a str,
    ) -> impl Iterator<Item = &'a Server> + 'a {
        self.servers.values().filter(move |s| s.host_name == host_name)
    }

    /// Servers of a cache group, optionally restricted to one CDN.
    pub fn servers_in_group(
        &self,
        cache_group: CacheGroupId,
        cdn_id: Option<CdnId>,
    ) -> impl Iterator<Item = &Server> {
        self.servers.values().filter(move |s| {
            s.cache_group == cache_group && cdn_id.map_or(true, |cdn| s.cdn_id == cdn)
        })
    }

    /// Cache group by id.
    pub fn cache_group(&self, id: CacheGroupId) -> Option<&CacheGroup> {
        self.cache_groups.get(&id)
    }

    /// All cache groups ordered by id.
    pub fn cache_groups(&self) -> impl Iterator<Item = &CacheGroup> {
        self.cache_groups.values()
    }

    /// Topology by name.
    pub fn topology(&self, name: &str) -> Option<&Topology> {
        self.topologies.get(name)
    }

    /// All topologies ordered by name.
    pub fn topologies(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.values()
    }

    /// Topologies a cache group is placed in.
    pub fn topologies_containing(
        &self,
        cache_group: CacheGroupId,
    ) -> impl Iterator<Item = &Topology> {
        self.topologies
            .values()
            .filter(move |t| t.contains(cache_group))
    }

    /// Insert or replace a server. Revision is carried forward on replace.
    pub fn insert_server(&mut self, mut server: Server) -> Result<(), StoreError> {
        if !self.cache_groups.contains_key(&server.cache_group) {
            return Err(StoreError::UnknownCacheGroup(server.cache_group));
        }
        if let Some(existing) = self.servers.get(&server.id) {
            server.revision = existing.revision + 1;
        }
        self.servers.insert(server.id, server);
        self.revision += 1;
        Ok(())
    }

    /// Remove a server.
    pub fn remove_server(&mut self, id: ServerId) -> Option<Server> {
        let removed = self.servers.remove(&id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Insert or replace a cache group. Legacy parents must already exist.
    pub fn insert_cache_group(&mut self, group: CacheGroup) -> Result<(), StoreError> {
        if let Some(missing) = group
            .legacy_parents()
            .find(|p| *p != group.id && !self.cache_groups.contains_key(p))
        {
            return Err(StoreError::UnknownCacheGroup(missing));
        }
        self.cache_groups.insert(group.id, group);
        self.revision += 1;
        Ok(())
    }

    /// Insert or replace a topology. Every node's cache group must exist.
    pub fn insert_topology(&mut self, topology: Topology) -> Result<(), StoreError> {
        if let Some(missing) = topology
            .cache_groups()
            .find(|cg| !self.cache_groups.contains_key(cg))
        {
            return Err(StoreError::UnknownCacheGroup(missing));
        }
        self.topologies.insert(topology.name.clone(), topology);
        self.revision += 1;
        Ok(())
    }

    /// Apply a change set all-or-nothing.
    ///
    /// Every target is checked before anything is written. Each touched
    /// server's revision is bumped once, however many changes it received.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<BTreeSet<ServerId>, StoreError> {
        for mutation in changes.iter() {
            let server = self
                .servers
                .get(&mutation.server_id)
                .ok_or(StoreError::MissingServer(mutation.server_id))?;
            if let Some(expected) = mutation.expected_revision {
                if server.revision != expected {
                    return Err(StoreError::RevisionConflict {
                        server_id: mutation.server_id,
                        expected,
                        actual: server.revision,
                    });
                }
            }
        }

        let touched = changes.touched_servers();
        for mutation in changes.iter() {
            if let Some(server) = self.servers.get_mut(&mutation.server_id) {
                server.apply(&mutation.change);
            }
        }
        for id in &touched {
            if let Some(server) = self.servers.get_mut(id) {
                server.revision += 1;
            }
        }
        if !touched.is_empty() {
            self.revision += 1;
        }
        Ok(touched)
    }
}

/// One change targeted at one server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerMutation {
    /// Target server
    pub server_id: ServerId,
    /// Revision the planner saw; `None` skips the check
    pub expected_revision: Option<u64>,
    /// The change
    pub change: ServerChange,
}

/// Writes produced by one trigger, committed as a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    mutations: Vec<ServerMutation>,
}

impl ChangeSet {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change guarded by the server's current revision.
    pub fn push(&mut self, server: &Server, change: ServerChange) {
        self.mutations.push(ServerMutation {
            server_id: server.id,
            expected_revision: Some(server.revision),
            change,
        });
    }

    /// Add a change with no revision guard.
    pub fn push_unchecked(&mut self, server_id: ServerId, change: ServerChange) {
        self.mutations.push(ServerMutation {
            server_id,
            expected_revision: None,
            change,
        });
    }

    /// Number of mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// No mutations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Mutations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ServerMutation> {
        self.mutations.iter()
    }

    /// Distinct servers touched.
    pub fn touched_servers(&self) -> BTreeSet<ServerId> {
        self.mutations.iter().map(|m| m.server_id).collect()
    }
}
