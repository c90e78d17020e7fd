//! Shared CDN inventory for the scenario tests.
//!
//! ```text
//!                 mso-topology
//!   parentCachegroup(1)      secondaryCachegroup(2)
//!          │                          │
//!     cachegroup1(3)            cachegroup2(4)
//!
//!   legacy links: cachegroup3(5) -> parent 1, secondary parent 2
//! ```
//!
//! | Server | Group | CDN |
//! |--------|-------|-----|
//! | atlanta-mid-01 (100) | 1 | cdn1 |
//! | atlanta-mid-16 (101) | 2 | cdn1 |
//! | atlanta-edge-01 (110) | 3 | cdn1 |
//! | atlanta-edge-03 (111) | 3 | cdn1 |
//! | atlanta-edge-14 (112) | 3 | cdn2 |
//! | atlanta-edge-16 (120) | 4 | cdn1 |
//! | denver-edge-01 (130) | 5 | cdn1 |
//! | dup-edge (140) | 3 | cdn1 |
//! | dup-edge (141) | 3 | cdn2 |

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tc_server_updates::{
    CacheGroup, CdnId, InMemoryInventory, ManualTimeSource, Server, ServerStatus,
    ServerUpdateApi, ServerUpdateHandler, ServerUpdateService, ServerUpdateStatus, Topology,
    UpdateStatusConfig,
};

pub const CDN1: CdnId = 1;
pub const CDN2: CdnId = 2;

pub const PARENT_CG: i64 = 1;
pub const SECONDARY_CG: i64 = 2;
pub const EDGE_CG: i64 = 3;
pub const SIBLING_CG: i64 = 4;
pub const LEGACY_CG: i64 = 5;

pub const MID_01: i64 = 100;
pub const MID_16: i64 = 101;
pub const EDGE_01: i64 = 110;
pub const EDGE_03: i64 = 111;
pub const EDGE_14_CDN2: i64 = 112;
pub const SIBLING_EDGE: i64 = 120;
pub const LEGACY_EDGE: i64 = 130;
pub const DUP_CDN1: i64 = 140;
pub const DUP_CDN2: i64 = 141;

pub const TOPOLOGY: &str = "mso-topology";
pub const DUP_HOST: &str = "dup-edge";

/// Service type used by every scenario.
pub type Service = ServerUpdateService<InMemoryInventory, Arc<ManualTimeSource>>;

/// Inventory, clock and handler wired together.
pub struct CdnFixture {
    pub store: Arc<InMemoryInventory>,
    pub clock: Arc<ManualTimeSource>,
    pub handler: ServerUpdateHandler<Service>,
}

impl CdnFixture {
    /// Fixture with [`UpdateStatusConfig::for_testing`].
    pub fn new() -> Self {
        Self::with_config(UpdateStatusConfig::for_testing())
    }

    pub fn with_config(config: UpdateStatusConfig) -> Self {
        Self::with_store(seed_inventory(), config)
    }

    /// Fixture over a caller-built store.
    pub fn with_store(store: InMemoryInventory, config: UpdateStatusConfig) -> Self {
        let store = Arc::new(store);
        let clock = Arc::new(ManualTimeSource::new(start_time()));
        let service = ServerUpdateService::with_config(store.clone(), clock.clone(), config)
            .expect("test config is valid");
        Self {
            store,
            clock,
            handler: ServerUpdateHandler::new(service),
        }
    }

    pub fn service(&self) -> &Service {
        self.handler.api()
    }

    /// The single update-status entry for a unique hostname.
    pub async fn status_of(&self, host_name: &str) -> ServerUpdateStatus {
        let mut entries = self
            .service()
            .get_server_update_status(host_name)
            .await
            .expect("host exists");
        assert_eq!(entries.len(), 1, "{host_name} is not unique");
        entries.remove(0)
    }

    /// `(update_pending, parent_pending)` for a unique hostname.
    pub async fn flags(&self, host_name: &str) -> (bool, bool) {
        let status = self.status_of(host_name).await;
        (status.update_pending, status.parent_pending)
    }

    pub fn server(&self, id: i64) -> Server {
        self.store.current().server(id).cloned().expect("server exists")
    }
}

impl Default for CdnFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

/// Build the inventory described in the module docs.
pub fn seed_inventory() -> InMemoryInventory {
    let store = InMemoryInventory::new();

    let groups = [
        CacheGroup::new(PARENT_CG, "parentCachegroup"),
        CacheGroup::new(SECONDARY_CG, "secondaryCachegroup"),
        CacheGroup::new(EDGE_CG, "cachegroup1"),
        CacheGroup::new(SIBLING_CG, "cachegroup2"),
        CacheGroup::new(LEGACY_CG, "cachegroup3")
            .with_parent(PARENT_CG)
            .with_secondary_parent(SECONDARY_CG),
    ];
    for group in groups {
        store.upsert_cache_group(group).expect("cache group");
    }

    store
        .upsert_topology(
            Topology::new(TOPOLOGY)
                .with_node(PARENT_CG, &[])
                .with_node(SECONDARY_CG, &[])
                .with_node(EDGE_CG, &[0])
                .with_node(SIBLING_CG, &[1]),
        )
        .expect("topology");

    let servers = [
        Server::new(MID_01, "atlanta-mid-01", PARENT_CG, CDN1, ServerStatus::Reported),
        Server::new(MID_16, "atlanta-mid-16", SECONDARY_CG, CDN1, ServerStatus::Reported),
        Server::new(EDGE_01, "atlanta-edge-01", EDGE_CG, CDN1, ServerStatus::Reported),
        Server::new(EDGE_03, "atlanta-edge-03", EDGE_CG, CDN1, ServerStatus::Reported),
        Server::new(EDGE_14_CDN2, "atlanta-edge-14", EDGE_CG, CDN2, ServerStatus::Reported),
        Server::new(SIBLING_EDGE, "atlanta-edge-16", SIBLING_CG, CDN1, ServerStatus::Reported),
        Server::new(LEGACY_EDGE, "denver-edge-01", LEGACY_CG, CDN1, ServerStatus::Reported),
        Server::new(DUP_CDN1, DUP_HOST, EDGE_CG, CDN1, ServerStatus::Reported),
        Server::new(DUP_CDN2, DUP_HOST, EDGE_CG, CDN2, ServerStatus::Reported),
    ];
    for server in servers {
        store.upsert_server(server).expect("server");
    }

    store
}

/// Hostnames of every fixture server with a unique name.
pub const UNIQUE_HOSTS: [&str; 7] = [
    "atlanta-mid-01",
    "atlanta-mid-16",
    "atlanta-edge-01",
    "atlanta-edge-03",
    "atlanta-edge-14",
    "atlanta-edge-16",
    "denver-edge-01",
];
