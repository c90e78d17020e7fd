//! Value objects for server update status.
//!
//! Identifiers, the closed set of server statuses with their rule table,
//! and the queue action vocabulary.

use super::errors::UpdateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server identifier.
pub type ServerId = i64;

/// Cache group identifier.
pub type CacheGroupId = i64;

/// CDN identifier.
pub type CdnId = i64;

/// Operational status of a cache server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    /// Taken out of rotation by an operator.
    AdminDown,
    /// Serving traffic and monitored.
    Online,
    /// Out of service.
    Offline,
    /// Serving traffic, availability decided by health reports.
    Reported,
    /// Provisioned but not yet in production.
    PreProd,
}

impl ServerStatus {
    /// Every status, ordered by numeric id.
    pub const ALL: [ServerStatus; 5] = [
        ServerStatus::AdminDown,
        ServerStatus::Online,
        ServerStatus::Offline,
        ServerStatus::Reported,
        ServerStatus::PreProd,
    ];

    /// Stable numeric id.
    pub fn id(self) -> i64 {
        match self {
            ServerStatus::AdminDown => 1,
            ServerStatus::Online => 2,
            ServerStatus::Offline => 3,
            ServerStatus::Reported => 4,
            ServerStatus::PreProd => 5,
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            ServerStatus::AdminDown => "ADMIN_DOWN",
            ServerStatus::Online => "ONLINE",
            ServerStatus::Offline => "OFFLINE",
            ServerStatus::Reported => "REPORTED",
            ServerStatus::PreProd => "PRE_PROD",
        }
    }

    /// Look a status up by numeric id.
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Look a status up by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// The transition rule for this status.
    pub fn rule(self) -> &'static StatusRule {
        // STATUS_RULES is indexed by id - 1
        &STATUS_RULES[(self.id() - 1) as usize]
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a transition into a status requires and triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusRule {
    /// Status the rule applies to.
    pub status: ServerStatus,
    /// A non-empty offline reason must accompany the transition.
    pub reason_required: bool,
    /// Servers in descendant cache groups get queued.
    pub queues_descendants: bool,
}

/// Rule table, indexed by `status.id() - 1`.
pub const STATUS_RULES: [StatusRule; 5] = [
    StatusRule {
        status: ServerStatus::AdminDown,
        reason_required: true,
        queues_descendants: true,
    },
    StatusRule {
        status: ServerStatus::Online,
        reason_required: false,
        queues_descendants: false,
    },
    StatusRule {
        status: ServerStatus::Offline,
        reason_required: true,
        queues_descendants: true,
    },
    StatusRule {
        status: ServerStatus::Reported,
        reason_required: false,
        queues_descendants: false,
    },
    StatusRule {
        status: ServerStatus::PreProd,
        reason_required: false,
        queues_descendants: false,
    },
];

/// A status given either by numeric id or by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusRef {
    /// Numeric status id.
    Id(i64),
    /// Status name, e.g. `"OFFLINE"`.
    Name(String),
}

impl StatusRef {
    /// Resolve to a known status.
    pub fn resolve(&self) -> Result<ServerStatus, UpdateError> {
        match self {
            StatusRef::Id(id) => ServerStatus::from_id(*id)
                .ok_or_else(|| UpdateError::InvalidStatus(id.to_string())),
            StatusRef::Name(name) => ServerStatus::from_name(name.trim())
                .ok_or_else(|| UpdateError::InvalidStatus(name.clone())),
        }
    }
}

impl From<ServerStatus> for StatusRef {
    fn from(status: ServerStatus) -> Self {
        StatusRef::Name(status.name().to_string())
    }
}

impl From<&str> for StatusRef {
    fn from(name: &str) -> Self {
        StatusRef::Name(name.to_string())
    }
}

/// Queue or dequeue pending updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueAction {
    /// Mark updates pending.
    Queue,
    /// Clear pending updates.
    Dequeue,
}

impl QueueAction {
    /// `Queue` for `true`, `Dequeue` for `false`.
    pub fn from_flag(queue: bool) -> Self {
        if queue {
            QueueAction::Queue
        } else {
            QueueAction::Dequeue
        }
    }

    /// Whether this action sets the pending flag.
    pub fn is_queue(self) -> bool {
        matches!(self, QueueAction::Queue)
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            QueueAction::Queue => "queue",
            QueueAction::Dequeue => "dequeue",
        }
    }
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueAction {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue" => Ok(QueueAction::Queue),
            "dequeue" => Ok(QueueAction::Dequeue),
            other => Err(UpdateError::InvalidAction(other.to_string())),
        }
    }
}
