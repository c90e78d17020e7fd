//! Request and response payloads.
//!
//! JSON field names are camelCase. Every response carries `alerts` and the
//! HTTP-style `statusCode` the handler chose.

use crate::domain::errors::UpdateError;
use crate::domain::value_objects::{CdnId, StatusRef};
use serde::{Deserialize, Serialize};

/// Body of `PUT /servers/{id}/status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusRequest {
    /// Status name or id
    pub status: StatusRef,
    /// Required for OFFLINE and ADMIN_DOWN
    #[serde(default)]
    pub offline_reason: Option<String>,
}

/// Body of `POST /servers/{id}/queue_update`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueUpdateRequest {
    /// `queue` or `dequeue`
    pub action: String,
}

/// Body of the cache group and topology queue routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedQueueRequest {
    /// `queue` or `dequeue`
    pub action: String,
    /// CDN to restrict the action to
    pub cdn_id: CdnId,
}

/// Body of `POST /servers/{id}/reval`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalPendingRequest {
    /// Set (`true`) or clear (`false`) revalidation
    pub reval_pending: bool,
}

/// Alert severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Operation succeeded
    Success,
    /// Informational
    Info,
    /// Succeeded with caveats
    Warning,
    /// Operation failed
    Error,
}

/// A message for the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Severity
    pub level: AlertLevel,
    /// Message
    pub text: String,
}

/// Envelope for every handler result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Status code to send
    pub status_code: u16,
    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
    /// Messages for the caller
    pub alerts: Vec<Alert>,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload and no alerts.
    pub fn ok(response: T) -> Self {
        Self {
            status_code: 200,
            response: Some(response),
            alerts: Vec::new(),
        }
    }

    /// 200 with a payload and a success alert.
    pub fn success(response: T, text: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            response: Some(response),
            alerts: vec![Alert {
                level: AlertLevel::Success,
                text: text.into(),
            }],
        }
    }

    /// Error envelope for a failed operation.
    pub fn from_error(err: &UpdateError) -> Self {
        Self {
            status_code: status_code(err),
            response: None,
            alerts: vec![Alert {
                level: AlertLevel::Error,
                text: error_text(err),
            }],
        }
    }

    /// Status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Status code for an error.
pub fn status_code(err: &UpdateError) -> u16 {
    match err {
        UpdateError::ServerNotFound(_)
        | UpdateError::HostNameNotFound(_)
        | UpdateError::CacheGroupNotFound(_)
        | UpdateError::TopologyNotFound(_) => 404,
        UpdateError::Validation(_)
        | UpdateError::InvalidStatus(_)
        | UpdateError::InvalidAction(_) => 400,
        UpdateError::Conflict { .. } => 409,
        UpdateError::TopologyCycle { .. }
        | UpdateError::Propagation(_)
        | UpdateError::Config(_) => 500,
    }
}

/// Caller-facing text. Server-side failures are not described in detail.
fn error_text(err: &UpdateError) -> String {
    match status_code(err) {
        500 => "Internal Server Error".to_string(),
        _ => err.to_string(),
    }
}
