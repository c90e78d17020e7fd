//! API layer: transport-agnostic handler and payloads.

pub mod handler;
pub mod payloads;

pub use handler::ServerUpdateHandler;
pub use payloads::{
    status_code, Alert, AlertLevel, ApiResponse, QueueUpdateRequest, RevalPendingRequest,
    ScopedQueueRequest, ServerStatusRequest,
};
