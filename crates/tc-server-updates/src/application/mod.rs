//! Application layer: service orchestration.

pub mod service;

pub use service::ServerUpdateService;
