//! Ports layer: inbound API and outbound store/time traits.

pub mod inbound;
pub mod outbound;

pub use inbound::ServerUpdateApi;
pub use outbound::{InventoryStore, SystemTimeSource, TimeSource};
