//! Adapters layer: in-memory store and a manual clock.

pub mod clock;
pub mod memory_inventory;

pub use clock::ManualTimeSource;
pub use memory_inventory::InMemoryInventory;
