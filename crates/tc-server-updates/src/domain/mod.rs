//! Domain layer: entities, value objects, errors, invariants and the
//! inventory snapshot.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod inventory;
pub mod value_objects;
