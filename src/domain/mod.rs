//! Domain layer types and invariants.

pub mod page;
pub mod resource;
pub mod settings;
