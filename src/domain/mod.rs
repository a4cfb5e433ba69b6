//! Domain layer types and invariants.

pub mod menu;
pub mod tree;
