//! Application services layer: the menu builder and the seams it talks through.

pub mod error;
pub mod menu;
pub mod render;
pub mod repos;
