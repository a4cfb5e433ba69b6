//! Turns the flat, parent-linked entries of a CMS navigation menu into an
//! ordered tree, with an optional cache in front of the build.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
