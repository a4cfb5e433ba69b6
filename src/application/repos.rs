//! Source traits describing where flat menu entries come from.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::menu::{MenuEntry, MenuId};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read menu entries from `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode menu entries from `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("menu `{menu}` appears more than once in `{path}`")]
    DuplicateMenu { path: PathBuf, menu: MenuId },
    #[error("menu source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Supplies the flat, host-ordered entries of a menu.
///
/// An unknown menu yields an empty list rather than an error.
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn list_menu_entries(&self, menu: MenuId) -> Result<Vec<MenuEntry>, SourceError>;
}
