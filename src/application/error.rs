use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::{
    application::{menu::MenuError, render::RenderError},
    cache::CacheError,
    config::LoadError,
    infra::error::InfraError,
};

/// An error flattened into its `source()` chain for reporting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut messages = self.messages.iter();
        if let Some(first) = messages.next() {
            f.write_str(first)?;
        }
        for message in messages {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("menu cache unavailable")]
    Cache(#[from] CacheError),
}

impl AppError {
    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
