use std::error::Error as StdError;

use thiserror::Error;

use crate::domain::menu::MenuTree;

type BoxedError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown menu template `{0}`")]
    UnknownTemplate(String),
    #[error("menu template `{template}` failed to render")]
    Template {
        template: String,
        #[source]
        source: BoxedError,
    },
    #[error("failed to write rendered menu")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn template(template: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Template {
            template: template.into(),
            source: source.into(),
        }
    }
}

/// Receives an organized tree together with the name of the template that
/// should present it.
pub trait RenderSink: Send + Sync {
    fn render(&self, template: &str, tree: &MenuTree) -> Result<(), RenderError>;
}
