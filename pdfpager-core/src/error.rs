//! Error types for document loading, page rendering and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// The document could not be opened.
///
/// Reported once at startup. A viewer that hits this never becomes
/// navigable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The rendering backend itself is unavailable (missing library, dead worker).
    #[error("renderer unavailable: {0}")]
    Backend(String),
}

/// A single page failed to render.
///
/// The controller returns to idle after one of these so the user can retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("no document loaded")]
    NoDocument,

    #[error("page {page} is unavailable: {message}")]
    PageUnavailable { page: u32, message: String },

    #[error("failed to rasterize page {page}: {message}")]
    Rasterize { page: u32, message: String },
}

impl RenderError {
    /// Page number the error refers to, if any.
    pub fn page(&self) -> Option<u32> {
        match self {
            RenderError::NoDocument => None,
            RenderError::PageUnavailable { page, .. } | RenderError::Rasterize { page, .. } => {
                Some(*page)
            }
        }
    }
}

/// Errors raised while reading or validating a [`ViewerConfig`](crate::ViewerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_reports_page() {
        let err = RenderError::Rasterize {
            page: 4,
            message: "boom".into(),
        };
        assert_eq!(err.page(), Some(4));
        assert_eq!(err.to_string(), "failed to rasterize page 4: boom");
        assert_eq!(RenderError::NoDocument.page(), None);
    }

    #[test]
    fn load_error_mentions_path() {
        let err = LoadError::NotFound(PathBuf::from("manual.pdf"));
        assert_eq!(err.to_string(), "document not found: manual.pdf");
    }
}
