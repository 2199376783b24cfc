//! Error taxonomy shared by the library components.
//!
//! Every component returns [`ViewerError`]. The HTTP layer maps each
//! variant onto a status code (see [`crate::server`]); the binary wraps
//! bootstrap failures in `anyhow` instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    /// Empty, absolute, or traversal-attempting relative path.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("path escapes root: {0}")]
    PathEscapesRoot(String),
    #[error("not a markdown file: {0}")]
    NotMarkdownFile(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid tag: {0}")]
    InvalidTag(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    /// True for errors caused by the caller's input rather than the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ViewerError::InvalidPath(_)
                | ViewerError::PathEscapesRoot(_)
                | ViewerError::NotMarkdownFile(_)
                | ViewerError::InvalidTag(_)
                | ViewerError::InvalidAction(_)
        )
    }
}
