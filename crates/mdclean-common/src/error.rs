//! Error types shared across mdclean crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, MdError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum MdError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MdError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
