use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the clip engine library
#[derive(Debug, Error)]
pub enum ClipError {
    /// The transcript (or another required input) does not exist
    #[error("input not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ClipResult<T> = Result<T, ClipError>;
