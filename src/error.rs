use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a documentation run.
///
/// Only a missing or unusable project root stops the pipeline; everything
/// below that boundary is recovered locally (see [`ScanError`] and
/// [`EnrichError`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("project path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("project path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("enrichment error: {0}")]
    Enrichment(#[from] EnrichError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

/// A source file that could not be read.
///
/// The file contributes zero endpoints; the scan of the rest of the tree
/// continues.
#[derive(Debug, Error)]
#[error("failed to read {}: {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure reported by an enrichment backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    /// The backing service cannot be reached at all (connection refused,
    /// binary missing). Remaining enrichment is abandoned.
    #[error("enrichment backend unreachable: {0}")]
    Unreachable(String),

    /// A single request took too long.
    #[error("enrichment request timed out: {0}")]
    Timeout(String),

    /// The backend answered with an error status or failed to run the request.
    #[error("enrichment backend failed: {0}")]
    Backend(String),

    /// The backend answered, but the payload could not be understood.
    #[error("invalid enrichment response: {0}")]
    InvalidResponse(String),
}

impl EnrichError {
    /// Whether this error means the whole enrichment channel is down, as
    /// opposed to a failure of the one item being processed.
    pub fn is_channel_failure(&self) -> bool {
        matches!(self, EnrichError::Unreachable(_))
    }
}
