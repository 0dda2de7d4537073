//! Error types for hy-thread-metrics.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when configuring, registering, or sampling thread metrics.
#[derive(Debug, Error)]
pub enum HyThreadError {
    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The thread snapshot source could not be read.
    #[error("failed to read thread snapshot at {}: {}", .path.display(), .source)]
    Io {
        /// Path that failed to read
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `stat` record did not have the expected `tid (comm) state ...` layout.
    #[error("malformed stat record at {}: {}", .path.display(), .reason)]
    MalformedStat { path: PathBuf, reason: String },

    /// Error creating or registering the Prometheus collector.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl HyThreadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for hy-thread-metrics operations.
pub type Result<T> = std::result::Result<T, HyThreadError>;
