//! History error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or persisting the history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Filesystem error.
    #[error("history io error on {}: {source}", .path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The history could not be encoded or decoded.
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The history file was written by an incompatible version.
    #[error("unsupported history version {version}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in the file.
        version: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// The storage backend refused the operation.
    #[error("history storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HistoryError::UnsupportedVersion {
            version: 9,
            expected: 1,
        };
        assert_eq!(err.to_string(), "unsupported history version 9, expected 1");
    }
}
