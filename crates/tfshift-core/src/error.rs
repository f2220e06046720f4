//! Core error types.

use thiserror::Error;

/// Errors reported by a state store collaborator.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// The run was cancelled before or during the call.
    #[error("operation cancelled")]
    Cancelled,

    /// The source address of a move or remove does not exist.
    #[error("address not found in state: {address}")]
    AddressNotFound {
        /// The missing address.
        address: String,
    },

    /// The destination address of a move or import already exists.
    #[error("address already exists in state: {address}")]
    AddressExists {
        /// The colliding address.
        address: String,
    },

    /// An external command exited unsuccessfully.
    #[error("command `{command}` failed with {status}: {stderr}")]
    Command {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// I/O error while talking to the store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot bytes could not be decoded.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StateStoreError::AddressExists {
            address: "aws_instance.foo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "address already exists in state: aws_instance.foo"
        );
    }
}
