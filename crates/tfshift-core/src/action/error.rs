//! Action error types.

use crate::address::PatternError;
use crate::error::StateStoreError;
use thiserror::Error;

/// Errors raised while parsing or applying a state action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action text is malformed.
    #[error("invalid action `{action}`: {reason}")]
    Parse {
        /// The action as written.
        action: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A wildcard source could not be turned into a pattern.
    #[error("wildcard expansion failed: {0}")]
    Pattern(#[from] PatternError),

    /// Listing addresses for a wildcard expansion failed.
    #[error("failed to list addresses: {0}")]
    List(#[source] StateStoreError),

    /// The store rejected a move.
    #[error("failed to move {from} to {to}: {error}")]
    Move {
        /// Source address.
        from: String,
        /// Destination address.
        to: String,
        /// Store error.
        #[source]
        error: StateStoreError,
    },

    /// The store rejected a remove.
    #[error("failed to remove {}: {error}", .addresses.join(", "))]
    Remove {
        /// Addresses to remove.
        addresses: Vec<String>,
        /// Store error.
        #[source]
        error: StateStoreError,
    },

    /// The store rejected an import.
    #[error("failed to import {id} as {address}: {error}")]
    Import {
        /// Destination address.
        address: String,
        /// Provider-side object ID.
        id: String,
        /// Store error.
        #[source]
        error: StateStoreError,
    },
}

impl ActionError {
    /// The underlying store error, if the store was involved.
    pub fn store_error(&self) -> Option<&StateStoreError> {
        match self {
            ActionError::List(error)
            | ActionError::Move { error, .. }
            | ActionError::Remove { error, .. }
            | ActionError::Import { error, .. } => Some(error),
            ActionError::Parse { .. } | ActionError::Pattern(_) => None,
        }
    }

    /// Whether the action failed because the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.store_error(), Some(StateStoreError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_error_display() {
        let err = ActionError::Move {
            from: "a.x".to_string(),
            to: "a.y".to_string(),
            error: StateStoreError::AddressExists {
                address: "a.y".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to move a.x to a.y: address already exists in state: a.y"
        );
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_remove_error_display() {
        let err = ActionError::Remove {
            addresses: vec!["a.x".to_string(), "a.y".to_string()],
            error: StateStoreError::Cancelled,
        };
        assert!(err.to_string().starts_with("failed to remove a.x, a.y"));
        assert!(err.is_cancelled());
    }
}
