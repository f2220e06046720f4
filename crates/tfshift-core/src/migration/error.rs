//! Migration-specific error types.

use crate::action::ActionError;
use crate::error::StateStoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Migration-specific errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration file could not be read.
    #[error("failed to read migration file {}: {source}", .path.display())]
    Read {
        /// Path of the migration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The migration file is not valid JSON for a migration.
    #[error("failed to parse migration file {}: {source}", .path.display())]
    Parse {
        /// Path of the migration file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The migration file is well-formed but not usable.
    #[error("invalid migration {name}: {reason}")]
    Invalid {
        /// Migration name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Reading the current state failed.
    #[error("failed to pull state: {0}")]
    Pull(#[source] StateStoreError),

    /// An action failed against the working copy of the state.
    #[error("action failed: {0}")]
    Action(#[from] ActionError),

    /// Planning against the migrated state failed.
    #[error("failed to plan migrated state: {0}")]
    Plan(#[source] StateStoreError),

    /// The migrated state still differs from the configuration.
    #[error("migration {name} produces a plan with changes; set force to apply anyway")]
    PlanHasChanges {
        /// Migration name.
        name: String,
    },

    /// Writing the migrated state back failed.
    #[error("failed to push migrated state: {0}")]
    Push(#[source] StateStoreError),
}

impl MigrationError {
    /// Whether the stored state may have been written before the failure.
    ///
    /// Actions run against a working copy, so only a failed push can leave
    /// the stored state partially updated.
    pub fn state_may_have_changed(&self) -> bool {
        matches!(self, MigrationError::Push(_))
    }

    /// Whether the migration failed because the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        match self {
            MigrationError::Pull(e) | MigrationError::Plan(e) | MigrationError::Push(e) => {
                matches!(e, StateStoreError::Cancelled)
            }
            MigrationError::Action(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
