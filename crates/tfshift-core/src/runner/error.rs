//! Runner error types.

use crate::history::HistoryError;
use crate::migration::MigrationError;
use thiserror::Error;

/// Errors returned by a history-aware run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The migration file is already recorded in the history.
    #[error("a migration has already been applied: {filename}")]
    AlreadyApplied {
        /// The migration file.
        filename: String,
    },

    /// The migration file could not be loaded.
    #[error("failed to load migration {filename}: {source}")]
    Load {
        /// The migration file.
        filename: String,
        /// Underlying error.
        #[source]
        source: MigrationError,
    },

    /// The migration failed to plan or apply.
    #[error("migration {filename} failed: {source}")]
    Migration {
        /// The migration file.
        filename: String,
        /// Underlying error.
        #[source]
        source: MigrationError,
    },

    /// A migration failed after earlier migrations of the same run were
    /// applied.
    #[error("{source} (applied before the failure: {})", .applied.join(", "))]
    Incomplete {
        /// Files applied by this run before the failure, in order.
        applied: Vec<String>,
        /// The failure that stopped the run.
        #[source]
        source: Box<RunError>,
    },

    /// The run was cancelled between migrations.
    #[error("run cancelled")]
    Cancelled,

    /// Every migration applied, but the history could not be saved.
    #[error("apply succeeded, but failed to save history: {source}")]
    HistoryNotSaved {
        /// Persistence error.
        #[source]
        source: HistoryError,
    },

    /// A migration failed and the history could not be saved either.
    #[error("failed to save history: {persist}, failed to apply: {apply}")]
    Composite {
        /// The apply failure.
        apply: Box<RunError>,
        /// The persistence failure.
        persist: HistoryError,
    },
}

impl RunError {
    /// Whether infrastructure state may have been written before this error.
    ///
    /// History persistence only fails after at least one migration was
    /// pushed, so both persistence variants report `true`.
    pub fn state_may_have_changed(&self) -> bool {
        match self {
            RunError::Migration { source, .. } => source.state_may_have_changed(),
            RunError::Incomplete { .. }
            | RunError::HistoryNotSaved { .. }
            | RunError::Composite { .. } => true,
            RunError::AlreadyApplied { .. } | RunError::Load { .. } | RunError::Cancelled => false,
        }
    }

    /// Whether the history on storage may be behind the applied state.
    pub fn history_may_be_inconsistent(&self) -> bool {
        matches!(
            self,
            RunError::HistoryNotSaved { .. } | RunError::Composite { .. }
        )
    }

    /// Files this run applied before failing.
    pub fn applied_files(&self) -> &[String] {
        match self {
            RunError::Incomplete { applied, .. } => applied,
            RunError::Composite { apply, .. } => apply.applied_files(),
            _ => &[],
        }
    }

    /// Whether the run stopped because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            RunError::Cancelled => true,
            RunError::Migration { source, .. } => source.is_cancelled(),
            RunError::Incomplete { source, .. } => source.is_cancelled(),
            RunError::Composite { apply, .. } => apply.is_cancelled(),
            _ => false,
        }
    }
}
