//! The history interface consumed by the runner.

use super::error::HistoryError;
use crate::state::RunContext;
use chrono::{DateTime, Utc};

/// Tracks which migration files have been applied.
pub trait HistoryStore {
    /// Whether `filename` was already applied.
    fn already_applied(&self, filename: &str) -> bool;

    /// Migration files not yet applied, in file order.
    fn unapplied_migrations(&self) -> Vec<String>;

    /// Record `filename` as applied. `applied_at` defaults to now.
    fn add_record(
        &mut self,
        filename: &str,
        kind: &str,
        name: &str,
        applied_at: Option<DateTime<Utc>>,
    );

    /// Number of records.
    fn len(&self) -> usize;

    /// Whether there are no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the history.
    fn save(&self, ctx: &RunContext) -> Result<(), HistoryError>;
}
