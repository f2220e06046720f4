//! Migrators - plan and apply one migration.

use super::error::MigrationError;
use crate::action::{apply_all, StateAction};
use crate::state::{PlanOutcome, RunContext, State, StateStore};

/// Plans or applies one migration.
pub trait Migrator: Send {
    /// Compute the migrated state and check it against the configuration.
    /// Never writes the stored state.
    fn plan(&self, ctx: &RunContext) -> Result<(), MigrationError>;

    /// Plan, then write the migrated state.
    fn apply(&self, ctx: &RunContext) -> Result<(), MigrationError>;
}

/// Migrator for a single state.
pub struct StateMigrator {
    name: String,
    store: Box<dyn StateStore + Send + Sync>,
    actions: Vec<Box<dyn StateAction>>,
    force: bool,
}

impl StateMigrator {
    /// Create a migrator running `actions` against `store`.
    pub fn new(
        name: impl Into<String>,
        store: Box<dyn StateStore + Send + Sync>,
        actions: Vec<Box<dyn StateAction>>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            actions,
            force: false,
        }
    }

    /// Apply even if the plan still has changes.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Pull the state, run every action on a working copy, and plan it.
    fn migrated_state(&self, ctx: &RunContext) -> Result<State, MigrationError> {
        let current = self.store.pull(ctx).map_err(MigrationError::Pull)?;
        let state = apply_all(ctx, &*self.store, current, &self.actions)?;

        match self.store.plan(ctx, &state).map_err(MigrationError::Plan)? {
            PlanOutcome::NoChanges => {}
            PlanOutcome::HasChanges if self.force => {
                tracing::warn!(migration = %self.name, "plan has changes, continuing because force is set");
            }
            PlanOutcome::HasChanges => {
                return Err(MigrationError::PlanHasChanges {
                    name: self.name.clone(),
                });
            }
        }
        Ok(state)
    }
}

impl Migrator for StateMigrator {
    fn plan(&self, ctx: &RunContext) -> Result<(), MigrationError> {
        tracing::info!(migration = %self.name, actions = self.actions.len(), "planning migration");
        self.migrated_state(ctx)?;
        tracing::info!(migration = %self.name, "plan succeeded");
        Ok(())
    }

    fn apply(&self, ctx: &RunContext) -> Result<(), MigrationError> {
        tracing::info!(migration = %self.name, actions = self.actions.len(), "applying migration");
        let state = self.migrated_state(ctx)?;
        self.store.push(ctx, &state).map_err(MigrationError::Push)?;
        tracing::info!(migration = %self.name, "apply succeeded");
        Ok(())
    }
}
