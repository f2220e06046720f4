//! Concrete move action.

use super::{ActionError, StateAction};
use crate::address::MoveOperation;
use crate::state::{RunContext, State, StateStore};

/// Moves one resource or module to a new address in the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    op: MoveOperation,
}

impl MoveAction {
    /// Create a move from `source` to `destination`.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            op: MoveOperation::new(source, destination),
        }
    }

    /// The move this action performs.
    pub fn operation(&self) -> &MoveOperation {
        &self.op
    }

    /// Apply a move to `state`, returning the updated snapshot.
    pub fn apply(
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
        op: &MoveOperation,
    ) -> Result<State, ActionError> {
        tracing::debug!(from = %op.source, to = %op.destination, "state mv");
        store
            .mv(ctx, state, &op.source, &op.destination)
            .map_err(|error| ActionError::Move {
                from: op.source.clone(),
                to: op.destination.clone(),
                error,
            })
    }
}

impl From<MoveOperation> for MoveAction {
    fn from(op: MoveOperation) -> Self {
        Self { op }
    }
}

impl StateAction for MoveAction {
    fn state_update(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<State, ActionError> {
        Self::apply(ctx, store, state, &self.op)
    }

    fn describe(&self) -> String {
        format!("mv {} {}", self.op.source, self.op.destination)
    }
}
