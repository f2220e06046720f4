//! Wildcard move action.

use super::mv::MoveAction;
use super::{ActionError, StateAction};
use crate::address::{expand, wildcard_count, MoveOperation};
use crate::state::{RunContext, State, StateStore};

/// Moves every address matching a wildcard pattern.
///
/// The source may contain `*` wildcards; the destination may refer to the
/// captured segments as `$1`, `$2`, ... The address listing is read once per
/// invocation, and the resulting moves are applied in listing order, each
/// against the snapshot returned by the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionAction {
    source: String,
    destination: String,
}

impl ExpansionAction {
    /// Create a wildcard move.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Compute the concrete moves against the current listing of `state`.
    pub fn moves(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<Vec<MoveOperation>, ActionError> {
        if wildcard_count(&self.source) == 0 {
            return Ok(vec![MoveOperation::new(&self.source, &self.destination)]);
        }
        let listing = store.list(ctx, state).map_err(ActionError::List)?;
        Ok(expand(&listing, &self.source, &self.destination)?)
    }
}

impl StateAction for ExpansionAction {
    fn state_update(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<State, ActionError> {
        let ops = self.moves(ctx, store, state)?;
        if ops.is_empty() {
            tracing::info!(source = %self.source, "wildcard matched no addresses");
        }

        // No rollback: moves before a failure stay applied to the returned chain.
        ops.iter().try_fold(state.clone(), |state, op| {
            MoveAction::apply(ctx, store, &state, op)
        })
    }

    fn describe(&self) -> String {
        format!("xmv {} {}", self.source, self.destination)
    }
}
