//! Import action.

use super::{ActionError, StateAction};
use crate::state::{RunContext, State, StateStore};

/// Imports an existing object into the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAction {
    address: String,
    id: String,
}

impl ImportAction {
    /// Create an import of object `id` at `address`.
    pub fn new(address: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            id: id.into(),
        }
    }
}

impl StateAction for ImportAction {
    fn state_update(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<State, ActionError> {
        tracing::debug!(address = %self.address, id = %self.id, "import");
        store
            .import(ctx, state, &self.address, &self.id)
            .map_err(|error| ActionError::Import {
                address: self.address.clone(),
                id: self.id.clone(),
                error,
            })
    }

    fn describe(&self) -> String {
        format!("import {} {}", self.address, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    #[test]
    fn test_import_collision() {
        let store = MemoryStateStore::with_addresses(["aws_instance.a"]);
        let ctx = RunContext::new();
        let state = store.pull(&ctx).unwrap();

        let action = ImportAction::new("aws_instance.b", "i-0123");
        let state = action.state_update(&ctx, &store, &state).unwrap();
        assert_eq!(
            MemoryStateStore::addresses_of(&state),
            vec!["aws_instance.a", "aws_instance.b"]
        );

        assert!(matches!(
            action.state_update(&ctx, &store, &state),
            Err(ActionError::Import { .. })
        ));
    }
}
