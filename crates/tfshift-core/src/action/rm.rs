//! Remove action.

use super::{ActionError, StateAction};
use crate::state::{RunContext, State, StateStore};

/// Removes addresses from the state without destroying the objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveAction {
    addresses: Vec<String>,
}

impl RemoveAction {
    /// Create a remove action for one or more addresses.
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

impl StateAction for RemoveAction {
    fn state_update(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<State, ActionError> {
        tracing::debug!(addresses = ?self.addresses, "state rm");
        store
            .rm(ctx, state, &self.addresses)
            .map_err(|error| ActionError::Remove {
                addresses: self.addresses.clone(),
                error,
            })
    }

    fn describe(&self) -> String {
        format!("rm {}", self.addresses.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    #[test]
    fn test_remove() {
        let store = MemoryStateStore::with_addresses(["a.x", "a.y", "a.z"]);
        let ctx = RunContext::new();
        let state = store.pull(&ctx).unwrap();

        let action = RemoveAction::new(vec!["a.x".to_string(), "a.z".to_string()]);
        let state = action.state_update(&ctx, &store, &state).unwrap();
        assert_eq!(MemoryStateStore::addresses_of(&state), vec!["a.y"]);
    }

    #[test]
    fn test_remove_missing() {
        let store = MemoryStateStore::with_addresses(["a.x"]);
        let ctx = RunContext::new();
        let state = store.pull(&ctx).unwrap();

        let action = RemoveAction::new(vec!["a.nope".to_string()]);
        assert!(matches!(
            action.state_update(&ctx, &store, &state),
            Err(ActionError::Remove { .. })
        ));
    }
}
