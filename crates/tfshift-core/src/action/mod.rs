//! State actions.
//!
//! Every action kind shares one contract: take a snapshot, return a new one
//! or fail. A migration applies its actions as a fold over snapshots.

pub mod error;
pub mod import;
pub mod mv;
pub mod parse;
pub mod rm;
pub mod xmv;

use crate::state::{RunContext, State, StateStore};

pub use error::ActionError;
pub use import::ImportAction;
pub use mv::MoveAction;
pub use parse::{parse_action, tokenize};
pub use rm::RemoveAction;
pub use xmv::ExpansionAction;

/// A state-update operation.
pub trait StateAction: std::fmt::Debug + Send + Sync {
    /// Apply the action to `state` and return the updated snapshot.
    ///
    /// The action must not keep `state` after returning.
    fn state_update(
        &self,
        ctx: &RunContext,
        store: &dyn StateStore,
        state: &State,
    ) -> Result<State, ActionError>;

    /// Human-readable form of the action, as it would be written.
    fn describe(&self) -> String;
}

/// Apply `actions` in order, threading the snapshot through each.
pub fn apply_all(
    ctx: &RunContext,
    store: &dyn StateStore,
    state: State,
    actions: &[Box<dyn StateAction>],
) -> Result<State, ActionError> {
    actions.iter().try_fold(state, |state, action| {
        tracing::info!(action = %action.describe(), "applying action");
        action.state_update(ctx, store, &state)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    #[test]
    fn test_apply_all_mixed_kinds() {
        let store = MemoryStateStore::with_addresses(["module.a[0].r", "module.a[1].r", "old.x"]);
        let ctx = RunContext::new();
        let state = store.pull(&ctx).unwrap();

        let actions = vec![
            parse_action("xmv module.a[*].r module.b[$1].r").unwrap(),
            parse_action("mv old.x new.x").unwrap(),
            parse_action("rm module.b[0].r").unwrap(),
            parse_action("import aws_instance.z i-9").unwrap(),
        ];
        let state = apply_all(&ctx, &store, state, &actions).unwrap();
        assert_eq!(
            MemoryStateStore::addresses_of(&state),
            vec!["module.b[1].r", "new.x", "aws_instance.z"]
        );
    }

    #[test]
    fn test_later_action_sees_earlier_moves() {
        // The second expansion lists again and sees the first one's output.
        let store = MemoryStateStore::with_addresses(["a.x", "a.y"]);
        let ctx = RunContext::new();
        let state = store.pull(&ctx).unwrap();

        let actions = vec![
            parse_action("xmv a.* b.$1").unwrap(),
            parse_action("xmv b.* c.$1").unwrap(),
        ];
        let state = apply_all(&ctx, &store, state, &actions).unwrap();
        assert_eq!(MemoryStateStore::addresses_of(&state), vec!["c.x", "c.y"]);
    }
}
