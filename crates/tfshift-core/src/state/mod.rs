//! State snapshots and the state store collaborator.
//!
//! A [`State`] is an opaque, immutable snapshot of a Terraform state. Every
//! mutating [`StateStore`] call takes a snapshot by reference and returns a
//! new one, so a chain of actions is a fold over snapshots rather than a
//! shared mutable value.

pub mod memory;
pub mod terraform;

use crate::error::StateStoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use memory::MemoryStateStore;
pub use terraform::TerraformCli;

/// Immutable snapshot of a state store.
#[derive(Clone, PartialEq, Eq)]
pub struct State {
    bytes: Arc<[u8]>,
}

impl State {
    /// Wrap raw state bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Raw bytes of the snapshot.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the snapshot in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State").field("len", &self.len()).finish()
    }
}

/// Cancellation context threaded through every state store call.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
}

impl RunContext {
    /// Create a new, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`StateStoreError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), StateStoreError> {
        if self.is_cancelled() {
            return Err(StateStoreError::Cancelled);
        }
        Ok(())
    }
}

/// Outcome of planning against a candidate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The configuration matches the state.
    NoChanges,
    /// Applying the configuration would change infrastructure.
    HasChanges,
}

/// Primitives of the underlying state store.
///
/// Implementations must check the [`RunContext`] before doing any work.
pub trait StateStore {
    /// Read the current state.
    fn pull(&self, ctx: &RunContext) -> Result<State, StateStoreError>;

    /// Write a state back as the current state.
    fn push(&self, ctx: &RunContext, state: &State) -> Result<(), StateStoreError>;

    /// List resource addresses in the state, in state order.
    fn list(&self, ctx: &RunContext, state: &State) -> Result<Vec<String>, StateStoreError>;

    /// Move `source` to `destination`.
    ///
    /// Fails if the source is missing or the destination already exists.
    fn mv(
        &self,
        ctx: &RunContext,
        state: &State,
        source: &str,
        destination: &str,
    ) -> Result<State, StateStoreError>;

    /// Remove addresses from the state.
    fn rm(
        &self,
        ctx: &RunContext,
        state: &State,
        addresses: &[String],
    ) -> Result<State, StateStoreError>;

    /// Import an existing object under `address`.
    fn import(
        &self,
        ctx: &RunContext,
        state: &State,
        address: &str,
        id: &str,
    ) -> Result<State, StateStoreError>;

    /// Plan the configuration against `state` without writing it.
    fn plan(&self, ctx: &RunContext, state: &State) -> Result<PlanOutcome, StateStoreError>;
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn pull(&self, ctx: &RunContext) -> Result<State, StateStoreError> {
        (**self).pull(ctx)
    }

    fn push(&self, ctx: &RunContext, state: &State) -> Result<(), StateStoreError> {
        (**self).push(ctx, state)
    }

    fn list(&self, ctx: &RunContext, state: &State) -> Result<Vec<String>, StateStoreError> {
        (**self).list(ctx, state)
    }

    fn mv(
        &self,
        ctx: &RunContext,
        state: &State,
        source: &str,
        destination: &str,
    ) -> Result<State, StateStoreError> {
        (**self).mv(ctx, state, source, destination)
    }

    fn rm(
        &self,
        ctx: &RunContext,
        state: &State,
        addresses: &[String],
    ) -> Result<State, StateStoreError> {
        (**self).rm(ctx, state, addresses)
    }

    fn import(
        &self,
        ctx: &RunContext,
        state: &State,
        address: &str,
        id: &str,
    ) -> Result<State, StateStoreError> {
        (**self).import(ctx, state, address, id)
    }

    fn plan(&self, ctx: &RunContext, state: &State) -> Result<PlanOutcome, StateStoreError> {
        (**self).plan(ctx, state)
    }
}
