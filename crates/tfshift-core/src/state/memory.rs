//! In-memory state store.
//!
//! Snapshots are JSON documents listing `(address, id)` pairs in state
//! order. Used for dry runs and tests.

use super::{PlanOutcome, RunContext, State, StateStore};
use crate::error::StateStoreError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A single resource in a memory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryResource {
    /// Resource address.
    pub address: String,
    /// Provider-side object ID.
    pub id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemorySnapshot {
    resources: Vec<MemoryResource>,
}

impl MemorySnapshot {
    fn decode(state: &State) -> Result<Self, StateStoreError> {
        if state.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(state.bytes())
            .map_err(|e| StateStoreError::InvalidState(e.to_string()))
    }

    fn encode(&self) -> Result<State, StateStoreError> {
        serde_json::to_vec(self)
            .map(State::new)
            .map_err(|e| StateStoreError::InvalidState(e.to_string()))
    }

    fn position(&self, address: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.address == address)
    }
}

/// State store that keeps the current state in memory.
pub struct MemoryStateStore {
    current: Mutex<State>,
    plan_outcome: PlanOutcome,
    push_count: Mutex<usize>,
}

impl MemoryStateStore {
    /// Create a store whose state contains the given addresses.
    ///
    /// Each resource gets a synthetic ID derived from its position.
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resources = addresses
            .into_iter()
            .enumerate()
            .map(|(i, address)| MemoryResource {
                address: address.into(),
                id: format!("id-{}", i),
            })
            .collect();
        Self::with_resources(resources)
    }

    /// Create a store from explicit resources.
    pub fn with_resources(resources: Vec<MemoryResource>) -> Self {
        let snapshot = MemorySnapshot { resources };
        let state = snapshot.encode().unwrap_or_else(|_| State::new(Vec::new()));
        Self {
            current: Mutex::new(state),
            plan_outcome: PlanOutcome::NoChanges,
            push_count: Mutex::new(0),
        }
    }

    /// Set the outcome reported by [`StateStore::plan`].
    pub fn with_plan_outcome(mut self, outcome: PlanOutcome) -> Self {
        self.plan_outcome = outcome;
        self
    }

    /// Addresses in the current (pushed) state.
    pub fn addresses(&self) -> Vec<String> {
        Self::addresses_of(&self.current.lock())
    }

    /// Resources in the current (pushed) state.
    pub fn resources(&self) -> Vec<MemoryResource> {
        MemorySnapshot::decode(&self.current.lock())
            .map(|s| s.resources)
            .unwrap_or_default()
    }

    /// Addresses in an arbitrary snapshot produced by this store.
    pub fn addresses_of(state: &State) -> Vec<String> {
        MemorySnapshot::decode(state)
            .map(|s| s.resources.into_iter().map(|r| r.address).collect())
            .unwrap_or_default()
    }

    /// Number of successful pushes.
    pub fn push_count(&self) -> usize {
        *self.push_count.lock()
    }
}

impl StateStore for MemoryStateStore {
    fn pull(&self, ctx: &RunContext) -> Result<State, StateStoreError> {
        ctx.check()?;
        Ok(self.current.lock().clone())
    }

    fn push(&self, ctx: &RunContext, state: &State) -> Result<(), StateStoreError> {
        ctx.check()?;
        // Reject garbage before it replaces the current state.
        MemorySnapshot::decode(state)?;
        *self.current.lock() = state.clone();
        *self.push_count.lock() += 1;
        Ok(())
    }

    fn list(&self, ctx: &RunContext, state: &State) -> Result<Vec<String>, StateStoreError> {
        ctx.check()?;
        let snapshot = MemorySnapshot::decode(state)?;
        Ok(snapshot.resources.into_iter().map(|r| r.address).collect())
    }

    fn mv(
        &self,
        ctx: &RunContext,
        state: &State,
        source: &str,
        destination: &str,
    ) -> Result<State, StateStoreError> {
        ctx.check()?;
        let mut snapshot = MemorySnapshot::decode(state)?;
        let idx = snapshot
            .position(source)
            .ok_or_else(|| StateStoreError::AddressNotFound {
                address: source.to_string(),
            })?;
        if snapshot.position(destination).is_some() {
            return Err(StateStoreError::AddressExists {
                address: destination.to_string(),
            });
        }
        snapshot.resources[idx].address = destination.to_string();
        snapshot.encode()
    }

    fn rm(
        &self,
        ctx: &RunContext,
        state: &State,
        addresses: &[String],
    ) -> Result<State, StateStoreError> {
        ctx.check()?;
        let mut snapshot = MemorySnapshot::decode(state)?;
        for address in addresses {
            let idx = snapshot
                .position(address)
                .ok_or_else(|| StateStoreError::AddressNotFound {
                    address: address.clone(),
                })?;
            snapshot.resources.remove(idx);
        }
        snapshot.encode()
    }

    fn import(
        &self,
        ctx: &RunContext,
        state: &State,
        address: &str,
        id: &str,
    ) -> Result<State, StateStoreError> {
        ctx.check()?;
        let mut snapshot = MemorySnapshot::decode(state)?;
        if snapshot.position(address).is_some() {
            return Err(StateStoreError::AddressExists {
                address: address.to_string(),
            });
        }
        snapshot.resources.push(MemoryResource {
            address: address.to_string(),
            id: id.to_string(),
        });
        snapshot.encode()
    }

    fn plan(&self, ctx: &RunContext, state: &State) -> Result<PlanOutcome, StateStoreError> {
        ctx.check()?;
        MemorySnapshot::decode(state)?;
        Ok(self.plan_outcome)
    }
}
