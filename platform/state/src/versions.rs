// Copyright (c) 2024-2026 The Meridian Foundation

use crate::chain::ChainState;
use mrd_core_types::BlockId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of concurrently-live state versions: the base state plus every
/// frozen diff awaiting acceptance.
///
/// Once `get_state` resolves an id, the returned state stays valid for as
/// long as the caller holds it; deleting an id only unregisters it for
/// future lookups.
#[derive(Default)]
pub struct StateVersions {
    states: RwLock<HashMap<BlockId, Arc<dyn ChainState>>>,
}

impl std::fmt::Debug for StateVersions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateVersions").finish_non_exhaustive()
    }
}

impl StateVersions {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a state version by block id.
    pub fn get_state(&self, id: &BlockId) -> Option<Arc<dyn ChainState>> {
        self.states
            .read()
            .expect("state registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Register a state version under `id`, replacing any previous entry.
    pub fn set_state(&self, id: BlockId, state: Arc<dyn ChainState>) {
        self.states
            .write()
            .expect("state registry lock poisoned")
            .insert(id, state);
    }

    /// Unregister a state version.
    pub fn delete_state(&self, id: &BlockId) {
        self.states
            .write()
            .expect("state registry lock poisoned")
            .remove(id);
    }
}
