// Copyright (c) 2024-2026 The Meridian Foundation

//! Keychains and multisig owner resolution.
//!
//! A keychain is an ordered set of spend keys. Matching an owner yields the
//! keys that can satisfy its threshold together with each key's position in
//! the owner's sorted address list; those positions become the input's
//! signature indices. When an owner's address is itself a registered
//! multisig alias, matching expands the alias through state, and positions
//! refer to leaves of the canonical depth-first flattening.

use crate::error::BuilderError;
use mrd_core_types::ShortId;
use mrd_crypto_keys::SpendKey;
use mrd_platform_state::{ChainState, StateError};
use mrd_platform_types::OutputOwners;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Hard bound on multisig alias nesting.
///
/// Expansion is worklist-driven with an explicit depth counter, so a deep
/// or cyclic alias graph costs a bounded amount of work and then fails.
pub const MAX_MULTISIG_DEPTH: usize = 16;

/// A successful owner match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeychainMatch {
    /// Positions of the matched keys within the owner's (flattened)
    /// address list, ascending.
    pub sig_indices: Vec<u32>,
    /// The matched keys, ordered to follow `sig_indices`.
    pub keys: Vec<SpendKey>,
}

/// An ordered map from address to spend key.
#[derive(Clone, Debug, Default)]
pub struct Keychain {
    keys: Vec<SpendKey>,
    by_addr: BTreeMap<ShortId, usize>,
}

impl Keychain {
    /// An empty keychain.
    pub fn new() -> Self {
        Self::default()
    }

    /// A keychain holding `keys`, first key wins on duplicate addresses.
    pub fn from_keys(keys: impl IntoIterator<Item = SpendKey>) -> Self {
        let mut keychain = Self::new();
        for key in keys {
            keychain.add(key);
        }
        keychain
    }

    /// Add a key; a key for an already-present address is ignored.
    pub fn add(&mut self, key: SpendKey) {
        let addr = key.address();
        if self.by_addr.contains_key(&addr) {
            return;
        }
        self.by_addr.insert(addr, self.keys.len());
        self.keys.push(key);
    }

    /// Look up the key controlling `addr`.
    pub fn get(&self, addr: &ShortId) -> Option<&SpendKey> {
        self.by_addr.get(addr).map(|&i| &self.keys[i])
    }

    /// The addresses this keychain controls.
    pub fn addresses(&self) -> BTreeSet<ShortId> {
        self.by_addr.keys().copied().collect()
    }

    /// The keys in insertion order.
    pub fn keys(&self) -> &[SpendKey] {
        &self.keys
    }

    /// Whether the keychain holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Match `owners` directly, without alias expansion.
    ///
    /// Returns the first keys satisfying the threshold in address order, or
    /// `None` if the threshold cannot be met or the locktime is in the
    /// future.
    pub fn match_owners(&self, owners: &OutputOwners, now: u64) -> Option<KeychainMatch> {
        if owners.locktime > now {
            return None;
        }
        let mut matched = KeychainMatch::default();
        for (pos, addr) in owners.addrs.iter().enumerate() {
            if matched.keys.len() as u32 == owners.threshold {
                break;
            }
            if let Some(key) = self.get(addr) {
                matched.sig_indices.push(pos as u32);
                matched.keys.push(key.clone());
            }
        }
        (matched.keys.len() as u32 >= owners.threshold).then_some(matched)
    }

    /// Match `owners`, expanding multisig aliases through `state`.
    ///
    /// Fails with `KeyMissing` when the (possibly nested) threshold cannot
    /// be met and `MultisigDepthExceeded` when aliases nest deeper than
    /// [`MAX_MULTISIG_DEPTH`].
    pub fn spend_multisig(
        &self,
        state: &dyn ChainState,
        owners: &OutputOwners,
        now: u64,
    ) -> Result<KeychainMatch, BuilderError> {
        let nodes = expand_aliases(state, owners)?;
        let (satisfied, mut collected) = self.evaluate(&nodes, now);
        if !satisfied {
            return Err(BuilderError::KeyMissing);
        }
        collected.sort_by_key(|(pos, _)| *pos);
        Ok(KeychainMatch {
            sig_indices: collected.iter().map(|(pos, _)| *pos).collect(),
            keys: collected.into_iter().map(|(_, key)| key).collect(),
        })
    }

    // Walk the finished alias tree depth-first, numbering leaves as they
    // are visited and collecting keys until each node's threshold is met.
    fn evaluate(&self, nodes: &[AliasNode], now: u64) -> (bool, Vec<(u32, SpendKey)>) {
        struct Frame {
            node: usize,
            cursor: usize,
            satisfied: u32,
            collected: Vec<(u32, SpendKey)>,
        }

        let mut leaf_pos: u32 = 0;
        let mut stack = vec![Frame {
            node: 0,
            cursor: 0,
            satisfied: 0,
            collected: Vec::new(),
        }];

        loop {
            let frame = stack.last_mut().expect("root frame present until return");
            let node = &nodes[frame.node];

            if frame.cursor < node.children.len() {
                let child = node.children[frame.cursor].clone();
                frame.cursor += 1;
                match child {
                    AliasChild::Leaf(addr) => {
                        let pos = leaf_pos;
                        leaf_pos += 1;
                        if frame.satisfied < node.owners.threshold {
                            if let Some(key) = self.get(&addr) {
                                frame.satisfied += 1;
                                frame.collected.push((pos, key.clone()));
                            }
                        }
                    }
                    AliasChild::Alias(child_node) => stack.push(Frame {
                        node: child_node,
                        cursor: 0,
                        satisfied: 0,
                        collected: Vec::new(),
                    }),
                }
                continue;
            }

            let satisfied =
                frame.satisfied >= node.owners.threshold && node.owners.locktime <= now;
            let collected = std::mem::take(&mut frame.collected);
            stack.pop();

            match stack.last_mut() {
                Some(parent) => {
                    let parent_threshold = nodes[parent.node].owners.threshold;
                    if satisfied && parent.satisfied < parent_threshold {
                        parent.satisfied += 1;
                        parent.collected.extend(collected);
                    }
                }
                None => return (satisfied, collected),
            }
        }
    }
}

#[derive(Clone)]
enum AliasChild {
    Leaf(ShortId),
    Alias(usize),
}

struct AliasNode {
    owners: OutputOwners,
    children: Vec<AliasChild>,
}

// Expand every alias reachable from `owners` into an arena of nodes,
// worklist-driven. Cycles surface as depth overruns.
fn expand_aliases(
    state: &dyn ChainState,
    owners: &OutputOwners,
) -> Result<Vec<AliasNode>, BuilderError> {
    let mut nodes = vec![AliasNode {
        owners: owners.clone(),
        children: Vec::new(),
    }];
    let mut worklist: Vec<(usize, usize)> = vec![(0, 0)];

    while let Some((node_idx, depth)) = worklist.pop() {
        let addrs = nodes[node_idx].owners.addrs.clone();
        let mut children = Vec::with_capacity(addrs.len());
        for addr in addrs {
            match state.get_multisig_alias(&addr) {
                Ok(alias) => {
                    if depth + 1 > MAX_MULTISIG_DEPTH {
                        return Err(BuilderError::MultisigDepthExceeded(MAX_MULTISIG_DEPTH));
                    }
                    let child_idx = nodes.len();
                    nodes.push(AliasNode {
                        owners: alias.owners,
                        children: Vec::new(),
                    });
                    worklist.push((child_idx, depth + 1));
                    children.push(AliasChild::Alias(child_idx));
                }
                Err(StateError::NotFound) => children.push(AliasChild::Leaf(addr)),
                Err(err) => return Err(err.into()),
            }
        }
        nodes[node_idx].children = children;
    }

    Ok(nodes)
}
