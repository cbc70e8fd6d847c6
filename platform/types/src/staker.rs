// Copyright (c) 2024-2026 The Meridian Foundation

use mrd_core_types::{NodeId, ShortId, SubnetId, TxId};
use serde::{Deserialize, Serialize};

/// A validator parked in the deferred set.
///
/// Deferred validators live in a diff-layered index keyed by
/// `(subnet_id, node_id)` and iterate in `(priority, tx_id)` order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staker {
    /// The transaction that added the validator.
    pub tx_id: TxId,
    /// The subnet being validated.
    pub subnet_id: SubnetId,
    /// The validator's node identity.
    pub node_id: NodeId,
    /// Stake weight.
    pub weight: u64,
    /// Unix time validation starts.
    pub start_time: u64,
    /// Unix time validation ends.
    pub end_time: u64,
    /// Where the validator's reward is paid.
    pub reward_address: ShortId,
    /// Queue priority; lower iterates first.
    pub priority: u8,
}

impl Staker {
    /// The identity key the deferred index is keyed by.
    pub fn key(&self) -> (SubnetId, NodeId) {
        (self.subnet_id, self.node_id)
    }

    /// The iteration order key.
    pub fn sort_key(&self) -> (u8, TxId) {
        (self.priority, self.tx_id)
    }
}
