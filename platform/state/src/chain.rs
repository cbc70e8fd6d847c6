// Copyright (c) 2024-2026 The Meridian Foundation

use crate::diff::Diff;
use crate::error::StateResult;
use mrd_core_types::{NodeId, OfferId, OwnerId, ShortId, SubnetId, TxId};
use mrd_platform_types::{
    AddressState, Claimable, Deposit, DepositOffer, LockState, MultisigAlias, ShortLinkKey,
    Staker, Utxo, UtxoId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-network genesis flags, stored in base state and read through the
/// diff chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Whether staking locks value in place as bond/deposit outputs rather
    /// than consuming it into stake.
    pub lock_mode_bond_deposit: bool,
    /// Whether validator-affecting transactions must carry the node's own
    /// signature.
    pub verify_node_signature: bool,
}

/// An owned iterator over deferred validators in `(priority, tx_id)` order.
pub type StakerIterator = Box<dyn Iterator<Item = Staker> + Send>;

/// The read surface shared by the base state and every diff layered above
/// it.
pub trait ChainState: Send + Sync {
    /// The per-network genesis flags.
    fn chain_config(&self) -> StateResult<ChainConfig>;

    /// The chain time of this state version.
    fn timestamp(&self) -> u64;

    /// Look up a single UTXO.
    fn get_utxo(&self, utxo_id: &UtxoId) -> StateResult<Utxo>;

    /// All UTXOs spendable by any of `addresses`, sorted by UTXO id.
    fn utxos(&self, addresses: &BTreeSet<ShortId>) -> StateResult<Vec<Utxo>>;

    /// UTXOs in `lock_state` whose matching lock ids are in `tx_ids`,
    /// optionally restricted to owners intersecting `addresses` (an empty
    /// set means no restriction).
    fn locked_utxos(
        &self,
        tx_ids: &BTreeSet<TxId>,
        addresses: &BTreeSet<ShortId>,
        lock_state: LockState,
    ) -> StateResult<Vec<Utxo>>;

    /// The role flags of `address`; empty if never set.
    fn get_address_states(&self, address: &ShortId) -> StateResult<AddressState>;

    /// Look up a deposit offer by id, locked or not.
    fn get_deposit_offer(&self, offer_id: &OfferId) -> StateResult<DepositOffer>;

    /// Every known deposit offer, including locked ones.
    fn all_deposit_offers(&self) -> StateResult<Vec<DepositOffer>>;

    /// Look up a deposit by the transaction that created it.
    fn get_deposit(&self, deposit_tx_id: &TxId) -> StateResult<Deposit>;

    /// The deposit ids sharing the minimum end time, ignoring `excluded`,
    /// sorted ascending, together with that end time. `NotFound` when the
    /// effective set is empty.
    fn get_next_to_unlock_deposit_ids_and_time(
        &self,
        excluded: &BTreeSet<TxId>,
    ) -> StateResult<(Vec<TxId>, u64)>;

    /// Look up a multisig alias by its address.
    fn get_multisig_alias(&self, alias: &ShortId) -> StateResult<MultisigAlias>;

    /// Resolve a short-id link.
    fn get_short_id_link(&self, id: &ShortId, key: ShortLinkKey) -> StateResult<ShortId>;

    /// Look up accrued reward for an owner hash.
    fn get_claimable(&self, owner_id: &OwnerId) -> StateResult<Claimable>;

    /// Validator reward accrued but not yet attributed to any owner.
    fn get_not_distributed_validator_reward(&self) -> StateResult<u64>;

    /// Look up a deferred validator.
    fn get_deferred_validator(
        &self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
    ) -> StateResult<Staker>;

    /// Iterate deferred validators in `(priority, tx_id)` order.
    fn deferred_staker_iterator(&self) -> StateResult<StakerIterator>;

    /// Downcast hook letting a diff walk its parent chain without dynamic
    /// type machinery. The base state keeps the default.
    fn as_diff(&self) -> Option<&Diff> {
        None
    }
}

/// The write surface of the base state, the target of [`Diff::apply`].
///
/// Removal-style setters take the applied value where the base state needs
/// it to maintain secondary indexes.
pub trait State: ChainState {
    /// Insert or replace a UTXO.
    fn put_utxo(&mut self, utxo: Utxo);

    /// Remove a UTXO.
    fn delete_utxo(&mut self, utxo_id: &UtxoId);

    /// Set the role flags of `address`.
    fn set_address_states(&mut self, address: ShortId, states: AddressState);

    /// Insert or replace a deposit offer.
    fn set_deposit_offer(&mut self, offer: DepositOffer);

    /// Record a new deposit.
    fn add_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit);

    /// Replace a running deposit after a claim or partial unlock.
    fn modify_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit);

    /// Remove a fully unlocked deposit.
    fn remove_deposit(&mut self, deposit_tx_id: TxId, deposit: &Deposit);

    /// Insert, replace or remove a multisig alias.
    fn set_multisig_alias(&mut self, alias_id: ShortId, alias: Option<MultisigAlias>);

    /// Insert, replace or remove a short-id link.
    fn set_short_id_link(&mut self, id: ShortId, key: ShortLinkKey, link: Option<ShortId>);

    /// Insert, replace or remove an owner's claimable.
    fn set_claimable(&mut self, owner_id: OwnerId, claimable: Option<Claimable>);

    /// Set the not-yet-attributed validator reward.
    fn set_not_distributed_validator_reward(&mut self, reward: u64);

    /// Insert or replace a deferred validator.
    fn put_deferred_validator(&mut self, staker: Staker);

    /// Remove a deferred validator.
    fn delete_deferred_validator(&mut self, subnet_id: &SubnetId, node_id: &NodeId);
}
