// Copyright (c) 2024-2026 The Meridian Foundation

use crate::chain::{ChainConfig, ChainState, StakerIterator, State};
use crate::error::{StateError, StateResult};
use mrd_core_types::{NodeId, OfferId, OwnerId, ShortId, SubnetId, TxId};
use mrd_platform_types::{
    AddressState, Claimable, Deposit, DepositOffer, LockState, MultisigAlias, ShortLinkKey,
    Staker, Utxo, UtxoId,
};
use std::collections::{BTreeMap, BTreeSet};

/// An in-memory base [`State`].
///
/// Holds the full setter/getter surface diffs apply onto, with the
/// secondary indexes the read paths need (owner address → UTXO ids,
/// deposit end time → deposit ids). Serves tests and genesis tooling;
/// a persistent deployment implements [`State`] over its store instead.
#[derive(Clone, Debug, Default)]
pub struct MemState {
    config: ChainConfig,
    timestamp: u64,

    utxos: BTreeMap<UtxoId, Utxo>,
    address_index: BTreeMap<ShortId, BTreeSet<UtxoId>>,
    address_states: BTreeMap<ShortId, AddressState>,
    deposit_offers: BTreeMap<OfferId, DepositOffer>,
    deposits: BTreeMap<TxId, Deposit>,
    deposits_by_end_time: BTreeMap<u64, BTreeSet<TxId>>,
    multisig_aliases: BTreeMap<ShortId, MultisigAlias>,
    short_links: BTreeMap<(ShortId, ShortLinkKey), ShortId>,
    claimables: BTreeMap<OwnerId, Claimable>,
    not_distributed_validator_reward: u64,
    deferred_validators: BTreeMap<(SubnetId, NodeId), Staker>,
}

impl MemState {
    /// An empty state carrying `config`.
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the chain time.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    fn index_utxo(&mut self, utxo: &Utxo) {
        for addr in &utxo.out.owners().addrs {
            self.address_index
                .entry(*addr)
                .or_default()
                .insert(utxo.utxo_id);
        }
    }

    fn unindex_utxo(&mut self, utxo: &Utxo) {
        for addr in &utxo.out.owners().addrs {
            if let Some(ids) = self.address_index.get_mut(addr) {
                ids.remove(&utxo.utxo_id);
                if ids.is_empty() {
                    self.address_index.remove(addr);
                }
            }
        }
    }
}

impl ChainState for MemState {
    fn chain_config(&self) -> StateResult<ChainConfig> {
        Ok(self.config)
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn get_utxo(&self, utxo_id: &UtxoId) -> StateResult<Utxo> {
        self.utxos.get(utxo_id).cloned().ok_or(StateError::NotFound)
    }

    fn utxos(&self, addresses: &BTreeSet<ShortId>) -> StateResult<Vec<Utxo>> {
        let mut ids: BTreeSet<UtxoId> = BTreeSet::new();
        for addr in addresses {
            if let Some(owned) = self.address_index.get(addr) {
                ids.extend(owned.iter().copied());
            }
        }
        Ok(ids
            .into_iter()
            .filter_map(|id| self.utxos.get(&id).cloned())
            .collect())
    }

    fn locked_utxos(
        &self,
        tx_ids: &BTreeSet<TxId>,
        addresses: &BTreeSet<ShortId>,
        lock_state: LockState,
    ) -> StateResult<Vec<Utxo>> {
        let matches = |utxo: &Utxo| {
            utxo.out.lock_ids().match_state(lock_state, tx_ids)
                && (addresses.is_empty()
                    || utxo
                        .out
                        .owners()
                        .addrs
                        .iter()
                        .any(|addr| addresses.contains(addr)))
        };
        Ok(self.utxos.values().filter(|u| matches(u)).cloned().collect())
    }

    fn get_address_states(&self, address: &ShortId) -> StateResult<AddressState> {
        Ok(self
            .address_states
            .get(address)
            .copied()
            .unwrap_or(AddressState::EMPTY))
    }

    fn get_deposit_offer(&self, offer_id: &OfferId) -> StateResult<DepositOffer> {
        self.deposit_offers
            .get(offer_id)
            .cloned()
            .ok_or(StateError::NotFound)
    }

    fn all_deposit_offers(&self) -> StateResult<Vec<DepositOffer>> {
        Ok(self.deposit_offers.values().cloned().collect())
    }

    fn get_deposit(&self, deposit_tx_id: &TxId) -> StateResult<Deposit> {
        self.deposits
            .get(deposit_tx_id)
            .cloned()
            .ok_or(StateError::NotFound)
    }

    fn get_next_to_unlock_deposit_ids_and_time(
        &self,
        excluded: &BTreeSet<TxId>,
    ) -> StateResult<(Vec<TxId>, u64)> {
        for (end_time, ids) in &self.deposits_by_end_time {
            let remaining: Vec<TxId> = ids
                .iter()
                .filter(|id| !excluded.contains(*id))
                .copied()
                .collect();
            if !remaining.is_empty() {
                return Ok((remaining, *end_time));
            }
        }
        Err(StateError::NotFound)
    }

    fn get_multisig_alias(&self, alias: &ShortId) -> StateResult<MultisigAlias> {
        self.multisig_aliases
            .get(alias)
            .cloned()
            .ok_or(StateError::NotFound)
    }

    fn get_short_id_link(&self, id: &ShortId, key: ShortLinkKey) -> StateResult<ShortId> {
        self.short_links
            .get(&(*id, key))
            .copied()
            .ok_or(StateError::NotFound)
    }

    fn get_claimable(&self, owner_id: &OwnerId) -> StateResult<Claimable> {
        self.claimables
            .get(owner_id)
            .cloned()
            .ok_or(StateError::NotFound)
    }

    fn get_not_distributed_validator_reward(&self) -> StateResult<u64> {
        Ok(self.not_distributed_validator_reward)
    }

    fn get_deferred_validator(
        &self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
    ) -> StateResult<Staker> {
        self.deferred_validators
            .get(&(*subnet_id, *node_id))
            .cloned()
            .ok_or(StateError::NotFound)
    }

    fn deferred_staker_iterator(&self) -> StateResult<StakerIterator> {
        let mut stakers: Vec<Staker> = self.deferred_validators.values().cloned().collect();
        stakers.sort_by_key(|staker| staker.sort_key());
        Ok(Box::new(stakers.into_iter()))
    }
}

impl State for MemState {
    fn put_utxo(&mut self, utxo: Utxo) {
        if let Some(previous) = self.utxos.get(&utxo.utxo_id).cloned() {
            self.unindex_utxo(&previous);
        }
        self.index_utxo(&utxo);
        self.utxos.insert(utxo.utxo_id, utxo);
    }

    fn delete_utxo(&mut self, utxo_id: &UtxoId) {
        if let Some(utxo) = self.utxos.remove(utxo_id) {
            self.unindex_utxo(&utxo);
        }
    }

    fn set_address_states(&mut self, address: ShortId, states: AddressState) {
        if states.is_empty() {
            self.address_states.remove(&address);
        } else {
            self.address_states.insert(address, states);
        }
    }

    fn set_deposit_offer(&mut self, offer: DepositOffer) {
        self.deposit_offers.insert(offer.id, offer);
    }

    fn add_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit) {
        self.deposits_by_end_time
            .entry(deposit.end_time())
            .or_default()
            .insert(deposit_tx_id);
        self.deposits.insert(deposit_tx_id, deposit);
    }

    fn modify_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit) {
        // start and duration are immutable, so the end-time index entry
        // stays where it is
        self.deposits.insert(deposit_tx_id, deposit);
    }

    fn remove_deposit(&mut self, deposit_tx_id: TxId, deposit: &Deposit) {
        self.deposits.remove(&deposit_tx_id);
        if let Some(ids) = self.deposits_by_end_time.get_mut(&deposit.end_time()) {
            ids.remove(&deposit_tx_id);
            if ids.is_empty() {
                self.deposits_by_end_time.remove(&deposit.end_time());
            }
        }
    }

    fn set_multisig_alias(&mut self, alias_id: ShortId, alias: Option<MultisigAlias>) {
        match alias {
            Some(alias) => {
                self.multisig_aliases.insert(alias_id, alias);
            }
            None => {
                self.multisig_aliases.remove(&alias_id);
            }
        }
    }

    fn set_short_id_link(&mut self, id: ShortId, key: ShortLinkKey, link: Option<ShortId>) {
        match link {
            Some(target) => {
                self.short_links.insert((id, key), target);
            }
            None => {
                self.short_links.remove(&(id, key));
            }
        }
    }

    fn set_claimable(&mut self, owner_id: OwnerId, claimable: Option<Claimable>) {
        match claimable {
            Some(claimable) => {
                self.claimables.insert(owner_id, claimable);
            }
            None => {
                self.claimables.remove(&owner_id);
            }
        }
    }

    fn set_not_distributed_validator_reward(&mut self, reward: u64) {
        self.not_distributed_validator_reward = reward;
    }

    fn put_deferred_validator(&mut self, staker: Staker) {
        self.deferred_validators.insert(staker.key(), staker);
    }

    fn delete_deferred_validator(&mut self, subnet_id: &SubnetId, node_id: &NodeId) {
        self.deferred_validators.remove(&(*subnet_id, *node_id));
    }
}
