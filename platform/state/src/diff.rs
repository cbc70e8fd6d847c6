// Copyright (c) 2024-2026 The Meridian Foundation

use crate::chain::{ChainConfig, ChainState, StakerIterator, State};
use crate::error::{StateError, StateResult};
use crate::stakers::MergedStakerIterator;
use crate::versions::StateVersions;
use mrd_core_types::{BlockId, NodeId, OfferId, OwnerId, ShortId, SubnetId, TxId};
use mrd_platform_types::{
    AddressState, Claimable, Deposit, DepositOffer, LockState, MultisigAlias, ShortLinkKey,
    Staker, Utxo, UtxoId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum DepositDiff {
    Added(Deposit),
    Modified(Deposit),
    Removed(Deposit),
}

#[derive(Clone, Debug)]
enum StakerDiff {
    Put(Staker),
    Delete(Staker),
}

/// A block's modification set over a parent state.
///
/// Every getter consults the diff's own modifications first; a tombstone
/// short-circuits to `NotFound`, anything else falls through to the parent
/// resolved via [`StateVersions`]. Scalar reads walk the parent chain
/// iteratively, so a long run of speculative blocks cannot grow the stack.
#[derive(Debug)]
pub struct Diff {
    parent_id: BlockId,
    versions: Arc<StateVersions>,
    timestamp: u64,

    modified_utxos: BTreeMap<UtxoId, Option<Utxo>>,
    modified_address_states: BTreeMap<ShortId, AddressState>,
    modified_deposit_offers: BTreeMap<OfferId, DepositOffer>,
    modified_deposits: BTreeMap<TxId, DepositDiff>,
    modified_multisig_aliases: BTreeMap<ShortId, Option<MultisigAlias>>,
    modified_short_links: BTreeMap<(ShortId, ShortLinkKey), Option<ShortId>>,
    modified_claimables: BTreeMap<OwnerId, Option<Claimable>>,
    modified_not_distributed_validator_reward: Option<u64>,
    deferred_staker_diffs: BTreeMap<(SubnetId, NodeId), StakerDiff>,
}

impl Diff {
    /// A fresh diff over the state registered as `parent_id`.
    ///
    /// Fails with `MissingParentState` if the parent is not registered; the
    /// chain timestamp is captured from the parent at creation.
    pub fn new(parent_id: BlockId, versions: &Arc<StateVersions>) -> StateResult<Self> {
        let parent = versions
            .get_state(&parent_id)
            .ok_or(StateError::MissingParentState(parent_id))?;
        Ok(Self {
            parent_id,
            versions: Arc::clone(versions),
            timestamp: parent.timestamp(),
            modified_utxos: BTreeMap::new(),
            modified_address_states: BTreeMap::new(),
            modified_deposit_offers: BTreeMap::new(),
            modified_deposits: BTreeMap::new(),
            modified_multisig_aliases: BTreeMap::new(),
            modified_short_links: BTreeMap::new(),
            modified_claimables: BTreeMap::new(),
            modified_not_distributed_validator_reward: None,
            deferred_staker_diffs: BTreeMap::new(),
        })
    }

    /// The parent this diff overlays.
    pub fn parent_id(&self) -> BlockId {
        self.parent_id
    }

    fn parent(&self) -> StateResult<Arc<dyn ChainState>> {
        self.versions
            .get_state(&self.parent_id)
            .ok_or(StateError::MissingParentState(self.parent_id))
    }

    // Walk the diff chain iteratively: consult each layer's own
    // modifications, dropping to the base state for unmodified keys.
    fn resolve<T>(
        &self,
        read_own: impl Fn(&Diff) -> Option<StateResult<T>>,
        read_base: impl Fn(&dyn ChainState) -> StateResult<T>,
    ) -> StateResult<T> {
        if let Some(result) = read_own(self) {
            return result;
        }
        let mut current = self.parent()?;
        loop {
            let next = match current.as_diff() {
                Some(diff) => {
                    if let Some(result) = read_own(diff) {
                        return result;
                    }
                    diff.parent()?
                }
                None => return read_base(current.as_ref()),
            };
            current = next;
        }
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// Record a created or replaced UTXO.
    pub fn put_utxo(&mut self, utxo: Utxo) {
        self.modified_utxos.insert(utxo.utxo_id, Some(utxo));
    }

    /// Record a consumed UTXO.
    pub fn delete_utxo(&mut self, utxo_id: UtxoId) {
        self.modified_utxos.insert(utxo_id, None);
    }

    /// Set an address's role flags.
    pub fn set_address_states(&mut self, address: ShortId, states: AddressState) {
        self.modified_address_states.insert(address, states);
    }

    /// Insert or replace a deposit offer.
    pub fn set_deposit_offer(&mut self, offer: DepositOffer) {
        self.modified_deposit_offers.insert(offer.id, offer);
    }

    /// Record a deposit created in this block.
    pub fn add_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit) {
        self.modified_deposits
            .insert(deposit_tx_id, DepositDiff::Added(deposit));
    }

    /// Record a claim or partial unlock against a running deposit.
    pub fn modify_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit) {
        self.modified_deposits
            .insert(deposit_tx_id, DepositDiff::Modified(deposit));
    }

    /// Record a fully unlocked deposit.
    pub fn remove_deposit(&mut self, deposit_tx_id: TxId, deposit: Deposit) {
        self.modified_deposits
            .insert(deposit_tx_id, DepositDiff::Removed(deposit));
    }

    /// Insert, replace or tombstone a multisig alias.
    pub fn set_multisig_alias(&mut self, alias_id: ShortId, alias: Option<MultisigAlias>) {
        self.modified_multisig_aliases.insert(alias_id, alias);
    }

    /// Insert, replace or tombstone a short-id link.
    pub fn set_short_id_link(&mut self, id: ShortId, key: ShortLinkKey, link: Option<ShortId>) {
        self.modified_short_links.insert((id, key), link);
    }

    /// Insert, replace or tombstone an owner's claimable.
    pub fn set_claimable(&mut self, owner_id: OwnerId, claimable: Option<Claimable>) {
        self.modified_claimables.insert(owner_id, claimable);
    }

    /// Set the not-yet-attributed validator reward.
    pub fn set_not_distributed_validator_reward(&mut self, reward: u64) {
        self.modified_not_distributed_validator_reward = Some(reward);
    }

    /// Park a validator in the deferred set.
    pub fn put_deferred_validator(&mut self, staker: Staker) {
        self.deferred_staker_diffs
            .insert(staker.key(), StakerDiff::Put(staker));
    }

    /// Remove a validator from the deferred set.
    pub fn delete_deferred_validator(&mut self, staker: Staker) {
        self.deferred_staker_diffs
            .insert(staker.key(), StakerDiff::Delete(staker));
    }

    // ------------------------------------------------------------------
    // Apply
    // ------------------------------------------------------------------

    /// Write every pending modification onto the base state.
    ///
    /// Called once per accepted block; calling it again writes the same
    /// final values, so a replayed apply is observationally a no-op.
    pub fn apply(&self, base: &mut dyn State) {
        if let Some(reward) = self.modified_not_distributed_validator_reward {
            base.set_not_distributed_validator_reward(reward);
        }

        for (address, states) in &self.modified_address_states {
            base.set_address_states(*address, *states);
        }

        for offer in self.modified_deposit_offers.values() {
            base.set_deposit_offer(offer.clone());
        }

        for (deposit_tx_id, change) in &self.modified_deposits {
            match change {
                DepositDiff::Added(deposit) => base.add_deposit(*deposit_tx_id, deposit.clone()),
                DepositDiff::Modified(deposit) => {
                    base.modify_deposit(*deposit_tx_id, deposit.clone())
                }
                DepositDiff::Removed(deposit) => base.remove_deposit(*deposit_tx_id, deposit),
            }
        }

        for (alias_id, alias) in &self.modified_multisig_aliases {
            base.set_multisig_alias(*alias_id, alias.clone());
        }

        for ((id, key), link) in &self.modified_short_links {
            base.set_short_id_link(*id, *key, *link);
        }

        for (owner_id, claimable) in &self.modified_claimables {
            base.set_claimable(*owner_id, claimable.clone());
        }

        for change in self.deferred_staker_diffs.values() {
            match change {
                StakerDiff::Put(staker) => base.put_deferred_validator(staker.clone()),
                StakerDiff::Delete(staker) => {
                    base.delete_deferred_validator(&staker.subnet_id, &staker.node_id)
                }
            }
        }

        for (utxo_id, modified) in &self.modified_utxos {
            match modified {
                Some(utxo) => base.put_utxo(utxo.clone()),
                None => base.delete_utxo(utxo_id),
            }
        }

        tracing::debug!(
            parent = %self.parent_id,
            utxos = self.modified_utxos.len(),
            deposits = self.modified_deposits.len(),
            claimables = self.modified_claimables.len(),
            "applied block diff to base state"
        );
    }

    fn owner_intersects(utxo: &Utxo, addresses: &BTreeSet<ShortId>) -> bool {
        addresses.is_empty()
            || utxo
                .out
                .owners()
                .addrs
                .iter()
                .any(|addr| addresses.contains(addr))
    }
}

impl ChainState for Diff {
    fn chain_config(&self) -> StateResult<ChainConfig> {
        self.resolve(|_| None, |base| base.chain_config())
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn get_utxo(&self, utxo_id: &UtxoId) -> StateResult<Utxo> {
        self.resolve(
            |diff| {
                diff.modified_utxos
                    .get(utxo_id)
                    .map(|modified| modified.clone().ok_or(StateError::NotFound))
            },
            |base| base.get_utxo(utxo_id),
        )
    }

    fn utxos(&self, addresses: &BTreeSet<ShortId>) -> StateResult<Vec<Utxo>> {
        let parent_utxos = self.parent()?.utxos(addresses)?;

        let mut remaining: BTreeSet<UtxoId> = self.modified_utxos.keys().copied().collect();
        let mut result = Vec::with_capacity(parent_utxos.len());
        for utxo in parent_utxos {
            match self.modified_utxos.get(&utxo.utxo_id) {
                None => result.push(utxo),
                Some(modified) => {
                    remaining.remove(&utxo.utxo_id);
                    if let Some(updated) = modified {
                        result.push(updated.clone());
                    }
                }
            }
        }

        for utxo_id in remaining {
            if let Some(Some(utxo)) = self.modified_utxos.get(&utxo_id) {
                if Self::owner_intersects(utxo, addresses) {
                    result.push(utxo.clone());
                }
            }
        }

        result.sort_by_key(|utxo| utxo.utxo_id);
        Ok(result)
    }

    fn locked_utxos(
        &self,
        tx_ids: &BTreeSet<TxId>,
        addresses: &BTreeSet<ShortId>,
        lock_state: LockState,
    ) -> StateResult<Vec<Utxo>> {
        let parent_utxos = self.parent()?.locked_utxos(tx_ids, addresses, lock_state)?;

        let mut remaining: BTreeSet<UtxoId> = self.modified_utxos.keys().copied().collect();
        let mut result = Vec::with_capacity(parent_utxos.len());
        for utxo in parent_utxos {
            match self.modified_utxos.get(&utxo.utxo_id) {
                None => result.push(utxo),
                Some(modified) => {
                    remaining.remove(&utxo.utxo_id);
                    if let Some(updated) = modified {
                        result.push(updated.clone());
                    }
                }
            }
        }

        for utxo_id in remaining {
            if let Some(Some(utxo)) = self.modified_utxos.get(&utxo_id) {
                if utxo.out.lock_ids().match_state(lock_state, tx_ids)
                    && Self::owner_intersects(utxo, addresses)
                {
                    result.push(utxo.clone());
                }
            }
        }

        Ok(result)
    }

    fn get_address_states(&self, address: &ShortId) -> StateResult<AddressState> {
        self.resolve(
            |diff| diff.modified_address_states.get(address).copied().map(Ok),
            |base| base.get_address_states(address),
        )
    }

    fn get_deposit_offer(&self, offer_id: &OfferId) -> StateResult<DepositOffer> {
        self.resolve(
            |diff| diff.modified_deposit_offers.get(offer_id).cloned().map(Ok),
            |base| base.get_deposit_offer(offer_id),
        )
    }

    fn all_deposit_offers(&self) -> StateResult<Vec<DepositOffer>> {
        let parent_offers = self.parent()?.all_deposit_offers()?;

        let mut offers: Vec<DepositOffer> =
            self.modified_deposit_offers.values().cloned().collect();
        for offer in parent_offers {
            if !self.modified_deposit_offers.contains_key(&offer.id) {
                offers.push(offer);
            }
        }
        Ok(offers)
    }

    fn get_deposit(&self, deposit_tx_id: &TxId) -> StateResult<Deposit> {
        self.resolve(
            |diff| {
                diff.modified_deposits.get(deposit_tx_id).map(|change| match change {
                    DepositDiff::Removed(_) => Err(StateError::NotFound),
                    DepositDiff::Added(deposit) | DepositDiff::Modified(deposit) => {
                        Ok(deposit.clone())
                    }
                })
            },
            |base| base.get_deposit(deposit_tx_id),
        )
    }

    fn get_next_to_unlock_deposit_ids_and_time(
        &self,
        excluded: &BTreeSet<TxId>,
    ) -> StateResult<(Vec<TxId>, u64)> {
        let mut excluded = excluded.clone();
        for (deposit_tx_id, change) in &self.modified_deposits {
            if matches!(change, DepositDiff::Removed(_)) {
                excluded.insert(*deposit_tx_id);
            }
        }

        let (parent_ids, parent_time) =
            match self.parent()?.get_next_to_unlock_deposit_ids_and_time(&excluded) {
                Ok(answer) => answer,
                Err(StateError::NotFound) => (Vec::new(), u64::MAX),
                Err(err) => return Err(err),
            };

        // earliest end time across the parent's answer and deposits added
        // by this diff
        let mut next_time = parent_time;
        for (deposit_tx_id, change) in &self.modified_deposits {
            if let DepositDiff::Added(deposit) = change {
                if !excluded.contains(deposit_tx_id) && deposit.end_time() < next_time {
                    next_time = deposit.end_time();
                }
            }
        }

        if next_time == u64::MAX {
            return Err(StateError::NotFound);
        }

        let mut next_ids = if parent_time == next_time {
            parent_ids
        } else {
            Vec::new()
        };

        let mut appended = false;
        for (deposit_tx_id, change) in &self.modified_deposits {
            if let DepositDiff::Added(deposit) = change {
                if !excluded.contains(deposit_tx_id) && deposit.end_time() == next_time {
                    next_ids.push(*deposit_tx_id);
                    appended = true;
                }
            }
        }
        if appended {
            next_ids.sort_unstable();
        }

        Ok((next_ids, next_time))
    }

    fn get_multisig_alias(&self, alias: &ShortId) -> StateResult<MultisigAlias> {
        self.resolve(
            |diff| {
                diff.modified_multisig_aliases
                    .get(alias)
                    .map(|modified| modified.clone().ok_or(StateError::NotFound))
            },
            |base| base.get_multisig_alias(alias),
        )
    }

    fn get_short_id_link(&self, id: &ShortId, key: ShortLinkKey) -> StateResult<ShortId> {
        self.resolve(
            |diff| {
                diff.modified_short_links
                    .get(&(*id, key))
                    .map(|modified| (*modified).ok_or(StateError::NotFound))
            },
            |base| base.get_short_id_link(id, key),
        )
    }

    fn get_claimable(&self, owner_id: &OwnerId) -> StateResult<Claimable> {
        self.resolve(
            |diff| {
                diff.modified_claimables
                    .get(owner_id)
                    .map(|modified| modified.clone().ok_or(StateError::NotFound))
            },
            |base| base.get_claimable(owner_id),
        )
    }

    fn get_not_distributed_validator_reward(&self) -> StateResult<u64> {
        self.resolve(
            |diff| diff.modified_not_distributed_validator_reward.map(Ok),
            |base| base.get_not_distributed_validator_reward(),
        )
    }

    fn get_deferred_validator(
        &self,
        subnet_id: &SubnetId,
        node_id: &NodeId,
    ) -> StateResult<Staker> {
        self.resolve(
            |diff| {
                diff.deferred_staker_diffs
                    .get(&(*subnet_id, *node_id))
                    .map(|change| match change {
                        StakerDiff::Put(staker) => Ok(staker.clone()),
                        StakerDiff::Delete(_) => Err(StateError::NotFound),
                    })
            },
            |base| base.get_deferred_validator(subnet_id, node_id),
        )
    }

    fn deferred_staker_iterator(&self) -> StateResult<StakerIterator> {
        let parent_iterator = self.parent()?.deferred_staker_iterator()?;

        let mut puts: Vec<Staker> = Vec::new();
        let mut deleted: BTreeSet<(SubnetId, NodeId)> = BTreeSet::new();
        for change in self.deferred_staker_diffs.values() {
            match change {
                StakerDiff::Put(staker) => puts.push(staker.clone()),
                StakerDiff::Delete(staker) => {
                    deleted.insert(staker.key());
                }
            }
        }
        puts.sort_by_key(|staker| staker.sort_key());

        Ok(Box::new(MergedStakerIterator::new(
            vec![parent_iterator, Box::new(puts.into_iter())],
            deleted,
        )))
    }

    fn as_diff(&self) -> Option<&Diff> {
        Some(self)
    }
}
