// Copyright (c) 2024-2026 The Meridian Foundation

//! The transaction builder.
//!
//! One constructor per transaction family. Each consults the chain's lock
//! mode, plans the value flow through the [`Spender`], attaches the
//! family's role signers, sorts, signs and syntactically verifies the
//! result. A failed build returns an error and touches nothing.

use crate::error::BuilderError;
use crate::keychain::Keychain;
use crate::spender::Spender;
use crate::traits::SharedMemory;
use mrd_common::Clock;
use mrd_core_types::{BlockId, Id, NodeId, OwnerId, ShortId, SubnetId, TxId};
use mrd_crypto_keys::SpendKey;
use mrd_platform_state::ChainState;
use mrd_platform_txs::{
    codec, sort_transferable_inputs, sort_transferable_inputs_with_signers,
    sort_transferable_outputs, AddSubnetValidatorTx, AddValidatorTx, AddressStateTx, BaseTx,
    ClaimTx, Context, DepositTx, RegisterNodeTx, RewardValidatorTx, RewardsImportTx,
    SubnetValidator, Tx, UnlockDepositTx, UnsignedTx, Validator,
};
use mrd_platform_types::{
    treasury, Input, LockState, Output, OutputOwners, TimedUtxo, TransferableInput,
    TransferableOutput,
};

/// Largest shared-memory page fetched per import.
pub const MAX_PAGE_SIZE: u32 = 1024;

/// Seconds an exported UTXO must have settled in shared memory before it
/// may be imported.
pub const SHARED_MEMORY_SYNC_BOUND: u64 = 10;

/// Fee schedule and import source, fixed at construction.
#[derive(Clone, Debug)]
pub struct Config {
    /// Flat fee burned by ordinary transactions.
    pub tx_fee: u64,
    /// Fee burned when registering a primary-network validator.
    pub validator_fee: u64,
    /// The chain treasury rewards are imported from.
    pub rewards_import_chain_id: BlockId,
}

/// Builds signed platform-chain transactions against a state snapshot.
pub struct Builder<'a> {
    ctx: Context,
    config: Config,
    clock: Clock,
    state: &'a dyn ChainState,
    shared_memory: Option<&'a dyn SharedMemory>,
}

impl<'a> Builder<'a> {
    /// A builder for the chain identified by `ctx`, reading `state`.
    pub fn new(
        ctx: Context,
        config: Config,
        clock: Clock,
        state: &'a dyn ChainState,
        shared_memory: Option<&'a dyn SharedMemory>,
    ) -> Self {
        Self {
            ctx,
            config,
            clock,
            state,
            shared_memory,
        }
    }

    fn spender(&self) -> Spender<'a> {
        Spender::new(self.state, self.ctx.asset_id)
    }

    fn require_lock_mode(&self) -> Result<(), BuilderError> {
        if !self.state.chain_config()?.lock_mode_bond_deposit {
            return Err(BuilderError::WrongLockMode);
        }
        Ok(())
    }

    fn base_tx(
        &self,
        ins: Vec<TransferableInput>,
        outs: Vec<TransferableOutput>,
    ) -> BaseTx {
        BaseTx {
            network_id: self.ctx.network_id,
            blockchain_id: self.ctx.blockchain_id,
            ins,
            outs,
            memo: vec![],
        }
    }

    fn finish(&self, unsigned: UnsignedTx, signers: &[Vec<SpendKey>]) -> Result<Tx, BuilderError> {
        let tx = Tx::sign(unsigned, signers)?;
        tx.syntactic_verify(&self.ctx)?;
        Ok(tx)
    }

    /// Register a primary-network validator, bonding its stake in place.
    #[allow(clippy::too_many_arguments)]
    pub fn new_add_validator_tx(
        &self,
        stake_amount: u64,
        start_time: u64,
        end_time: u64,
        node_id: NodeId,
        reward_address: ShortId,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;

        let plan = self.spender().lock(
            keys,
            stake_amount,
            self.config.validator_fee,
            LockState::Bonded,
            None,
            change,
            self.clock.unix(),
        )?;

        let unsigned = UnsignedTx::AddValidator(AddValidatorTx {
            base: self.base_tx(plan.ins, plan.outs),
            validator: Validator {
                node_id,
                start: start_time,
                end: end_time,
                weight: stake_amount,
            },
            rewards_owner: OutputOwners::single(reward_address),
        });
        self.finish(unsigned, &plan.signers)
    }

    /// Register a subnet validator. No value transition; the node's own
    /// signature is attached on networks that demand it.
    #[allow(clippy::too_many_arguments)]
    pub fn new_add_subnet_validator_tx(
        &self,
        weight: u64,
        start_time: u64,
        end_time: u64,
        node_id: NodeId,
        subnet_id: SubnetId,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        let plan = self.spender().lock(
            keys,
            0,
            self.config.tx_fee,
            LockState::Unlocked,
            None,
            change,
            self.clock.unix(),
        )?;

        let mut signers = plan.signers;
        if self.state.chain_config()?.verify_node_signature {
            signers.push(get_signer(keys, &node_id)?);
        }

        let unsigned = UnsignedTx::AddSubnetValidator(AddSubnetValidatorTx {
            base: self.base_tx(plan.ins, plan.outs),
            validator: SubnetValidator {
                validator: Validator {
                    node_id,
                    start: start_time,
                    end: end_time,
                    weight,
                },
                subnet_id,
            },
        });
        self.finish(unsigned, &signers)
    }

    /// Release the bond held by validator transaction `tx_id`. System
    /// transaction; carries no credentials.
    pub fn new_reward_validator_tx(&self, tx_id: TxId) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;

        let (mut ins, mut outs) = self.spender().unlock(&[tx_id], LockState::Bonded)?;
        sort_transferable_inputs(&mut ins);
        sort_transferable_outputs(&mut outs)?;

        let unsigned = UnsignedTx::RewardValidator(RewardValidatorTx { tx_id, ins, outs });
        self.finish(unsigned, &[])
    }

    /// Set or clear one role bit on an address. Burns the flat fee.
    pub fn new_address_state_tx(
        &self,
        address: ShortId,
        remove: bool,
        state_bit: u8,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        let plan = self.spender().lock(
            keys,
            0,
            self.config.tx_fee,
            LockState::Unlocked,
            None,
            change,
            self.clock.unix(),
        )?;

        let unsigned = UnsignedTx::AddressState(AddressStateTx {
            base: self.base_tx(plan.ins, plan.outs),
            address,
            remove,
            state_bit,
        });
        self.finish(unsigned, &plan.signers)
    }

    /// Lock `amount` as a deposit under `deposit_offer_id`.
    ///
    /// The offer must be active and permit the requested amount and
    /// duration; a retired or mismatched offer fails the build before any
    /// spend planning happens.
    #[allow(clippy::too_many_arguments)]
    pub fn new_deposit_tx(
        &self,
        amount: u64,
        duration: u32,
        deposit_offer_id: Id,
        reward_address: ShortId,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;
        let now = self.clock.unix();

        let offer = self.state.get_deposit_offer(&deposit_offer_id)?;
        offer.permits(amount, duration, now)?;

        let plan = self.spender().lock(
            keys,
            amount,
            self.config.tx_fee,
            LockState::Deposited,
            None,
            change,
            now,
        )?;

        let unsigned = UnsignedTx::Deposit(DepositTx {
            base: self.base_tx(plan.ins, plan.outs),
            deposit_offer_id,
            deposit_duration: duration,
            rewards_owner: OutputOwners::single(reward_address),
        });
        self.finish(unsigned, &plan.signers)
    }

    /// Release the expired deposits in `deposit_tx_ids`, burning the flat
    /// fee out of the freshly unlocked value first and out of held
    /// unlocked UTXOs only for any shortfall.
    pub fn new_unlock_deposit_tx(
        &self,
        deposit_tx_ids: &[TxId],
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;
        let now = self.clock.unix();

        let (mut ins, outs, mut signers) =
            self.spender().unlock_deposit(keys, deposit_tx_ids, now)?;

        let mut fee_remaining = self.config.tx_fee;
        let mut kept_outs = Vec::with_capacity(outs.len());
        for mut out in outs {
            if fee_remaining > 0 && !out.out.lock_state().is_locked() {
                let take = fee_remaining.min(out.out.amount());
                fee_remaining -= take;
                let rest = out.out.amount() - take;
                if rest == 0 {
                    continue;
                }
                out.out = Output::transfer(rest, out.out.owners().clone());
            }
            kept_outs.push(out);
        }
        let mut outs = kept_outs;

        if fee_remaining > 0 {
            let fee_plan = self.spender().lock(
                keys,
                0,
                fee_remaining,
                LockState::Unlocked,
                None,
                change,
                now,
            )?;
            ins.extend(fee_plan.ins);
            outs.extend(fee_plan.outs);
            signers.extend(fee_plan.signers);
        }

        sort_transferable_inputs_with_signers(&mut ins, &mut signers);
        sort_transferable_outputs(&mut outs)?;

        let unsigned = UnsignedTx::UnlockDeposit(UnlockDepositTx {
            base: self.base_tx(ins, outs),
        });
        self.finish(unsigned, &signers)
    }

    /// Claim accrued deposit rewards and claimable balances.
    ///
    /// One trailing credential carries the union of the matched claim
    /// signers, which is the layout verifiers expect.
    #[allow(clippy::too_many_arguments)]
    pub fn new_claim_tx(
        &self,
        deposit_tx_ids: &[TxId],
        claimable_owner_ids: &[OwnerId],
        claimed_amounts: &[u64],
        claim_to: &OutputOwners,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;
        let now = self.clock.unix();

        let plan = self.spender().lock(
            keys,
            0,
            self.config.tx_fee,
            LockState::Unlocked,
            None,
            change,
            now,
        )?;

        let keychain = Keychain::from_keys(keys.iter().cloned());
        let mut claim_signers = Keychain::new();

        for deposit_tx_id in deposit_tx_ids {
            let deposit = self.state.get_deposit(deposit_tx_id)?;
            let matched =
                keychain.spend_multisig(self.state, &deposit.rewards_owner, now)?;
            for key in matched.keys {
                claim_signers.add(key);
            }
        }

        for owner_id in claimable_owner_ids {
            let claimable = self.state.get_claimable(owner_id)?;
            let matched = keychain.spend_multisig(self.state, &claimable.owner, now)?;
            for key in matched.keys {
                claim_signers.add(key);
            }
        }

        let mut signers = plan.signers;
        signers.push(claim_signers.keys().to_vec());

        let unsigned = UnsignedTx::Claim(ClaimTx {
            base: self.base_tx(plan.ins, plan.outs),
            deposit_tx_ids: deposit_tx_ids.to_vec(),
            claimable_owner_ids: claimable_owner_ids.to_vec(),
            claimed_amounts: claimed_amounts.to_vec(),
            claim_to: claim_to.clone(),
        });
        self.finish(unsigned, &signers)
    }

    /// Register or replace a consortium member's validator node.
    ///
    /// Attaches the new node's key (when a node is being registered) and
    /// the consortium member's threshold signers as trailing credentials.
    pub fn new_register_node_tx(
        &self,
        old_node_id: NodeId,
        new_node_id: NodeId,
        consortium_member_address: ShortId,
        keys: &[SpendKey],
        change: Option<&OutputOwners>,
    ) -> Result<Tx, BuilderError> {
        let now = self.clock.unix();
        let plan = self.spender().lock(
            keys,
            0,
            self.config.tx_fee,
            LockState::Unlocked,
            None,
            change,
            now,
        )?;

        let mut signers = plan.signers;
        if !new_node_id.is_empty() {
            signers.push(get_signer(keys, &new_node_id)?);
        }

        let keychain = Keychain::from_keys(keys.iter().cloned());
        let member_owner = OutputOwners::single(consortium_member_address);
        let matched = keychain.spend_multisig(self.state, &member_owner, now)?;
        signers.push(matched.keys);

        let unsigned = UnsignedTx::RegisterNode(RegisterNodeTx {
            base: self.base_tx(plan.ins, plan.outs),
            old_node_id,
            new_node_id,
            consortium_member_auth: matched.sig_indices,
            consortium_member_address,
        });
        self.finish(unsigned, &signers)
    }

    /// Import settled treasury rewards from the configured source chain.
    ///
    /// Bytes that do not decode as timed UTXOs are skipped, preserving the
    /// historical fall-through for plain exports; the skip count is
    /// reported for observability.
    pub fn new_rewards_import_tx(&self) -> Result<Tx, BuilderError> {
        self.require_lock_mode()?;
        let shared_memory = self
            .shared_memory
            .ok_or_else(|| BuilderError::SharedMemory("no shared memory configured".into()))?;

        let page = shared_memory.indexed(
            self.config.rewards_import_chain_id,
            &treasury::addr_traits_bytes(),
            ShortId::EMPTY.as_bytes(),
            Id::EMPTY.as_bytes(),
            MAX_PAGE_SIZE,
        )?;

        let now = self.clock.unix();
        let cutoff = now.saturating_sub(SHARED_MEMORY_SYNC_BOUND);

        let mut utxos = Vec::new();
        let mut skipped = 0usize;
        for bytes in &page.utxo_bytes {
            match codec::unmarshal::<TimedUtxo>(bytes) {
                Ok((_, timed)) => {
                    if timed.timestamp <= cutoff {
                        utxos.push(timed.utxo);
                    }
                }
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "ignored undecodable shared-memory utxos");
        }

        if utxos.is_empty() {
            return Err(BuilderError::NoUtxosForImport);
        }

        let treasury_keychain =
            Keychain::from_keys([SpendKey::Fake(treasury::TREASURY_ADDR)]);

        let mut ins = Vec::with_capacity(utxos.len());
        for utxo in &utxos {
            let matched = treasury_keychain
                .match_owners(utxo.out.owners(), now)
                .ok_or(BuilderError::KeyMissing)?;
            ins.push(TransferableInput {
                utxo_id: utxo.utxo_id,
                asset_id: utxo.asset_id,
                input: Input::transfer(utxo.out.amount(), matched.sig_indices),
            });
        }
        sort_transferable_inputs(&mut ins);

        let unsigned = UnsignedTx::RewardsImport(RewardsImportTx {
            base: self.base_tx(ins, vec![]),
        });
        self.finish(unsigned, &[])
    }

    /// Release deposits on the chain's own initiative, without user keys.
    /// Carries one empty credential per input.
    pub fn new_system_unlock_deposit_tx(
        &self,
        deposit_tx_ids: &[TxId],
    ) -> Result<Tx, BuilderError> {
        let (mut ins, mut outs) =
            self.spender().unlock(deposit_tx_ids, LockState::Deposited)?;
        sort_transferable_inputs(&mut ins);
        sort_transferable_outputs(&mut outs)?;

        let empty_signers = vec![Vec::new(); ins.len()];
        let unsigned = UnsignedTx::UnlockDeposit(UnlockDepositTx {
            base: self.base_tx(ins, outs),
        });
        self.finish(unsigned, &empty_signers)
    }
}

// The key controlling exactly `address`, as a one-element signer list.
fn get_signer(keys: &[SpendKey], address: &ShortId) -> Result<Vec<SpendKey>, BuilderError> {
    keys.iter()
        .find(|key| key.address() == *address)
        .cloned()
        .map(|key| vec![key])
        .ok_or(BuilderError::KeyMissing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SharedMemoryPage;
    use mrd_crypto_keys::PrivateKey;
    use mrd_platform_state::{ChainConfig, MemState, State};
    use mrd_platform_txs::{sum_inputs, sum_outputs};
    use mrd_platform_types::{
        locked::THIS_TX_ID, Claimable, Deposit, DepositOffer, LockIds, OfferFlags, Utxo, UtxoId,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ASSET: Id = Id([3; 32]);

    fn ctx() -> Context {
        Context {
            network_id: 1,
            blockchain_id: Id([2; 32]),
            asset_id: ASSET,
        }
    }

    fn config() -> Config {
        Config {
            tx_fee: 10,
            validator_fee: 20,
            rewards_import_chain_id: Id([0xcc; 32]),
        }
    }

    fn lock_mode_state() -> MemState {
        MemState::new(ChainConfig {
            lock_mode_bond_deposit: true,
            verify_node_signature: false,
        })
    }

    fn keys(seed: u64, count: usize) -> Vec<PrivateKey> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| PrivateKey::generate(&mut rng)).collect()
    }

    fn fund(state: &mut MemState, tx_byte: u8, amount: u64, owner: ShortId) {
        state.put_utxo(Utxo::new(
            UtxoId::new(Id([tx_byte; 32]), 0),
            ASSET,
            Output::transfer(amount, OutputOwners::single(owner)),
        ));
    }

    fn fund_locked(
        state: &mut MemState,
        tx_byte: u8,
        amount: u64,
        owner: ShortId,
        lock_ids: LockIds,
    ) {
        state.put_utxo(Utxo::new(
            UtxoId::new(Id([tx_byte; 32]), 0),
            ASSET,
            Output::locked(lock_ids, amount, OutputOwners::single(owner)),
        ));
    }

    const OFFER_ID: Id = Id([0x0f; 32]);

    // registers the offer the deposit tests run against: open-ended, 10%
    // per year, permissive bounds
    fn register_offer(state: &mut MemState) {
        state.set_deposit_offer(DepositOffer {
            id: OFFER_ID,
            interest_rate_nominator: 100_000,
            start: 0,
            end: u64::MAX,
            min_amount: 1,
            min_duration: 60,
            max_duration: u32::MAX,
            flags: OfferFlags::NONE,
        });
    }

    fn deposit(owner: ShortId, start: u64, duration: u32, amount: u64) -> Deposit {
        Deposit {
            deposit_offer_id: Id([0x0f; 32]),
            start,
            duration,
            amount,
            unlocked_amount: 0,
            claimed_reward_amount: 0,
            rewards_owner: OutputOwners::single(owner),
        }
    }

    fn builder<'a>(state: &'a MemState, now: u64) -> Builder<'a> {
        Builder::new(ctx(), config(), Clock::faked(now), state, None)
    }

    fn amount_by_state(tx: &Tx, lock_state: LockState) -> u64 {
        tx.unsigned
            .outs()
            .iter()
            .filter(|o| o.out.lock_state() == lock_state)
            .map(|o| o.out.amount())
            .sum()
    }

    #[test]
    fn test_deposit_tx_simple() {
        // one unlocked utxo of 1000, deposit 500 with fee 10:
        // deposited 500 + unlocked change 490
        let signer = keys(1, 1).remove(0);
        let mut state = lock_mode_state();
        register_offer(&mut state);
        fund(&mut state, 1, 1000, signer.address());

        let b = builder(&state, 1000);
        let tx = b
            .new_deposit_tx(
                500,
                3600,
                OFFER_ID,
                signer.address(),
                &[SpendKey::Real(signer.clone())],
                None,
            )
            .unwrap();

        assert_eq!(sum_inputs(tx.unsigned.ins()), 1000);
        assert_eq!(sum_outputs(tx.unsigned.outs()), 990);
        assert_eq!(amount_by_state(&tx, LockState::Deposited), 500);
        assert_eq!(amount_by_state(&tx, LockState::Unlocked), 490);
        assert_eq!(tx.creds.len(), 1);

        // the deposited output names the transaction being built
        let locked_out = tx
            .unsigned
            .outs()
            .iter()
            .find(|o| o.out.lock_state() == LockState::Deposited)
            .unwrap();
        assert_eq!(locked_out.out.lock_ids().deposit_tx_id, Some(THIS_TX_ID));

        // signature recovers to the funding key
        let digest = tx.signing_digest().unwrap();
        assert_eq!(
            tx.creds[0].recover_addresses(&digest).unwrap(),
            vec![signer.address()]
        );
    }

    #[test]
    fn test_deposit_tx_insufficient_funds() {
        let signer = keys(2, 1).remove(0);
        let mut state = lock_mode_state();
        register_offer(&mut state);
        fund(&mut state, 1, 1000, signer.address());

        let b = builder(&state, 1000);
        let err = b
            .new_deposit_tx(
                2000,
                3600,
                OFFER_ID,
                signer.address(),
                &[SpendKey::Real(signer)],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, BuilderError::InsufficientSpendable { .. }));
    }

    #[test]
    fn test_deposit_tx_rejects_retired_or_mismatched_offer() {
        let signer = keys(2, 1).remove(0);
        let mut state = lock_mode_state();
        register_offer(&mut state);
        fund(&mut state, 1, 1000, signer.address());
        let held = [SpendKey::Real(signer.clone())];

        let b = builder(&state, 1000);
        // duration below the offer minimum
        assert!(matches!(
            b.new_deposit_tx(500, 1, OFFER_ID, signer.address(), &held, None),
            Err(BuilderError::Deposit(_))
        ));
        // unknown offer
        assert!(matches!(
            b.new_deposit_tx(500, 3600, Id([0xee; 32]), signer.address(), &held, None),
            Err(BuilderError::State(_))
        ));

        // retired offer
        let mut retired = lock_mode_state();
        register_offer(&mut retired);
        retired.set_deposit_offer(DepositOffer {
            flags: OfferFlags::LOCKED,
            ..retired.get_deposit_offer(&OFFER_ID).unwrap()
        });
        fund(&mut retired, 1, 1000, signer.address());
        let b = builder(&retired, 1000);
        assert!(matches!(
            b.new_deposit_tx(500, 3600, OFFER_ID, signer.address(), &held, None),
            Err(BuilderError::Deposit(_))
        ));
    }

    #[test]
    fn test_deposit_tx_requires_lock_mode() {
        let signer = keys(3, 1).remove(0);
        let mut state = MemState::new(ChainConfig::default());
        fund(&mut state, 1, 1000, signer.address());

        let b = builder(&state, 1000);
        assert!(matches!(
            b.new_deposit_tx(
                500,
                3600,
                OFFER_ID,
                signer.address(),
                &[SpendKey::Real(signer)],
                None,
            ),
            Err(BuilderError::WrongLockMode)
        ));
    }

    #[test]
    fn test_unlock_deposit_tx_burns_fee_from_unlocked_value() {
        // expired deposit of 500: unlock input 500, unlocked output 490,
        // fee 10 burned out of the released value
        let signer = keys(4, 1).remove(0);
        let deposit_id = Id([0xd0; 32]);
        let mut state = lock_mode_state();
        state.add_deposit(deposit_id, deposit(signer.address(), 100, 50, 500));
        fund_locked(
            &mut state,
            1,
            500,
            signer.address(),
            LockIds {
                deposit_tx_id: Some(deposit_id),
                bond_tx_id: None,
            },
        );

        let b = builder(&state, 200);
        let tx = b
            .new_unlock_deposit_tx(&[deposit_id], &[SpendKey::Real(signer.clone())], None)
            .unwrap();

        assert_eq!(tx.unsigned.ins().len(), 1);
        assert_eq!(sum_inputs(tx.unsigned.ins()), 500);
        assert_eq!(sum_outputs(tx.unsigned.outs()), 490);
        assert_eq!(amount_by_state(&tx, LockState::Unlocked), 490);
        assert_eq!(tx.creds.len(), 1);
    }

    #[test]
    fn test_unlock_deposit_tx_rejects_active_deposit() {
        let signer = keys(5, 1).remove(0);
        let deposit_id = Id([0xd0; 32]);
        let mut state = lock_mode_state();
        state.add_deposit(deposit_id, deposit(signer.address(), 100, 50, 500));
        fund_locked(
            &mut state,
            1,
            500,
            signer.address(),
            LockIds {
                deposit_tx_id: Some(deposit_id),
                bond_tx_id: None,
            },
        );

        let b = builder(&state, 120);
        assert!(matches!(
            b.new_unlock_deposit_tx(&[deposit_id], &[SpendKey::Real(signer)], None),
            Err(BuilderError::IncompatibleLockState)
        ));
    }

    #[test]
    fn test_claim_tx_with_multisig_claimable() {
        // claimable owned 2-of-3; two held keys satisfy it, one does not
        let signers = keys(6, 3);
        let funder = keys(7, 1).remove(0);
        let owner = OutputOwners::new(
            0,
            2,
            signers.iter().map(|k| k.address()).collect(),
        );
        let owner_id = owner.owner_id();

        let mut state = lock_mode_state();
        state.set_claimable(
            owner_id,
            Some(Claimable {
                owner: owner.clone(),
                validator_reward: 0,
                deposit_reward: 100,
            }),
        );
        fund(&mut state, 1, 50, funder.address());

        let b = builder(&state, 1000);
        let held = vec![
            SpendKey::Real(funder.clone()),
            SpendKey::Real(signers[0].clone()),
            SpendKey::Real(signers[1].clone()),
        ];
        let claim_to = OutputOwners::single(funder.address());
        let tx = b
            .new_claim_tx(&[], &[owner_id], &[100], &claim_to, &held, None)
            .unwrap();

        // one credential per input plus the single trailing claim slot
        assert_eq!(tx.creds.len(), tx.unsigned.ins().len() + 1);
        let digest = tx.signing_digest().unwrap();
        // the trailing credential carries the union of matched claim
        // signers, ordered by their position within the owner
        let claim_addresses: std::collections::BTreeSet<ShortId> = tx
            .creds
            .last()
            .unwrap()
            .recover_addresses(&digest)
            .unwrap()
            .into_iter()
            .collect();
        let expected_addresses: std::collections::BTreeSet<ShortId> =
            [signers[0].address(), signers[1].address()].into_iter().collect();
        assert_eq!(claim_addresses, expected_addresses);

        // the threshold positions of the held keys within the owner
        let matched = Keychain::from_keys(held.clone())
            .spend_multisig(&state, &owner, 1000)
            .unwrap();
        let expected: Vec<u32> = {
            let mut positions: Vec<u32> = [&signers[0], &signers[1]]
                .iter()
                .map(|k| owner.position(&k.address()).unwrap())
                .collect();
            positions.sort_unstable();
            positions
        };
        assert_eq!(matched.sig_indices, expected);

        // a single key cannot meet the threshold
        let short = vec![
            SpendKey::Real(funder),
            SpendKey::Real(signers[0].clone()),
        ];
        assert!(matches!(
            b.new_claim_tx(&[], &[owner_id], &[100], &claim_to, &short, None),
            Err(BuilderError::KeyMissing)
        ));
    }

    #[test]
    fn test_claim_tx_collects_deposit_reward_owners() {
        let signer = keys(8, 1).remove(0);
        let deposit_id = Id([0xd5; 32]);
        let mut state = lock_mode_state();
        state.add_deposit(deposit_id, deposit(signer.address(), 0, 100, 500));
        fund(&mut state, 1, 50, signer.address());

        let b = builder(&state, 1000);
        let claim_to = OutputOwners::single(signer.address());
        let tx = b
            .new_claim_tx(
                &[deposit_id],
                &[],
                &[],
                &claim_to,
                &[SpendKey::Real(signer.clone())],
                None,
            )
            .unwrap();

        let digest = tx.signing_digest().unwrap();
        assert_eq!(
            tx.creds.last().unwrap().recover_addresses(&digest).unwrap(),
            vec![signer.address()]
        );
    }

    #[test]
    fn test_reward_validator_tx_releases_bond() {
        // one purely bonded utxo and one deposited-bonded utxo; releasing
        // the bond leaves the deposit lock in place
        let owner = ShortId([1; 20]);
        let bond_id = Id([0xb0; 32]);
        let deposit_id = Id([0xd0; 32]);
        let mut state = lock_mode_state();
        fund_locked(
            &mut state,
            1,
            500,
            owner,
            LockIds {
                deposit_tx_id: None,
                bond_tx_id: Some(bond_id),
            },
        );
        fund_locked(
            &mut state,
            2,
            300,
            owner,
            LockIds {
                deposit_tx_id: Some(deposit_id),
                bond_tx_id: Some(bond_id),
            },
        );

        let b = builder(&state, 1000);
        let tx = b.new_reward_validator_tx(bond_id).unwrap();

        assert!(tx.creds.is_empty());
        assert_eq!(sum_inputs(tx.unsigned.ins()), 800);
        assert_eq!(sum_outputs(tx.unsigned.outs()), 800);
        assert_eq!(amount_by_state(&tx, LockState::Unlocked), 500);
        assert_eq!(amount_by_state(&tx, LockState::Deposited), 300);
        assert_eq!(amount_by_state(&tx, LockState::Bonded), 0);
    }

    #[test]
    fn test_system_unlock_deposit_tx() {
        let owner = ShortId([1; 20]);
        let deposit_id = Id([0xd0; 32]);
        let mut state = lock_mode_state();
        fund_locked(
            &mut state,
            1,
            700,
            owner,
            LockIds {
                deposit_tx_id: Some(deposit_id),
                bond_tx_id: None,
            },
        );

        let b = builder(&state, 1000);
        let tx = b.new_system_unlock_deposit_tx(&[deposit_id]).unwrap();

        // one empty credential per input, no signatures anywhere
        assert_eq!(tx.creds.len(), tx.unsigned.ins().len());
        assert!(tx.creds.iter().all(|c| c.signatures.is_empty()));
        assert_eq!(amount_by_state(&tx, LockState::Unlocked), 700);
    }

    #[test]
    fn test_add_validator_tx_bonds_stake() {
        let signer = keys(9, 1).remove(0);
        let node = keys(10, 1).remove(0);
        let mut state = lock_mode_state();
        fund(&mut state, 1, 1000, signer.address());

        let b = builder(&state, 50);
        let tx = b
            .new_add_validator_tx(
                500,
                100,
                200,
                node.address(),
                signer.address(),
                &[SpendKey::Real(signer.clone())],
                None,
            )
            .unwrap();

        // bonded 500, change 480 after the validator fee of 20
        assert_eq!(amount_by_state(&tx, LockState::Bonded), 500);
        assert_eq!(amount_by_state(&tx, LockState::Unlocked), 480);
        assert_eq!(
            sum_inputs(tx.unsigned.ins()),
            sum_outputs(tx.unsigned.outs()) + 20
        );

        // consumed unlocked value, produced only same-or-higher states
        assert!(tx
            .unsigned
            .outs()
            .iter()
            .all(|o| !o.out.lock_state().is_deposited()));
    }

    #[test]
    fn test_add_subnet_validator_signs_with_node_key_when_required() {
        let signer = keys(11, 1).remove(0);
        let node = keys(12, 1).remove(0);
        let mut state = MemState::new(ChainConfig {
            lock_mode_bond_deposit: true,
            verify_node_signature: true,
        });
        fund(&mut state, 1, 100, signer.address());

        let b = builder(&state, 50);
        let held = vec![SpendKey::Real(signer.clone()), SpendKey::Real(node.clone())];
        let tx = b
            .new_add_subnet_validator_tx(
                7,
                100,
                200,
                node.address(),
                Id([0x5b; 32]),
                &held,
                None,
            )
            .unwrap();

        assert_eq!(tx.creds.len(), tx.unsigned.ins().len() + 1);
        let digest = tx.signing_digest().unwrap();
        assert_eq!(
            tx.creds.last().unwrap().recover_addresses(&digest).unwrap(),
            vec![node.address()]
        );

        // without the node key the build fails
        assert!(matches!(
            b.new_add_subnet_validator_tx(
                7,
                100,
                200,
                node.address(),
                Id([0x5b; 32]),
                &[SpendKey::Real(signer)],
                None,
            ),
            Err(BuilderError::KeyMissing)
        ));
    }

    #[test]
    fn test_register_node_tx() {
        let member = keys(13, 1).remove(0);
        let node = keys(14, 1).remove(0);
        let mut state = lock_mode_state();
        fund(&mut state, 1, 100, member.address());

        let b = builder(&state, 50);
        let held = vec![SpendKey::Real(member.clone()), SpendKey::Real(node.clone())];
        let tx = b
            .new_register_node_tx(
                ShortId::EMPTY,
                node.address(),
                member.address(),
                &held,
                None,
            )
            .unwrap();

        // fee inputs + node credential + consortium credential
        assert_eq!(tx.creds.len(), tx.unsigned.ins().len() + 2);
        let digest = tx.signing_digest().unwrap();
        let creds = &tx.creds;
        assert_eq!(
            creds[creds.len() - 2].recover_addresses(&digest).unwrap(),
            vec![node.address()]
        );
        assert_eq!(
            creds[creds.len() - 1].recover_addresses(&digest).unwrap(),
            vec![member.address()]
        );

        let UnsignedTx::RegisterNode(ref utx) = tx.unsigned else {
            panic!("wrong tx kind");
        };
        assert_eq!(utx.consortium_member_auth, vec![0]);
    }

    #[test]
    fn test_address_state_tx_burns_fee_only() {
        let signer = keys(15, 1).remove(0);
        let target = ShortId([0x42; 20]);
        let mut state = lock_mode_state();
        fund(&mut state, 1, 100, signer.address());

        let b = builder(&state, 50);
        let tx = b
            .new_address_state_tx(target, false, 2, &[SpendKey::Real(signer)], None)
            .unwrap();

        assert_eq!(
            sum_inputs(tx.unsigned.ins()),
            sum_outputs(tx.unsigned.outs()) + 10
        );
        let UnsignedTx::AddressState(ref utx) = tx.unsigned else {
            panic!("wrong tx kind");
        };
        assert_eq!(utx.state_bit, 2);
        assert!(!utx.remove);
    }

    struct FixedSharedMemory {
        pages: Vec<Vec<u8>>,
    }

    impl SharedMemory for FixedSharedMemory {
        fn indexed(
            &self,
            _chain_id: BlockId,
            _traits: &[Vec<u8>],
            _start_addr: &[u8],
            _start_utxo: &[u8],
            _max_page: u32,
        ) -> Result<SharedMemoryPage, BuilderError> {
            Ok(SharedMemoryPage {
                utxo_bytes: self.pages.clone(),
                last_addr: vec![],
                last_utxo: vec![],
            })
        }
    }

    fn timed_treasury_utxo(tx_byte: u8, amount: u64, timestamp: u64) -> Vec<u8> {
        let timed = TimedUtxo {
            utxo: Utxo::new(
                UtxoId::new(Id([tx_byte; 32]), 0),
                ASSET,
                Output::transfer(amount, OutputOwners::single(treasury::TREASURY_ADDR)),
            ),
            timestamp,
        };
        codec::marshal(codec::CODEC_VERSION, &timed).unwrap()
    }

    #[test]
    fn test_rewards_import_tx_filters_and_skips() {
        let now = 1000;
        let shared = FixedSharedMemory {
            pages: vec![
                // settled long ago: imported
                timed_treasury_utxo(1, 400, 100),
                // exported just now: not yet settled
                timed_treasury_utxo(2, 500, now - 1),
                // not a timed utxo at all: skipped
                vec![0xde, 0xad, 0xbe, 0xef],
            ],
        };
        let state = lock_mode_state();
        let b = Builder::new(ctx(), config(), Clock::faked(now), &state, Some(&shared));

        let tx = b.new_rewards_import_tx().unwrap();
        assert!(tx.creds.is_empty());
        assert_eq!(tx.unsigned.ins().len(), 1);
        assert_eq!(sum_inputs(tx.unsigned.ins()), 400);
        assert!(tx.unsigned.outs().is_empty());
    }

    #[test]
    fn test_rewards_import_tx_with_nothing_settled() {
        let now = 1000;
        let shared = FixedSharedMemory {
            pages: vec![timed_treasury_utxo(1, 400, now)],
        };
        let state = lock_mode_state();
        let b = Builder::new(ctx(), config(), Clock::faked(now), &state, Some(&shared));

        assert!(matches!(
            b.new_rewards_import_tx(),
            Err(BuilderError::NoUtxosForImport)
        ));
    }

    #[test]
    fn test_produced_transactions_are_canonically_sorted() {
        // two funding utxos force multi-input plans
        let signer = keys(16, 1).remove(0);
        let mut state = lock_mode_state();
        register_offer(&mut state);
        fund(&mut state, 9, 600, signer.address());
        fund(&mut state, 1, 600, signer.address());

        let b = builder(&state, 1000);
        let tx = b
            .new_deposit_tx(
                900,
                3600,
                OFFER_ID,
                signer.address(),
                &[SpendKey::Real(signer)],
                None,
            )
            .unwrap();

        let ins = tx.unsigned.ins();
        assert!(ins.windows(2).all(|w| w[0].utxo_id < w[1].utxo_id));
        // verification re-checks both orders
        tx.syntactic_verify(&ctx()).unwrap();
        assert_eq!(amount_by_state(&tx, LockState::Deposited), 900);
        assert_eq!(sum_inputs(ins), sum_outputs(tx.unsigned.outs()) + 10);
    }
}
