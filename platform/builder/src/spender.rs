// Copyright (c) 2024-2026 The Meridian Foundation

//! The spend planner.
//!
//! Given a keychain and a requested lock transition, the planner selects
//! UTXOs, splits them into locked, change and burned portions, and returns
//! inputs, outputs and the signer bundle for each input. Selection prefers
//! UTXOs that already carry the other lock kind, so fresh unlocked value is
//! only encumbered once partially-locked value is exhausted; burns are
//! always paid from unlocked value.

use crate::error::BuilderError;
use crate::keychain::{Keychain, KeychainMatch};
use mrd_core_types::{AssetId, TxId};
use mrd_platform_state::ChainState;
use mrd_platform_txs::{sort_transferable_inputs_with_signers, sort_transferable_outputs};
use mrd_crypto_keys::SpendKey;
use mrd_platform_types::{
    locked::THIS_TX_ID, Input, LockIds, LockState, Output, OutputOwners, TransferableInput,
    TransferableOutput, Utxo,
};
use std::collections::BTreeSet;

/// The planner's answer: balanced inputs and outputs, one signer list per
/// input, and the owners of the newly locked outputs.
#[derive(Clone, Debug, Default)]
pub struct SpendPlan {
    /// Consumed UTXOs, in canonical order.
    pub ins: Vec<TransferableInput>,
    /// Produced outputs, in canonical order.
    pub outs: Vec<TransferableOutput>,
    /// Signer bundle per input, permuted to follow input order.
    pub signers: Vec<Vec<SpendKey>>,
    /// Owners of the produced locked outputs.
    pub owners: Vec<OutputOwners>,
}

/// Plans spends against a state snapshot.
pub struct Spender<'s> {
    state: &'s dyn ChainState,
    asset_id: AssetId,
}

impl<'s> Spender<'s> {
    /// A planner reading `state`, spending the fee asset `asset_id`.
    pub fn new(state: &'s dyn ChainState, asset_id: AssetId) -> Self {
        Self { state, asset_id }
    }

    /// Select inputs covering `amount_to_lock` under the `applied_state`
    /// transition plus `amount_to_burn` of fees, producing locked outputs
    /// and change.
    ///
    /// `applied_state` may be `Unlocked`, in which case `amount_to_lock`
    /// is sent as a plain transfer to `to` (burn-only calls pass zero).
    /// The locked output from fresh unlocked value goes to `to`, falling
    /// back to `change`, then to the consumed UTXO's owners; upgrading an
    /// already-locked UTXO preserves that UTXO's owners. Change keeps the
    /// consumed UTXO's lock ids.
    #[allow(clippy::too_many_arguments)]
    pub fn lock(
        &self,
        keys: &[SpendKey],
        amount_to_lock: u64,
        amount_to_burn: u64,
        applied_state: LockState,
        to: Option<&OutputOwners>,
        change: Option<&OutputOwners>,
        as_of: u64,
    ) -> Result<SpendPlan, BuilderError> {
        if applied_state == LockState::DepositedBonded {
            return Err(BuilderError::IncompatibleLockState);
        }

        let keychain = Keychain::from_keys(keys.iter().cloned());
        let utxos = self.state.utxos(&keychain.addresses())?;

        let mut plan = SpendPlan::default();
        let mut remaining_lock = amount_to_lock;
        let mut remaining_burn = amount_to_burn;

        // already-locked UTXOs first: they can take the second lock kind
        // without encumbering fresh value, but can never pay the burn
        if applied_state.is_locked() {
            for utxo in utxos.iter().filter(|u| u.out.lock_state().is_locked()) {
                if remaining_lock == 0 {
                    break;
                }
                let lock_ids = utxo.out.lock_ids();
                if lock_ids.lock_state().holds(applied_state) {
                    continue;
                }
                let Some(matched) = self.spendable_by(&keychain, utxo, as_of)? else {
                    continue;
                };

                let amount = utxo.out.amount();
                let lock_now = remaining_lock.min(amount);
                remaining_lock -= lock_now;

                let owners = utxo.out.owners().clone();
                plan.ins.push(TransferableInput {
                    utxo_id: utxo.utxo_id,
                    asset_id: utxo.asset_id,
                    input: Input::locked(lock_ids, amount, matched.sig_indices),
                });
                plan.signers.push(matched.keys);

                let locked_ids = lock_ids.with_lock(applied_state, THIS_TX_ID)?;
                plan.outs.push(TransferableOutput {
                    asset_id: utxo.asset_id,
                    out: Output::locked(locked_ids, lock_now, owners.clone()),
                });
                plan.owners.push(owners.clone());

                if amount > lock_now {
                    plan.outs.push(TransferableOutput {
                        asset_id: utxo.asset_id,
                        out: Output::locked(lock_ids, amount - lock_now, owners),
                    });
                }
            }
        }

        // unlocked UTXOs cover the rest of the lock plus the whole burn
        for utxo in utxos.iter().filter(|u| !u.out.lock_state().is_locked()) {
            if remaining_lock == 0 && remaining_burn == 0 {
                break;
            }
            let Some(matched) = self.spendable_by(&keychain, utxo, as_of)? else {
                continue;
            };

            let amount = utxo.out.amount();
            let burn_now = remaining_burn.min(amount);
            remaining_burn -= burn_now;
            let lock_now = remaining_lock.min(amount - burn_now);
            remaining_lock -= lock_now;

            let utxo_owners = utxo.out.owners();
            plan.ins.push(TransferableInput {
                utxo_id: utxo.utxo_id,
                asset_id: utxo.asset_id,
                input: Input::transfer(amount, matched.sig_indices),
            });
            plan.signers.push(matched.keys);

            if lock_now > 0 {
                let to_owners = to.or(change).unwrap_or(utxo_owners).clone();
                let out = match applied_state {
                    LockState::Unlocked => Output::transfer(lock_now, to_owners.clone()),
                    applied => Output::locked(
                        LockIds::from_state(applied, THIS_TX_ID)?,
                        lock_now,
                        to_owners.clone(),
                    ),
                };
                plan.outs.push(TransferableOutput {
                    asset_id: utxo.asset_id,
                    out,
                });
                plan.owners.push(to_owners);
            }

            let change_amount = amount - burn_now - lock_now;
            if change_amount > 0 {
                plan.outs.push(TransferableOutput {
                    asset_id: utxo.asset_id,
                    out: Output::transfer(
                        change_amount,
                        change.unwrap_or(utxo_owners).clone(),
                    ),
                });
            }
        }

        if remaining_lock > 0 || remaining_burn > 0 {
            return Err(BuilderError::InsufficientSpendable {
                lock: remaining_lock,
                burn: remaining_burn,
            });
        }

        sort_transferable_inputs_with_signers(&mut plan.ins, &mut plan.signers);
        sort_transferable_outputs(&mut plan.outs)?;
        Ok(plan)
    }

    /// Consume every UTXO whose `lock_state` lock id is one of
    /// `lock_tx_ids` and emit its descended counterpart, amount and owners
    /// preserved. Signer slots stay empty; this path is system-driven.
    ///
    /// Results are unsorted; the caller sorts after combining with other
    /// inputs.
    pub fn unlock(
        &self,
        lock_tx_ids: &[TxId],
        lock_state: LockState,
    ) -> Result<(Vec<TransferableInput>, Vec<TransferableOutput>), BuilderError> {
        if !matches!(lock_state, LockState::Deposited | LockState::Bonded) {
            return Err(BuilderError::IncompatibleLockState);
        }

        let tx_ids: BTreeSet<TxId> = lock_tx_ids.iter().copied().collect();
        let utxos = self
            .state
            .locked_utxos(&tx_ids, &BTreeSet::new(), lock_state)?;

        let mut ins = Vec::with_capacity(utxos.len());
        let mut outs = Vec::with_capacity(utxos.len());
        for utxo in utxos {
            let Output::Locked(locked) = &utxo.out else {
                continue;
            };
            let descended = locked.lock_ids.without_lock(lock_state)?;
            let amount = locked.transfer.amount;
            let owners = locked.transfer.owners.clone();

            ins.push(TransferableInput {
                utxo_id: utxo.utxo_id,
                asset_id: utxo.asset_id,
                input: Input::locked(locked.lock_ids, amount, vec![]),
            });
            outs.push(TransferableOutput {
                asset_id: utxo.asset_id,
                out: match descended.lock_state() {
                    LockState::Unlocked => Output::transfer(amount, owners),
                    _ => Output::locked(descended, amount, owners),
                },
            });
        }

        Ok((ins, outs))
    }

    /// Release the unlockable remainder of each expired deposit in
    /// `deposit_tx_ids`, authenticated by `keys`.
    ///
    /// Fails with `IncompatibleLockState` if any selected deposit has not
    /// expired by `now`. Removing the deposit lock from a deposited-bonded
    /// UTXO leaves its bond in place. Results are unsorted.
    pub fn unlock_deposit(
        &self,
        keys: &[SpendKey],
        deposit_tx_ids: &[TxId],
        now: u64,
    ) -> Result<
        (
            Vec<TransferableInput>,
            Vec<TransferableOutput>,
            Vec<Vec<SpendKey>>,
        ),
        BuilderError,
    > {
        let keychain = Keychain::from_keys(keys.iter().cloned());
        let addresses = keychain.addresses();

        let mut ins = Vec::new();
        let mut outs = Vec::new();
        let mut signers = Vec::new();

        for deposit_tx_id in deposit_tx_ids {
            let deposit = self.state.get_deposit(deposit_tx_id)?;
            if !deposit.is_expired(now) {
                return Err(BuilderError::IncompatibleLockState);
            }
            let mut remaining = deposit.pending_unlock();
            if remaining == 0 {
                continue;
            }

            let tx_ids: BTreeSet<TxId> = [*deposit_tx_id].into_iter().collect();
            let utxos = self
                .state
                .locked_utxos(&tx_ids, &addresses, LockState::Deposited)?;

            for utxo in &utxos {
                if remaining == 0 {
                    break;
                }
                let Output::Locked(locked) = &utxo.out else {
                    continue;
                };
                let Some(matched) = self.spendable_by(&keychain, utxo, now)? else {
                    continue;
                };

                let amount = locked.transfer.amount;
                let unlock_now = remaining.min(amount);
                remaining -= unlock_now;

                let owners = locked.transfer.owners.clone();
                ins.push(TransferableInput {
                    utxo_id: utxo.utxo_id,
                    asset_id: utxo.asset_id,
                    input: Input::locked(locked.lock_ids, amount, matched.sig_indices),
                });
                signers.push(matched.keys);

                let descended = locked.lock_ids.without_lock(LockState::Deposited)?;
                outs.push(TransferableOutput {
                    asset_id: utxo.asset_id,
                    out: match descended.lock_state() {
                        LockState::Unlocked => Output::transfer(unlock_now, owners.clone()),
                        _ => Output::locked(descended, unlock_now, owners.clone()),
                    },
                });
                if amount > unlock_now {
                    outs.push(TransferableOutput {
                        asset_id: utxo.asset_id,
                        out: Output::locked(locked.lock_ids, amount - unlock_now, owners),
                    });
                }
            }

            if remaining > 0 {
                return Err(BuilderError::InsufficientSpendable {
                    lock: remaining,
                    burn: 0,
                });
            }
        }

        Ok((ins, outs, signers))
    }

    // Owner match for one UTXO: skip UTXOs of foreign assets and UTXOs the
    // keychain cannot satisfy; propagate structural failures.
    fn spendable_by(
        &self,
        keychain: &Keychain,
        utxo: &Utxo,
        now: u64,
    ) -> Result<Option<KeychainMatch>, BuilderError> {
        if utxo.asset_id != self.asset_id {
            return Ok(None);
        }
        match keychain.spend_multisig(self.state, utxo.out.owners(), now) {
            Ok(matched) => Ok(Some(matched)),
            Err(BuilderError::KeyMissing) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
