// Copyright (c) 2024-2026 The Meridian Foundation

use crate::locked::{LockIds, LockState};
use crate::owners::OutputOwners;
use mrd_core_types::{AssetId, TxId};
use serde::{Deserialize, Serialize};

/// Identifier of an output: the transaction that created it plus its index
/// within that transaction's outputs.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UtxoId {
    /// The creating transaction.
    pub tx_id: TxId,
    /// The output's index within the transaction.
    pub output_index: u32,
}

impl UtxoId {
    /// Build a UTXO id.
    pub fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }
}

/// A plain value output spendable by its owners.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferOutput {
    /// Amount carried by the output.
    pub amount: u64,
    /// Who may spend it.
    pub owners: OutputOwners,
}

/// A value output encumbered by one or both locks.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockedOutput {
    /// The encumbering lock ids; at least one is present.
    pub lock_ids: LockIds,
    /// The wrapped plain output.
    pub transfer: TransferOutput,
}

/// An output: plain or locked. Closed sum, so a verifier can never see an
/// output kind it does not know how to handle.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Output {
    /// A plain transfer output.
    Transfer(TransferOutput),
    /// A lock-encumbered output.
    Locked(LockedOutput),
}

impl Output {
    /// A plain output of `amount` to `owners`.
    pub fn transfer(amount: u64, owners: OutputOwners) -> Self {
        Output::Transfer(TransferOutput { amount, owners })
    }

    /// A locked output of `amount` to `owners` under `lock_ids`.
    pub fn locked(lock_ids: LockIds, amount: u64, owners: OutputOwners) -> Self {
        Output::Locked(LockedOutput {
            lock_ids,
            transfer: TransferOutput { amount, owners },
        })
    }

    /// The carried amount.
    pub fn amount(&self) -> u64 {
        match self {
            Output::Transfer(out) => out.amount,
            Output::Locked(out) => out.transfer.amount,
        }
    }

    /// Who may spend the output.
    pub fn owners(&self) -> &OutputOwners {
        match self {
            Output::Transfer(out) => &out.owners,
            Output::Locked(out) => &out.transfer.owners,
        }
    }

    /// The lock ids; empty for plain outputs.
    pub fn lock_ids(&self) -> LockIds {
        match self {
            Output::Transfer(_) => LockIds::default(),
            Output::Locked(out) => out.lock_ids,
        }
    }

    /// The decoded lock state.
    pub fn lock_state(&self) -> LockState {
        self.lock_ids().lock_state()
    }
}

/// A plain input consuming a transfer output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    /// Amount consumed, equal to the referenced output's amount.
    pub amount: u64,
    /// Positions of the signers within the owner's sorted address list
    /// (leaf positions of the flattening, for multisig owners).
    pub sig_indices: Vec<u32>,
}

/// An input consuming a locked output; carries the lock ids it consumes so
/// verifiers can balance value per lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedInput {
    /// The lock ids of the consumed output.
    pub lock_ids: LockIds,
    /// The wrapped plain input.
    pub transfer: TransferInput,
}

/// An input: plain or locked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    /// Consumes a plain output.
    Transfer(TransferInput),
    /// Consumes a locked output.
    Locked(LockedInput),
}

impl Input {
    /// A plain input.
    pub fn transfer(amount: u64, sig_indices: Vec<u32>) -> Self {
        Input::Transfer(TransferInput {
            amount,
            sig_indices,
        })
    }

    /// A locked input.
    pub fn locked(lock_ids: LockIds, amount: u64, sig_indices: Vec<u32>) -> Self {
        Input::Locked(LockedInput {
            lock_ids,
            transfer: TransferInput {
                amount,
                sig_indices,
            },
        })
    }

    /// The consumed amount.
    pub fn amount(&self) -> u64 {
        match self {
            Input::Transfer(input) => input.amount,
            Input::Locked(input) => input.transfer.amount,
        }
    }

    /// The signature indices.
    pub fn sig_indices(&self) -> &[u32] {
        match self {
            Input::Transfer(input) => &input.sig_indices,
            Input::Locked(input) => &input.transfer.sig_indices,
        }
    }

    /// The lock ids consumed; empty for plain inputs.
    pub fn lock_ids(&self) -> LockIds {
        match self {
            Input::Transfer(_) => LockIds::default(),
            Input::Locked(input) => input.lock_ids,
        }
    }
}

/// An output paired with its asset, as it appears in a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableOutput {
    /// The asset the output carries.
    pub asset_id: AssetId,
    /// The output itself.
    pub out: Output,
}

/// An input paired with the UTXO it consumes, as it appears in a
/// transaction. Inputs sort by `(tx_id, output_index)` of the consumed UTXO.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableInput {
    /// The consumed UTXO.
    pub utxo_id: UtxoId,
    /// The asset the input carries.
    pub asset_id: AssetId,
    /// The input itself.
    pub input: Input,
}

/// An unspent transaction output as stored in state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Identity of the output.
    pub utxo_id: UtxoId,
    /// The asset it carries.
    pub asset_id: AssetId,
    /// The output itself.
    pub out: Output,
}

impl Utxo {
    /// Build a UTXO.
    pub fn new(utxo_id: UtxoId, asset_id: AssetId, out: Output) -> Self {
        Self {
            utxo_id,
            asset_id,
            out,
        }
    }
}

/// A cross-chain reward UTXO stamped with its export time. Imports only
/// accept UTXOs old enough to have settled in shared memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedUtxo {
    /// The exported UTXO.
    pub utxo: Utxo,
    /// Unix time the UTXO was placed into shared memory.
    pub timestamp: u64,
}
