// Copyright (c) 2024-2026 The Meridian Foundation

use displaydoc::Display;
use mrd_crypto_keys::KeyError;
use mrd_platform_state::StateError;
use mrd_platform_txs::{CodecError, TxError};
use mrd_platform_types::{DepositError, LockError, OwnersError};

/// Errors surfaced by spend planning and transaction construction.
#[derive(Debug, Display)]
pub enum BuilderError {
    /// couldn't find key matching address or owner threshold
    KeyMissing,
    /// insufficient spendable funds: {lock} more to lock, {burn} more to burn
    InsufficientSpendable {
        /// Lock amount still uncovered.
        lock: u64,
        /// Burn amount still uncovered.
        burn: u64,
    },
    /// utxo lock state is incompatible with the requested transition
    IncompatibleLockState,
    /// this transaction kind requires the bond/deposit lock mode
    WrongLockMode,
    /// no utxos eligible for import
    NoUtxosForImport,
    /// multisig alias nesting exceeds depth {0}
    MultisigDepthExceeded(usize),
    /// amount arithmetic overflowed
    AmountOverflow,
    /// deposit offer: {0}
    Deposit(DepositError),
    /// shared memory: {0}
    SharedMemory(String),
    /// state: {0}
    State(StateError),
    /// transaction: {0}
    Tx(TxError),
    /// codec: {0}
    Codec(CodecError),
    /// key: {0}
    Key(KeyError),
    /// owners: {0}
    Owners(OwnersError),
}

impl std::error::Error for BuilderError {}

impl From<StateError> for BuilderError {
    fn from(err: StateError) -> Self {
        BuilderError::State(err)
    }
}

impl From<TxError> for BuilderError {
    fn from(err: TxError) -> Self {
        BuilderError::Tx(err)
    }
}

impl From<CodecError> for BuilderError {
    fn from(err: CodecError) -> Self {
        BuilderError::Codec(err)
    }
}

impl From<KeyError> for BuilderError {
    fn from(err: KeyError) -> Self {
        BuilderError::Key(err)
    }
}

impl From<OwnersError> for BuilderError {
    fn from(err: OwnersError) -> Self {
        BuilderError::Owners(err)
    }
}

impl From<DepositError> for BuilderError {
    fn from(err: DepositError) -> Self {
        BuilderError::Deposit(err)
    }
}

impl From<LockError> for BuilderError {
    fn from(_: LockError) -> Self {
        BuilderError::IncompatibleLockState
    }
}
