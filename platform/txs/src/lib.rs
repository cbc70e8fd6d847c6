// Copyright (c) 2024-2026 The Meridian Foundation

//! Typed transactions for the Meridian platform chain.
//!
//! Transaction kinds form a closed sum type: a verifier pattern-matches the
//! discriminant instead of downcasting, so "unknown transaction type" is not
//! a reachable runtime state. Every transaction marshals under the versioned
//! wire codec; signatures are made over the SHA-256 of the unsigned codec
//! bytes and carried as one credential per input plus any trailing
//! role credentials the transaction kind declares.

pub mod codec;
mod credential;
mod error;
mod tx;
pub mod validation;

pub use codec::{marshal, unmarshal, CodecError, CODEC_VERSION};
pub use credential::Credential;
pub use error::TxError;
pub use tx::{
    AddSubnetValidatorTx, AddValidatorTx, AddressStateTx, BaseTx, ClaimTx, Context, DepositTx,
    RegisterNodeTx, RewardValidatorTx, RewardsImportTx, SubnetValidator, Tx, UnlockDepositTx,
    UnsignedTx, Validator, MAX_MEMO_SIZE,
};
pub use validation::{
    sort_transferable_inputs, sort_transferable_inputs_with_signers, sort_transferable_outputs,
    sum_inputs, sum_outputs,
};
