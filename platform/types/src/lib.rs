// Copyright (c) 2024-2026 The Meridian Foundation

//! Data model for the Meridian platform chain.
//!
//! Every on-chain output can be encumbered by a *deposit* lock, a *bond*
//! lock, both, or neither. This crate defines that lock-state algebra and
//! the types it acts on: output owners and their content-hash ids, the UTXO
//! sum types, deposits and their offers, accrued claimables, per-address
//! role flags, short-id links and deferred validators.

mod address_state;
mod claimable;
mod deposit;
mod link;
pub mod locked;
mod owners;
mod staker;
pub mod treasury;
mod utxo;

pub use address_state::AddressState;
pub use claimable::Claimable;
pub use deposit::{
    Deposit, DepositError, DepositOffer, OfferFlags, INTEREST_RATE_DENOMINATOR, SECONDS_PER_YEAR,
};
pub use link::ShortLinkKey;
pub use locked::{LockError, LockIds, LockState, THIS_TX_ID};
pub use owners::{MultisigAlias, OutputOwners, OwnersError};
pub use staker::Staker;
pub use utxo::{
    Input, LockedInput, LockedOutput, Output, TimedUtxo, TransferInput, TransferOutput,
    TransferableInput, TransferableOutput, Utxo, UtxoId,
};
