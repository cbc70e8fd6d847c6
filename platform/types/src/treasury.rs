// Copyright (c) 2024-2026 The Meridian Foundation

//! The treasury: a well-known address holding system-owned reward funds.
//!
//! No key exists for this address. Transactions spending treasury outputs
//! are built by the chain itself with a selection-only fake key and are
//! verified structurally, not by signature.

use mrd_core_types::ShortId;

/// The treasury address.
pub const TREASURY_ADDR: ShortId = ShortId(*b"meridian-treasury-00");

/// Address traits used to index treasury UTXOs in cross-chain shared
/// memory.
pub fn addr_traits_bytes() -> Vec<Vec<u8>> {
    vec![TREASURY_ADDR.as_bytes().to_vec()]
}
