// Copyright (c) 2024-2026 The Meridian Foundation

//! Contracts of the collaborators the builder consumes.

use crate::error::BuilderError;
use crate::keychain::Keychain;
use mrd_core_types::{BlockId, ShortId};

/// One page of an indexed shared-memory scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedMemoryPage {
    /// Marshaled UTXOs, at most the requested page size.
    pub utxo_bytes: Vec<Vec<u8>>,
    /// Resume cursor: last address scanned.
    pub last_addr: Vec<u8>,
    /// Resume cursor: last UTXO scanned.
    pub last_utxo: Vec<u8>,
}

/// Cross-chain atomic memory, implemented by the host.
pub trait SharedMemory {
    /// Fetch UTXOs indexed under any of `traits` from `chain_id`'s shared
    /// memory, resuming after the `(start_addr, start_utxo)` cursor.
    fn indexed(
        &self,
        chain_id: BlockId,
        traits: &[Vec<u8>],
        start_addr: &[u8],
        start_utxo: &[u8],
        max_page: u32,
    ) -> Result<SharedMemoryPage, BuilderError>;
}

/// A logged-in keystore user, implemented by the host's key store.
pub trait KeystoreUser {
    /// The signing keys the user holds for `addresses`.
    fn get_keychain(&mut self, addresses: &[ShortId]) -> Result<Keychain, BuilderError>;

    /// Release the keystore handle.
    fn close(&mut self);
}
