// Copyright (c) 2024-2026 The Meridian Foundation

use mrd_crypto_keys::{KeyError, Signature};
use mrd_core_types::ShortId;
use serde::{Deserialize, Serialize};

/// The signatures authorizing one input (or one trailing role slot) of a
/// transaction.
///
/// Signature order follows the input's signature indices: `signatures[i]`
/// belongs to the address at the input's `sig_indices[i]` position within
/// the owner's flattened address list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Recoverable signatures over the transaction's signing digest.
    pub signatures: Vec<Signature>,
}

impl Credential {
    /// A credential carrying no signatures, used by system-built inputs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Recover the signer address of each signature over `digest`,
    /// preserving order.
    pub fn recover_addresses(&self, digest: &[u8; 32]) -> Result<Vec<ShortId>, KeyError> {
        self.signatures
            .iter()
            .map(|signature| signature.recover_address(digest))
            .collect()
    }
}
