// Copyright (c) 2024-2026 The Meridian Foundation

use displaydoc::Display;
use mrd_core_types::{OwnerId, ShortId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors from malformed owner structures.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum OwnersError {
    /// threshold {threshold} exceeds the {addrs} available addresses
    InvalidThreshold {
        /// The signature threshold.
        threshold: u32,
        /// The number of addresses.
        addrs: usize,
    },
    /// addresses must be sorted and unique
    UnsortedAddresses,
}

impl std::error::Error for OwnersError {}

/// Who may spend an output: a threshold over a sorted address set, gated by
/// a locktime.
///
/// Two owners with identical contents hash to the same [`OwnerId`], which is
/// how claimables and reward destinations are keyed.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputOwners {
    /// Unix time before which the output cannot be spent.
    pub locktime: u64,
    /// How many of `addrs` must sign.
    pub threshold: u32,
    /// The candidate signer addresses, sorted ascending and unique.
    pub addrs: Vec<ShortId>,
}

impl OutputOwners {
    /// Build an owner set, sorting and deduplicating the addresses.
    pub fn new(locktime: u64, threshold: u32, mut addrs: Vec<ShortId>) -> Self {
        addrs.sort_unstable();
        addrs.dedup();
        Self {
            locktime,
            threshold,
            addrs,
        }
    }

    /// A single-address owner with threshold 1 and no locktime.
    pub fn single(addr: ShortId) -> Self {
        Self {
            locktime: 0,
            threshold: 1,
            addrs: vec![addr],
        }
    }

    /// Check structural validity: `threshold <= |addrs|`, sorted unique.
    pub fn verify(&self) -> Result<(), OwnersError> {
        if self.threshold as usize > self.addrs.len() {
            return Err(OwnersError::InvalidThreshold {
                threshold: self.threshold,
                addrs: self.addrs.len(),
            });
        }
        if !self.addrs.windows(2).all(|w| w[0] < w[1]) {
            return Err(OwnersError::UnsortedAddresses);
        }
        Ok(())
    }

    /// Whether `addr` is one of the candidate signers.
    pub fn contains(&self, addr: &ShortId) -> bool {
        self.addrs.binary_search(addr).is_ok()
    }

    /// The position of `addr` within the sorted address list.
    pub fn position(&self, addr: &ShortId) -> Option<u32> {
        self.addrs.binary_search(addr).ok().map(|i| i as u32)
    }

    /// The content hash of the canonical encoding of this owner structure.
    pub fn owner_id(&self) -> OwnerId {
        let bytes = canonical_bytes(self);
        OwnerId::new(Sha256::digest(&bytes).into())
    }
}

// Owners hash over their canonical codec bytes. Addresses are kept sorted,
// so equal contents always produce equal bytes.
fn canonical_bytes(owners: &OutputOwners) -> Vec<u8> {
    use bincode::Options;
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .serialize(owners)
        .expect("owner structures always serialize")
}

/// A registered multisig alias: an address that expands to an owner
/// structure when it appears in an output's address list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAlias {
    /// The alias address.
    pub id: ShortId,
    /// Free-form metadata attached at registration.
    pub memo: Vec<u8>,
    /// The owner structure the alias stands for.
    pub owners: OutputOwners,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> ShortId {
        ShortId([byte; 20])
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let owners = OutputOwners::new(0, 2, vec![addr(3), addr(1), addr(3), addr(2)]);
        assert_eq!(owners.addrs, vec![addr(1), addr(2), addr(3)]);
        assert!(owners.verify().is_ok());
    }

    #[test]
    fn test_verify_rejects_threshold_above_addrs() {
        let owners = OutputOwners {
            locktime: 0,
            threshold: 2,
            addrs: vec![addr(1)],
        };
        assert_eq!(
            owners.verify(),
            Err(OwnersError::InvalidThreshold {
                threshold: 2,
                addrs: 1
            })
        );
    }

    #[test]
    fn test_verify_rejects_unsorted() {
        let owners = OutputOwners {
            locktime: 0,
            threshold: 1,
            addrs: vec![addr(2), addr(1)],
        };
        assert_eq!(owners.verify(), Err(OwnersError::UnsortedAddresses));
    }

    #[test]
    fn test_owner_id_equal_for_equal_contents() {
        let a = OutputOwners::new(5, 2, vec![addr(1), addr(2), addr(3)]);
        let b = OutputOwners::new(5, 2, vec![addr(3), addr(2), addr(1)]);
        assert_eq!(a.owner_id(), b.owner_id());
    }

    #[test]
    fn test_owner_id_differs_for_different_contents() {
        let a = OutputOwners::single(addr(1));
        let mut b = a.clone();
        b.locktime = 1;
        assert_ne!(a.owner_id(), b.owner_id());
    }

    #[test]
    fn test_position() {
        let owners = OutputOwners::new(0, 2, vec![addr(1), addr(2), addr(3)]);
        assert_eq!(owners.position(&addr(2)), Some(1));
        assert_eq!(owners.position(&addr(9)), None);
    }
}
