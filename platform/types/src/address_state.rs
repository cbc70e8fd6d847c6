// Copyright (c) 2024-2026 The Meridian Foundation

use serde::{Deserialize, Serialize};

/// Per-address role flags, stored as a 64-bit field.
///
/// The core only sets, clears and tests bits; what a bit entitles an address
/// to do is enforced by transaction execution.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AddressState(pub u64);

impl AddressState {
    /// No roles.
    pub const EMPTY: AddressState = AddressState(0);
    /// May administer role assignments.
    pub const ROLE_ADMIN: AddressState = AddressState(1);
    /// Passed identity verification.
    pub const KYC_VERIFIED: AddressState = AddressState(1 << 1);
    /// Member of the consortium; may register validator nodes.
    pub const CONSORTIUM_MEMBER: AddressState = AddressState(1 << 2);
    /// The address's validator is deferred from the active set.
    pub const NODE_DEFERRED: AddressState = AddressState(1 << 3);

    /// The state with only bit `bit` set.
    pub fn from_bit(bit: u8) -> AddressState {
        AddressState(1u64 << (bit % 64))
    }

    /// Whether every bit of `other` is set.
    pub fn contains(&self, other: AddressState) -> bool {
        self.0 & other.0 == other.0
    }

    /// This state with the bits of `other` added.
    pub fn with(&self, other: AddressState) -> AddressState {
        AddressState(self.0 | other.0)
    }

    /// This state with the bits of `other` removed.
    pub fn without(&self, other: AddressState) -> AddressState {
        AddressState(self.0 & !other.0)
    }

    /// Whether no bits are set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let state = AddressState::EMPTY
            .with(AddressState::KYC_VERIFIED)
            .with(AddressState::CONSORTIUM_MEMBER);

        assert!(state.contains(AddressState::KYC_VERIFIED));
        assert!(state.contains(AddressState::CONSORTIUM_MEMBER));
        assert!(!state.contains(AddressState::ROLE_ADMIN));

        let cleared = state.without(AddressState::KYC_VERIFIED);
        assert!(!cleared.contains(AddressState::KYC_VERIFIED));
        assert!(cleared.contains(AddressState::CONSORTIUM_MEMBER));
    }

    #[test]
    fn test_from_bit() {
        assert_eq!(AddressState::from_bit(2), AddressState::CONSORTIUM_MEMBER);
        assert_eq!(AddressState::from_bit(64), AddressState(1));
    }
}
