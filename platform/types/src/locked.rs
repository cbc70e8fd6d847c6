// Copyright (c) 2024-2026 The Meridian Foundation

//! The lock-state algebra.
//!
//! An output is encumbered by up to two locks, each named by the id of the
//! transaction that placed it: a *deposit* lock and a *bond* lock. The four
//! resulting states form a partial order
//!
//! ```text
//!            DepositedBonded
//!              /         \
//!        Deposited      Bonded
//!              \         /
//!               Unlocked
//! ```
//!
//! Adding a lock moves up, removing one moves down, and a doubly-locked
//! output can be released one lock at a time.

use displaydoc::Display;
use mrd_core_types::{Id, TxId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Placeholder lock id meaning "the transaction currently being built".
///
/// Produced outputs cannot name their own transaction id before the
/// transaction is signed; execution replaces this sentinel with the real id.
pub const THIS_TX_ID: TxId = Id(*b"this tx id placeholder..........");

/// Errors from invalid lock transitions.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum LockError {
    /// output already carries a {0:?} lock
    AlreadyLocked(LockState),
    /// output carries no {0:?} lock to remove
    NotLocked(LockState),
    /// transition must add or remove exactly one of deposit or bond
    InvalidTransition,
}

impl std::error::Error for LockError {}

/// The lock state of an output, decoded from its [`LockIds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Neither lock present.
    Unlocked,
    /// Only the deposit lock present.
    Deposited,
    /// Only the bond lock present.
    Bonded,
    /// Both locks present.
    DepositedBonded,
}

impl LockState {
    /// Whether the deposit lock is part of this state.
    pub fn is_deposited(&self) -> bool {
        matches!(self, LockState::Deposited | LockState::DepositedBonded)
    }

    /// Whether the bond lock is part of this state.
    pub fn is_bonded(&self) -> bool {
        matches!(self, LockState::Bonded | LockState::DepositedBonded)
    }

    /// Whether any lock is present.
    pub fn is_locked(&self) -> bool {
        !matches!(self, LockState::Unlocked)
    }

    /// Whether every lock in `other` is also held in this state.
    pub fn holds(&self, other: LockState) -> bool {
        (!other.is_deposited() || self.is_deposited())
            && (!other.is_bonded() || self.is_bonded())
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockState::Unlocked => "unlocked",
            LockState::Deposited => "deposited",
            LockState::Bonded => "bonded",
            LockState::DepositedBonded => "depositedBonded",
        };
        f.write_str(name)
    }
}

/// The lock ids carried by a locked output. At least one is present on any
/// output wrapped in [`crate::LockedOutput`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LockIds {
    /// The deposit transaction that placed the deposit lock, if any.
    pub deposit_tx_id: Option<TxId>,
    /// The bond transaction that placed the bond lock, if any.
    pub bond_tx_id: Option<TxId>,
}

impl LockIds {
    /// Lock ids for a fresh single lock placed by `tx_id`.
    ///
    /// `applied` must be `Deposited` or `Bonded`.
    pub fn from_state(applied: LockState, tx_id: TxId) -> Result<Self, LockError> {
        match applied {
            LockState::Deposited => Ok(LockIds {
                deposit_tx_id: Some(tx_id),
                bond_tx_id: None,
            }),
            LockState::Bonded => Ok(LockIds {
                deposit_tx_id: None,
                bond_tx_id: Some(tx_id),
            }),
            _ => Err(LockError::InvalidTransition),
        }
    }

    /// Decode the lock state these ids encode.
    pub fn lock_state(&self) -> LockState {
        match (self.deposit_tx_id, self.bond_tx_id) {
            (None, None) => LockState::Unlocked,
            (Some(_), None) => LockState::Deposited,
            (None, Some(_)) => LockState::Bonded,
            (Some(_), Some(_)) => LockState::DepositedBonded,
        }
    }

    /// Add the single lock named by `applied`, placed by `tx_id`.
    pub fn with_lock(&self, applied: LockState, tx_id: TxId) -> Result<Self, LockError> {
        let mut ids = *self;
        match applied {
            LockState::Deposited => {
                if ids.deposit_tx_id.is_some() {
                    return Err(LockError::AlreadyLocked(LockState::Deposited));
                }
                ids.deposit_tx_id = Some(tx_id);
            }
            LockState::Bonded => {
                if ids.bond_tx_id.is_some() {
                    return Err(LockError::AlreadyLocked(LockState::Bonded));
                }
                ids.bond_tx_id = Some(tx_id);
            }
            _ => return Err(LockError::InvalidTransition),
        }
        Ok(ids)
    }

    /// Remove the single lock named by `removed`.
    pub fn without_lock(&self, removed: LockState) -> Result<Self, LockError> {
        let mut ids = *self;
        match removed {
            LockState::Deposited => {
                if ids.deposit_tx_id.is_none() {
                    return Err(LockError::NotLocked(LockState::Deposited));
                }
                ids.deposit_tx_id = None;
            }
            LockState::Bonded => {
                if ids.bond_tx_id.is_none() {
                    return Err(LockError::NotLocked(LockState::Bonded));
                }
                ids.bond_tx_id = None;
            }
            _ => return Err(LockError::InvalidTransition),
        }
        Ok(ids)
    }

    /// Whether these ids satisfy a lock query: every lock named by `state`
    /// is held here, with its id in `tx_ids`.
    ///
    /// A `Deposited` query therefore also matches `DepositedBonded` outputs
    /// whose deposit id is requested, which is what lets a doubly-locked
    /// output be released one lock at a time.
    pub fn match_state(&self, state: LockState, tx_ids: &BTreeSet<TxId>) -> bool {
        if !state.is_locked() {
            return false;
        }
        if state.is_deposited()
            && !self.deposit_tx_id.is_some_and(|id| tx_ids.contains(&id))
        {
            return false;
        }
        if state.is_bonded() && !self.bond_tx_id.is_some_and(|id| tx_ids.contains(&id)) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrd_core_types::Id;

    fn id(byte: u8) -> TxId {
        Id([byte; 32])
    }

    #[test]
    fn test_lock_state_decoding() {
        assert_eq!(LockIds::default().lock_state(), LockState::Unlocked);
        assert_eq!(
            LockIds {
                deposit_tx_id: Some(id(1)),
                bond_tx_id: None
            }
            .lock_state(),
            LockState::Deposited
        );
        assert_eq!(
            LockIds {
                deposit_tx_id: None,
                bond_tx_id: Some(id(2))
            }
            .lock_state(),
            LockState::Bonded
        );
        assert_eq!(
            LockIds {
                deposit_tx_id: Some(id(1)),
                bond_tx_id: Some(id(2))
            }
            .lock_state(),
            LockState::DepositedBonded
        );
    }

    #[test]
    fn test_lock_moves_up() {
        let ids = LockIds::default().with_lock(LockState::Deposited, id(1)).unwrap();
        assert_eq!(ids.lock_state(), LockState::Deposited);

        let ids = ids.with_lock(LockState::Bonded, id(2)).unwrap();
        assert_eq!(ids.lock_state(), LockState::DepositedBonded);
    }

    #[test]
    fn test_double_lock_rejected() {
        let ids = LockIds::from_state(LockState::Bonded, id(1)).unwrap();
        assert_eq!(
            ids.with_lock(LockState::Bonded, id(2)),
            Err(LockError::AlreadyLocked(LockState::Bonded))
        );
    }

    #[test]
    fn test_partial_release() {
        let both = LockIds {
            deposit_tx_id: Some(id(1)),
            bond_tx_id: Some(id(2)),
        };

        let deposited = both.without_lock(LockState::Bonded).unwrap();
        assert_eq!(deposited.lock_state(), LockState::Deposited);

        let bonded = both.without_lock(LockState::Deposited).unwrap();
        assert_eq!(bonded.lock_state(), LockState::Bonded);
    }

    #[test]
    fn test_unlock_without_lock_rejected() {
        assert_eq!(
            LockIds::default().without_lock(LockState::Deposited),
            Err(LockError::NotLocked(LockState::Deposited))
        );
    }

    #[test]
    fn test_compound_transition_rejected() {
        assert_eq!(
            LockIds::default().with_lock(LockState::DepositedBonded, id(1)),
            Err(LockError::InvalidTransition)
        );
        assert_eq!(
            LockIds::from_state(LockState::Unlocked, id(1)),
            Err(LockError::InvalidTransition)
        );
    }

    #[test]
    fn test_match_state() {
        let ids = LockIds {
            deposit_tx_id: Some(id(1)),
            bond_tx_id: Some(id(2)),
        };
        let set: BTreeSet<TxId> = [id(1)].into_iter().collect();

        // deposit query matches the doubly-locked output
        assert!(ids.match_state(LockState::Deposited, &set));
        // bond id is not in the requested set
        assert!(!ids.match_state(LockState::Bonded, &set));
        // both-locks query needs both ids requested
        assert!(!ids.match_state(LockState::DepositedBonded, &set));

        let both: BTreeSet<TxId> = [id(1), id(2)].into_iter().collect();
        assert!(ids.match_state(LockState::DepositedBonded, &both));
        assert!(!ids.match_state(LockState::Unlocked, &both));
    }

    #[test]
    fn test_holds() {
        assert!(LockState::DepositedBonded.holds(LockState::Deposited));
        assert!(LockState::DepositedBonded.holds(LockState::Bonded));
        assert!(LockState::Deposited.holds(LockState::Unlocked));
        assert!(!LockState::Deposited.holds(LockState::Bonded));
        assert!(!LockState::Unlocked.holds(LockState::Deposited));
    }
}
