// Copyright (c) 2024-2026 The Meridian Foundation

use crate::owners::OutputOwners;
use serde::{Deserialize, Serialize};

/// Reward accrued to an owner but not yet paid out, keyed in state by the
/// owner's content hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimable {
    /// Who may claim.
    pub owner: OutputOwners,
    /// Accrued validator reward.
    pub validator_reward: u64,
    /// Accrued deposit reward.
    pub deposit_reward: u64,
}

impl Claimable {
    /// Total claimable amount across both reward kinds.
    pub fn total(&self) -> u64 {
        self.validator_reward.saturating_add(self.deposit_reward)
    }
}
