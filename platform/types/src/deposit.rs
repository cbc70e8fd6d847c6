// Copyright (c) 2024-2026 The Meridian Foundation

//! Deposits and the offers that configure them.
//!
//! A deposit time-locks value under an offer's terms and accrues reward
//! linearly until its end time. Offers are immutable once created; flagging
//! an offer `LOCKED` hides it from active-offer queries but never alters a
//! deposit already running against it.

use crate::owners::OutputOwners;
use displaydoc::Display;
use mrd_core_types::OfferId;
use serde::{Deserialize, Serialize};

/// Interest rates are expressed as parts per million per year.
pub const INTEREST_RATE_DENOMINATOR: u64 = 1_000_000;

/// Seconds in the 365-day year the reward schedule is quoted against.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Errors from checking a prospective deposit against an offer.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum DepositError {
    /// offer is locked or outside its availability window
    OfferInactive,
    /// duration {duration} outside offer range [{min}, {max}]
    DurationOutOfRange {
        /// Requested duration in seconds.
        duration: u32,
        /// Offer minimum.
        min: u32,
        /// Offer maximum.
        max: u32,
    },
    /// amount {amount} below offer minimum {min}
    AmountTooSmall {
        /// Requested amount.
        amount: u64,
        /// Offer minimum.
        min: u64,
    },
}

impl std::error::Error for DepositError {}

/// Flag bits on a deposit offer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OfferFlags(pub u64);

impl OfferFlags {
    /// No flags set.
    pub const NONE: OfferFlags = OfferFlags(0);
    /// The offer no longer accepts new deposits.
    pub const LOCKED: OfferFlags = OfferFlags(1);

    /// Whether every flag in `other` is set here.
    pub fn contains(&self, other: OfferFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Immutable configuration a deposit is created against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOffer {
    /// The offer's id.
    pub id: OfferId,
    /// Annual reward rate in parts per [`INTEREST_RATE_DENOMINATOR`].
    pub interest_rate_nominator: u64,
    /// Unix time from which deposits may be created.
    pub start: u64,
    /// Unix time after which no deposits may be created.
    pub end: u64,
    /// Minimum deposit amount.
    pub min_amount: u64,
    /// Minimum deposit duration in seconds.
    pub min_duration: u32,
    /// Maximum deposit duration in seconds.
    pub max_duration: u32,
    /// Flag bits; `LOCKED` retires the offer.
    pub flags: OfferFlags,
}

impl DepositOffer {
    /// Whether the offer currently accepts new deposits. Locked offers are
    /// invisible to active-only queries but remain resolvable by id.
    pub fn is_active(&self, now: u64) -> bool {
        !self.flags.contains(OfferFlags::LOCKED) && self.start <= now && now < self.end
    }

    /// Check that a prospective deposit fits this offer's terms.
    pub fn permits(&self, amount: u64, duration: u32, now: u64) -> Result<(), DepositError> {
        if !self.is_active(now) {
            return Err(DepositError::OfferInactive);
        }
        if duration < self.min_duration || duration > self.max_duration {
            return Err(DepositError::DurationOutOfRange {
                duration,
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        if amount < self.min_amount {
            return Err(DepositError::AmountTooSmall {
                amount,
                min: self.min_amount,
            });
        }
        Ok(())
    }
}

/// A running deposit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// The offer this deposit was created against.
    pub deposit_offer_id: OfferId,
    /// Unix time the deposit started.
    pub start: u64,
    /// Duration in seconds; the deposit expires at `start + duration`.
    pub duration: u32,
    /// Principal locked by the deposit.
    pub amount: u64,
    /// Principal already released back to the owner.
    pub unlocked_amount: u64,
    /// Reward already claimed.
    pub claimed_reward_amount: u64,
    /// Where accrued reward is paid.
    pub rewards_owner: OutputOwners,
}

impl Deposit {
    /// Unix time at which the deposit expires.
    pub fn end_time(&self) -> u64 {
        self.start.saturating_add(self.duration as u64)
    }

    /// Whether the deposit has expired at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.end_time()
    }

    /// Principal still locked and releasable once the deposit expires.
    pub fn pending_unlock(&self) -> u64 {
        self.amount.saturating_sub(self.unlocked_amount)
    }

    /// Reward accrued from `start` to `min(now, end)` under `offer`, minus
    /// what was already claimed. Monotonic in `now`.
    pub fn claimable_reward(&self, offer: &DepositOffer, now: u64) -> u64 {
        let until = now.clamp(self.start, self.end_time());
        let elapsed = until - self.start;

        // 128-bit intermediates: amount * rate * elapsed overflows u64 for
        // realistic principals.
        let accrued = (self.amount as u128)
            .saturating_mul(offer.interest_rate_nominator as u128)
            .saturating_mul(elapsed as u128)
            / (INTEREST_RATE_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128);

        u64::try_from(accrued)
            .unwrap_or(u64::MAX)
            .saturating_sub(self.claimed_reward_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrd_core_types::{Id, ShortId};

    fn offer() -> DepositOffer {
        DepositOffer {
            id: Id([1; 32]),
            // 10% per year
            interest_rate_nominator: 100_000,
            start: 0,
            end: 1_000_000,
            min_amount: 10,
            min_duration: 60,
            max_duration: SECONDS_PER_YEAR as u32,
            flags: OfferFlags::NONE,
        }
    }

    fn deposit(start: u64, duration: u32, amount: u64) -> Deposit {
        Deposit {
            deposit_offer_id: Id([1; 32]),
            start,
            duration,
            amount,
            unlocked_amount: 0,
            claimed_reward_amount: 0,
            rewards_owner: OutputOwners::single(ShortId([7; 20])),
        }
    }

    #[test]
    fn test_end_time() {
        assert_eq!(deposit(100, 50, 500).end_time(), 150);
        assert!(deposit(100, 50, 500).is_expired(150));
        assert!(!deposit(100, 50, 500).is_expired(149));
    }

    #[test]
    fn test_full_year_reward() {
        let d = deposit(0, SECONDS_PER_YEAR as u32, 1_000_000);
        // 10% of 1_000_000 over a full year
        assert_eq!(d.claimable_reward(&offer(), SECONDS_PER_YEAR), 100_000);
    }

    #[test]
    fn test_reward_is_monotonic_and_clamped() {
        let d = deposit(1000, SECONDS_PER_YEAR as u32, 1_000_000);
        let o = offer();

        let mut last = 0;
        for now in [0, 1000, 2000, 500_000, d.end_time(), d.end_time() + 5000] {
            let reward = d.claimable_reward(&o, now);
            assert!(reward >= last, "reward regressed at now={now}");
            last = reward;
        }
        // accrual stops at end_time
        assert_eq!(
            d.claimable_reward(&o, d.end_time()),
            d.claimable_reward(&o, d.end_time() + 123_456)
        );
    }

    #[test]
    fn test_claimed_reward_is_subtracted() {
        let mut d = deposit(0, SECONDS_PER_YEAR as u32, 1_000_000);
        let o = offer();
        let full = d.claimable_reward(&o, SECONDS_PER_YEAR);

        d.claimed_reward_amount = 40_000;
        assert_eq!(d.claimable_reward(&o, SECONDS_PER_YEAR), full - 40_000);
    }

    #[test]
    fn test_no_reward_before_start() {
        let d = deposit(5000, 1000, 777);
        assert_eq!(d.claimable_reward(&offer(), 10), 0);
    }

    #[test]
    fn test_offer_activity_window() {
        let o = offer();
        assert!(!o.is_active(o.end));
        assert!(o.is_active(o.start));

        let mut locked = offer();
        locked.flags = OfferFlags::LOCKED;
        assert!(!locked.is_active(100));
    }

    #[test]
    fn test_offer_permits() {
        let o = offer();
        assert!(o.permits(100, 3600, 10).is_ok());
        assert_eq!(
            o.permits(100, 1, 10),
            Err(DepositError::DurationOutOfRange {
                duration: 1,
                min: 60,
                max: SECONDS_PER_YEAR as u32,
            })
        );
        assert_eq!(
            o.permits(1, 3600, 10),
            Err(DepositError::AmountTooSmall { amount: 1, min: 10 })
        );
        assert_eq!(
            o.permits(100, 3600, o.end),
            Err(DepositError::OfferInactive)
        );
    }

    #[test]
    fn test_pending_unlock() {
        let mut d = deposit(0, 100, 500);
        assert_eq!(d.pending_unlock(), 500);
        d.unlocked_amount = 200;
        assert_eq!(d.pending_unlock(), 300);
    }
}
