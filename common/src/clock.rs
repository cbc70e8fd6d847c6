// Copyright (c) 2024-2026 The Meridian Foundation

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A wall clock that can be faked for tests.
///
/// Production code constructs a default `Clock` and reads real time;
/// tests call [`Clock::set`] to pin the reported time. All chain logic
/// works in whole unix seconds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Clock {
    faked: Option<u64>,
}

impl Clock {
    /// A clock reporting real system time.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock pinned to `timestamp`.
    pub fn faked(timestamp: u64) -> Self {
        Self {
            faked: Some(timestamp),
        }
    }

    /// Pin the clock to `timestamp`. Subsequent `unix()` calls return it.
    pub fn set(&mut self, timestamp: u64) {
        self.faked = Some(timestamp);
    }

    /// Current time in unix seconds.
    pub fn unix(&self) -> u64 {
        match self.faked {
            Some(timestamp) => timestamp,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}
