// Copyright (c) 2024-2026 The Meridian Foundation

//! Shared utilities for the Meridian platform chain: a mockable wall clock
//! and logging initialization for consuming binaries.

mod clock;
pub mod logging;

pub use clock::Clock;
