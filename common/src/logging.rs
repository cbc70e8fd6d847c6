// Copyright (c) 2024-2026 The Meridian Foundation

//! Logging initialization for binaries.
//!
//! The library crates only emit `tracing` events; installing a subscriber
//! is the consuming binary's job, typically by calling [`init`] once at
//! startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber reading `RUST_LOG`, defaulting to `filter`.
///
/// Calling this twice panics, as `tracing` allows one global subscriber.
pub fn init(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
