// Copyright (c) 2024-2026 The Meridian Foundation

//! Spend planning and transaction construction for the Meridian platform
//! chain.
//!
//! The [`Spender`] turns "lock this much, burn this much" into balanced,
//! canonically ordered inputs and outputs with signer bundles; the
//! [`Builder`] wraps it with one constructor per transaction family,
//! attaching each family's role credentials. The [`Keychain`] resolves
//! owners to signing keys, expanding registered multisig aliases through
//! state.

mod builder;
mod error;
mod keychain;
mod spender;
mod traits;

pub use builder::{Builder, Config, MAX_PAGE_SIZE, SHARED_MEMORY_SYNC_BOUND};
pub use error::BuilderError;
pub use keychain::{Keychain, KeychainMatch, MAX_MULTISIG_DEPTH};
pub use spender::{SpendPlan, Spender};
pub use traits::{KeystoreUser, SharedMemory, SharedMemoryPage};
