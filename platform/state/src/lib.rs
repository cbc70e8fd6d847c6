// Copyright (c) 2024-2026 The Meridian Foundation

//! Layered state for the Meridian platform chain.
//!
//! A block under consideration executes against a [`Diff`]: a modification
//! set overlaying a parent state, which may itself be a diff. Reads fall
//! through unmodified keys to the parent chain down to the base
//! [`State`]; a tombstoned key short-circuits to `NotFound`. When a block
//! is accepted its diff is applied onto the base state atomically; when it
//! is rejected the diff is simply dropped.
//!
//! [`StateVersions`] is the registry through which a diff resolves its
//! parent, holding every concurrently-live diff plus the base state.

mod chain;
mod diff;
mod error;
mod mem;
mod stakers;
mod versions;

pub use chain::{ChainConfig, ChainState, StakerIterator, State};
pub use diff::Diff;
pub use error::{StateError, StateResult};
pub use mem::MemState;
pub use stakers::MergedStakerIterator;
pub use versions::StateVersions;
