// Copyright (c) 2024-2026 The Meridian Foundation

use displaydoc::Display;
use mrd_core_types::BlockId;

/// Type alias for state operation results.
pub type StateResult<T> = Result<T, StateError>;

/// Errors surfaced by state reads and diff application.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum StateError {
    /// missing parent state {0}
    MissingParentState(BlockId),
    /// not found
    NotFound,
}

impl std::error::Error for StateError {}
