// Copyright (c) 2024-2026 The Meridian Foundation

use serde::{Deserialize, Serialize};

/// The relation a short-id link records.
///
/// A link maps `(ShortId, ShortLinkKey)` to another `ShortId`; storing no
/// target in a diff tombstones the link.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ShortLinkKey {
    /// Links a consortium member address and its registered node id, in
    /// both directions.
    RegisterNode,
}
