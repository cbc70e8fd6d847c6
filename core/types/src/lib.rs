// Copyright (c) 2024-2026 The Meridian Foundation

//! Primitive identifier types shared across the Meridian platform chain.
//!
//! Two byte-array newtypes cover every identifier the chain uses:
//! [`Id`] is a 32-byte content hash (transactions, assets, blocks, subnets,
//! canonicalized owners), [`ShortId`] is a 20-byte address (accounts,
//! multisig aliases, node identities). Domain-specific aliases make
//! signatures self-describing without introducing new types.

mod ids;

pub use ids::{Id, IdError, ShortId};

/// A transaction id: the SHA-256 of the signed transaction bytes.
pub type TxId = Id;
/// An asset id; the id of the transaction that created the asset.
pub type AssetId = Id;
/// A block id.
pub type BlockId = Id;
/// A subnet id.
pub type SubnetId = Id;
/// A deposit-offer id.
pub type OfferId = Id;
/// The content hash of a canonicalized owner structure.
pub type OwnerId = Id;
/// A node identity, carried as a 20-byte address.
pub type NodeId = ShortId;
