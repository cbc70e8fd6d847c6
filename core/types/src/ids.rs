// Copyright (c) 2024-2026 The Meridian Foundation

use displaydoc::Display;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Errors from parsing identifiers out of raw bytes or hex strings.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum IdError {
    /// wrong byte length: expected {expected}, got {got}
    InvalidLength {
        /// The length the identifier requires.
        expected: usize,
        /// The length that was supplied.
        got: usize,
    },
    /// invalid hex encoding
    InvalidHex,
}

impl std::error::Error for IdError {}

/// A 32-byte content-hash identifier.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Id(pub [u8; 32]);

impl Id {
    /// The all-zero id, used as "no id".
    pub const EMPTY: Id = Id([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Id(bytes)
    }

    /// Parse from a byte slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;
        Ok(Id(arr))
    }

    /// The SHA-256 of `data`, as an id.
    pub fn sha256(data: &[u8]) -> Self {
        Id(Sha256::digest(data).into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the all-zero id.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&hex::encode(self.0)).finish()
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|_| IdError::InvalidHex)?;
        Id::from_slice(&bytes)
    }
}

impl From<[u8; 32]> for Id {
    fn from(bytes: [u8; 32]) -> Self {
        Id(bytes)
    }
}

/// A 20-byte address identifier.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ShortId(pub [u8; 20]);

impl ShortId {
    /// The all-zero address, used as "no address".
    pub const EMPTY: ShortId = ShortId([0u8; 20]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        ShortId(bytes)
    }

    /// Parse from a byte slice of exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 20,
            got: bytes.len(),
        })?;
        Ok(ShortId(arr))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the all-zero address.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShortId").field(&hex::encode(self.0)).finish()
    }
}

impl FromStr for ShortId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|_| IdError::InvalidHex)?;
        ShortId::from_slice(&bytes)
    }
}

impl From<[u8; 20]> for ShortId {
    fn from(bytes: [u8; 20]) -> Self {
        ShortId(bytes)
    }
}
