// Copyright (c) 2024-2026 The Meridian Foundation

//! The versioned wire codec.
//!
//! Values marshal as a big-endian `u16` codec version followed by the
//! value's canonical bytes: fixed-width little-endian integers,
//! length-prefixed sequences, no trailing bytes accepted. The encoding is
//! deterministic, which output sorting and owner hashing rely on.

use bincode::Options;
use displaydoc::Display;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The current wire version.
pub const CODEC_VERSION: u16 = 0;

/// Errors from marshaling or unmarshaling wire bytes.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum CodecError {
    /// unsupported codec version {0}
    UnsupportedVersion(u16),
    /// byte buffer too short to carry a codec version
    TooShort,
    /// serialization failed: {0}
    Serialize(String),
    /// deserialization failed: {0}
    Deserialize(String),
}

impl std::error::Error for CodecError {}

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Marshal `value` under codec `version`.
pub fn marshal<T: Serialize>(version: u16, value: &T) -> Result<Vec<u8>, CodecError> {
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let mut bytes = version.to_be_bytes().to_vec();
    bytes.extend(
        options()
            .serialize(value)
            .map_err(|err| CodecError::Serialize(err.to_string()))?,
    );
    Ok(bytes)
}

/// Unmarshal a versioned byte buffer, returning the version it carried.
pub fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> Result<(u16, T), CodecError> {
    if bytes.len() < 2 {
        return Err(CodecError::TooShort);
    }
    let version = u16::from_be_bytes([bytes[0], bytes[1]]);
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let value = options()
        .deserialize(&bytes[2..])
        .map_err(|err| CodecError::Deserialize(err.to_string()))?;
    Ok((version, value))
}

/// Canonical unversioned bytes of `value`, used as a sort key.
pub fn sort_key<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    options()
        .serialize(value)
        .map_err(|err| CodecError::Serialize(err.to_string()))
}
