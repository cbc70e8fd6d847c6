// Copyright (c) 2024-2026 The Meridian Foundation

#![deny(unsafe_code)]

//! secp256k1 key support for the Meridian platform chain.
//!
//! Transactions are authorized with ECDSA over secp256k1. Signatures are
//! 65 bytes (r ‖ s ‖ recovery id), so verifiers recover the signer's public
//! key from the signature and compare addresses instead of carrying public
//! keys on the wire. An address is the first 20 bytes of the SHA-256 of the
//! 33-byte compressed public key.
//!
//! # Examples
//!
//! ```
//! use mrd_crypto_keys::PrivateKey;
//!
//! let key = PrivateKey::from_bytes(&[7u8; 32]).unwrap();
//! let digest = [42u8; 32];
//! let signature = key.sign(&digest);
//! let recovered = signature.recover_address(&digest).unwrap();
//! assert_eq!(recovered, key.address());
//! ```

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::SecretKey;
use mrd_core_types::ShortId;
use rand_core::{CryptoRng, RngCore};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroize;

/// Length of a recoverable signature: r (32) + s (32) + recovery id (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during key operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The supplied scalar is zero or not in the curve's field.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// The signature bytes did not parse as r ‖ s ‖ v.
    #[error("invalid signature encoding")]
    InvalidSignature,

    /// The public key could not be recovered from the signature.
    #[error("signature recovery failed")]
    RecoveryFailed,

    /// A fake key carries only an address and cannot sign.
    #[error("fake key for {0} carries only an address and cannot sign")]
    FakeKeyCannotSign(ShortId),
}

/// A secp256k1 signing key.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey {{ address: {} }}", self.address())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.signing_key.to_bytes() == other.signing_key.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Generate a fresh random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::random(rng),
        }
    }

    /// Construct from raw 32-byte scalar bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        let secret_key =
            SecretKey::from_bytes(bytes.into()).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self {
            signing_key: SigningKey::from(secret_key),
        })
    }

    /// The raw 32-byte scalar. Callers must zeroize copies they make.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.signing_key.verifying_key())
    }

    /// The address of the corresponding public key.
    pub fn address(&self) -> ShortId {
        self.public_key().address()
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    pub fn sign(&self, digest: &[u8; 32]) -> Signature {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .expect("signing with a valid key cannot fail");

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Signature(bytes)
    }
}

/// A secp256k1 verifying key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// The 33-byte compressed SEC1 encoding.
    pub fn to_compressed(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// The address: first 20 bytes of SHA-256 of the compressed encoding.
    pub fn address(&self) -> ShortId {
        let digest = Sha256::digest(self.to_compressed());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        ShortId(bytes)
    }
}

/// A 65-byte recoverable ECDSA signature (r ‖ s ‖ recovery id).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Parse from a byte slice of exactly 65 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Signature(arr))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Recover the signer's public key from this signature over `digest`.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<PublicKey, KeyError> {
        let signature = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|_| KeyError::InvalidSignature)?;
        let recovery_id =
            RecoveryId::from_byte(self.0[64]).ok_or(KeyError::InvalidSignature)?;

        let verifying_key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|_| KeyError::RecoveryFailed)?;
        Ok(PublicKey(verifying_key))
    }

    /// Recover the signer's address from this signature over `digest`.
    pub fn recover_address(&self, digest: &[u8; 32]) -> Result<ShortId, KeyError> {
        Ok(self.recover(digest)?.address())
    }

    /// Check that this signature over `digest` was made by `address`.
    pub fn verify(&self, digest: &[u8; 32], address: &ShortId) -> bool {
        self.recover_address(digest)
            .map(|recovered| recovered == *address)
            .unwrap_or(false)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature")
            .field(&hex::encode(self.0))
            .finish()
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        Signature::from_slice(&bytes).map_err(D::Error::custom)
    }
}

/// A key usable for planning a spend.
///
/// The spend planner only needs to know *which address* a key controls to
/// select UTXOs and compute signature indices; only the signer needs the
/// actual scalar. `Fake` carries just the address, which lets API-side
/// previews and the treasury's system-built transactions run the planner
/// without signing power. Signing with a `Fake` key fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpendKey {
    /// A real signing key.
    Real(PrivateKey),
    /// A selection-only sentinel carrying an address.
    Fake(ShortId),
}

impl SpendKey {
    /// The address this key controls.
    pub fn address(&self) -> ShortId {
        match self {
            SpendKey::Real(key) => key.address(),
            SpendKey::Fake(addr) => *addr,
        }
    }

    /// Whether this key can produce signatures.
    pub fn can_sign(&self) -> bool {
        matches!(self, SpendKey::Real(_))
    }

    /// Sign a 32-byte digest. Fails for `Fake` keys.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        match self {
            SpendKey::Real(key) => Ok(key.sign(digest)),
            SpendKey::Fake(addr) => Err(KeyError::FakeKeyCannotSign(*addr)),
        }
    }
}

impl From<PrivateKey> for SpendKey {
    fn from(key: PrivateKey) -> Self {
        SpendKey::Real(key)
    }
}

/// Zeroize a secret scalar copy.
pub fn zeroize_scalar(bytes: &mut [u8; 32]) {
    bytes.zeroize();
}
