//! The 32-byte account identity and its Base58 text form.
//!
//! A Solana address is simply the Base58 encoding of 32 raw bytes. There is no
//! hashing step and no checksum. The bytes are usually an Ed25519 public key,
//! but program-derived addresses are deliberately *off* the curve, so a
//! `Pubkey` makes no promise about being a valid point.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyError;

/// Number of bytes in a public key.
pub const PUBKEY_BYTES: usize = 32;

/// Longest Base58 string that can decode to 32 bytes.
const MAX_BASE58_LEN: usize = 44;

/// A 32-byte account address.
///
/// Equality and ordering are plain byte comparisons.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice that must be exactly 32 bytes long.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            KeyError::InvalidPublicKey(format!(
                "expected {PUBKEY_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub const fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    /// Whether these bytes decompress to a point on the Ed25519 curve.
    ///
    /// Ordinary wallet keys are on the curve; program-derived addresses
    /// must not be.
    pub fn is_on_curve(&self) -> bool {
        curve25519_dalek::edwards::CompressedEdwardsY(self.0)
            .decompress()
            .is_some()
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(bytes)
    }
}

impl FromStr for Pubkey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(KeyError::InvalidPublicKey(format!(
                "base58 string too long: {} chars",
                s.len()
            )));
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::InvalidPublicKey(format!("base58 decode failed: {e}")))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
