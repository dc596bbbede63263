//! The 32-byte recent blockhash a message is anchored to.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TxError;

pub const HASH_BYTES: usize = 32;

/// Longest Base58 string that can decode to 32 bytes.
const MAX_BASE58_LEN: usize = 44;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash)]
pub struct Hash([u8; HASH_BYTES]);

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_BYTES]> for Hash {
    fn from(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Hash {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(TxError::InvalidBlockhash(format!(
                "base58 string too long: {} chars",
                s.len()
            )));
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TxError::InvalidBlockhash(format!("base58 decode failed: {e}")))?;
        let arr: [u8; HASH_BYTES] = bytes.as_slice().try_into().map_err(|_| {
            TxError::InvalidBlockhash(format!("expected {HASH_BYTES} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        let hash = Hash::new_from_array([0xab; 32]);
        let parsed: Hash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
        assert_eq!(Hash::default().to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn parse_rejects_short_input() {
        let err = "1111".parse::<Hash>().unwrap_err();
        assert!(matches!(err, TxError::InvalidBlockhash(_)));
    }

    #[test]
    fn serde_uses_base58_string() {
        let hash = Hash::new_from_array([7u8; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert_eq!(json, format!("\"{hash}\""));
    }
}
