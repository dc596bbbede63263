//! 64-byte Ed25519 signatures.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeyError;
use crate::pubkey::Pubkey;

/// Number of bytes in a signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Longest Base58 string that can decode to 64 bytes.
const MAX_BASE58_LEN: usize = 88;

/// A detached Ed25519 signature.
///
/// The all-zero value stands for "not yet signed" inside a transaction's
/// signature table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_BYTES] = bytes.try_into().map_err(|_| {
            KeyError::InvalidSignature(format!(
                "expected {SIGNATURE_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    /// True for the 64 zero bytes used as an empty signature slot.
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Check this signature against `message` for `pubkey`.
    ///
    /// Uses strict verification (rejects small-order keys and
    /// non-canonical `R`/`s`). Returns `false` for keys that are not valid
    /// curve points.
    pub fn verify(&self, pubkey: &Pubkey, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(pubkey.as_array()) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify_strict(message, &signature).is_ok()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Self(signature.to_bytes())
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(KeyError::InvalidSignature(format!(
                "base58 string too long: {} chars",
                s.len()
            )));
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::InvalidSignature(format!("base58 decode failed: {e}")))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::Keypair;

    #[test]
    fn default_is_placeholder() {
        let sig = Signature::default();
        assert!(sig.is_placeholder());
        assert_eq!(sig.to_bytes(), [0u8; 64]);
    }

    #[test]
    fn real_signature_is_not_placeholder() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let sig = keypair.sign_message(b"hello");
        assert!(!sig.is_placeholder());
    }

    #[test]
    fn verify_accepts_matching_message() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let sig = keypair.sign_message(b"hello");
        assert!(sig.verify(&keypair.pubkey(), b"hello"));
    }

    #[test]
    fn verify_rejects_other_message_or_key() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let other = Keypair::from_seed(&[0x43; 32]);
        let sig = keypair.sign_message(b"hello");
        assert!(!sig.verify(&keypair.pubkey(), b"hell0"));
        assert!(!sig.verify(&other.pubkey(), b"hello"));
    }

    #[test]
    fn verify_rejects_placeholder() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        assert!(!Signature::default().verify(&keypair.pubkey(), b"hello"));
    }

    #[test]
    fn base58_roundtrip() {
        let keypair = Keypair::from_seed(&[0x11; 32]);
        let sig = keypair.sign_message(b"roundtrip");
        let text = sig.to_string();
        let parsed: Signature = text.parse().unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn parse_rejects_pubkey_length() {
        let err = "11111111111111111111111111111111".parse::<Signature>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidSignature(_)));
    }

    #[test]
    fn serde_uses_base58_string() {
        let sig = Keypair::from_seed(&[0x11; 32]).sign_message(b"serde");
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, format!("\"{sig}\""));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);

        assert!(serde_json::from_str::<Signature>("\"not base58 0OIl\"").is_err());
    }
}
