//! Zero-on-drop containers for seeds, exported secret keys and phrases.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret bytes (BIP-39 seeds, exported keypairs) wiped when dropped.
///
/// `Debug` never prints the contents.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Copy a fixed-size buffer in, then wipe the caller's copy.
    pub fn from_array<const N: usize>(mut data: [u8; N]) -> Self {
        let secret = Self(data.to_vec());
        data.zeroize();
        secret
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// A secret string (mnemonic phrases) wiped when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(data: String) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretString {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for SecretString {
    fn from(data: &str) -> Self {
        Self::new(data.to_owned())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_deref() {
        let secret = SecretBytes::new(vec![1, 2, 3]);
        assert_eq!(&*secret, &[1, 2, 3]);
        assert_eq!(secret.len(), 3);
        assert!(!secret.is_empty());
    }

    #[test]
    fn secret_bytes_from_array() {
        let secret = SecretBytes::from_array([9u8; 64]);
        assert_eq!(secret.len(), 64);
        assert!(secret.iter().all(|b| *b == 9));
    }

    #[test]
    fn secret_bytes_debug_is_redacted() {
        let secret = SecretBytes::new(vec![0xAB; 4]);
        let debug = format!("{secret:?}");
        assert_eq!(debug, "SecretBytes([REDACTED; 4])");
        assert!(!debug.contains("171"));
    }

    #[test]
    fn secret_bytes_manual_zeroize_clears() {
        let mut secret = SecretBytes::new(vec![0xAA; 32]);
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn secret_string_deref_and_debug() {
        let phrase: SecretString = "abandon ability able".into();
        assert!(phrase.starts_with("abandon"));
        assert_eq!(phrase.split_whitespace().count(), 3);
        assert_eq!(format!("{phrase:?}"), "SecretString([REDACTED])");
    }

    #[test]
    fn secret_string_manual_zeroize_clears() {
        let mut phrase = SecretString::new("sensitive".into());
        phrase.zeroize();
        assert!(phrase.is_empty());
    }
}
