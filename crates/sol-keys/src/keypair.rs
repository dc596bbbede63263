//! Ed25519 signing keypairs.
//!
//! The 32-byte private seed lives inside an `ed25519_dalek::SigningKey`,
//! which wipes itself on drop. Anything we copy the seed into for
//! import/export is either a `Zeroizing` buffer or a [`SecretBytes`].

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::derivation_path::DerivationPath;
use crate::error::KeyError;
use crate::hd_derivation::derive_ed25519_key;
use crate::pubkey::Pubkey;
use crate::secret::SecretBytes;
use crate::signature::Signature;

/// Length of the exported `seed || pubkey` secret key format.
pub const KEYPAIR_BYTES: usize = 64;

/// A private signing key together with its public address.
///
/// Deliberately not `Clone`: copies of secret material should be explicit.
pub struct Keypair {
    signing_key: SigningKey,
    pubkey: Pubkey,
}

impl Keypair {
    /// Generate a fresh keypair from the operating system RNG.
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut seed[..]);
        Self::from_seed(&seed)
    }

    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let pubkey = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            pubkey,
        }
    }

    /// Import the 64-byte `seed || pubkey` format used by CLI keypair files.
    ///
    /// The embedded public key must match the one derived from the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEYPAIR_BYTES {
            return Err(KeyError::InvalidPrivateKey(format!(
                "expected {KEYPAIR_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        let mut buf = Zeroizing::new([0u8; KEYPAIR_BYTES]);
        buf.copy_from_slice(bytes);

        let signing_key = SigningKey::from_keypair_bytes(&buf).map_err(|_| {
            KeyError::InvalidPrivateKey("public key does not match private seed".into())
        })?;
        let pubkey = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
        Ok(Self {
            signing_key,
            pubkey,
        })
    }

    pub fn from_base58_string(s: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            bs58::decode(s)
                .into_vec()
                .map_err(|e| KeyError::InvalidPrivateKey(format!("base58 decode failed: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            hex::decode(s.trim_start_matches("0x"))
                .map_err(|e| KeyError::InvalidPrivateKey(format!("hex decode failed: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Derive a keypair along a hardened SLIP-0010 path from a master seed.
    pub fn from_seed_and_derivation_path(
        seed: &[u8],
        path: &DerivationPath,
    ) -> Result<Self, KeyError> {
        let derived = derive_ed25519_key(seed, path)?;
        Ok(derived.keypair())
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    /// Export as 64 bytes `seed || pubkey`.
    pub fn to_bytes(&self) -> SecretBytes {
        SecretBytes::from_array(self.signing_key.to_keypair_bytes())
    }

    pub fn to_base58_string(&self) -> String {
        bs58::encode(&*self.to_bytes()).into_string()
    }

    /// Sign arbitrary bytes. Ed25519 is deterministic, so the same key and
    /// message always yield the same signature.
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
