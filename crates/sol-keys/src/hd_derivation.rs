use hmac::{Hmac, Mac};
use sha2::Sha512;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::derivation_path::DerivationPath;
use crate::error::KeyError;
use crate::keypair::Keypair;
use crate::pubkey::Pubkey;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for the SLIP-0010 ed25519 master node.
const ED25519_CURVE_SEED: &[u8] = b"ed25519 seed";

/// BIP-32 allows master seeds of 128 to 512 bits.
const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// Derive an Ed25519 private key from a master seed (SLIP-0010).
///
/// Master node: HMAC-SHA512(key = "ed25519 seed", data = seed).
/// Each child: HMAC-SHA512(key = chain_code, data = 0x00 || key || ser32(i')).
/// Only hardened children exist for ed25519.
pub fn derive_ed25519_key(seed: &[u8], path: &DerivationPath) -> Result<DerivedKey, KeyError> {
    if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
        return Err(KeyError::InvalidSeed(format!(
            "seed must be {MIN_SEED_LEN}..={MAX_SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }
    if let Some(normal) = path.path().iter().find(|c| !c.is_hardened()) {
        return Err(KeyError::UnsupportedDerivation(format!(
            "ed25519 only supports hardened children, found {normal} in {path}"
        )));
    }

    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    hmac_split(ED25519_CURVE_SEED, &[seed], &mut key, &mut chain_code)?;

    for child in path.path() {
        let index = child.to_bits().to_be_bytes();
        let parent_chain = chain_code.clone();
        let parent_key = key.clone();
        hmac_split(
            &parent_chain[..],
            &[&[0x00u8][..], &parent_key[..], &index[..]],
            &mut key,
            &mut chain_code,
        )?;
    }

    let public_key = Keypair::from_seed(&key).pubkey();
    debug!(path = %path, depth = path.len(), pubkey = %public_key, "derived ed25519 key");

    Ok(DerivedKey {
        private_key: *key,
        chain_code: *chain_code,
        public_key,
        derivation_path: path.clone(),
    })
}

/// Run HMAC-SHA512 over `parts` and split the 64-byte output into
/// `IL` (key) and `IR` (chain code).
fn hmac_split(
    hmac_key: &[u8],
    parts: &[&[u8]],
    key: &mut [u8; 32],
    chain_code: &mut [u8; 32],
) -> Result<(), KeyError> {
    let mut mac = HmacSha512::new_from_slice(hmac_key)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut output = mac.finalize().into_bytes();
    key.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..]);
    output.as_mut_slice().zeroize();
    Ok(())
}

/// A derived Ed25519 node. Secret halves are wiped on drop.
pub struct DerivedKey {
    private_key: [u8; 32],
    chain_code: [u8; 32],
    public_key: Pubkey,
    derivation_path: DerivationPath,
}

impl DerivedKey {
    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn public_key(&self) -> Pubkey {
        self.public_key
    }

    pub fn derivation_path(&self) -> &DerivationPath {
        &self.derivation_path
    }

    /// The signing keypair for this node.
    pub fn keypair(&self) -> Keypair {
        Keypair::from_seed(&self.private_key)
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.chain_code.zeroize();
    }
}
