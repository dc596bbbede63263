//! Key material and identities for the Solana transaction toolkit.
//!
//! Everything a client needs before it can build a transaction: the 32-byte
//! [`Pubkey`] identity with its Base58 text form, 64-byte [`Signature`]s,
//! Ed25519 [`Keypair`]s, and hardened-only SLIP-0010 derivation from a seed
//! or BIP-39 seed phrase along an `m/44'/501'/...` [`DerivationPath`].
//!
//! Private key bytes never leave a zeroize-on-drop container.

pub mod derivation_path;
pub mod error;
pub mod hd_derivation;
pub mod keypair;
pub mod mnemonic;
pub mod pubkey;
pub mod secret;
pub mod signature;

// Re-export key public types for ergonomic imports.
pub use derivation_path::{ChildIndex, DerivationPath};
pub use error::KeyError;
pub use hd_derivation::{derive_ed25519_key, DerivedKey};
pub use keypair::Keypair;
pub use mnemonic::{
    generate_mnemonic, is_valid_word, keypair_from_seed_phrase, mnemonic_to_seed,
    validate_mnemonic,
};
pub use pubkey::{Pubkey, PUBKEY_BYTES};
pub use secret::{SecretBytes, SecretString};
pub use signature::{Signature, SIGNATURE_BYTES};
