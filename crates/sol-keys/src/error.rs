use thiserror::Error;

/// Key, identity and derivation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("unsupported derivation: {0}")]
    UnsupportedDerivation(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}
