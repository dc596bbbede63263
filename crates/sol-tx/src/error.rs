use sol_keys::{KeyError, Pubkey};
use thiserror::Error;

/// Transaction construction, codec and signing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    // ----- compact codec -----
    #[error("malformed compact-u16 encoding")]
    MalformedVarint,

    #[error("value {0} does not fit in a compact-u16")]
    ValueTooLarge(usize),

    #[error("unexpected end of input")]
    TruncatedInput,

    #[error("{0} trailing bytes after end of input")]
    TrailingBytes(usize),

    // ----- message compiler -----
    #[error("account table overflow: {0} keys, at most 256 allowed")]
    AccountTableOverflow(usize),

    #[error("invalid message header: {0}")]
    InvalidHeader(String),

    #[error("instruction {instruction} references account index {index} out of range")]
    InvalidAccountIndex { instruction: usize, index: u8 },

    #[error("unsupported message version (prefix byte {0:#04x})")]
    UnsupportedMessageVersion(u8),

    #[error("invalid blockhash: {0}")]
    InvalidBlockhash(String),

    // ----- address lookup tables -----
    #[error("address {index} of lookup table {table} is past index 255")]
    LookupTableIndexOverflow { table: Pubkey, index: usize },

    #[error("address table lookup for {0} loads no accounts")]
    EmptyAddressTableLookup(Pubkey),

    #[error("lookup table {0} was not provided")]
    MissingLookupTable(Pubkey),

    #[error("lookup table {table} has no address at index {index}")]
    InvalidLookupIndex { table: Pubkey, index: u8 },

    // ----- program derived addresses -----
    #[error("no viable bump seed found")]
    NoValidBumpFound,

    #[error("seed {index} is {len} bytes, at most 32 allowed")]
    InvalidSeedLength { index: usize, len: usize },

    #[error("too many seeds: {0}")]
    TooManySeeds(usize),

    #[error("seeds derive an address on the ed25519 curve")]
    InvalidSeeds,

    #[error("owner program id ends with the program-derived-address marker")]
    IllegalOwner,

    // ----- signing -----
    #[error("missing signature for signer {index} ({pubkey})")]
    MissingSigner { index: usize, pubkey: Pubkey },

    #[error("signature {index} does not verify for {pubkey}")]
    SignatureMismatch { index: usize, pubkey: Pubkey },

    #[error("{0} is not a required signer of this message")]
    UnknownSigner(Pubkey),

    #[error("expected {expected} signatures, found {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Key(#[from] KeyError),
}
