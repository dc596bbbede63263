//! Solana transaction construction without `solana-sdk`.
//!
//! This crate compiles instructions into the canonical account table
//! (optionally loading accounts from address lookup tables), serializes the
//! compact wire format by hand, derives program addresses and collects
//! Ed25519 signatures from one or more [`sol_keys::Keypair`]s.
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     [0x80 | version]      u8, v0 only
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]
//!     [address_table_lookups]  v0 only
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```

pub mod error;
pub mod hash;
pub mod instruction;
pub mod message;
pub mod pda;
pub mod short_vec;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use error::TxError;
pub use hash::{Hash, HASH_BYTES};
pub use instruction::{AccountMeta, CompiledInstruction, Instruction};
pub use message::v0::{AddressLookupTableAccount, LoadedAddresses, MessageAddressTableLookup};
pub use message::{
    v0, Message, MessageHeader, VersionedMessage, MAX_ACCOUNT_KEYS, MESSAGE_VERSION_PREFIX,
};
pub use pda::{
    create_program_address, create_with_seed, find_program_address, MAX_SEEDS, MAX_SEED_LEN,
    PDA_MARKER,
};
pub use short_vec::{decode_compact_u16, encode_compact_u16};
pub use transaction::Transaction;

pub use sol_keys::{Keypair, Pubkey, Signature};
