use sol_keys::Pubkey;

use super::v0::{self, AddressLookupTableAccount, MessageAddressTableLookup};
use super::{Message, MessageHeader, MESSAGE_VERSION_PREFIX};
use crate::error::TxError;
use crate::hash::Hash;
use crate::instruction::{CompiledInstruction, Instruction};
use crate::short_vec::ByteReader;

/// Either message format. On the wire a set high bit in the first byte
/// marks a versioned message; otherwise the bytes are a legacy message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedMessage {
    Legacy(Message),
    V0(v0::Message),
}

impl Default for VersionedMessage {
    fn default() -> Self {
        Self::Legacy(Message::default())
    }
}

impl From<Message> for VersionedMessage {
    fn from(message: Message) -> Self {
        Self::Legacy(message)
    }
}

impl From<v0::Message> for VersionedMessage {
    fn from(message: v0::Message) -> Self {
        Self::V0(message)
    }
}

impl VersionedMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Legacy(message) => message.header(),
            Self::V0(message) => message.header(),
        }
    }

    /// Keys listed in the message itself. For v0 this excludes accounts
    /// loaded from lookup tables.
    pub fn account_keys(&self) -> &[Pubkey] {
        match self {
            Self::Legacy(message) => message.account_keys(),
            Self::V0(message) => message.account_keys(),
        }
    }

    pub fn address_table_lookups(&self) -> Option<&[MessageAddressTableLookup]> {
        match self {
            Self::Legacy(_) => None,
            Self::V0(message) => Some(message.address_table_lookups()),
        }
    }

    pub fn recent_blockhash(&self) -> &Hash {
        match self {
            Self::Legacy(message) => message.recent_blockhash(),
            Self::V0(message) => message.recent_blockhash(),
        }
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            Self::Legacy(message) => message.instructions(),
            Self::V0(message) => message.instructions(),
        }
    }

    pub fn with_recent_blockhash(&self, recent_blockhash: Hash) -> Self {
        match self {
            Self::Legacy(message) => Self::Legacy(message.with_recent_blockhash(recent_blockhash)),
            Self::V0(message) => Self::V0(message.with_recent_blockhash(recent_blockhash)),
        }
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.signer_keys().first()
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        match self {
            Self::Legacy(message) => message.signer_keys(),
            Self::V0(message) => message.signer_keys(),
        }
    }

    pub fn is_signer(&self, index: usize) -> bool {
        match self {
            Self::Legacy(message) => message.is_signer(index),
            Self::V0(message) => message.is_signer(index),
        }
    }

    pub fn is_writable(&self, index: usize) -> bool {
        match self {
            Self::Legacy(message) => message.is_writable(index),
            Self::V0(message) => message.is_writable(index),
        }
    }

    /// Rebuild full instructions. `tables` is only consulted for v0 lookups.
    pub fn decompile_instructions(
        &self,
        tables: &[AddressLookupTableAccount],
    ) -> Result<Vec<Instruction>, TxError> {
        match self {
            Self::Legacy(message) => Ok(message.decompile_instructions()),
            Self::V0(message) => message.decompile_instructions(tables),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        match self {
            Self::Legacy(message) => message.serialize(),
            Self::V0(message) => message.serialize(),
        }
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), TxError> {
        match self {
            Self::Legacy(message) => message.write_to(buf),
            Self::V0(message) => message.write_to(buf),
        }
    }

    /// Parse either format. The whole input must be consumed.
    pub fn deserialize(data: &[u8]) -> Result<Self, TxError> {
        let mut reader = ByteReader::new(data);
        let message = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }

    pub(crate) fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TxError> {
        match reader.peek_u8() {
            Some(prefix) if prefix & MESSAGE_VERSION_PREFIX != 0 => {
                v0::Message::read_from(reader).map(Self::V0)
            }
            _ => Message::read_from(reader).map(Self::Legacy),
        }
    }
}
