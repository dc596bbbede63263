//! Version 0 messages: the legacy layout plus address table lookups.
//!
//! A non-signer account that is not invoked as a program can be loaded from
//! an on-chain address lookup table instead of being listed in full. The
//! message then carries one [`MessageAddressTableLookup`] per table it uses,
//! and instruction indices address the concatenation of
//!
//! 1. the static `account_keys`
//! 2. writable addresses loaded by every lookup, in lookup order
//! 3. read-only addresses loaded by every lookup, in lookup order
//!
//! ```text
//! 0x80 | version            u8
//! header, keys, blockhash, instructions   (legacy layout)
//! num_lookups               compact-u16
//! lookups[]:
//!   table_key               32 bytes
//!   writable_indexes        compact-u16 len + u8 each
//!   readonly_indexes        compact-u16 len + u8 each
//! ```

use serde::{Deserialize, Serialize};
use sol_keys::Pubkey;
use tracing::debug;

use super::{
    compile_instructions, compile_keys, header_for, is_static_writable, read_body,
    sanitize_header, sanitize_indices, write_body, MessageHeader, MAX_ACCOUNT_KEYS,
    MESSAGE_VERSION_PREFIX,
};
use crate::error::TxError;
use crate::hash::Hash;
use crate::instruction::{AccountMeta, CompiledInstruction, Instruction};
use crate::short_vec::{self, ByteReader};

/// An address lookup table's on-chain contents, as fetched by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLookupTableAccount {
    pub key: Pubkey,
    pub addresses: Vec<Pubkey>,
}

/// The accounts a message loads from one lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

impl MessageAddressTableLookup {
    fn num_loaded(&self) -> usize {
        self.writable_indexes.len() + self.readonly_indexes.len()
    }
}

/// Addresses a message's lookups resolve to, in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

impl LoadedAddresses {
    pub fn len(&self) -> usize {
        self.writable.len() + self.readonly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    account_keys: Vec<Pubkey>,
    recent_blockhash: Hash,
    instructions: Vec<CompiledInstruction>,
    address_table_lookups: Vec<MessageAddressTableLookup>,
}

/// First table holding `pubkey`, and the address's index inside it.
fn find_in_tables(
    pubkey: &Pubkey,
    tables: &[AddressLookupTableAccount],
) -> Result<Option<(usize, u8)>, TxError> {
    for (table_index, table) in tables.iter().enumerate() {
        if let Some(position) = table.addresses.iter().position(|a| a == pubkey) {
            let index = u8::try_from(position).map_err(|_| TxError::LookupTableIndexOverflow {
                table: table.key,
                index: position,
            })?;
            return Ok(Some((table_index, index)));
        }
    }
    Ok(None)
}

impl Message {
    /// Compile `instructions` paid for by `payer`, loading every eligible
    /// account from `address_lookup_table_accounts`.
    ///
    /// Signers and invoked programs always stay in the static table. Any
    /// other account found in a table is loaded from the first table that
    /// lists it. Tables that end up loading nothing are left out.
    pub fn try_compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        address_lookup_table_accounts: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<Self, TxError> {
        let tables = address_lookup_table_accounts;
        let mut lookups: Vec<MessageAddressTableLookup> = tables
            .iter()
            .map(|table| MessageAddressTableLookup {
                account_key: table.key,
                ..Default::default()
            })
            .collect();
        let mut loaded = vec![LoadedAddresses::default(); tables.len()];
        let mut static_entries = Vec::new();

        for entry in compile_keys(instructions, Some(payer)) {
            let found = if entry.is_signer || entry.is_invoked {
                None
            } else {
                find_in_tables(&entry.pubkey, tables)?
            };
            match found {
                Some((table, index)) if entry.is_writable => {
                    lookups[table].writable_indexes.push(index);
                    loaded[table].writable.push(entry.pubkey);
                }
                Some((table, index)) => {
                    lookups[table].readonly_indexes.push(index);
                    loaded[table].readonly.push(entry.pubkey);
                }
                None => static_entries.push(entry),
            }
        }

        let (address_table_lookups, loaded): (Vec<_>, Vec<_>) = lookups
            .into_iter()
            .zip(loaded)
            .filter(|(lookup, _)| lookup.num_loaded() > 0)
            .unzip();

        let num_loaded: usize = loaded.iter().map(LoadedAddresses::len).sum();
        let total = static_entries.len() + num_loaded;
        if total > MAX_ACCOUNT_KEYS {
            return Err(TxError::AccountTableOverflow(total));
        }

        let header = header_for(&static_entries, total)?;
        let account_keys: Vec<Pubkey> = static_entries.iter().map(|e| e.pubkey).collect();
        let all_keys = account_keys
            .iter()
            .chain(loaded.iter().flat_map(|l| &l.writable))
            .chain(loaded.iter().flat_map(|l| &l.readonly));
        let compiled = compile_instructions(instructions, all_keys);

        debug!(
            static_accounts = account_keys.len(),
            loaded_accounts = num_loaded,
            lookups = address_table_lookups.len(),
            signers = header.num_required_signatures,
            instructions = instructions.len(),
            "compiled v0 message"
        );

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
            address_table_lookups,
        })
    }

    pub fn with_recent_blockhash(&self, recent_blockhash: Hash) -> Self {
        Self {
            recent_blockhash,
            ..self.clone()
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The static keys; loaded addresses are not included.
    pub fn account_keys(&self) -> &[Pubkey] {
        &self.account_keys
    }

    pub fn recent_blockhash(&self) -> &Hash {
        &self.recent_blockhash
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        &self.instructions
    }

    pub fn address_table_lookups(&self) -> &[MessageAddressTableLookup] {
        &self.address_table_lookups
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.signer_keys().first()
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = usize::from(self.header.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Signers are always static, so loaded indices never sign.
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
            && index < self.account_keys.len()
    }

    /// Writability of any account index, static or loaded.
    pub fn is_writable(&self, index: usize) -> bool {
        let num_static = self.account_keys.len();
        if index < num_static {
            return is_static_writable(&self.header, num_static, index);
        }
        let num_writable_loaded: usize = self
            .address_table_lookups
            .iter()
            .map(|l| l.writable_indexes.len())
            .sum();
        index - num_static < num_writable_loaded
    }

    /// Look every lookup index up in `tables`.
    pub fn resolve_addresses(
        &self,
        tables: &[AddressLookupTableAccount],
    ) -> Result<LoadedAddresses, TxError> {
        let mut loaded = LoadedAddresses::default();
        for lookup in &self.address_table_lookups {
            let table = tables
                .iter()
                .find(|t| t.key == lookup.account_key)
                .ok_or(TxError::MissingLookupTable(lookup.account_key))?;
            let resolve = |index: u8| {
                table
                    .addresses
                    .get(usize::from(index))
                    .copied()
                    .ok_or(TxError::InvalidLookupIndex {
                        table: table.key,
                        index,
                    })
            };
            for &index in &lookup.writable_indexes {
                loaded.writable.push(resolve(index)?);
            }
            for &index in &lookup.readonly_indexes {
                loaded.readonly.push(resolve(index)?);
            }
        }
        Ok(loaded)
    }

    /// Rebuild full instructions, resolving loaded accounts through `tables`.
    pub fn decompile_instructions(
        &self,
        tables: &[AddressLookupTableAccount],
    ) -> Result<Vec<Instruction>, TxError> {
        let loaded = self.resolve_addresses(tables)?;
        let keys: Vec<Pubkey> = self
            .account_keys
            .iter()
            .chain(&loaded.writable)
            .chain(&loaded.readonly)
            .copied()
            .collect();

        let meta = |index: u8| {
            let i = usize::from(index);
            AccountMeta {
                pubkey: keys[i],
                is_signer: self.is_signer(i),
                is_writable: self.is_writable(i),
            }
        };
        Ok(self
            .instructions
            .iter()
            .map(|ix| Instruction {
                program_id: keys[usize::from(ix.program_id_index)],
                accounts: ix.accounts.iter().map(|&i| meta(i)).collect(),
                data: ix.data.clone(),
            })
            .collect())
    }

    // -- Wire codec ---------------------------------------------------------

    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let mut buf = Vec::with_capacity(
            1 + 3 + 3 + self.account_keys.len() * 32 + 32 + 3 + self.instructions.len() * 8,
        );
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), TxError> {
        buf.push(MESSAGE_VERSION_PREFIX);
        write_body(
            buf,
            &self.header,
            &self.account_keys,
            &self.recent_blockhash,
            &self.instructions,
        )?;
        short_vec::write_vec(buf, &self.address_table_lookups, |b, lookup| {
            b.extend_from_slice(lookup.account_key.as_ref());
            short_vec::write_bytes(b, &lookup.writable_indexes)?;
            short_vec::write_bytes(b, &lookup.readonly_indexes)
        })
    }

    /// Parse a v0 message, version prefix included.
    pub fn deserialize(data: &[u8]) -> Result<Self, TxError> {
        let mut reader = ByteReader::new(data);
        let message = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }

    pub(crate) fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TxError> {
        let prefix = reader.read_u8()?;
        if prefix != MESSAGE_VERSION_PREFIX {
            return Err(TxError::UnsupportedMessageVersion(prefix));
        }
        let body = read_body(reader)?;
        let address_table_lookups = reader.read_vec(|r| {
            Ok(MessageAddressTableLookup {
                account_key: Pubkey::new_from_array(r.read_array::<32>()?),
                writable_indexes: r.read_byte_vec()?,
                readonly_indexes: r.read_byte_vec()?,
            })
        })?;

        let message = Self {
            header: body.header,
            account_keys: body.account_keys,
            recent_blockhash: body.recent_blockhash,
            instructions: body.instructions,
            address_table_lookups,
        };
        message.sanitize()?;
        Ok(message)
    }

    fn sanitize(&self) -> Result<(), TxError> {
        sanitize_header(&self.header, self.account_keys.len())?;

        let mut num_accounts = self.account_keys.len();
        for lookup in &self.address_table_lookups {
            if lookup.num_loaded() == 0 {
                return Err(TxError::EmptyAddressTableLookup(lookup.account_key));
            }
            num_accounts += lookup.num_loaded();
        }
        if num_accounts > MAX_ACCOUNT_KEYS {
            return Err(TxError::AccountTableOverflow(num_accounts));
        }
        sanitize_indices(&self.instructions, num_accounts)
    }
}
