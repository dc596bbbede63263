//! Message compilation and its wire codec.
//!
//! Compiling merges every account an instruction set touches into one
//! deduplicated table ordered by privilege:
//!
//! 1. writable signers (fee payer first)
//! 2. read-only signers
//! 3. writable non-signers
//! 4. read-only non-signers
//!
//! Within a bucket keys keep first-seen order. The header records the bucket
//! sizes so the runtime can recover each key's permissions from its position.
//!
//! [`Message`] is the legacy format. [`v0::Message`] additionally loads
//! non-signer accounts from address lookup tables, and [`VersionedMessage`]
//! holds either.

use std::collections::HashMap;

use sol_keys::Pubkey;
use tracing::debug;

use crate::error::TxError;
use crate::hash::Hash;
use crate::instruction::{AccountMeta, CompiledInstruction, Instruction};
use crate::short_vec::{self, ByteReader};

pub mod v0;
mod versioned;

pub use versioned::VersionedMessage;

/// Account indices are a single byte on the wire.
pub const MAX_ACCOUNT_KEYS: usize = 256;

/// High bit of the first byte marks a versioned message; the low seven bits
/// carry the version number.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Signatures required; the first N account keys are the signers.
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed_accounts: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

/// The signed payload of a legacy transaction.
///
/// Fields are private: a message is only produced by [`Message::compile`] or
/// [`Message::deserialize`], so its header always agrees with its key table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    account_keys: Vec<Pubkey>,
    recent_blockhash: Hash,
    instructions: Vec<CompiledInstruction>,
}

pub(crate) struct AccountEntry {
    pub(crate) pubkey: Pubkey,
    pub(crate) is_signer: bool,
    pub(crate) is_writable: bool,
    /// Used as an instruction's program id.
    pub(crate) is_invoked: bool,
}

impl AccountEntry {
    fn rank(&self) -> u8 {
        match (self.is_signer, self.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared compilation steps
// ---------------------------------------------------------------------------

/// Collect every account `instructions` touch, merge duplicate mentions and
/// order the result by privilege bucket.
pub(crate) fn compile_keys(instructions: &[Instruction], payer: Option<&Pubkey>) -> Vec<AccountEntry> {
    let mut entries: Vec<AccountEntry> = Vec::new();
    let mut positions: HashMap<Pubkey, usize> = HashMap::new();

    let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool, invoked: bool| {
        if let Some(&pos) = positions.get(&pubkey) {
            let entry = &mut entries[pos];
            entry.is_signer |= signer;
            entry.is_writable |= writable;
            entry.is_invoked |= invoked;
        } else {
            positions.insert(pubkey, entries.len());
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
                is_invoked: invoked,
            });
        }
    };

    if let Some(payer) = payer {
        upsert(*payer, true, true, false);
    }
    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable, false);
        }
        upsert(ix.program_id, false, false, true);
    }

    // Stable: first-seen order survives inside each bucket, and the payer
    // (first seen, top rank) stays at index 0.
    entries.sort_by_key(AccountEntry::rank);
    entries
}

/// Header counts for the static keys in `entries`. `total` is the full
/// account count reported on overflow.
pub(crate) fn header_for(entries: &[AccountEntry], total: usize) -> Result<MessageHeader, TxError> {
    let count = |rank: u8| -> Result<u8, TxError> {
        let n = entries.iter().filter(|e| e.rank() == rank).count();
        u8::try_from(n).map_err(|_| TxError::AccountTableOverflow(total))
    };
    let writable_signers = count(0)?;
    let readonly_signers = count(1)?;
    let num_required_signatures = writable_signers
        .checked_add(readonly_signers)
        .ok_or(TxError::AccountTableOverflow(total))?;
    Ok(MessageHeader {
        num_required_signatures,
        num_readonly_signed_accounts: readonly_signers,
        num_readonly_unsigned_accounts: count(3)?,
    })
}

/// Replace account references with indices into `keys`.
///
/// `keys` must hold every referenced account and at most
/// [`MAX_ACCOUNT_KEYS`] entries.
pub(crate) fn compile_instructions<'a>(
    instructions: &[Instruction],
    keys: impl IntoIterator<Item = &'a Pubkey>,
) -> Vec<CompiledInstruction> {
    let index_of: HashMap<Pubkey, u8> = keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| (*key, i as u8))
        .collect();

    instructions
        .iter()
        .map(|ix| CompiledInstruction {
            program_id_index: index_of[&ix.program_id],
            accounts: ix.accounts.iter().map(|m| index_of[&m.pubkey]).collect(),
            data: ix.data.clone(),
        })
        .collect()
}

/// Writability of a key in the static table, recovered from the header.
pub(crate) fn is_static_writable(header: &MessageHeader, num_keys: usize, index: usize) -> bool {
    let num_signers = usize::from(header.num_required_signatures);
    if index >= num_keys {
        false
    } else if index < num_signers {
        index < num_signers.saturating_sub(usize::from(header.num_readonly_signed_accounts))
    } else {
        index < num_keys.saturating_sub(usize::from(header.num_readonly_unsigned_accounts))
    }
}

// ---------------------------------------------------------------------------
// Shared wire layout
// ---------------------------------------------------------------------------

/// The fields every message version shares, in wire order.
pub(crate) struct MessageBody {
    pub(crate) header: MessageHeader,
    pub(crate) account_keys: Vec<Pubkey>,
    pub(crate) recent_blockhash: Hash,
    pub(crate) instructions: Vec<CompiledInstruction>,
}

pub(crate) fn write_body(
    buf: &mut Vec<u8>,
    header: &MessageHeader,
    account_keys: &[Pubkey],
    recent_blockhash: &Hash,
    instructions: &[CompiledInstruction],
) -> Result<(), TxError> {
    // Header: 3 bytes.
    buf.push(header.num_required_signatures);
    buf.push(header.num_readonly_signed_accounts);
    buf.push(header.num_readonly_unsigned_accounts);

    short_vec::write_vec(buf, account_keys, |b, key| {
        b.extend_from_slice(key.as_ref());
        Ok(())
    })?;
    buf.extend_from_slice(recent_blockhash.as_ref());

    short_vec::write_vec(buf, instructions, |b, ix| {
        b.push(ix.program_id_index);
        short_vec::write_bytes(b, &ix.accounts)?;
        short_vec::write_bytes(b, &ix.data)
    })
}

pub(crate) fn read_body(reader: &mut ByteReader<'_>) -> Result<MessageBody, TxError> {
    let header = MessageHeader {
        num_required_signatures: reader.read_u8()?,
        num_readonly_signed_accounts: reader.read_u8()?,
        num_readonly_unsigned_accounts: reader.read_u8()?,
    };
    let account_keys = reader.read_vec(|r| Ok(Pubkey::new_from_array(r.read_array::<32>()?)))?;
    let recent_blockhash = Hash::new_from_array(reader.read_array::<32>()?);
    let instructions = reader.read_vec(|r| {
        Ok(CompiledInstruction {
            program_id_index: r.read_u8()?,
            accounts: r.read_byte_vec()?,
            data: r.read_byte_vec()?,
        })
    })?;
    Ok(MessageBody {
        header,
        account_keys,
        recent_blockhash,
        instructions,
    })
}

/// The header must leave a writable fee payer and must not describe more
/// accounts than the static table holds.
pub(crate) fn sanitize_header(header: &MessageHeader, num_keys: usize) -> Result<(), TxError> {
    if header.num_readonly_signed_accounts >= header.num_required_signatures {
        return Err(TxError::InvalidHeader(format!(
            "{} read-only signers leaves no writable fee payer among {} signers",
            header.num_readonly_signed_accounts, header.num_required_signatures
        )));
    }
    let claimed = usize::from(header.num_required_signatures)
        + usize::from(header.num_readonly_unsigned_accounts);
    if claimed > num_keys {
        return Err(TxError::InvalidHeader(format!(
            "header describes {claimed} accounts but only {num_keys} keys are present"
        )));
    }
    Ok(())
}

pub(crate) fn sanitize_indices(
    instructions: &[CompiledInstruction],
    num_accounts: usize,
) -> Result<(), TxError> {
    for (position, ix) in instructions.iter().enumerate() {
        let out_of_range = std::iter::once(ix.program_id_index)
            .chain(ix.accounts.iter().copied())
            .find(|&i| usize::from(i) >= num_accounts);
        if let Some(index) = out_of_range {
            return Err(TxError::InvalidAccountIndex {
                instruction: position,
                index,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

impl Message {
    /// Compile `instructions` into a message paid for by `payer`.
    ///
    /// The payer is forced to be a writable signer at index 0. Program ids
    /// are added as read-only non-signers; an account mentioned several
    /// times gets the union of its flags.
    pub fn compile(
        instructions: &[Instruction],
        payer: Option<&Pubkey>,
        recent_blockhash: Hash,
    ) -> Result<Self, TxError> {
        let entries = compile_keys(instructions, payer);
        if entries.len() > MAX_ACCOUNT_KEYS {
            return Err(TxError::AccountTableOverflow(entries.len()));
        }

        let header = header_for(&entries, entries.len())?;
        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let compiled = compile_instructions(instructions, &account_keys);

        debug!(
            accounts = account_keys.len(),
            signers = header.num_required_signatures,
            readonly_signed = header.num_readonly_signed_accounts,
            readonly_unsigned = header.num_readonly_unsigned_accounts,
            instructions = instructions.len(),
            "compiled message"
        );

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Same as [`Message::compile`].
    pub fn new_with_blockhash(
        instructions: &[Instruction],
        payer: Option<&Pubkey>,
        blockhash: Hash,
    ) -> Result<Self, TxError> {
        Self::compile(instructions, payer, blockhash)
    }

    /// A copy of this message anchored to a different blockhash. Any
    /// signatures over the old message do not carry over.
    pub fn with_recent_blockhash(&self, recent_blockhash: Hash) -> Self {
        Self {
            recent_blockhash,
            ..self.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn account_keys(&self) -> &[Pubkey] {
        &self.account_keys
    }

    pub fn recent_blockhash(&self) -> &Hash {
        &self.recent_blockhash
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        &self.instructions
    }

    /// The account paying fees, if the message requires any signature.
    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.signer_keys().first()
    }

    /// The keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = usize::from(self.header.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
            && index < self.account_keys.len()
    }

    pub fn is_writable(&self, index: usize) -> bool {
        is_static_writable(&self.header, self.account_keys.len(), index)
    }

    /// Rebuild full instructions, recovering each account's flags from its
    /// position in the key table.
    pub fn decompile_instructions(&self) -> Vec<Instruction> {
        let meta = |index: u8| {
            let i = usize::from(index);
            AccountMeta {
                pubkey: self.account_keys[i],
                is_signer: self.is_signer(i),
                is_writable: self.is_writable(i),
            }
        };
        self.instructions
            .iter()
            .map(|ix| Instruction {
                program_id: self.account_keys[usize::from(ix.program_id_index)],
                accounts: ix.accounts.iter().map(|&i| meta(i)).collect(),
                data: ix.data.clone(),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Wire codec
    // -----------------------------------------------------------------------

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let mut buf = Vec::with_capacity(
            3 + 3 + self.account_keys.len() * 32 + 32 + 3 + self.instructions.len() * 8,
        );
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), TxError> {
        write_body(
            buf,
            &self.header,
            &self.account_keys,
            &self.recent_blockhash,
            &self.instructions,
        )
    }

    /// Parse a legacy message. The whole input must be consumed; versioned
    /// input is rejected here and handled by [`VersionedMessage::deserialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self, TxError> {
        let mut reader = ByteReader::new(data);
        let message = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }

    pub(crate) fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, TxError> {
        if let Some(prefix) = reader.peek_u8() {
            if prefix & MESSAGE_VERSION_PREFIX != 0 {
                return Err(TxError::UnsupportedMessageVersion(prefix));
            }
        }
        let body = read_body(reader)?;
        let message = Self {
            header: body.header,
            account_keys: body.account_keys,
            recent_blockhash: body.recent_blockhash,
            instructions: body.instructions,
        };
        message.sanitize()?;
        Ok(message)
    }

    /// Check the header against the key table and every index against its
    /// bounds.
    fn sanitize(&self) -> Result<(), TxError> {
        let num_keys = self.account_keys.len();
        if num_keys > MAX_ACCOUNT_KEYS {
            return Err(TxError::AccountTableOverflow(num_keys));
        }
        sanitize_header(&self.header, num_keys)?;
        sanitize_indices(&self.instructions, num_keys)
    }
}
