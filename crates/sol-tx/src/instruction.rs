use serde::{Deserialize, Serialize};
use sol_keys::Pubkey;

/// A single account reference in an instruction, with the permissions the
/// program needs on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A program invocation before it is compiled into a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    /// Opaque to this crate; each program defines its own encoding.
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new_with_bytes(program_id: Pubkey, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }
}

/// An instruction whose account references are replaced by u8 indices into
/// the message's `account_keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    /// Index into `account_keys` for the program to invoke.
    pub program_id_index: u8,
    /// Indices into `account_keys`, in the instruction's own account order.
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    pub fn program_id<'a>(&self, account_keys: &'a [Pubkey]) -> Option<&'a Pubkey> {
        account_keys.get(usize::from(self.program_id_index))
    }
}
