//! Signature collection and the transaction wire format.
//!
//! A transaction is a [`VersionedMessage`] (legacy or v0) plus one 64-byte
//! signature slot per required signer. Slot `i` belongs to `account_keys[i]`; an all-zero slot
//! means "not signed yet". Slots can be filled in any order and by several
//! parties, so a transaction can be passed around for co-signing before it
//! is complete.

use sol_keys::{Keypair, Pubkey, Signature, SIGNATURE_BYTES};
use tracing::{debug, warn};

use crate::error::TxError;
use crate::hash::Hash;
use crate::instruction::Instruction;
use crate::message::v0::{self, AddressLookupTableAccount};
use crate::message::{Message, VersionedMessage};
use crate::short_vec::{self, ByteReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    signatures: Vec<Signature>,
    message: VersionedMessage,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Transaction {
    /// Wrap `message` with empty signature slots.
    pub fn new_unsigned(message: impl Into<VersionedMessage>) -> Self {
        let message = message.into();
        let slots = usize::from(message.header().num_required_signatures);
        Self {
            signatures: vec![Signature::default(); slots],
            message,
        }
    }

    /// Sign `message` with every required signer.
    ///
    /// Fails if any keypair is not a signer of the message or if any
    /// required signer is missing from `signers`.
    pub fn new(
        signers: &[&Keypair],
        message: impl Into<VersionedMessage>,
    ) -> Result<Self, TxError> {
        let mut tx = Self::new_unsigned(message);
        tx.sign(signers)?;
        Ok(tx)
    }

    /// Compile, then fully sign, in one step.
    pub fn new_signed_with_payer(
        instructions: &[Instruction],
        payer: Option<&Pubkey>,
        signers: &[&Keypair],
        recent_blockhash: Hash,
    ) -> Result<Self, TxError> {
        let message = Message::compile(instructions, payer, recent_blockhash)?;
        Self::new(signers, message)
    }

    /// Compile a v0 message that loads what it can from
    /// `address_lookup_table_accounts`, then fully sign.
    pub fn new_signed_with_lookup_tables(
        instructions: &[Instruction],
        payer: &Pubkey,
        address_lookup_table_accounts: &[AddressLookupTableAccount],
        signers: &[&Keypair],
        recent_blockhash: Hash,
    ) -> Result<Self, TxError> {
        let message = v0::Message::try_compile(
            payer,
            instructions,
            address_lookup_table_accounts,
            recent_blockhash,
        )?;
        Self::new(signers, message)
    }

    pub fn message(&self) -> &VersionedMessage {
        &self.message
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The bytes every signer signs.
    pub fn message_data(&self) -> Result<Vec<u8>, TxError> {
        self.message.serialize()
    }

    /// The fee payer's signature, which doubles as the transaction id.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

impl Transaction {
    /// Sign with whichever required signers are present in `signers`,
    /// leaving the other slots untouched.
    ///
    /// Every keypair must belong to a required signer; otherwise nothing is
    /// signed and [`TxError::UnknownSigner`] is returned. Signing is
    /// deterministic, so repeating a call (or changing the order of
    /// `signers`) produces the same transaction.
    pub fn partial_sign(&mut self, signers: &[&Keypair]) -> Result<(), TxError> {
        let positions = signers
            .iter()
            .map(|kp| {
                let pubkey = kp.pubkey();
                self.signer_position(&pubkey)
                    .ok_or(TxError::UnknownSigner(pubkey))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let message_bytes = self.message_data()?;
        for (keypair, position) in signers.iter().zip(positions) {
            self.signatures[position] = keypair.sign_message(&message_bytes);
        }

        debug!(
            signed = signers.len(),
            required = self.signatures.len(),
            missing = self.signatures.iter().filter(|s| s.is_placeholder()).count(),
            "partially signed transaction"
        );
        Ok(())
    }

    /// [`partial_sign`](Self::partial_sign), then require every slot to be
    /// filled.
    pub fn sign(&mut self, signers: &[&Keypair]) -> Result<(), TxError> {
        self.partial_sign(signers)?;
        self.ensure_complete()
    }

    /// Install a signature produced elsewhere (hardware wallet, another
    /// party). It must verify against this exact message.
    pub fn add_signature(&mut self, pubkey: &Pubkey, signature: Signature) -> Result<(), TxError> {
        let index = self
            .signer_position(pubkey)
            .ok_or(TxError::UnknownSigner(*pubkey))?;
        if !signature.verify(pubkey, &self.message_data()?) {
            return Err(TxError::SignatureMismatch {
                index,
                pubkey: *pubkey,
            });
        }
        self.signatures[index] = signature;
        Ok(())
    }

    fn signer_position(&self, pubkey: &Pubkey) -> Option<usize> {
        self.message
            .signer_keys()
            .iter()
            .position(|key| key == pubkey)
    }

    /// Fails with the first signer whose slot is still empty.
    pub fn ensure_complete(&self) -> Result<(), TxError> {
        let keys = self.message.signer_keys();
        match self.signatures.iter().position(Signature::is_placeholder) {
            Some(index) => Err(TxError::MissingSigner {
                index,
                pubkey: keys.get(index).copied().unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }

    /// Whether every slot holds a signature (verified or not).
    pub fn is_signed(&self) -> bool {
        self.ensure_complete().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

impl Transaction {
    /// Check each slot against its signer. Empty slots count as failures.
    pub fn verify_with_results(&self) -> Result<Vec<bool>, TxError> {
        let message_bytes = self.message_data()?;
        Ok(self
            .signatures
            .iter()
            .zip(self.message.signer_keys())
            .map(|(signature, pubkey)| signature.verify(pubkey, &message_bytes))
            .collect())
    }

    /// Require every slot to be filled with a valid signature.
    pub fn verify(&self) -> Result<(), TxError> {
        self.ensure_complete()?;
        let results = self.verify_with_results()?;
        if let Some(index) = results.iter().position(|ok| !ok) {
            let pubkey = self.message.signer_keys()[index];
            warn!(index, %pubkey, "signature failed verification");
            return Err(TxError::SignatureMismatch { index, pubkey });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire codec
// ---------------------------------------------------------------------------

impl Transaction {
    /// Serialize in whatever state the transaction is in; empty slots are
    /// written as zeros.
    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let mut wire = Vec::with_capacity(1 + self.signatures.len() * SIGNATURE_BYTES + 256);
        short_vec::write_vec(&mut wire, &self.signatures, |buf, sig| {
            buf.extend_from_slice(sig.as_ref());
            Ok(())
        })?;
        self.message.write_to(&mut wire)?;
        Ok(wire)
    }

    /// The bytes to hand to a transport: only produced once every signature
    /// is present and valid.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.verify()?;
        self.serialize()
    }

    /// Parse a legacy or v0 wire transaction. Signatures are not verified.
    pub fn deserialize(data: &[u8]) -> Result<Self, TxError> {
        let mut reader = ByteReader::new(data);
        let signatures = reader.read_vec(|r| {
            Ok(Signature::new_from_array(r.read_array::<SIGNATURE_BYTES>()?))
        })?;
        let message = VersionedMessage::read_from(&mut reader)?;
        reader.finish()?;

        let expected = usize::from(message.header().num_required_signatures);
        if signatures.len() != expected {
            return Err(TxError::SignatureCountMismatch {
                expected,
                actual: signatures.len(),
            });
        }
        Ok(Self {
            signatures,
            message,
        })
    }
}
