//! Legacy transaction wire format
//!
//! ```text
//! transaction = compact_array<signature(64)> message
//! message     = header(3) compact_array<key(32)> blockhash(32)
//!               compact_array<instruction>
//! instruction = program_index(u8) compact_array<u8 account_index>
//!               compact_array<u8 data>
//! ```
//!
//! Keys are ordered writable signers, readonly signers, writable
//! non-signers, readonly non-signers, with the fee payer first. The header
//! counts signers and the readonly members of each group.

use common::crypto::{SecretKey, Signature};
use common::ledger::{AccountMeta, Address};
use common::wallet::Wallet;

use crate::clients::ClientError;

pub const SIGNATURE_SIZE: usize = 64;

/// Append `len` as a compact-u16 (7 bits per byte, high bit continues)
pub fn encode_compact_u16(mut len: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn compact_len(len: usize) -> Result<u16, ClientError> {
    u16::try_from(len).map_err(|_| ClientError::Decode(format!("array too long: {}", len)))
}

fn key_index(keys: &[Address], address: &Address) -> Result<u8, ClientError> {
    keys.iter()
        .position(|key| key == address)
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| ClientError::Decode(format!("account {} not in message", address)))
}

/// A single-instruction legacy message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Address>,
    pub recent_blockhash: [u8; 32],
    pub program_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(
        payer: Address,
        program_id: Address,
        accounts: &[AccountMeta],
        data: Vec<u8>,
        recent_blockhash: [u8; 32],
    ) -> Result<Self, ClientError> {
        // merge duplicate keys, keeping the strongest flags
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::writable_signer(payer)];
        for meta in accounts
            .iter()
            .copied()
            .chain(std::iter::once(AccountMeta::readonly(program_id)))
        {
            match metas.iter_mut().find(|m| m.address == meta.address) {
                Some(existing) => {
                    existing.is_signer |= meta.is_signer;
                    existing.is_writable |= meta.is_writable;
                }
                None => metas.push(meta),
            }
        }

        // stable sort keeps the payer first among writable signers
        metas.sort_by_key(|m| match (m.is_signer, m.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let count = |f: fn(&AccountMeta) -> bool| metas.iter().filter(|m| f(m)).count() as u8;
        let num_required_signatures = count(|m| m.is_signer);
        let num_readonly_signed = count(|m| m.is_signer && !m.is_writable);
        let num_readonly_unsigned = count(|m| !m.is_signer && !m.is_writable);

        let account_keys: Vec<Address> = metas.iter().map(|m| m.address).collect();
        let program_index = key_index(&account_keys, &program_id)?;
        let account_indexes = accounts
            .iter()
            .map(|meta| key_index(&account_keys, &meta.address))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            program_index,
            account_indexes,
            data,
        })
    }

    /// Keys that must sign, in signature order
    pub fn signers(&self) -> &[Address] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ClientError> {
        let mut out = vec![
            self.num_required_signatures,
            self.num_readonly_signed,
            self.num_readonly_unsigned,
        ];

        encode_compact_u16(compact_len(self.account_keys.len())?, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash);

        // one instruction
        encode_compact_u16(1, &mut out);
        out.push(self.program_index);
        encode_compact_u16(compact_len(self.account_indexes.len())?, &mut out);
        out.extend_from_slice(&self.account_indexes);
        encode_compact_u16(compact_len(self.data.len())?, &mut out);
        out.extend_from_slice(&self.data);

        Ok(out)
    }
}

/// Sign a message with the payer wallet and any co-signing keys
///
/// Returns the wire bytes and the payer's signature, which identifies the
/// transaction.
pub fn sign_transaction(
    message: &Message,
    payer: &dyn Wallet,
    signers: &[SecretKey],
) -> Result<(Vec<u8>, Signature), ClientError> {
    let message_bytes = message.serialize()?;
    let payer_address = Address::from(payer.public_key());

    let mut signatures = Vec::with_capacity(message.signers().len());
    for required in message.signers() {
        let signature = if *required == payer_address {
            payer.sign_message(&message_bytes)
        } else {
            signers
                .iter()
                .find(|key| Address::from(*key) == *required)
                .map(|key| key.sign(&message_bytes))
                .ok_or_else(|| ClientError::Decode(format!("missing signer for {}", required)))?
        };
        signatures.push(signature);
    }

    let mut out = Vec::with_capacity(1 + signatures.len() * SIGNATURE_SIZE + message_bytes.len());
    encode_compact_u16(compact_len(signatures.len())?, &mut out);
    for signature in &signatures {
        out.extend_from_slice(&signature.to_bytes());
    }
    out.extend_from_slice(&message_bytes);

    // the payer always sorts first
    Ok((out, signatures[0]))
}
