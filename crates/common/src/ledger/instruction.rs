//! Program instructions
//!
//! Instruction data is the Anchor encoding: `sha256("global:<name>")[..8]`
//! followed by the Borsh-encoded arguments. Account lists mirror the
//! program's account contexts.

use borsh::BorshSerialize;

use super::accounts::discriminator;
use super::address::Address;

/// An account referenced by an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable_signer(address: Address) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: true,
        }
    }

    pub fn writable(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// A call into the sharing program
///
/// `owner`/`user` accounts are always the submitting wallet; accounts being
/// created are fresh keypairs that co-sign the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    RegisterDocument {
        document: Address,
        ipfs_hash: String,
        expires_at: i64,
    },
    GrantAccess {
        access: Address,
        document: Address,
        grantee: Address,
    },
    RevokeAccess {
        access: Address,
    },
    LogAccess {
        access_log: Address,
        document: Address,
    },
    CreateBatchShare {
        batch_share: Address,
        manifest_cid: String,
        recipient: Address,
        file_count: u32,
        expiry: Option<i64>,
    },
}

#[derive(BorshSerialize)]
struct RegisterDocumentArgs<'a> {
    ipfs_hash: &'a String,
    expires_at: i64,
}

#[derive(BorshSerialize)]
struct GrantAccessArgs {
    grantee: Address,
}

#[derive(BorshSerialize)]
struct CreateBatchShareArgs<'a> {
    manifest_cid: &'a String,
    recipient: Address,
    file_count: u32,
    expiry: Option<i64>,
}

impl Instruction {
    /// The program method name, as used for the discriminator
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::RegisterDocument { .. } => "register_document",
            Instruction::GrantAccess { .. } => "grant_access",
            Instruction::RevokeAccess { .. } => "revoke_access",
            Instruction::LogAccess { .. } => "log_access",
            Instruction::CreateBatchShare { .. } => "create_batch_share",
        }
    }

    /// Anchor instruction data
    pub fn data(&self) -> std::io::Result<Vec<u8>> {
        let mut out = discriminator("global", self.name()).to_vec();
        match self {
            Instruction::RegisterDocument {
                ipfs_hash,
                expires_at,
                ..
            } => RegisterDocumentArgs {
                ipfs_hash,
                expires_at: *expires_at,
            }
            .serialize(&mut out)?,
            Instruction::GrantAccess { grantee, .. } => {
                GrantAccessArgs { grantee: *grantee }.serialize(&mut out)?
            }
            Instruction::RevokeAccess { .. } | Instruction::LogAccess { .. } => {}
            Instruction::CreateBatchShare {
                manifest_cid,
                recipient,
                file_count,
                expiry,
                ..
            } => CreateBatchShareArgs {
                manifest_cid,
                recipient: *recipient,
                file_count: *file_count,
                expiry: *expiry,
            }
            .serialize(&mut out)?,
        }
        Ok(out)
    }

    /// Accounts in the order the program's context declares them
    pub fn accounts(&self, signer: Address) -> Vec<AccountMeta> {
        let system = AccountMeta::readonly(Address::SYSTEM_PROGRAM);
        match self {
            Instruction::RegisterDocument { document, .. } => vec![
                AccountMeta::writable_signer(*document),
                AccountMeta::writable_signer(signer),
                system,
            ],
            Instruction::GrantAccess {
                access, document, ..
            } => vec![
                AccountMeta::writable_signer(*access),
                AccountMeta::writable(*document),
                AccountMeta::writable_signer(signer),
                system,
            ],
            Instruction::RevokeAccess { access } => vec![
                AccountMeta::writable(*access),
                AccountMeta::writable_signer(signer),
            ],
            Instruction::LogAccess {
                access_log,
                document,
            } => vec![
                AccountMeta::writable_signer(*access_log),
                AccountMeta::writable(*document),
                AccountMeta::writable_signer(signer),
                system,
            ],
            Instruction::CreateBatchShare { batch_share, .. } => vec![
                AccountMeta::writable_signer(*batch_share),
                AccountMeta::writable_signer(signer),
                system,
            ],
        }
    }

    /// The account this instruction creates, if any
    pub fn created_account(&self) -> Option<Address> {
        match self {
            Instruction::RegisterDocument { document, .. } => Some(*document),
            Instruction::GrantAccess { access, .. } => Some(*access),
            Instruction::LogAccess { access_log, .. } => Some(*access_log),
            Instruction::CreateBatchShare { batch_share, .. } => Some(*batch_share),
            Instruction::RevokeAccess { .. } => None,
        }
    }
}
