//! Ledger access
//!
//! The sharing program that enforces ownership and stores documents, access
//! grants and batch shares runs on the ledger and is not part of this
//! crate. [`Ledger`] is the narrow seam to it: read one account, list
//! accounts of a kind, submit one signed instruction. [`ProgramClient`]
//! builds the user-facing operations on top of that seam.

mod accounts;
mod address;
mod client;
mod instruction;

use async_trait::async_trait;

use crate::crypto::SecretKey;
use crate::wallet::Wallet;

pub use accounts::{
    discriminator, AccessAccount, AccessLogAccount, AccountError, AccountKind, BatchShareAccount,
    DocumentAccount, Keyed, ProgramAccount, ACCESS_DOC_OFFSET, ACCESS_GRANTEE_OFFSET,
    DISCRIMINATOR_SIZE,
};
pub use address::{Address, AddressError, ADDRESS_SIZE};
pub use client::ProgramClient;
pub use instruction::{AccountMeta, Instruction};

/// Transaction signature as reported by the ledger (base58)
pub type TxSignature = String;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(Address),
    #[error("account error: {0}")]
    Account(#[from] AccountError),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("missing signer for {0}")]
    MissingSigner(Address),
    #[error("instruction encoding error: {0}")]
    Encode(#[from] std::io::Error),
}

/// Server-side predicate for listing access records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFilter {
    /// Records granting access to this wallet
    Grantee(Address),
    /// Records pointing at this document
    Document(Address),
}

impl AccessFilter {
    /// Whether a decoded record satisfies the predicate
    pub fn matches(&self, access: &AccessAccount) -> bool {
        match self {
            AccessFilter::Grantee(grantee) => access.grantee == *grantee,
            AccessFilter::Document(doc) => access.doc == *doc,
        }
    }

    /// Byte offset and value for a memcmp filter over raw account data
    pub fn memcmp(&self) -> (usize, Address) {
        match self {
            AccessFilter::Grantee(grantee) => (ACCESS_GRANTEE_OFFSET, *grantee),
            AccessFilter::Document(doc) => (ACCESS_DOC_OFFSET, *doc),
        }
    }
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fetch and decode one program account; `None` if it does not exist
    async fn fetch_account(&self, address: &Address)
        -> Result<Option<ProgramAccount>, LedgerError>;

    /// List every document account
    async fn documents(&self) -> Result<Vec<Keyed<DocumentAccount>>, LedgerError>;

    /// List access accounts matching a server-side filter
    async fn access_records(
        &self,
        filter: AccessFilter,
    ) -> Result<Vec<Keyed<AccessAccount>>, LedgerError>;

    /// Submit one instruction in its own transaction, signed by `payer` and
    /// any `signers` for accounts being created
    ///
    /// Attempted once. A failure after the transaction left this process is
    /// indistinguishable from one before it.
    async fn submit(
        &self,
        payer: &dyn Wallet,
        instruction: Instruction,
        signers: &[SecretKey],
    ) -> Result<TxSignature, LedgerError>;
}
