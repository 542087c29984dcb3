use std::sync::Arc;

use super::{
    AccessAccount, AccessFilter, Address, BatchShareAccount, DocumentAccount, Instruction, Keyed,
    Ledger, LedgerError, ProgramAccount, TxSignature,
};
use crate::crypto::SecretKey;
use crate::wallet::Wallet;

/// The sharing program as seen by one wallet
///
/// Every method is a single ledger round-trip (or a list plus a filter);
/// nothing is cached and nothing is retried.
#[derive(Clone)]
pub struct ProgramClient {
    ledger: Arc<dyn Ledger>,
    wallet: Arc<dyn Wallet>,
}

impl std::fmt::Debug for ProgramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramClient")
            .field("wallet", &self.wallet.public_key())
            .finish()
    }
}

impl ProgramClient {
    pub fn new(ledger: Arc<dyn Ledger>, wallet: Arc<dyn Wallet>) -> Self {
        Self { ledger, wallet }
    }

    pub fn wallet(&self) -> &dyn Wallet {
        self.wallet.as_ref()
    }

    /// Ledger address of the connected wallet
    pub fn address(&self) -> Address {
        self.wallet.public_key().into()
    }

    /// Whether `viewer` holds a live grant on `document`
    ///
    /// Lists the viewer's grants (filtered by the ledger), then checks
    /// document, grantee and revocation locally.
    pub async fn has_access(
        &self,
        document: &Address,
        viewer: &Address,
    ) -> Result<bool, LedgerError> {
        let grants = self
            .ledger
            .access_records(AccessFilter::Grantee(*viewer))
            .await?;
        Ok(grants.iter().any(|grant| {
            grant.account.doc == *document
                && grant.account.grantee == *viewer
                && !grant.account.revoked
        }))
    }

    /// Fetch a program account, failing if it does not exist
    pub async fn fetch_account(&self, address: &Address) -> Result<ProgramAccount, LedgerError> {
        self.ledger
            .fetch_account(address)
            .await?
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    pub async fn fetch_document(&self, address: &Address) -> Result<DocumentAccount, LedgerError> {
        Ok(self.fetch_account(address).await?.into_document()?)
    }

    pub async fn fetch_batch_share(
        &self,
        address: &Address,
    ) -> Result<BatchShareAccount, LedgerError> {
        Ok(self.fetch_account(address).await?.into_batch_share()?)
    }

    pub async fn documents(&self) -> Result<Vec<Keyed<DocumentAccount>>, LedgerError> {
        self.ledger.documents().await
    }

    pub async fn access_records(
        &self,
        filter: AccessFilter,
    ) -> Result<Vec<Keyed<AccessAccount>>, LedgerError> {
        self.ledger.access_records(filter).await
    }

    /// Register a document pointing at `ipfs_hash`, returning its address
    pub async fn register_document(
        &self,
        ipfs_hash: &str,
        expires_at: i64,
    ) -> Result<Address, LedgerError> {
        self.create(|document| Instruction::RegisterDocument {
            document,
            ipfs_hash: ipfs_hash.to_string(),
            expires_at,
        })
        .await
    }

    /// Grant `grantee` access to one of our documents, returning the grant's
    /// address
    pub async fn grant_access(
        &self,
        document: &Address,
        grantee: &Address,
    ) -> Result<Address, LedgerError> {
        self.create(|access| Instruction::GrantAccess {
            access,
            document: *document,
            grantee: *grantee,
        })
        .await
    }

    /// Record a batch share of `manifest_cid` with `recipient`
    pub async fn create_batch_share(
        &self,
        manifest_cid: &str,
        recipient: &Address,
        file_count: u32,
        expiry: Option<i64>,
    ) -> Result<Address, LedgerError> {
        self.create(|batch_share| Instruction::CreateBatchShare {
            batch_share,
            manifest_cid: manifest_cid.to_string(),
            recipient: *recipient,
            file_count,
            expiry,
        })
        .await
    }

    /// Revoke a grant; the program only accepts this from the grant's owner
    pub async fn revoke_access(&self, access: &Address) -> Result<TxSignature, LedgerError> {
        self.ledger
            .submit(
                self.wallet.as_ref(),
                Instruction::RevokeAccess { access: *access },
                &[],
            )
            .await
    }

    /// Record an audit entry that we viewed `document`
    pub async fn log_access(&self, document: &Address) -> Result<Address, LedgerError> {
        self.create(|access_log| Instruction::LogAccess {
            access_log,
            document: *document,
        })
        .await
    }

    // New accounts get a fresh keypair that co-signs their creation
    async fn create(
        &self,
        build: impl FnOnce(Address) -> Instruction,
    ) -> Result<Address, LedgerError> {
        let account_key = SecretKey::generate();
        let address = Address::from(&account_key);
        let instruction = build(address);
        let name = instruction.name();

        let signature = self
            .ledger
            .submit(self.wallet.as_ref(), instruction, &[account_key])
            .await?;
        tracing::info!(instruction = name, %address, %signature, "transaction submitted");

        Ok(address)
    }
}
