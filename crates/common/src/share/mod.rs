//! User-facing flows
//!
//! Each flow is one linear sequence of awaited steps, reporting a [`Status`]
//! before each step:
//!
//! - [`share_files`]: encrypt files and share them with one recipient
//! - [`register_files`]: encrypt files, register them as a document, and
//!   grant access to a list of wallets
//! - [`open_share`]: check access, fetch and decrypt a document or batch
//!   share
//! - [`revoke_expired`]: revoke every live grant on an expired document
//!
//! Nothing runs concurrently and nothing is retried; the first failing step
//! ends the flow.

mod cleanup;
mod register;
mod status;
mod upload;
mod view;

use std::sync::Arc;

use crate::crypto::{PublicKey, Secret, SecretError, SecretShare, SecretShareError};
use crate::ledger::{AccountKind, Address, LedgerError, ProgramClient};
use crate::manifest::{Keys, ManifestError};
use crate::store::{ContentStore, StoreError};

pub use cleanup::{revoke_expired, CleanupReport};
pub use register::{register_files, Registered};
pub use status::Status;
pub use upload::{share_files, Shared};
pub use view::{open_share, DecryptedFile, Opened};

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("no files selected")]
    NoFiles,
    #[error("no recipient wallet address given")]
    NoRecipient,
    #[error("too many files for one share: {0}")]
    TooManyFiles(usize),
    #[error("expiry must be at least one day")]
    InvalidExpiry,
    #[error("access denied")]
    AccessDenied,
    #[error("share expired at {0}")]
    Expired(i64),
    #[error("{0} accounts cannot be opened")]
    NotShareable(AccountKind),
    #[error("manifest holds no key for this wallet")]
    NoKey,
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("encryption error: {0}")]
    Secret(#[from] SecretError),
    #[error("key share error: {0}")]
    SecretShare(#[from] SecretShareError),
}

impl ShareError {
    /// Whether the flow was refused before doing any work
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ShareError::NoFiles
                | ShareError::NoRecipient
                | ShareError::TooManyFiles(_)
                | ShareError::InvalidExpiry
        )
    }
}

/// Everything a flow talks to
#[derive(Clone)]
pub struct ShareContext {
    pub program: ProgramClient,
    pub store: Arc<dyn ContentStore>,
}

impl ShareContext {
    pub fn new(program: ProgramClient, store: Arc<dyn ContentStore>) -> Self {
        Self { program, store }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn wallet_address(&self) -> Address {
        self.program.address()
    }
}

/// Unix expiry `days` after `now`
pub fn expiry_after_days(now: i64, days: u32) -> Result<i64, ShareError> {
    if days == 0 {
        return Err(ShareError::InvalidExpiry);
    }
    Ok(now + i64::from(days) * SECONDS_PER_DAY)
}

/// Wrap `secret` for each wallet, keyed by base58 address
fn wrap_keys<'a>(
    secret: &Secret,
    wallets: impl IntoIterator<Item = &'a PublicKey>,
) -> Result<Keys, SecretShareError> {
    let mut keys = Keys::new();
    for wallet in wallets {
        keys.insert(wallet.to_string(), SecretShare::new(secret, wallet)?);
    }
    Ok(keys)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;

    #[test]
    fn test_expiry_after_days() {
        assert_eq!(expiry_after_days(1_000, 7).unwrap(), 1_000 + 7 * 86_400);
        assert!(matches!(
            expiry_after_days(1_000, 0),
            Err(ShareError::InvalidExpiry)
        ));
    }

    #[test]
    fn test_wrap_keys_deduplicates() {
        let a = SecretKey::generate();
        let secret = Secret::derive(b"k");
        let keys = wrap_keys(&secret, [&a.public(), &a.public()]).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[&a.public().to_string()].recover(&a).unwrap(), secret);
    }
}
