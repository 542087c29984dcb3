//! Wallets sign on behalf of a user
//!
//! Everything SolCipher needs from a wallet: its public key, a signature over
//! arbitrary bytes (transactions and key-derivation messages), and unwrapping
//! key shares addressed to it.

use crate::crypto::{
    KeyPurpose, PublicKey, Salt, Secret, SecretKey, SecretShare, SecretShareError, Signature,
};

pub trait Wallet: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn sign_message(&self, message: &[u8]) -> Signature;

    fn recover_share(&self, share: &SecretShare) -> Result<Secret, SecretShareError>;

    /// Derive this wallet's file key for one upload
    ///
    /// SHA-256 of the wallet's signature over the purpose's message salted
    /// with `salt`. Without a salt the bare message is signed, which only
    /// manifests written without one need.
    fn derive_secret(&self, purpose: KeyPurpose, salt: Option<&Salt>) -> Secret {
        let signature = match salt {
            Some(salt) => self.sign_message(&purpose.salted_message(salt)),
            None => self.sign_message(purpose.message()),
        };
        Secret::from_signature(&signature)
    }
}

/// A wallet backed by a secret key held in this process
#[derive(Debug, Clone)]
pub struct LocalWallet {
    key: SecretKey,
}

impl LocalWallet {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    pub fn generate() -> Self {
        Self::new(SecretKey::generate())
    }
}

impl From<SecretKey> for LocalWallet {
    fn from(key: SecretKey) -> Self {
        Self::new(key)
    }
}

impl Wallet for LocalWallet {
    fn public_key(&self) -> PublicKey {
        self.key.public()
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        self.key.sign(message)
    }

    fn recover_share(&self, share: &SecretShare) -> Result<Secret, SecretShareError> {
        share.recover(&self.key)
    }
}
