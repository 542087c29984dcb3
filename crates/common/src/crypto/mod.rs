//! Cryptographic primitives for SolCipher
//!
//! - **Identity**: Ed25519 wallet keypairs (`SecretKey`/`PublicKey`); the
//!   public key is the wallet's ledger address
//! - **Key derivation**: a file key is SHA-256 of the wallet's signature over
//!   a per-purpose message salted once per upload
//! - **Encryption**: AES-256-GCM with a fresh 12-byte nonce per file
//! - **Key sharing**: the derived key is wrapped for each recipient with
//!   ephemeral X25519 ECDH + AES-KW
//!
//! # Key Sharing Protocol
//! To hand a file key to a recipient:
//! 1. Generate an ephemeral Ed25519 keypair
//! 2. Convert both keys to X25519 (Montgomery curve)
//! 3. Perform ECDH to derive a shared secret
//! 4. AES-KW wrap the file key with the shared secret
//! 5. Package as a `SecretShare` (ephemeral_pubkey || wrapped_secret)

mod keys;
mod secret;
mod secret_share;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{
    KeyPurpose, Nonce, Salt, Secret, SecretError, NONCE_SIZE, SALT_SIZE, SECRET_SIZE, TAG_SIZE,
};
pub use secret_share::{SecretShare, SecretShareError, SECRET_SHARE_SIZE};
