/**
 * Cryptographic types and operations.
 *  - Wallet keypairs and base58 addresses
 *  - Signature-derived file keys and AES-GCM
 *  - Wrapping a file key for another wallet
 */
pub mod crypto;
/**
 * Files before and after the cipher step.
 */
pub mod file;
/**
 * The on-ledger sharing program: account and
 *  instruction encodings, the narrow `Ledger`
 *  seam and the client built on it.
 */
pub mod ledger;
/**
 * The JSON manifest describing an uploaded batch.
 */
pub mod manifest;
/**
 * Upload, register, view and cleanup flows.
 */
pub mod share;
/**
 * Content-addressed blob storage seam and
 *  batch upload.
 */
pub mod store;
/**
 * In-memory store and ledger for tests.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;
pub mod wallet;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::crypto::{KeyPurpose, PublicKey, Secret, SecretKey};
    pub use crate::file::PlainFile;
    pub use crate::ledger::{Address, Ledger, ProgramClient};
    pub use crate::manifest::Manifest;
    pub use crate::share::{ShareContext, ShareError, Status};
    pub use crate::store::{Cid, ContentStore};
    pub use crate::version::BuildInfo;
    pub use crate::wallet::{LocalWallet, Wallet};
}
