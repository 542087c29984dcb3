//! Content-addressed blob storage
//!
//! The store itself (an IPFS pinning service plus its HTTP gateway) is an
//! external service; this module only defines the narrow seam SolCipher
//! needs from it ([`ContentStore`]) and the batch upload built on top.

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::file::EncryptedFile;
use crate::manifest::{Manifest, ManifestEntry, ManifestError};

pub use cid::Cid;

/// Name every blob is uploaded under; the gateway path relies on it
pub const BLOB_NAME: &str = "encrypted-file";

/// Multicodec code for raw binary blocks
const RAW_CODEC: u64 = 0x55;
/// Multihash code for SHA2-256
const SHA2_256: u64 = 0x12;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("fetch failed for {cid}: {reason}")]
    Fetch { cid: String, reason: String },
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid cid: {0}")]
    InvalidCid(String),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a named blob and return its content identifier
    async fn put(&self, name: &str, data: Bytes) -> Result<Cid, StoreError>;

    /// Retrieve a blob by content identifier
    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError>;
}

/// CIDv1 (raw codec, SHA2-256) of a block of bytes
pub fn raw_cid(data: &[u8]) -> Cid {
    let digest = Sha256::digest(data);
    let hash = cid::multihash::Multihash::<64>::wrap(SHA2_256, &digest)
        .expect("sha2-256 digest fits in a 64 byte multihash");
    Cid::new_v1(RAW_CODEC, hash)
}

/// Upload every encrypted file, then `manifest` with an entry for each
///
/// Uploads are strictly sequential. The first failed upload aborts the batch
/// and no manifest is produced; blobs already uploaded stay orphaned in the
/// store, which is harmless for content-addressed storage.
pub async fn upload_batch(
    store: &dyn ContentStore,
    files: &[EncryptedFile],
    mut manifest: Manifest,
) -> Result<Cid, StoreError> {
    for (index, file) in files.iter().enumerate() {
        let cid = store
            .put(BLOB_NAME, Bytes::from(file.ciphertext.clone()))
            .await?;
        tracing::debug!(index, name = %file.name, %cid, "uploaded encrypted file");
        manifest.push(ManifestEntry::new(file, &cid));
    }

    let manifest_cid = store
        .put(BLOB_NAME, Bytes::from(manifest.to_json()?))
        .await?;
    tracing::info!(files = files.len(), %manifest_cid, "uploaded manifest");

    Ok(manifest_cid)
}

/// Fetch a single blob
pub async fn fetch_blob(store: &dyn ContentStore, cid: &Cid) -> Result<Bytes, StoreError> {
    store.get(cid).await
}

/// Fetch and parse a manifest
pub async fn fetch_manifest(store: &dyn ContentStore, cid: &Cid) -> Result<Manifest, StoreError> {
    let data = store.get(cid).await?;
    Ok(Manifest::from_json(&data)?)
}

/// Parse a content identifier string
pub fn parse_cid(raw: &str) -> Result<Cid, StoreError> {
    Cid::try_from(raw.trim()).map_err(|e| StoreError::InvalidCid(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_raw_cid_is_stable() {
        let a = raw_cid(b"hello");
        let b = raw_cid(b"hello");
        assert_eq!(a, b);
        assert_ne!(a, raw_cid(b"world"));
        assert_eq!(a.codec(), RAW_CODEC);
        assert!(a.to_string().starts_with("bafkrei"));
    }

    #[test]
    fn test_parse_cid() {
        let cid = raw_cid(b"data");
        assert_eq!(parse_cid(&cid.to_string()).unwrap(), cid);
        assert!(parse_cid("definitely not a cid").is_err());
    }
}
