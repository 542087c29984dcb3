//! # Manifest
//!
//! One manifest is uploaded per batch. It lists every encrypted file with
//! the metadata needed to fetch and decrypt it, plus the file key wrapped
//! for each wallet allowed to read the batch:
//!
//! ```json
//! {
//!   "files": [{ "name": "a.txt", "type": "text/plain", "size": 10,
//!               "iv": [12 numbers], "cid": "bafk..." }],
//!   "keys": { "<base58 wallet>": "<hex secret share>" },
//!   "salt": "<hex>",
//!   "createdAt": "2026-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! `salt` is the per-upload value the owner signed to derive the file key.
//! Manifests written by older clients have neither `keys` nor `salt`.
//!
//! A manifest is immutable once uploaded and is addressed by its own CID.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{Nonce, PublicKey, Salt, SecretShare};
use crate::file::EncryptedFile;
use crate::store::Cid;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid cid in manifest: {0}")]
    Cid(String),
}

/// One uploaded file as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "iv")]
    pub nonce: Nonce,
    pub cid: String,
}

impl ManifestEntry {
    pub fn new(file: &EncryptedFile, cid: &Cid) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            nonce: file.nonce,
            cid: cid.to_string(),
        }
    }

    /// Parse the stored content identifier
    pub fn cid(&self) -> Result<Cid, ManifestError> {
        Cid::try_from(self.cid.as_str()).map_err(|e| ManifestError::Cid(e.to_string()))
    }
}

/// Per-wallet wrapped file keys, keyed by base58 address
pub type Keys = BTreeMap<String, SecretShare>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
    #[serde(default)]
    pub keys: Keys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    /// Start an empty manifest stamped with the current time
    pub fn new(keys: Keys) -> Self {
        Self {
            files: Vec::new(),
            keys,
            salt: None,
            created_at: Utc::now(),
        }
    }

    /// Record the salt the file key was derived with
    pub fn with_salt(mut self, salt: Salt) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.files.push(entry);
    }

    /// The key wrapped for `wallet`, if the sender included one
    pub fn key_for(&self, wallet: &PublicKey) -> Option<&SecretShare> {
        self.keys.get(&wallet.to_string())
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ManifestError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(data)?)
    }
}

// ISO-8601 with millisecond precision and a `Z` suffix
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
