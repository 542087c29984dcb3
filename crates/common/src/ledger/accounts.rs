//! Program account layouts
//!
//! Accounts owned by the sharing program are Anchor accounts: an 8-byte
//! discriminator (`sha256("account:<Name>")[..8]`) followed by the
//! Borsh-encoded fields. Accounts are allocated with spare space, so
//! trailing bytes after the fields are ignored.
//!
//! Raw account data is decoded exactly once, here, into the tagged
//! [`ProgramAccount`]; nothing past this boundary handles raw bytes.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::address::{Address, ADDRESS_SIZE};

pub const DISCRIMINATOR_SIZE: usize = 8;

/// Byte offset of `Access::doc` in raw account data
pub const ACCESS_DOC_OFFSET: usize = DISCRIMINATOR_SIZE;
/// Byte offset of `Access::grantee` in raw account data (after doc + owner)
pub const ACCESS_GRANTEE_OFFSET: usize = DISCRIMINATOR_SIZE + 2 * ADDRESS_SIZE;

pub type Discriminator = [u8; DISCRIMINATOR_SIZE];

/// Anchor discriminator for `<namespace>:<name>`
pub fn discriminator(namespace: &str, name: &str) -> Discriminator {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; DISCRIMINATOR_SIZE];
    out.copy_from_slice(&digest[..DISCRIMINATOR_SIZE]);
    out
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account data too short ({0} bytes)")]
    TooShort(usize),
    #[error("unknown account discriminator {0}")]
    UnknownDiscriminator(String),
    #[error("account encoding error: {0}")]
    Borsh(#[from] std::io::Error),
    #[error("expected {expected} account, found {found}")]
    WrongKind {
        expected: AccountKind,
        found: AccountKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountKind {
    Document,
    Access,
    AccessLog,
    BatchShare,
}

impl AccountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::Document => "Document",
            AccountKind::Access => "Access",
            AccountKind::AccessLog => "AccessLog",
            AccountKind::BatchShare => "BatchShare",
        }
    }

    pub fn discriminator(&self) -> Discriminator {
        discriminator("account", self.name())
    }

    fn from_discriminator(disc: &[u8]) -> Option<Self> {
        [
            AccountKind::Document,
            AccountKind::Access,
            AccountKind::AccessLog,
            AccountKind::BatchShare,
        ]
        .into_iter()
        .find(|kind| kind.discriminator() == disc)
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A registered encrypted document
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAccount {
    pub owner: Address,
    /// Content identifier of the document's manifest
    pub ipfs_hash: String,
    /// Unix seconds
    pub expires_at: i64,
    pub created_at: i64,
}

impl DocumentAccount {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

/// A grant of read access on a document to one wallet
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAccount {
    pub doc: Address,
    pub owner: Address,
    pub grantee: Address,
    pub granted_at: i64,
    pub revoked: bool,
}

/// One recorded viewing of a document
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogAccount {
    pub doc: Address,
    pub user: Address,
    pub timestamp: i64,
}

/// A manifest shared with a single recipient
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchShareAccount {
    pub owner: Address,
    pub recipient: Address,
    pub manifest_cid: String,
    pub file_count: u32,
    /// Unix seconds; `None` never expires
    pub expiry: Option<i64>,
}

impl BatchShareAccount {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry.map(|expiry| expiry < now).unwrap_or(false)
    }
}

/// Any account owned by the sharing program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgramAccount {
    Document(DocumentAccount),
    Access(AccessAccount),
    AccessLog(AccessLogAccount),
    BatchShare(BatchShareAccount),
}

impl ProgramAccount {
    pub fn kind(&self) -> AccountKind {
        match self {
            ProgramAccount::Document(_) => AccountKind::Document,
            ProgramAccount::Access(_) => AccountKind::Access,
            ProgramAccount::AccessLog(_) => AccountKind::AccessLog,
            ProgramAccount::BatchShare(_) => AccountKind::BatchShare,
        }
    }

    /// Decode raw account data, dispatching on the discriminator
    pub fn decode(data: &[u8]) -> Result<Self, AccountError> {
        if data.len() < DISCRIMINATOR_SIZE {
            return Err(AccountError::TooShort(data.len()));
        }
        let (disc, mut body) = data.split_at(DISCRIMINATOR_SIZE);
        let kind = AccountKind::from_discriminator(disc)
            .ok_or_else(|| AccountError::UnknownDiscriminator(hex::encode(disc)))?;

        // `deserialize` reads a prefix, which skips the allocation padding
        Ok(match kind {
            AccountKind::Document => {
                ProgramAccount::Document(DocumentAccount::deserialize(&mut body)?)
            }
            AccountKind::Access => ProgramAccount::Access(AccessAccount::deserialize(&mut body)?),
            AccountKind::AccessLog => {
                ProgramAccount::AccessLog(AccessLogAccount::deserialize(&mut body)?)
            }
            AccountKind::BatchShare => {
                ProgramAccount::BatchShare(BatchShareAccount::deserialize(&mut body)?)
            }
        })
    }

    /// Encode as raw account data (discriminator + fields)
    pub fn encode(&self) -> Result<Vec<u8>, AccountError> {
        let mut out = self.kind().discriminator().to_vec();
        match self {
            ProgramAccount::Document(a) => BorshSerialize::serialize(a, &mut out)?,
            ProgramAccount::Access(a) => BorshSerialize::serialize(a, &mut out)?,
            ProgramAccount::AccessLog(a) => BorshSerialize::serialize(a, &mut out)?,
            ProgramAccount::BatchShare(a) => BorshSerialize::serialize(a, &mut out)?,
        }
        Ok(out)
    }

    pub fn into_document(self) -> Result<DocumentAccount, AccountError> {
        match self {
            ProgramAccount::Document(doc) => Ok(doc),
            other => Err(AccountError::WrongKind {
                expected: AccountKind::Document,
                found: other.kind(),
            }),
        }
    }

    pub fn into_access(self) -> Result<AccessAccount, AccountError> {
        match self {
            ProgramAccount::Access(access) => Ok(access),
            other => Err(AccountError::WrongKind {
                expected: AccountKind::Access,
                found: other.kind(),
            }),
        }
    }

    pub fn into_batch_share(self) -> Result<BatchShareAccount, AccountError> {
        match self {
            ProgramAccount::BatchShare(share) => Ok(share),
            other => Err(AccountError::WrongKind {
                expected: AccountKind::BatchShare,
                found: other.kind(),
            }),
        }
    }
}

/// An account together with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyed<T> {
    pub address: Address,
    pub account: T,
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; ADDRESS_SIZE])
    }

    #[test]
    fn test_discriminator_matches_anchor() {
        // sha256("account:Document")[..8]
        let expected = Sha256::digest(b"account:Document");
        assert_eq!(AccountKind::Document.discriminator(), expected[..8]);
        assert_ne!(
            AccountKind::Access.discriminator(),
            AccountKind::Document.discriminator()
        );
    }

    #[test]
    fn test_access_field_offsets() {
        let access = AccessAccount {
            doc: addr(1),
            owner: addr(2),
            grantee: addr(3),
            granted_at: 7,
            revoked: false,
        };
        let data = ProgramAccount::Access(access).encode().unwrap();
        assert_eq!(
            &data[ACCESS_DOC_OFFSET..ACCESS_DOC_OFFSET + ADDRESS_SIZE],
            addr(1).as_bytes()
        );
        assert_eq!(
            &data[ACCESS_GRANTEE_OFFSET..ACCESS_GRANTEE_OFFSET + ADDRESS_SIZE],
            addr(3).as_bytes()
        );
    }

    #[test]
    fn test_decode_ignores_padding() {
        let doc = DocumentAccount {
            owner: addr(9),
            ipfs_hash: "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy".into(),
            expires_at: 1_700_000_000,
            created_at: 1_600_000_000,
        };
        let mut data = ProgramAccount::Document(doc.clone()).encode().unwrap();
        // document accounts are allocated with 128 bytes for the hash
        data.resize(8 + 32 + 4 + 128 + 8 + 8, 0);

        let decoded = ProgramAccount::decode(&data).unwrap();
        assert_eq!(decoded.into_document().unwrap(), doc);
    }

    #[test]
    fn test_batch_share_optional_expiry() {
        let share = BatchShareAccount {
            owner: addr(1),
            recipient: addr(2),
            manifest_cid: "cid".into(),
            file_count: 3,
            expiry: None,
        };
        let data = ProgramAccount::BatchShare(share.clone()).encode().unwrap();
        let decoded = ProgramAccount::decode(&data)
            .unwrap()
            .into_batch_share()
            .unwrap();
        assert_eq!(decoded, share);
        assert!(!decoded.is_expired(i64::MAX));

        let expiring = BatchShareAccount {
            expiry: Some(100),
            ..share
        };
        assert!(expiring.is_expired(101));
        assert!(!expiring.is_expired(100));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ProgramAccount::decode(&[1, 2, 3]),
            Err(AccountError::TooShort(3))
        ));
        assert!(matches!(
            ProgramAccount::decode(&[0u8; 64]),
            Err(AccountError::UnknownDiscriminator(_))
        ));

        // right discriminator, truncated body
        let mut data = AccountKind::Access.discriminator().to_vec();
        data.extend_from_slice(&[0u8; 10]);
        assert!(matches!(
            ProgramAccount::decode(&data),
            Err(AccountError::Borsh(_))
        ));
    }

    #[test]
    fn test_access_log_layout() {
        let log = AccessLogAccount {
            doc: addr(4),
            user: addr(5),
            timestamp: 1_700_000_123,
        };
        let data = ProgramAccount::AccessLog(log.clone()).encode().unwrap();
        // disc(8) + doc(32) + user(32) + i64(8)
        assert_eq!(data.len(), 8 + 32 + 32 + 8);
        assert_eq!(&data[..8], &discriminator("account", "AccessLog"));

        let decoded = ProgramAccount::decode(&data).unwrap();
        assert_eq!(decoded.kind(), AccountKind::AccessLog);
        assert_eq!(decoded, ProgramAccount::AccessLog(log));
    }

    #[test]
    fn test_wrong_kind() {
        let access = ProgramAccount::Access(AccessAccount {
            doc: addr(1),
            owner: addr(2),
            grantee: addr(3),
            granted_at: 0,
            revoked: true,
        });
        assert!(matches!(
            access.into_document(),
            Err(AccountError::WrongKind {
                expected: AccountKind::Document,
                found: AccountKind::Access
            })
        ));
    }
}
