use super::{ShareContext, ShareError, Status};
use crate::crypto::{KeyPurpose, Secret};
use crate::file::decrypt_file;
use crate::ledger::{AccountKind, Address, ProgramAccount};
use crate::manifest::Manifest;
use crate::store::{fetch_blob, fetch_manifest, parse_cid};

/// A file recovered from a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Result of opening a document or batch share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub kind: AccountKind,
    pub owner: Address,
    pub files: Vec<DecryptedFile>,
}

/// What the ledger says about the share being opened
struct Target {
    kind: AccountKind,
    owner: Address,
    manifest_cid: String,
    purpose: KeyPurpose,
}

/// Check access to `address`, then fetch and decrypt every file it points
/// to
///
/// `address` may be a document or a batch share. The owner always has
/// access. Anyone else needs a live grant (documents) or to be the
/// recipient (batch shares), and the share must not have expired. With
/// `log_access`, a non-owner opening a document also records an audit entry
/// on the ledger.
pub async fn open_share<F>(
    ctx: &ShareContext,
    address: &Address,
    now: i64,
    log_access: bool,
    status: &mut F,
) -> Result<Opened, ShareError>
where
    F: FnMut(Status) + Send + ?Sized,
{
    let result = async {
        status(Status::CheckingAccess);
        let target = authorize(ctx, address, now).await?;

        status(Status::FetchingMetadata);
        let manifest = fetch_manifest(ctx.store(), &parse_cid(&target.manifest_cid)?).await?;
        let secret = file_key(ctx, &manifest, &target)?;

        status(Status::Downloading);
        let mut blobs = Vec::with_capacity(manifest.files.len());
        for entry in &manifest.files {
            blobs.push(fetch_blob(ctx.store(), &entry.cid()?).await?);
        }

        status(Status::Decrypting);
        let files = manifest
            .files
            .iter()
            .zip(blobs)
            .map(|(entry, blob)| -> Result<DecryptedFile, ShareError> {
                Ok(DecryptedFile {
                    name: entry.name.clone(),
                    mime_type: entry.mime_type.clone(),
                    data: decrypt_file(&blob, &secret, &entry.nonce)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let viewer = ctx.wallet_address();
        if log_access && target.kind == AccountKind::Document && target.owner != viewer {
            ctx.program.log_access(address).await?;
        }

        Ok::<_, ShareError>(Opened {
            kind: target.kind,
            owner: target.owner,
            files,
        })
    }
    .await;

    match result {
        Ok(opened) => {
            status(Status::Ready);
            Ok(opened)
        }
        Err(ShareError::AccessDenied) => {
            status(Status::AccessDenied);
            Err(ShareError::AccessDenied)
        }
        Err(err) => {
            tracing::error!(error = %err, %address, "failed to open share");
            status(Status::Failed("Error decrypting file"));
            Err(err)
        }
    }
}

async fn authorize(ctx: &ShareContext, address: &Address, now: i64) -> Result<Target, ShareError> {
    let viewer = ctx.wallet_address();
    let account = ctx.program.fetch_account(address).await?;

    match account {
        ProgramAccount::Document(doc) => {
            if doc.owner != viewer {
                if !ctx.program.has_access(address, &viewer).await? {
                    return Err(ShareError::AccessDenied);
                }
                if doc.is_expired(now) {
                    return Err(ShareError::Expired(doc.expires_at));
                }
            }
            Ok(Target {
                kind: AccountKind::Document,
                owner: doc.owner,
                manifest_cid: doc.ipfs_hash,
                purpose: KeyPurpose::Document,
            })
        }
        ProgramAccount::BatchShare(share) => {
            if share.owner != viewer {
                if share.recipient != viewer {
                    return Err(ShareError::AccessDenied);
                }
                if let Some(expiry) = share.expiry.filter(|_| share.is_expired(now)) {
                    return Err(ShareError::Expired(expiry));
                }
            }
            Ok(Target {
                kind: AccountKind::BatchShare,
                owner: share.owner,
                manifest_cid: share.manifest_cid,
                purpose: KeyPurpose::Batch,
            })
        }
        other => Err(ShareError::NotShareable(other.kind())),
    }
}

// A wrapped key addressed to us wins; the owner can also re-derive
fn file_key(ctx: &ShareContext, manifest: &Manifest, target: &Target) -> Result<Secret, ShareError> {
    let wallet = ctx.program.wallet();
    if let Some(share) = manifest.key_for(&wallet.public_key()) {
        return Ok(wallet.recover_share(share)?);
    }
    if target.owner == ctx.wallet_address() {
        return Ok(wallet.derive_secret(target.purpose, manifest.salt.as_ref()));
    }
    Err(ShareError::NoKey)
}
