use super::{expiry_after_days, wrap_keys, ShareContext, ShareError, Status};
use crate::crypto::{KeyPurpose, PublicKey, Salt};
use crate::file::{encrypt_file, PlainFile};
use crate::ledger::Address;
use crate::manifest::Manifest;
use crate::store::{upload_batch, Cid};

/// Result of a completed batch share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shared {
    pub batch_share: Address,
    pub manifest_cid: Cid,
    pub recipient: Address,
    pub file_count: u32,
    pub expires_at: i64,
}

/// Encrypt `files` under a fresh batch key, upload them with a
/// manifest, and record a batch share for `recipient` on the ledger
///
/// The manifest carries the batch key wrapped for the recipient and for the
/// sender. If any upload fails nothing is recorded on the ledger.
pub async fn share_files<F>(
    ctx: &ShareContext,
    files: &[PlainFile],
    recipient: Option<&PublicKey>,
    expiry_days: u32,
    now: i64,
    status: &mut F,
) -> Result<Shared, ShareError>
where
    F: FnMut(Status) + Send + ?Sized,
{
    if files.is_empty() {
        return Err(ShareError::NoFiles);
    }
    let recipient = recipient.ok_or(ShareError::NoRecipient)?;
    let file_count =
        u32::try_from(files.len()).map_err(|_| ShareError::TooManyFiles(files.len()))?;
    let expires_at = expiry_after_days(now, expiry_days)?;

    let result = async {
        status(Status::DerivingKey);
        let wallet = ctx.program.wallet();
        // a fresh salt gives every upload its own key
        let salt = Salt::generate()?;
        let secret = wallet.derive_secret(KeyPurpose::Batch, Some(&salt));

        status(Status::Encrypting);
        let encrypted = files
            .iter()
            .map(|file| encrypt_file(file, &secret))
            .collect::<Result<Vec<_>, _>>()?;
        let sender = wallet.public_key();
        let keys = wrap_keys(&secret, [recipient, &sender])?;

        status(Status::Uploading);
        let manifest = Manifest::new(keys).with_salt(salt);
        let manifest_cid = upload_batch(ctx.store(), &encrypted, manifest).await?;

        status(Status::CreatingShare);
        let recipient = Address::from(*recipient);
        let batch_share = ctx
            .program
            .create_batch_share(
                &manifest_cid.to_string(),
                &recipient,
                file_count,
                Some(expires_at),
            )
            .await?;

        Ok::<_, ShareError>(Shared {
            batch_share,
            manifest_cid,
            recipient,
            file_count,
            expires_at,
        })
    }
    .await;

    match result {
        Ok(shared) => {
            status(Status::Shared {
                file_count,
                recipient: shared.recipient,
            });
            Ok(shared)
        }
        Err(err) => {
            tracing::error!(error = %err, "batch share failed");
            status(Status::Failed("Error uploading files"));
            Err(err)
        }
    }
}
