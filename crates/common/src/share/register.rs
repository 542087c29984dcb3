use super::{expiry_after_days, wrap_keys, ShareContext, ShareError, Status};
use crate::crypto::{KeyPurpose, PublicKey, Salt};
use crate::file::{encrypt_file, PlainFile};
use crate::ledger::Address;
use crate::manifest::Manifest;
use crate::store::{upload_batch, Cid};

/// Result of registering files as a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub document: Address,
    pub manifest_cid: Cid,
    /// Access record per grantee, in the order given
    pub grants: Vec<Address>,
    pub file_count: u32,
    pub expires_at: i64,
}

/// Encrypt `files` under a fresh document key, upload them with a
/// manifest, register the manifest as a document, and grant each of
/// `grantees` access to it
///
/// Grants are submitted one at a time after the document exists. A failed
/// grant ends the flow; the document and earlier grants stay on the ledger.
pub async fn register_files<F>(
    ctx: &ShareContext,
    files: &[PlainFile],
    grantees: &[PublicKey],
    expiry_days: u32,
    now: i64,
    status: &mut F,
) -> Result<Registered, ShareError>
where
    F: FnMut(Status) + Send + ?Sized,
{
    if files.is_empty() {
        return Err(ShareError::NoFiles);
    }
    let file_count =
        u32::try_from(files.len()).map_err(|_| ShareError::TooManyFiles(files.len()))?;
    let expires_at = expiry_after_days(now, expiry_days)?;

    let result = async {
        status(Status::DerivingKey);
        let wallet = ctx.program.wallet();
        // a fresh salt gives every upload its own key
        let salt = Salt::generate()?;
        let secret = wallet.derive_secret(KeyPurpose::Document, Some(&salt));

        status(Status::Encrypting);
        let encrypted = files
            .iter()
            .map(|file| encrypt_file(file, &secret))
            .collect::<Result<Vec<_>, _>>()?;
        let owner = wallet.public_key();
        let keys = wrap_keys(&secret, std::iter::once(&owner).chain(grantees))?;

        status(Status::Uploading);
        let manifest = Manifest::new(keys).with_salt(salt);
        let manifest_cid = upload_batch(ctx.store(), &encrypted, manifest).await?;

        status(Status::RegisteringDocument);
        let document = ctx
            .program
            .register_document(&manifest_cid.to_string(), expires_at)
            .await?;

        let mut grants = Vec::with_capacity(grantees.len());
        for grantee in grantees {
            let grantee = Address::from(*grantee);
            status(Status::GrantingAccess(grantee));
            grants.push(ctx.program.grant_access(&document, &grantee).await?);
        }

        Ok::<_, ShareError>(Registered {
            document,
            manifest_cid,
            grants,
            file_count,
            expires_at,
        })
    }
    .await;

    match result {
        Ok(registered) => {
            status(Status::Registered {
                file_count,
                document: registered.document,
            });
            Ok(registered)
        }
        Err(err) => {
            tracing::error!(error = %err, "document registration failed");
            status(Status::Failed("Error uploading files"));
            Err(err)
        }
    }
}
