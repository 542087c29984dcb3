use std::path::PathBuf;

use clap::Args;

use common::crypto::PublicKey;
use common::share::{register_files, ShareError};

use super::{format_timestamp, now, parse_wallet, print_status, read_files, ReadError};

/// Encrypt files, register them as a document and grant wallets access
#[derive(Args, Debug, Clone)]
pub struct Register {
    /// Files to encrypt and upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Wallet to grant access (repeatable)
    #[arg(long = "grantee")]
    pub grantees: Vec<String>,

    /// Days until the document expires
    #[arg(long, default_value_t = super::DEFAULT_EXPIRY_DAYS)]
    pub expiry_days: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("invalid grantee {0}")]
    InvalidGrantee(String),
    #[error(transparent)]
    Connect(#[from] crate::clients::ConnectError),
    #[error(transparent)]
    Share(#[from] ShareError),
}

#[async_trait::async_trait]
impl crate::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let grantees = self
            .grantees
            .iter()
            .map(|raw| parse_wallet(raw))
            .collect::<Result<Vec<PublicKey>, _>>()
            .map_err(RegisterError::InvalidGrantee)?;

        let files = read_files(&self.files).await?;
        let share = ctx.connect()?;

        let mut status = print_status;
        let registered = register_files(
            &share,
            &files,
            &grantees,
            self.expiry_days,
            now(),
            &mut status,
        )
        .await?;

        let mut output = format!(
            "Document: {}\n\
             - Manifest: {}\n\
             - Files: {}\n\
             - Expires: {}",
            registered.document,
            registered.manifest_cid,
            registered.file_count,
            format_timestamp(registered.expires_at),
        );
        for (grantee, grant) in grantees.iter().zip(&registered.grants) {
            output.push_str(&format!("\n - Access for {}: {}", grantee, grant));
        }

        Ok(output)
    }
}
