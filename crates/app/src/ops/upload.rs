use std::path::PathBuf;

use clap::Args;

use common::share::{share_files, ShareError};

use super::{format_timestamp, now, parse_wallet, print_status, read_files, ReadError};

/// Encrypt files and share them with one wallet
#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Files to encrypt and upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Recipient wallet address (base58)
    #[arg(long)]
    pub recipient: Option<String>,

    /// Days until the share expires
    #[arg(long, default_value_t = super::DEFAULT_EXPIRY_DAYS)]
    pub expiry_days: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("invalid recipient {0}")]
    InvalidRecipient(String),
    #[error(transparent)]
    Connect(#[from] crate::clients::ConnectError),
    #[error(transparent)]
    Share(#[from] ShareError),
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let recipient = self
            .recipient
            .as_deref()
            .map(parse_wallet)
            .transpose()
            .map_err(UploadError::InvalidRecipient)?;

        let files = read_files(&self.files).await?;
        let share = ctx.connect()?;

        let mut status = print_status;
        let shared = share_files(
            &share,
            &files,
            recipient.as_ref(),
            self.expiry_days,
            now(),
            &mut status,
        )
        .await?;

        Ok(format!(
            "Batch share: {}\n\
             - Recipient: {}\n\
             - Manifest: {}\n\
             - Expires: {}",
            shared.batch_share,
            shared.recipient,
            shared.manifest_cid,
            format_timestamp(shared.expires_at),
        ))
    }
}
