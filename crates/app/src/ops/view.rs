use std::path::PathBuf;

use clap::Args;

use common::ledger::{Address, AddressError};
use common::share::{open_share, ShareError};

use super::{now, output_path, print_status};

/// Decrypt a document or batch share shared with this wallet
#[derive(Args, Debug, Clone)]
pub struct View {
    /// Address of the document or batch share
    pub address: String,

    /// Directory the decrypted files are written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Record this access on the ledger (documents only)
    #[arg(long)]
    pub log_access: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
    #[error(transparent)]
    Connect(#[from] crate::clients::ConnectError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for View {
    type Error = ViewError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let address: Address = self.address.parse()?;
        let share = ctx.connect()?;

        let mut status = print_status;
        let opened = open_share(&share, &address, now(), self.log_access, &mut status).await?;

        tokio::fs::create_dir_all(&self.out)
            .await
            .map_err(|e| ViewError::Write(self.out.clone(), e))?;

        let mut output = format!("{} {} (owner {})", opened.kind, address, opened.owner);
        for (index, file) in opened.files.iter().enumerate() {
            let path = output_path(&self.out, &file.name, index);
            tokio::fs::write(&path, &file.data)
                .await
                .map_err(|e| ViewError::Write(path.clone(), e))?;
            tracing::info!(path = %path.display(), bytes = file.data.len(), "wrote file");
            output.push_str(&format!(
                "\n - {} ({}, {} bytes)",
                path.display(),
                file.mime_type,
                file.data.len()
            ));
        }

        Ok(output)
    }
}
