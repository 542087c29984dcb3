use clap::Args;

use common::ledger::LedgerError;
use common::share::{revoke_expired, Status};

use super::{now, print_status};

/// Revoke access records on expired documents owned by this wallet
#[derive(Args, Debug, Clone)]
pub struct Cleanup;

#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error(transparent)]
    Connect(#[from] crate::clients::ConnectError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[async_trait::async_trait]
impl crate::op::Op for Cleanup {
    type Error = CleanupError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let share = ctx.connect()?;

        let report = match revoke_expired(&share.program, now()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "cleanup failed");
                print_status(Status::Failed("Error running cleanup"));
                return Err(e.into());
            }
        };

        let mut output = format!(
            "Scanned {} document(s), {} expired\n\
             - Revoked: {}\n\
             - Skipped (not owner): {}",
            report.documents_scanned,
            report.expired_documents,
            report.revoked.len(),
            report.skipped.len(),
        );
        for grant in &report.revoked {
            output.push_str(&format!("\n - revoked {}", grant));
        }
        for grant in &report.skipped {
            output.push_str(&format!("\n - skipped {}", grant));
        }

        Ok(output)
    }
}
