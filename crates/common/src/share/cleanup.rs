use crate::ledger::{AccessFilter, Address, LedgerError, ProgramClient};

/// What a cleanup run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub documents_scanned: usize,
    pub expired_documents: usize,
    /// Access records revoked during this run
    pub revoked: Vec<Address>,
    /// Live records on expired documents owned by another wallet
    pub skipped: Vec<Address>,
}

/// Revoke every live access record on documents that expired before `now`
///
/// Only the grant's owner may revoke it, so records owned by another wallet
/// are skipped and reported. Records already revoked are left alone, which
/// makes a second run a no-op. The first failed revocation ends the run;
/// revocations before it stand.
pub async fn revoke_expired(
    program: &ProgramClient,
    now: i64,
) -> Result<CleanupReport, LedgerError> {
    let me = program.address();
    let mut report = CleanupReport::default();

    let documents = program.documents().await?;
    report.documents_scanned = documents.len();

    for document in documents.iter().filter(|d| d.account.is_expired(now)) {
        report.expired_documents += 1;
        tracing::info!(
            document = %document.address,
            expires_at = document.account.expires_at,
            "document expired"
        );

        let grants = program
            .access_records(AccessFilter::Document(document.address))
            .await?;
        for grant in grants.into_iter().filter(|g| !g.account.revoked) {
            if grant.account.owner != me {
                tracing::warn!(
                    access = %grant.address,
                    owner = %grant.account.owner,
                    "skipping access record owned by another wallet"
                );
                report.skipped.push(grant.address);
                continue;
            }

            let signature = program.revoke_access(&grant.address).await?;
            tracing::info!(
                access = %grant.address,
                grantee = %grant.account.grantee,
                %signature,
                "revoked access"
            );
            report.revoked.push(grant.address);
        }
    }

    Ok(report)
}
