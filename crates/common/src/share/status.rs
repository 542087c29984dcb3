use std::fmt;

use crate::ledger::Address;

/// Progress of a flow, rendered as the status line shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    DerivingKey,
    Encrypting,
    Uploading,
    CreatingShare,
    RegisteringDocument,
    GrantingAccess(Address),
    Shared { file_count: u32, recipient: Address },
    Registered { file_count: u32, document: Address },
    CheckingAccess,
    AccessDenied,
    FetchingMetadata,
    Downloading,
    Decrypting,
    Ready,
    /// Terminal failure; the string is the flow's generic failure message
    Failed(&'static str),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::DerivingKey => write!(f, "Deriving encryption key..."),
            Status::Encrypting => write!(f, "Encrypting files..."),
            Status::Uploading => write!(f, "Uploading encrypted files to IPFS..."),
            Status::CreatingShare => write!(f, "Creating batch share on-chain..."),
            Status::RegisteringDocument => write!(f, "Registering document on-chain..."),
            Status::GrantingAccess(grantee) => write!(f, "Granting access to {}...", grantee),
            Status::Shared {
                file_count,
                recipient,
            } => write!(
                f,
                "Uploaded {} file(s) and shared with {}.",
                file_count, recipient
            ),
            Status::Registered {
                file_count,
                document,
            } => write!(
                f,
                "Registered {} file(s) as document {}.",
                file_count, document
            ),
            Status::CheckingAccess => write!(f, "Checking access..."),
            Status::AccessDenied => write!(f, "Access denied"),
            Status::FetchingMetadata => write!(f, "Fetching metadata..."),
            Status::Downloading => write!(f, "Downloading encrypted files..."),
            Status::Decrypting => write!(f, "Decrypting files..."),
            Status::Ready => write!(f, "File ready to download"),
            Status::Failed(message) => write!(f, "{}", message),
        }
    }
}
