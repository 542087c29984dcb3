use common::ledger::LedgerError;
use common::store::StoreError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        match err {
            // the node refused the transaction (preflight, signature, program error)
            ClientError::Rpc { code, message } => {
                LedgerError::Rejected(format!("{}: {}", code, message))
            }
            other => LedgerError::Rpc(other.to_string()),
        }
    }
}

impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        StoreError::Upload(err.to_string())
    }
}
