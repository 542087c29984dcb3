//! Network adapters for the two external services

mod error;
mod rpc;
mod web3_storage;

use std::sync::Arc;

use common::ledger::ProgramClient;
use common::share::ShareContext;
use common::wallet::Wallet;

use crate::state::{ClientConfig, StateError};

pub use error::ClientError;
pub use rpc::RpcLedger;
pub use web3_storage::Web3Storage;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Wire a wallet to the configured ledger and store
pub fn connect(config: &ClientConfig, wallet: Arc<dyn Wallet>) -> Result<ShareContext, ConnectError> {
    let ledger = RpcLedger::new(config.rpc_url.clone(), config.require_program_id()?)?;
    let store = Web3Storage::new(config)?;
    tracing::debug!(
        rpc = %config.rpc_url,
        program = %ledger.program_id(),
        "connected"
    );

    Ok(ShareContext::new(
        ProgramClient::new(Arc::new(ledger), wallet),
        Arc::new(store),
    ))
}
