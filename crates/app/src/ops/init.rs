use std::path::PathBuf;

use clap::Args;

use common::crypto::SecretKey;
use common::ledger::Address;

use crate::state::{AppConfig, AppState, StorageConfig};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Cluster name or RPC URL (default: devnet)
    #[arg(long)]
    pub network: Option<String>,

    /// Base58 address of the sharing program
    #[arg(long)]
    pub program_id: Option<String>,

    /// API token for the storage service
    #[arg(long)]
    pub storage_token: Option<String>,

    /// Import an existing wallet key (PEM) instead of generating one
    #[arg(long)]
    pub import_key: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("invalid program id: {0}")]
    ProgramId(#[from] common::ledger::AddressError),
    #[error("failed to read key {0}: {1}")]
    ReadKey(PathBuf, std::io::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if let Some(program_id) = &self.program_id {
            program_id.parse::<Address>()?;
        }

        let key = match &self.import_key {
            Some(path) => {
                let pem = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| InitError::ReadKey(path.clone(), e))?;
                Some(SecretKey::from_pem(&pem).map_err(|e| InitError::InvalidKey(e.to_string()))?)
            }
            None => None,
        };

        let defaults = AppConfig::default();
        let config = AppConfig {
            network: self.network.clone().unwrap_or(defaults.network),
            program_id: self.program_id.clone(),
            storage: StorageConfig {
                token: self.storage_token.clone(),
                ..defaults.storage
            },
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config), key)?;
        let wallet = state.load_key()?.public();

        let output = format!(
            "Initialized solcipher directory at: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - Wallet address: {}\n\
             - Network: {}\n\
             - Program: {}",
            state.solcipher_dir.display(),
            state.key_path.display(),
            state.config_path.display(),
            wallet,
            state.config.network,
            state
                .config
                .program_id
                .as_deref()
                .unwrap_or("not set (set program_id in config.toml)"),
        );

        Ok(output)
    }
}
