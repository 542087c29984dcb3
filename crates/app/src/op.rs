use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use common::share::ShareContext;
use common::wallet::LocalWallet;

use crate::clients::{self, ConnectError};
use crate::state::{AppState, ClientConfig, EnvOverrides, StateError};

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom state directory (defaults to ~/.solcipher)
    pub config_path: Option<PathBuf>,
    /// Environment overrides captured at startup
    pub env: EnvOverrides,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, env: EnvOverrides) -> Self {
        Self { config_path, env }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    pub fn wallet(&self) -> Result<LocalWallet, StateError> {
        Ok(LocalWallet::new(self.state()?.load_key()?))
    }

    /// Load state and wire the wallet to the ledger and store
    pub fn connect(&self) -> Result<ShareContext, ConnectError> {
        let state = self.state()?;
        let wallet = LocalWallet::new(state.load_key()?);
        let config = ClientConfig::resolve(&state.config, &self.env)?;
        clients::connect(&config, Arc::new(wallet))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
