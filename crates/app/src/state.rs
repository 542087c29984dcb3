use std::{fs, path::PathBuf};

use common::ledger::{Address, AddressError};
use common::prelude::SecretKey;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "solcipher";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

pub const NETWORK_ENV: &str = "SOLANA_NETWORK";
pub const PROGRAM_ID_ENV: &str = "PROGRAM_ID";
pub const STORAGE_TOKEN_ENV: &str = "WEB3_STORAGE_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cluster name (`devnet`, `testnet`, `mainnet-beta`) or an RPC URL
    #[serde(default = "default_network")]
    pub network: String,
    /// Base58 address of the sharing program
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_network() -> String {
    "devnet".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            program_id: None,
            storage: StorageConfig::default(),
        }
    }
}

/// Where encrypted blobs and manifests are pinned and read back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the pinning API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Gateway URL template; `{cid}` is replaced with the content identifier
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// API token for uploads
    #[serde(default)]
    pub token: Option<String>,
}

fn default_api_url() -> String {
    "https://api.web3.storage".to_string()
}

fn default_gateway_url() -> String {
    "https://{cid}.ipfs.w3s.link/encrypted-file".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            gateway_url: default_gateway_url(),
            token: None,
        }
    }
}

/// Environment overrides, read once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub network: Option<String>,
    pub program_id: Option<String>,
    pub storage_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name| std::env::var(name).ok().filter(|v: &String| !v.is_empty());
        Self {
            network: var(NETWORK_ENV),
            program_id: var(PROGRAM_ID_ENV),
            storage_token: var(STORAGE_TOKEN_ENV),
        }
    }
}

/// Fully resolved settings handed to the network adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub rpc_url: Url,
    pub program_id: Option<Address>,
    pub storage_api_url: Url,
    pub gateway_url: String,
    pub storage_token: Option<String>,
}

impl ClientConfig {
    /// Merge the config file with environment overrides; the environment wins
    pub fn resolve(config: &AppConfig, env: &EnvOverrides) -> Result<Self, StateError> {
        let network = env.network.as_deref().unwrap_or(&config.network);
        let program_id = env
            .program_id
            .as_deref()
            .or(config.program_id.as_deref())
            .map(str::parse::<Address>)
            .transpose()?;

        if !config.storage.gateway_url.contains("{cid}") {
            return Err(StateError::InvalidConfig(format!(
                "storage.gateway_url must contain {{cid}}: {}",
                config.storage.gateway_url
            )));
        }

        Ok(Self {
            rpc_url: rpc_url(network)?,
            program_id,
            storage_api_url: Url::parse(&config.storage.api_url)?,
            gateway_url: config.storage.gateway_url.clone(),
            storage_token: env
                .storage_token
                .clone()
                .or_else(|| config.storage.token.clone()),
        })
    }

    pub fn require_program_id(&self) -> Result<Address, StateError> {
        self.program_id.ok_or(StateError::MissingProgramId)
    }
}

/// RPC endpoint for a network: URLs verbatim, cluster names expanded
pub fn rpc_url(network: &str) -> Result<Url, StateError> {
    if network.starts_with("http") {
        return Ok(Url::parse(network)?);
    }
    Ok(Url::parse(&format!("https://api.{}.solana.com", network))?)
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the solcipher directory (~/.solcipher)
    pub solcipher_dir: PathBuf,
    /// Path to the wallet key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the solcipher directory path (custom or default ~/.solcipher)
    pub fn solcipher_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory, generating a wallet key unless one
    /// is given
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
        key: Option<SecretKey>,
    ) -> Result<Self, StateError> {
        let solcipher_dir = Self::solcipher_dir(custom_path)?;

        if solcipher_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&solcipher_dir)?;

        let key = key.unwrap_or_else(SecretKey::generate);
        let key_path = solcipher_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = solcipher_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            solcipher_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the solcipher directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let solcipher_dir = Self::solcipher_dir(custom_path)?;

        if !solcipher_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = solcipher_dir.join(KEY_FILE_NAME);
        let config_path = solcipher_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            solcipher_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the wallet's secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("solcipher directory not initialized. Run 'solcipher init' first")]
    NotInitialized,

    #[error("solcipher directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no program id configured. Set program_id in config.toml or {}", PROGRAM_ID_ENV)]
    MissingProgramId,

    #[error("invalid program id: {0}")]
    ProgramId(#[from] AddressError),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
