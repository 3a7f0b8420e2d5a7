use std::{fs, path::PathBuf};

use common::crypto::OwnerSecretKey;
use common::document::KeyProtection;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "ledgerdoc";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base url share links are rendered against
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether new revisions wrap their keys for the owner
    #[serde(default)]
    pub key_protection: KeyProtection,
}

fn default_share_base_url() -> String {
    "https://ledgerdoc.local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            share_base_url: default_share_base_url(),
            log_level: default_log_level(),
            key_protection: KeyProtection::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.ledgerdoc)
    pub ledgerdoc_dir: PathBuf,
    /// Path to the SQLite ledger
    pub db_path: PathBuf,
    /// Path to the owner key PEM file
    pub key_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppConfig {
    pub fn share_base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.share_base_url)
    }
}

impl AppState {
    /// Get the state directory path (custom or default ~/.ledgerdoc)
    pub fn ledgerdoc_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh owner key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let ledgerdoc_dir = Self::ledgerdoc_dir(custom_path)?;

        if ledgerdoc_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&ledgerdoc_dir)?;

        let blobs_path = ledgerdoc_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let key = OwnerSecretKey::generate().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = ledgerdoc_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = ledgerdoc_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // sqlite treats an empty file as a fresh database; tables are created on connect
        let db_path = ledgerdoc_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            ledgerdoc_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let ledgerdoc_dir = Self::ledgerdoc_dir(custom_path)?;

        if !ledgerdoc_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = ledgerdoc_dir.join(DB_FILE_NAME);
        let key_path = ledgerdoc_dir.join(KEY_FILE_NAME);
        let blobs_path = ledgerdoc_dir.join(BLOBS_DIR_NAME);
        let config_path = ledgerdoc_dir.join(CONFIG_FILE_NAME);

        for (path, name) in [
            (&db_path, DB_FILE_NAME),
            (&key_path, KEY_FILE_NAME),
            (&blobs_path, "blobs/"),
            (&config_path, CONFIG_FILE_NAME),
        ] {
            if !path.exists() {
                return Err(StateError::MissingFile(name.to_string()));
            }
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            ledgerdoc_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the owner secret key from the key file
    pub fn load_key(&self) -> Result<OwnerSecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        OwnerSecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("ledgerdoc directory not initialized. Run 'ledgerdoc init' first")]
    NotInitialized,

    #[error("ledgerdoc directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
