use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default remote backend address.
fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

/// Where accounts and portfolios are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON files under the data directory.
    #[default]
    Local,
    /// The remote portfolio API.
    Http,
}

/// Where quotes, price history, and strategies come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotesKind {
    /// Built-in deterministic market data.
    #[default]
    Fixture,
    /// The remote market data API.
    Http,
}

/// Sync behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Revert an optimistic change when the remote commit fails, instead of
    /// keeping it and reporting the failure.
    pub rollback_on_failure: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: false,
        }
    }
}

/// Default per-request timeout (30 seconds).
fn default_timeout_secs() -> u64 {
    30
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for backend and market data calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Persistence backend for accounts and portfolios.
    pub backend: BackendKind,

    /// Base URL of the remote portfolio API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Source of quotes, price history, and strategies.
    pub quotes: QuotesKind,

    /// Sync behaviour settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendKind::default(),
            api_base_url: default_api_base_url(),
            quotes: QuotesKind::default(),
            sync: SyncConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    /// Persistence backend for accounts and portfolios.
    pub backend: BackendKind,

    /// Base URL of the remote portfolio API.
    pub api_base_url: String,

    /// Source of quotes, price history, and strategies.
    pub quotes: QuotesKind,

    /// Sync behaviour settings.
    pub sync: SyncConfig,

    /// HTTP client settings.
    pub http: HttpConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./stockfolio.toml` if it exists in current directory
/// 2. `~/.local/share/stockfolio/stockfolio.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("stockfolio.toml");
    if local_config.exists() {
        return local_config;
    }

    // XDG data directory fallback
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("stockfolio").join("stockfolio.toml");
    }

    // Final fallback to local
    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        let data_dir = config.resolve_data_dir(config_dir);

        Ok(Self {
            data_dir,
            backend: config.backend,
            api_base_url: config.api_base_url,
            quotes: config.quotes,
            sync: config.sync,
            http: config.http,
        })
    }

    /// Load config, creating a default if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            // Resolve the config path relative to current directory
            let config_path = if config_path.is_relative() {
                std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(config_path)
            } else {
                config_path.to_path_buf()
            };

            // Use the intended config directory as data dir
            let config_dir = config_path
                .parent()
                .context("Config path has no parent directory")?;

            Ok(Self {
                data_dir: config_dir.to_path_buf(),
                backend: BackendKind::default(),
                api_base_url: default_api_base_url(),
                quotes: QuotesKind::default(),
                sync: SyncConfig::default(),
                http: HttpConfig::default(),
            })
        }
    }
}
