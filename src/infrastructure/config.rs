//! Configuration infrastructure
//!
//! Contains configuration loading and management for the store sync engine.
//!
//! Configuration is organized into sections:
//! 1. Environment credentials (exposed in the settings screen)
//! 2. Engine tuning: pagination delay, sync chunking, detail concurrency
//! 3. HTTP client, database and logging settings (config file only)

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::environment::Environment;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-environment API credentials
    pub environments: EnvironmentsConfig,

    /// Compare and sync tuning
    pub sync: SyncConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentsConfig {
    pub production: EnvironmentConfig,
    pub staging: EnvironmentConfig,
}

impl EnvironmentsConfig {
    pub fn get(&self, environment: Environment) -> &EnvironmentConfig {
        match environment {
            Environment::Production => &self.production,
            Environment::Staging => &self.staging,
        }
    }

    pub fn get_mut(&mut self, environment: Environment) -> &mut EnvironmentConfig {
        match environment {
            Environment::Production => &mut self.production,
            Environment::Staging => &mut self.staging,
        }
    }

    /// Both sides need credentials before anything can be compared
    pub fn is_complete(&self) -> bool {
        self.production.is_configured() && self.staging.is_configured()
    }
}

/// Admin API endpoint and token of one store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Full GraphQL endpoint, e.g. `https://shop.myshopify.com/admin/api/2024-07/graphql.json`
    pub graphql_url: String,

    /// Admin API access token sent as `X-Shopify-Access-Token`
    pub access_token: String,
}

impl EnvironmentConfig {
    pub fn is_configured(&self) -> bool {
        !self.graphql_url.trim().is_empty() && !self.access_token.trim().is_empty()
    }

    /// Reject endpoints that are not absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(self.graphql_url.trim())
            .with_context(|| format!("Invalid GraphQL URL: {}", self.graphql_url))?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "GraphQL URL must use http or https: {}",
            self.graphql_url
        );
        anyhow::ensure!(!self.access_token.trim().is_empty(), "Access token is empty");
        Ok(())
    }
}

/// Compare and sync tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay between list pages in milliseconds
    pub page_delay_ms: u64,

    /// Keys synced concurrently per chunk
    pub chunk_size: usize,

    /// Deep comparisons in flight at once during compare
    pub detail_concurrency: usize,

    /// Send product media along with product syncs
    pub sync_product_images: bool,
}

impl SyncConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: defaults::PAGE_DELAY_MS,
            chunk_size: defaults::SYNC_CHUNK_SIZE,
            detail_concurrency: defaults::DETAIL_CONCURRENCY,
            sync_product_images: defaults::SYNC_PRODUCT_IMAGES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_seconds: u64,

    /// Per-environment request budget
    pub max_requests_per_second: u32,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL; empty means the default file under the data directory
    pub url: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// File rotation: "daily" or "never"
    pub rotation: String,

    /// Log directory; empty means `logs/` under the data directory
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            rotation: defaults::LOG_ROTATION.to_string(),
            directory: String::new(),
        }
    }
}

/// Environment variables that override stored credentials
pub mod env_vars {
    pub const PRODUCTION_URL: &str = "STORE_SYNC_PRODUCTION_URL";
    pub const PRODUCTION_TOKEN: &str = "STORE_SYNC_PRODUCTION_TOKEN";
    pub const STAGING_URL: &str = "STORE_SYNC_STAGING_URL";
    pub const STAGING_TOKEN: &str = "STORE_SYNC_STAGING_TOKEN";
}

impl AppConfig {
    /// Apply `STORE_SYNC_*` overrides from a variable lookup
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (Environment::Production, env_vars::PRODUCTION_URL, env_vars::PRODUCTION_TOKEN),
            (Environment::Staging, env_vars::STAGING_URL, env_vars::STAGING_TOKEN),
        ];
        for (environment, url_var, token_var) in overrides {
            let target = self.environments.get_mut(environment);
            if let Some(url) = lookup(url_var).filter(|v| !v.trim().is_empty()) {
                target.graphql_url = url;
            }
            if let Some(token) = lookup(token_var).filter(|v| !v.trim().is_empty()) {
                target.access_token = token;
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|name| std::env::var(name).ok());
    }

    /// Database URL, falling back to the default file under the data directory
    pub fn database_url(&self) -> Result<String> {
        if !self.database.url.trim().is_empty() {
            return Ok(self.database.url.clone());
        }
        let path = ConfigManager::get_app_data_dir()?.join("database").join(defaults::DATABASE_FILE);
        Ok(format!("sqlite:{}", path.display()))
    }

    pub fn log_directory(&self) -> Result<PathBuf> {
        if !self.logging.directory.trim().is_empty() {
            return Ok(PathBuf::from(&self.logging.directory));
        }
        Ok(ConfigManager::get_app_data_dir()?.join("logs"))
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(data_dir)
    }

    /// Configuration manager rooted at the per-user config directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_path(config_dir.join(defaults::CONFIG_FILE)))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the stored configuration and apply environment variable overrides
    pub async fn load_effective_config(&self) -> Result<AppConfig> {
        let mut config = self.load_config().await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("Configuration parse error: {}", parse_error);
                warn!("Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Replace the stored credentials of one environment
    pub async fn update_environment(&self, environment: Environment, settings: EnvironmentConfig) -> Result<AppConfig> {
        settings
            .validate()
            .with_context(|| format!("Rejected {} settings", environment))?;
        self.update_config(|config| *config.environments.get_mut(environment) = settings)
            .await
    }

    /// Update the stored configuration in place
    pub async fn update_config<F>(&self, updater: F) -> Result<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config);
        self.save_config(&config).await?;
        Ok(config)
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "store-sync";
    pub const CONFIG_FILE: &str = "store_sync_config.json";
    pub const DATABASE_FILE: &str = "store_sync.db";

    /// Matches the list pacing the Admin API tolerates without throttling
    pub const PAGE_DELAY_MS: u64 = 500;
    pub const SYNC_CHUNK_SIZE: usize = 2;
    pub const DETAIL_CONCURRENCY: usize = 1;
    pub const SYNC_PRODUCT_IMAGES: bool = false;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
    pub const USER_AGENT: &str = concat!("store-sync/", env!("CARGO_PKG_VERSION"));

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_ROTATION: &str = "daily";
}
