//! Application state shared by the desktop shell and the headless runner
//!
//! Holds the loaded configuration, the database connection and the current
//! [`ComparisonService`]. Changing environment credentials rebuilds the
//! service so the next run talks to the new endpoints.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::comparison_service::{ComparisonService, EngineSettings};
use crate::domain::environment::Environment;
use crate::domain::repositories::{ComparisonStore, RemoteEntityClient};
use crate::infrastructure::comparison_repository::SqliteComparisonStore;
use crate::infrastructure::config::{AppConfig, ConfigManager, EnvironmentConfig};
use crate::infrastructure::database_connection::DatabaseConnection;
use crate::infrastructure::shopify_client::ShopifyClient;

pub struct AppState {
    config_manager: ConfigManager,

    /// Effective configuration (file plus environment overrides)
    config: Arc<RwLock<AppConfig>>,

    database: DatabaseConnection,

    service: Arc<RwLock<Arc<ComparisonService>>>,
}

impl AppState {
    /// Open the database, run migrations and build the service from `config`
    pub async fn initialize(config_manager: ConfigManager, config: AppConfig) -> Result<Self> {
        let database_url = config.database_url()?;
        let database = DatabaseConnection::new(&database_url).await?;
        database.migrate().await.context("Failed to migrate database")?;
        info!("Database ready at {}", database_url);

        let service = build_service(&config, &database)?;

        Ok(Self {
            config_manager,
            config: Arc::new(RwLock::new(config)),
            database,
            service: Arc::new(RwLock::new(Arc::new(service))),
        })
    }

    /// Service handle for one run; concurrent runs share it
    pub async fn service(&self) -> Arc<ComparisonService> {
        self.service.read().await.clone()
    }

    pub async fn config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Persist new credentials for one environment and rebuild the service
    pub async fn update_environment(&self, environment: Environment, settings: EnvironmentConfig) -> Result<AppConfig> {
        let mut updated = self.config_manager.update_environment(environment, settings).await?;
        updated.apply_env_overrides();

        let service = build_service(&updated, &self.database)?;
        *self.service.write().await = Arc::new(service);
        *self.config.write().await = updated.clone();

        info!("Settings for {} updated", environment);
        Ok(updated)
    }
}

fn build_service(config: &AppConfig, database: &DatabaseConnection) -> Result<ComparisonService> {
    let client: Arc<dyn RemoteEntityClient> = Arc::new(ShopifyClient::new(&config.environments, &config.http)?);
    let store: Arc<dyn ComparisonStore> = Arc::new(SqliteComparisonStore::new(database.pool().clone()));
    Ok(ComparisonService::new(client, store, EngineSettings::from(&config.sync)))
}
