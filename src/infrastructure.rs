//! Infrastructure layer: configuration, logging, persistence and the Admin API client

pub mod comparison_repository;
pub mod config;
pub mod database_connection;
pub mod graphql;
pub mod logging;
pub mod memory_store;
pub mod shopify_client;

pub use comparison_repository::SqliteComparisonStore;
pub use config::{AppConfig, ConfigManager, EnvironmentConfig, LoggingConfig};
pub use database_connection::DatabaseConnection;
pub use memory_store::InMemoryComparisonStore;
pub use shopify_client::ShopifyClient;
