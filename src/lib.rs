//! Store Sync - production/staging comparison and synchronization for Shopify stores
//!
//! Compares collections, products, pages and files between two stores and
//! pushes selected records one way. Runs headless from the command line or,
//! with the `desktop` feature, as a Tauri application.

// Module declarations
pub mod application;
pub mod domain;
pub mod headless;
pub mod infrastructure;
pub mod types;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use anyhow::{Context, Result};

    use crate::application::state::AppState;
    use crate::commands::{
        clear_comparisons, compare_entities, get_comparison, get_comparisons, get_environment_settings,
        sync_entities, update_environment_settings,
    };
    use crate::infrastructure::config::ConfigManager;
    use crate::infrastructure::logging::init_logging_with_config;

    pub fn run() -> Result<()> {
        let state = tauri::async_runtime::block_on(async {
            let config_manager = ConfigManager::new()?;
            let config = config_manager.load_effective_config().await?;
            init_logging_with_config(&config.logging, &config.log_directory()?)?;
            AppState::initialize(config_manager, config).await
        })?;

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .manage(state)
            .invoke_handler(tauri::generate_handler![
                compare_entities,
                sync_entities,
                get_comparisons,
                get_comparison,
                clear_comparisons,
                get_environment_settings,
                update_environment_settings
            ])
            .run(tauri::generate_context!())
            .context("error while running tauri application")
    }
}
