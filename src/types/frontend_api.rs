//! Types exchanged with the desktop frontend
//!
//! Exported to TypeScript with ts-rs (see `src/bin/ts_export.rs`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::comparison::{ComparisonRecord, RecordStatus};
use crate::domain::environment::Environment;
use crate::infrastructure::config::{AppConfig, EnvironmentConfig};

/// One table row: the stored record plus its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ComparisonRow {
    pub key: String,
    pub production_id: Option<String>,
    pub staging_id: Option<String>,
    pub title: String,
    pub differences: String,
    pub tags: Vec<String>,
    pub status: RecordStatus,
    pub updated_at: String,
    pub compared_at: String,
    pub url: Option<String>,
}

impl From<ComparisonRecord> for ComparisonRow {
    fn from(record: ComparisonRecord) -> Self {
        let status = record.status();
        let tags = if record.is_in_sync() {
            Vec::new()
        } else {
            record.difference_tags().into_iter().map(str::to_string).collect()
        };
        Self {
            key: record.key,
            production_id: record.production_id,
            staging_id: record.staging_id,
            title: record.title,
            differences: record.differences,
            tags,
            status,
            updated_at: record.updated_at,
            compared_at: record.compared_at,
            url: record.url,
        }
    }
}

/// Settings screen view of one environment; the token never leaves the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct EnvironmentSettingsView {
    pub environment: Environment,
    pub graphql_url: String,
    pub has_access_token: bool,
    pub configured: bool,
}

impl EnvironmentSettingsView {
    pub fn from_config(environment: Environment, config: &AppConfig) -> Self {
        let settings = config.environments.get(environment);
        Self {
            environment,
            graphql_url: settings.graphql_url.clone(),
            has_access_token: !settings.access_token.trim().is_empty(),
            configured: settings.is_configured(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct EnvironmentSettingsUpdate {
    pub graphql_url: String,
    pub access_token: String,
}

impl From<EnvironmentSettingsUpdate> for EnvironmentConfig {
    fn from(update: EnvironmentSettingsUpdate) -> Self {
        Self {
            graphql_url: update.graphql_url.trim().to_string(),
            access_token: update.access_token.trim().to_string(),
        }
    }
}
