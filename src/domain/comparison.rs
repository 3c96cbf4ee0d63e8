//! Comparison records and difference tags

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::entities::EntityKey;
use crate::domain::environment::Environment;

pub const IN_SYNC: &str = "In sync";
pub const MISSING_IN_PRODUCTION: &str = "Missing in production";
pub const MISSING_IN_STAGING: &str = "Missing in staging";

/// Difference tags reported by the detail differ
pub mod tags {
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const HTML_DESCRIPTION: &str = "HTML description";
    pub const SORT_ORDER: &str = "Sort order";
    pub const TEMPLATE_SUFFIX: &str = "Template suffix";
    pub const IMAGE_ALT_TEXT: &str = "Image alt text";
    pub const SEO_TITLE: &str = "SEO title";
    pub const SEO_DESCRIPTION: &str = "SEO description";
    pub const STATUS: &str = "Status";
    pub const VENDOR: &str = "Vendor";
    pub const PRODUCT_TYPE: &str = "Product type";
    pub const TAGS: &str = "Tags";
    pub const BODY: &str = "Body";
    pub const PUBLISHED_STATUS: &str = "Published status";
    pub const METAFIELDS_COUNT: &str = "Metafields count";
    pub const METAFIELDS_CONTENT: &str = "Metafields content";
    pub const FILE_NAME: &str = "File name";
    pub const ALT_TEXT: &str = "Alt text";
}

/// Join a differ result into the persisted summary; empty means in sync
#[must_use]
pub fn summarize(differences: &[String]) -> String {
    if differences.is_empty() {
        IN_SYNC.to_string()
    } else {
        differences.join(", ")
    }
}

/// Latest cross-environment state of one logical record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ComparisonRecord {
    pub key: EntityKey,
    pub production_id: Option<String>,
    pub staging_id: Option<String>,
    pub title: String,
    pub differences: String,
    pub updated_at: String,
    pub compared_at: String,
    /// Preview URL, files only
    pub url: Option<String>,
}

/// Filter buckets offered to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    MissingInProduction,
    MissingInStaging,
    HasDifferences,
    InSync,
}

impl ComparisonRecord {
    #[must_use]
    pub fn id_for(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Production => self.production_id.as_deref(),
            Environment::Staging => self.staging_id.as_deref(),
        }
    }

    pub fn set_id_for(&mut self, environment: Environment, id: String) {
        match environment {
            Environment::Production => self.production_id = Some(id),
            Environment::Staging => self.staging_id = Some(id),
        }
    }

    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.differences == IN_SYNC
    }

    #[must_use]
    pub fn difference_tags(&self) -> Vec<&str> {
        self.differences
            .split(", ")
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    #[must_use]
    pub fn status(&self) -> RecordStatus {
        if self.production_id.is_none() {
            RecordStatus::MissingInProduction
        } else if self.staging_id.is_none() {
            RecordStatus::MissingInStaging
        } else if self.is_in_sync() {
            RecordStatus::InSync
        } else {
            RecordStatus::HasDifferences
        }
    }

    /// The post-sync state: both sides now hold the source content
    pub fn mark_synced(&mut self, target: Environment, created_id: Option<String>) {
        if let Some(id) = created_id {
            self.set_id_for(target, id);
        }
        self.differences = IN_SYNC.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(production: Option<&str>, staging: Option<&str>, differences: &str) -> ComparisonRecord {
        ComparisonRecord {
            key: "summer".into(),
            production_id: production.map(str::to_string),
            staging_id: staging.map(str::to_string),
            title: "Summer".into(),
            differences: differences.into(),
            updated_at: "2024-05-01T10:00:00Z".into(),
            compared_at: String::new(),
            url: None,
        }
    }

    #[test]
    fn summarize_falls_back_to_in_sync() {
        assert_eq!(summarize(&[]), IN_SYNC);
        assert_eq!(summarize(&["Title".into(), "Tags".into()]), "Title, Tags");
    }

    #[test]
    fn status_follows_ids_then_differences() {
        assert_eq!(record(None, Some("s"), MISSING_IN_PRODUCTION).status(), RecordStatus::MissingInProduction);
        assert_eq!(record(Some("p"), None, MISSING_IN_STAGING).status(), RecordStatus::MissingInStaging);
        assert_eq!(record(Some("p"), Some("s"), "Title, Tags").status(), RecordStatus::HasDifferences);
        assert_eq!(record(Some("p"), Some("s"), IN_SYNC).status(), RecordStatus::InSync);
    }

    #[test]
    fn mark_synced_records_created_target_id() {
        let mut rec = record(Some("p"), None, MISSING_IN_STAGING);
        rec.mark_synced(Environment::Staging, Some("s-new".into()));
        assert_eq!(rec.id_for(Environment::Staging), Some("s-new"));
        assert!(rec.is_in_sync());
        assert_eq!(rec.difference_tags(), vec![IN_SYNC]);
    }
}
