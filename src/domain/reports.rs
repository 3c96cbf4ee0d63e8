//! Outcomes of compare and sync runs, and the progress updates they emit

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::comparison::{ComparisonRecord, RecordStatus};
use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::errors::{FailureCategory, SyncEngineError};

/// A key whose compare or sync step failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct KeyFailure {
    pub key: EntityKey,
    pub category: FailureCategory,
    pub message: String,
}

impl KeyFailure {
    pub fn from_error(key: &str, error: &SyncEngineError) -> Self {
        Self {
            key: key.to_string(),
            category: error.category(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CompareReport {
    pub total: usize,
    pub in_sync: usize,
    pub with_differences: usize,
    pub missing_in_production: usize,
    pub missing_in_staging: usize,
    pub pruned: usize,
    /// Keys whose deep comparison failed; their previous record was kept
    pub failures: Vec<KeyFailure>,
}

impl CompareReport {
    pub fn tally(&mut self, record: &ComparisonRecord) {
        match record.status() {
            RecordStatus::InSync => self.in_sync += 1,
            RecordStatus::HasDifferences => self.with_differences += 1,
            RecordStatus::MissingInProduction => self.missing_in_production += 1,
            RecordStatus::MissingInStaging => self.missing_in_staging += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct SyncReport {
    pub kind: EntityKind,
    pub target: Environment,
    pub total: usize,
    pub synced: Vec<EntityKey>,
    pub failed: Vec<KeyFailure>,
}

impl SyncReport {
    #[must_use]
    pub const fn new(kind: EntityKind, target: Environment, total: usize) -> Self {
        Self {
            kind,
            target,
            total,
            synced: Vec::new(),
            failed: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// "N of M synced, K failed: detail"
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} of {} {} synced to {}",
            self.synced.len(),
            self.total,
            self.kind.plural(),
            self.target
        );
        if !self.failed.is_empty() {
            let detail = self
                .failed
                .iter()
                .map(|failure| failure.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            text.push_str(&format!(", {} failed: {detail}", self.failed.len()));
        }
        text
    }
}

/// Granular progress pushed to the caller while a run is in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressUpdate {
    Compare {
        kind: EntityKind,
        current: usize,
        total: usize,
    },
    Sync {
        kind: EntityKind,
        target: Environment,
        current: usize,
        total: usize,
    },
    KeySynced {
        kind: EntityKind,
        record: ComparisonRecord,
    },
}
