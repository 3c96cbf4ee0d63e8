//! Error taxonomy of the comparison and sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::reports::SyncReport;

/// Transport or protocol failure talking to one environment's API
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response is missing '{0}'")]
    MissingData(String),

    #[error("No credentials configured for {0}")]
    NotConfigured(Environment),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt comparison row '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SyncEngineError {
    #[error("Failed to fetch {kind} list from {environment}: {source}")]
    Fetch {
        environment: Environment,
        kind: EntityKind,
        #[source]
        source: RemoteError,
    },

    #[error("Failed to fetch details of '{key}' from {environment}: {source}")]
    DetailFetch {
        environment: Environment,
        key: EntityKey,
        #[source]
        source: RemoteError,
    },

    #[error("'{key}' depends on records missing in the target: {}", .missing.join(", "))]
    DependencyUnresolved { key: EntityKey, missing: Vec<String> },

    #[error("'{key}' was rejected: {}", .messages.join("; "))]
    Validation { key: EntityKey, messages: Vec<String> },

    #[error("'{key}' not found in {environment}")]
    NotFound { key: EntityKey, environment: Environment },

    #[error("Mutation for '{key}' failed: {source}")]
    Mutation {
        key: EntityKey,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{}", .0.summary())]
    SyncIncomplete(SyncReport),
}

/// Coarse failure bucket shown next to a failed key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Fetch,
    DetailFetch,
    DependencyUnresolved,
    Validation,
    NotFound,
    Mutation,
    Store,
    Incomplete,
}

impl SyncEngineError {
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::Fetch { .. } => FailureCategory::Fetch,
            Self::DetailFetch { .. } => FailureCategory::DetailFetch,
            Self::DependencyUnresolved { .. } => FailureCategory::DependencyUnresolved,
            Self::Validation { .. } => FailureCategory::Validation,
            Self::NotFound { .. } => FailureCategory::NotFound,
            Self::Mutation { .. } => FailureCategory::Mutation,
            Self::Store(_) => FailureCategory::Store,
            Self::SyncIncomplete(_) => FailureCategory::Incomplete,
        }
    }
}

pub type EngineResult<T> = Result<T, SyncEngineError>;
