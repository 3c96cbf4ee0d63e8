//! Key-based reconciliation of two environment snapshots
//!
//! Presence decides first; for records on both sides the list timestamp is a
//! shallow oracle, and only a timestamp mismatch pays for two detail fetches.
//! Files carry no timestamp, so both-present files are always diffed from
//! their list records.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::application::detail_differ;
use crate::domain::comparison::{ComparisonRecord, MISSING_IN_PRODUCTION, MISSING_IN_STAGING, summarize};
use crate::domain::entities::{BasicEntity, DetailedEntity, DetailedFile, EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::errors::{RemoteError, SyncEngineError};
use crate::domain::events::ProgressReporter;
use crate::domain::reports::{KeyFailure, ProgressUpdate};
use crate::domain::repositories::RemoteEntityClient;
use crate::utils::now_rfc3339;

/// Per-environment key index, alive for one compare run
pub type EnvironmentIndex = BTreeMap<EntityKey, BasicEntity>;

/// Index a snapshot by key; a repeated key keeps its first record
pub fn build_index(environment: Environment, entities: Vec<BasicEntity>) -> EnvironmentIndex {
    let mut index = EnvironmentIndex::new();
    for entity in entities {
        if index.contains_key(&entity.key) {
            warn!(environment = %environment, key = %entity.key, "Duplicate key in list, keeping first");
            continue;
        }
        index.insert(entity.key.clone(), entity);
    }
    index
}

#[derive(Debug, Default)]
pub struct ComparisonOutcome {
    /// One record per key of the union, ascending by key, except failed keys
    pub records: Vec<ComparisonRecord>,
    pub failures: Vec<KeyFailure>,
}

pub struct Comparator {
    client: Arc<dyn RemoteEntityClient>,
    detail_concurrency: usize,
}

/// A key present on both sides whose timestamps disagree
struct DeepPair {
    key: EntityKey,
    production: BasicEntity,
    staging: BasicEntity,
}

impl Comparator {
    pub fn new(client: Arc<dyn RemoteEntityClient>, detail_concurrency: usize) -> Self {
        Self {
            client,
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    pub async fn compare(
        &self,
        kind: EntityKind,
        production: EnvironmentIndex,
        staging: EnvironmentIndex,
        reporter: &dyn ProgressReporter,
    ) -> ComparisonOutcome {
        let keys: BTreeSet<&EntityKey> = production.keys().chain(staging.keys()).collect();
        let total = keys.len();
        let done = AtomicUsize::new(0);
        let tick = || {
            let current = done.fetch_add(1, Ordering::SeqCst) + 1;
            reporter.report(ProgressUpdate::Compare { kind, current, total });
        };

        let mut outcome = ComparisonOutcome::default();
        let mut deep = Vec::new();

        for key in keys {
            match (production.get(key), staging.get(key)) {
                (Some(p), None) => {
                    outcome.records.push(missing_record(p, Environment::Production));
                    tick();
                }
                (None, Some(s)) => {
                    outcome.records.push(missing_record(s, Environment::Staging));
                    tick();
                }
                (Some(p), Some(s)) if kind == EntityKind::File => {
                    let differences =
                        detail_differ::diff_files(&DetailedFile::from_basic(p), &DetailedFile::from_basic(s));
                    outcome.records.push(paired_record(p, s, &differences, now_rfc3339()));
                    tick();
                }
                (Some(p), Some(s)) if p.updated_at == s.updated_at => {
                    outcome.records.push(paired_record(p, s, &[], p.updated_at.clone().unwrap_or_default()));
                    tick();
                }
                (Some(p), Some(s)) => deep.push(DeepPair {
                    key: key.clone(),
                    production: p.clone(),
                    staging: s.clone(),
                }),
                (None, None) => {}
            }
        }

        debug!(kind = %kind, total, deep = deep.len(), "Shallow pass complete");

        let results: Vec<_> = stream::iter(deep)
            .map(|pair| async move {
                let result = self.deep_compare(kind, &pair).await;
                (pair, result)
            })
            .buffer_unordered(self.detail_concurrency)
            .inspect(|_| tick())
            .collect()
            .await;

        for (pair, result) in results {
            match result {
                Ok(differences) => {
                    let updated_at = pair.production.updated_at.clone().unwrap_or_default();
                    outcome
                        .records
                        .push(paired_record(&pair.production, &pair.staging, &differences, updated_at));
                }
                Err(e) => {
                    warn!(kind = %kind, key = %pair.key, "Deep comparison failed: {}", e);
                    outcome.failures.push(KeyFailure::from_error(&pair.key, &e));
                }
            }
        }

        outcome.records.sort_by(|a, b| a.key.cmp(&b.key));
        outcome
    }

    async fn fetch_detail(
        &self,
        environment: Environment,
        kind: EntityKind,
        entity: &BasicEntity,
    ) -> Result<DetailedEntity, SyncEngineError> {
        self.client
            .get_detail(environment, kind, &entity.id)
            .await
            .map_err(|source| SyncEngineError::DetailFetch {
                environment,
                key: entity.key.clone(),
                source,
            })
    }

    async fn deep_compare(&self, kind: EntityKind, pair: &DeepPair) -> Result<Vec<String>, SyncEngineError> {
        let (production, staging) = tokio::try_join!(
            self.fetch_detail(Environment::Production, kind, &pair.production),
            self.fetch_detail(Environment::Staging, kind, &pair.staging),
        )?;

        detail_differ::diff(&production, &staging).ok_or_else(|| SyncEngineError::DetailFetch {
            environment: Environment::Staging,
            key: pair.key.clone(),
            source: RemoteError::Other(format!("detail is not a {kind}")),
        })
    }
}

fn missing_record(entity: &BasicEntity, present_in: Environment) -> ComparisonRecord {
    let (production_id, staging_id, differences) = match present_in {
        Environment::Production => (Some(entity.id.clone()), None, MISSING_IN_STAGING),
        Environment::Staging => (None, Some(entity.id.clone()), MISSING_IN_PRODUCTION),
    };
    ComparisonRecord {
        key: entity.key.clone(),
        production_id,
        staging_id,
        title: entity.title.clone(),
        differences: differences.to_string(),
        updated_at: entity.updated_at.clone().unwrap_or_else(now_rfc3339),
        compared_at: String::new(),
        url: entity.url.clone(),
    }
}

fn paired_record(
    production: &BasicEntity,
    staging: &BasicEntity,
    differences: &[String],
    updated_at: String,
) -> ComparisonRecord {
    ComparisonRecord {
        key: production.key.clone(),
        production_id: Some(production.id.clone()),
        staging_id: Some(staging.id.clone()),
        title: production.title.clone(),
        differences: summarize(differences),
        updated_at,
        compared_at: String::new(),
        url: production.url.clone(),
    }
}
