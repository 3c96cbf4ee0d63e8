//! One-way push of selected records into the target environment
//!
//! Keys run in fixed-size chunks: items inside a chunk run concurrently,
//! chunks run one after another. A failing key never stops its neighbours;
//! the caller receives the full report.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::sync_payload;
use crate::domain::comparison::ComparisonRecord;
use crate::domain::entities::{DetailedCollection, DetailedEntity, EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::errors::{EngineResult, RemoteError, SyncEngineError};
use crate::domain::events::ProgressReporter;
use crate::domain::mutations::{EntityInput, Mutation, MutationOutcome, ProductOptionInput};
use crate::domain::reports::{KeyFailure, ProgressUpdate, SyncReport};
use crate::domain::repositories::{ComparisonStore, RemoteEntityClient};
use crate::utils::dedup_preserving_order;

#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub chunk_size: usize,
    pub sync_product_images: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            chunk_size: 2,
            sync_product_images: false,
        }
    }
}

pub struct SyncOrchestrator {
    client: Arc<dyn RemoteEntityClient>,
    store: Arc<dyn ComparisonStore>,
    settings: SyncSettings,
}

impl SyncOrchestrator {
    pub fn new(client: Arc<dyn RemoteEntityClient>, store: Arc<dyn ComparisonStore>, settings: SyncSettings) -> Self {
        Self { client, store, settings }
    }

    /// Push `keys` of `kind` from `target.opposite()` into `target`
    pub async fn sync(
        &self,
        kind: EntityKind,
        keys: &[EntityKey],
        target: Environment,
        reporter: &dyn ProgressReporter,
    ) -> EngineResult<SyncReport> {
        let keys = dedup_preserving_order(keys.iter().cloned());
        let total = keys.len();
        let chunk_size = self.settings.chunk_size.max(1);
        let mut report = SyncReport::new(kind, target, total);

        info!(kind = %kind, target = %target, total, chunk_size, "Sync started");

        for (index, chunk) in keys.chunks(chunk_size).enumerate() {
            let results = join_all(chunk.iter().map(|key| self.sync_key(kind, key, target))).await;

            for (key, result) in chunk.iter().zip(results) {
                match result {
                    Ok(record) => {
                        debug!(kind = %kind, key = %key, "Synced");
                        report.synced.push(key.clone());
                        reporter.report(ProgressUpdate::KeySynced { kind, record });
                    }
                    Err(e) => {
                        warn!(kind = %kind, key = %key, "Sync failed: {}", e);
                        report.failed.push(KeyFailure::from_error(key, &e));
                    }
                }
            }

            let current = ((index + 1) * chunk_size).min(total);
            reporter.report(ProgressUpdate::Sync {
                kind,
                target,
                current,
                total,
            });
        }

        info!("{}", report.summary());
        if report.is_complete() {
            Ok(report)
        } else {
            Err(SyncEngineError::SyncIncomplete(report))
        }
    }

    async fn sync_key(&self, kind: EntityKind, key: &str, target: Environment) -> EngineResult<ComparisonRecord> {
        let source = target.opposite();
        let not_found = || SyncEngineError::NotFound {
            key: key.to_string(),
            environment: source,
        };

        let mut record = self.store.get_by_key(kind, key).await?.ok_or_else(not_found)?;
        let source_id = record.id_for(source).ok_or_else(not_found)?.to_string();
        let target_id = record.id_for(target).map(str::to_string);

        let detail = self
            .client
            .get_detail(source, kind, &source_id)
            .await
            .map_err(|source_error| SyncEngineError::DetailFetch {
                environment: source,
                key: key.to_string(),
                source: source_error,
            })?;

        let created_id = match detail {
            DetailedEntity::Collection(collection) => {
                self.sync_collection(key, &collection, target, target_id.as_deref()).await?
            }
            DetailedEntity::Product(product) => {
                let input =
                    sync_payload::product_input(&product, target_id.is_none(), self.settings.sync_product_images);
                let created = self.upsert_remote(key, target, target_id.as_deref(), EntityInput::Product(input)).await?;
                if let Some(product_id) = target_id.as_deref() {
                    self.push_product_options(key, target, product_id, sync_payload::product_options(&product))
                        .await?;
                }
                created
            }
            DetailedEntity::Page(page) => {
                let input = sync_payload::page_input(&page);
                self.upsert_remote(key, target, target_id.as_deref(), EntityInput::Page(input)).await?
            }
            DetailedEntity::File(file) => {
                let input = sync_payload::file_input(&file, record.url.as_deref(), key);
                let outcome = self.mutate(key, target, Mutation::Create(EntityInput::File(input))).await?;
                Some(created_id(key, outcome)?)
            }
        };

        record.mark_synced(target, created_id);
        Ok(self.store.upsert(kind, record).await?)
    }

    /// Create when the target has no id yet, otherwise update; returns the created id
    async fn upsert_remote(
        &self,
        key: &str,
        target: Environment,
        target_id: Option<&str>,
        input: EntityInput,
    ) -> EngineResult<Option<String>> {
        match target_id {
            Some(id) => {
                let mutation = Mutation::Update {
                    id: id.to_string(),
                    input,
                };
                self.mutate(key, target, mutation).await?;
                Ok(None)
            }
            None => {
                let outcome = self.mutate(key, target, Mutation::Create(input)).await?;
                Ok(Some(created_id(key, outcome)?))
            }
        }
    }

    /// Run a mutation; `userErrors` become a validation failure carrying every message
    async fn mutate(&self, key: &str, target: Environment, mutation: Mutation) -> EngineResult<MutationOutcome> {
        let operation = mutation.operation();
        let outcome = self
            .client
            .mutate(target, mutation)
            .await
            .map_err(|source| SyncEngineError::Mutation {
                key: key.to_string(),
                source,
            })?;

        if outcome.is_rejected() {
            return Err(SyncEngineError::Validation {
                key: key.to_string(),
                messages: outcome.messages(),
            });
        }
        debug!(key = %key, target = %target, operation, "Mutation applied");
        Ok(outcome)
    }

    /// Map member product handles to target-side ids; any miss fails the whole key
    async fn resolve_members(
        &self,
        key: &str,
        collection: &DetailedCollection,
        target: Environment,
    ) -> EngineResult<Vec<String>> {
        let handles = collection.member_handles();
        let lookups = join_all(handles.iter().map(|handle| self.store.get_by_key(EntityKind::Product, handle))).await;

        let mut resolved = Vec::with_capacity(handles.len());
        let mut missing = Vec::new();
        for (handle, lookup) in handles.iter().zip(lookups) {
            match lookup?.as_ref().and_then(|product| product.id_for(target)) {
                Some(id) => resolved.push(id.to_string()),
                None => missing.push(handle.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(SyncEngineError::DependencyUnresolved {
                key: key.to_string(),
                missing,
            });
        }
        Ok(resolved)
    }

    async fn sync_collection(
        &self,
        key: &str,
        collection: &DetailedCollection,
        target: Environment,
        target_id: Option<&str>,
    ) -> EngineResult<Option<String>> {
        let member_ids = self.resolve_members(key, collection, target).await?;

        let input = EntityInput::Collection(sync_payload::collection_input(collection));
        let created = self.upsert_remote(key, target, target_id, input).await?;

        let Some(collection_id) = created.as_deref().or(target_id) else {
            return Ok(created);
        };
        if let Err(e) = self.add_missing_members(key, target, collection_id, member_ids).await {
            // The collection now exists remotely; a retry must update it, not create it again
            if let Some(id) = created {
                self.remember_target_id(key, target, id).await;
            }
            return Err(e);
        }
        Ok(created)
    }

    async fn add_missing_members(
        &self,
        key: &str,
        target: Environment,
        collection_id: &str,
        member_ids: Vec<String>,
    ) -> EngineResult<()> {
        if member_ids.is_empty() {
            return Ok(());
        }

        let current = self.client.get_detail(target, EntityKind::Collection, collection_id).await;
        let existing: HashSet<String> = match current {
            Ok(DetailedEntity::Collection(current)) => current.products.nodes().map(|m| m.id.clone()).collect(),
            Ok(_) => HashSet::new(),
            Err(source) => {
                return Err(SyncEngineError::DetailFetch {
                    environment: target,
                    key: key.to_string(),
                    source,
                });
            }
        };

        let to_add: Vec<String> = member_ids.into_iter().filter(|id| !existing.contains(id)).collect();
        if !to_add.is_empty() {
            debug!(key = %key, count = to_add.len(), "Adding collection members");
            let mutation = Mutation::AddCollectionProducts {
                collection_id: collection_id.to_string(),
                product_ids: to_add,
            };
            self.mutate(key, target, mutation).await?;
        }
        Ok(())
    }

    /// Store a created target id without marking the record in sync
    async fn remember_target_id(&self, key: &str, target: Environment, id: String) {
        let stored = match self.store.get_by_key(EntityKind::Collection, key).await {
            Ok(Some(mut record)) => {
                record.set_id_for(target, id);
                self.store.upsert(EntityKind::Collection, record).await.map(|_| ())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            warn!(key = %key, "Could not record created collection id: {}", e);
        }
    }

    /// Options that already exist are rejected by the API; that is expected and only logged
    async fn push_product_options(
        &self,
        key: &str,
        target: Environment,
        product_id: &str,
        options: Vec<ProductOptionInput>,
    ) -> EngineResult<()> {
        if options.is_empty() {
            return Ok(());
        }
        let mutation = Mutation::CreateProductOptions {
            product_id: product_id.to_string(),
            options,
        };
        match self.mutate(key, target, mutation).await {
            Ok(_) => Ok(()),
            Err(SyncEngineError::Validation { messages, .. }) => {
                warn!(key = %key, errors = ?messages, "Product options not created");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn created_id(key: &str, outcome: MutationOutcome) -> EngineResult<String> {
    outcome.id.ok_or_else(|| SyncEngineError::Mutation {
        key: key.to_string(),
        source: RemoteError::MissingData("created record id".to_string()),
    })
}
