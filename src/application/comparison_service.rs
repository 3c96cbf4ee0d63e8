//! Entry point of the engine: compare, sync and read back comparison results
//!
//! The service owns the store handle and the remote client; callers keep
//! their own view state and re-read after each run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::application::comparator::{Comparator, build_index};
use crate::application::paginated_fetcher::PaginatedFetcher;
use crate::application::sync_orchestrator::{SyncOrchestrator, SyncSettings};
use crate::domain::comparison::ComparisonRecord;
use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::environment::Environment;
use crate::domain::errors::EngineResult;
use crate::domain::events::ProgressReporter;
use crate::domain::reports::{CompareReport, SyncReport};
use crate::domain::repositories::{ComparisonStore, RemoteEntityClient};
use crate::infrastructure::config::SyncConfig;

/// Tuning knobs of one service instance
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub page_delay: Duration,
    pub detail_concurrency: usize,
    pub chunk_size: usize,
    pub sync_product_images: bool,
}

impl From<&SyncConfig> for EngineSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            page_delay: config.page_delay(),
            detail_concurrency: config.detail_concurrency,
            chunk_size: config.chunk_size,
            sync_product_images: config.sync_product_images,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

pub struct ComparisonService {
    store: Arc<dyn ComparisonStore>,
    fetcher: PaginatedFetcher,
    comparator: Comparator,
    orchestrator: SyncOrchestrator,
}

impl ComparisonService {
    pub fn new(client: Arc<dyn RemoteEntityClient>, store: Arc<dyn ComparisonStore>, settings: EngineSettings) -> Self {
        let sync_settings = SyncSettings {
            chunk_size: settings.chunk_size,
            sync_product_images: settings.sync_product_images,
        };
        Self {
            fetcher: PaginatedFetcher::new(client.clone(), settings.page_delay),
            comparator: Comparator::new(client.clone(), settings.detail_concurrency),
            orchestrator: SyncOrchestrator::new(client, store.clone(), sync_settings),
            store,
        }
    }

    /// Re-derive every comparison record of `kind` from both environments.
    ///
    /// A list fetch failure aborts the run before anything is written. Keys whose
    /// deep comparison failed keep their previous record; keys absent from both
    /// environments are pruned.
    pub async fn compare(&self, kind: EntityKind, reporter: &dyn ProgressReporter) -> EngineResult<CompareReport> {
        info!(kind = %kind, "Compare started");

        let (production, staging) = tokio::try_join!(
            self.fetcher.fetch_all(Environment::Production, kind),
            self.fetcher.fetch_all(Environment::Staging, kind),
        )
        .inspect_err(|e| error!(kind = %kind, "Compare aborted: {}", e))?;

        let production = build_index(Environment::Production, production);
        let staging = build_index(Environment::Staging, staging);
        let union: HashSet<EntityKey> = production.keys().chain(staging.keys()).cloned().collect();

        let outcome = self.comparator.compare(kind, production, staging, reporter).await;

        let mut report = CompareReport {
            total: union.len(),
            ..CompareReport::default()
        };
        for record in outcome.records {
            report.tally(&record);
            self.store.upsert(kind, record).await?;
        }
        report.pruned = self.store.prune_except(kind, &union).await?;
        report.failures = outcome.failures;

        info!(
            kind = %kind,
            total = report.total,
            in_sync = report.in_sync,
            differences = report.with_differences,
            missing_in_production = report.missing_in_production,
            missing_in_staging = report.missing_in_staging,
            pruned = report.pruned,
            failed = report.failures.len(),
            "Compare finished"
        );
        Ok(report)
    }

    /// Push `keys` into `target`; `SyncIncomplete` carries the report when any key failed
    pub async fn sync(
        &self,
        kind: EntityKind,
        keys: &[EntityKey],
        target: Environment,
        reporter: &dyn ProgressReporter,
    ) -> EngineResult<SyncReport> {
        self.orchestrator.sync(kind, keys, target, reporter).await
    }

    pub async fn comparisons(&self, kind: EntityKind) -> EngineResult<Vec<ComparisonRecord>> {
        Ok(self.store.get_all(kind).await?)
    }

    pub async fn comparison(&self, kind: EntityKind, key: &str) -> EngineResult<Option<ComparisonRecord>> {
        Ok(self.store.get_by_key(kind, key).await?)
    }

    pub async fn clear(&self, kind: EntityKind) -> EngineResult<()> {
        self.store.clear_all(kind).await?;
        info!(kind = %kind, "Comparisons cleared");
        Ok(())
    }
}
