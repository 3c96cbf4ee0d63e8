//! In-memory comparison store, for tests and throwaway runs

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::comparison::ComparisonRecord;
use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ComparisonStore;
use crate::utils::now_rfc3339;

#[derive(Default)]
pub struct InMemoryComparisonStore {
    tables: RwLock<HashMap<EntityKind, BTreeMap<EntityKey, ComparisonRecord>>>,
}

impl InMemoryComparisonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComparisonStore for InMemoryComparisonStore {
    async fn get_all(&self, kind: EntityKind) -> Result<Vec<ComparisonRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<ComparisonRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).and_then(|table| table.get(key)).cloned())
    }

    async fn upsert(&self, kind: EntityKind, mut record: ComparisonRecord) -> Result<ComparisonRecord, StoreError> {
        if record.production_id.is_none() && record.staging_id.is_none() {
            return Err(StoreError::Corrupt {
                key: record.key,
                reason: "neither a production nor a staging id".to_string(),
            });
        }
        record.compared_at = now_rfc3339();
        self.tables
            .write()
            .await
            .entry(kind)
            .or_default()
            .insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn clear_all(&self, kind: EntityKind) -> Result<(), StoreError> {
        self.tables.write().await.remove(&kind);
        Ok(())
    }

    async fn prune_except(&self, kind: EntityKind, keep: &HashSet<EntityKey>) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&kind) else {
            return Ok(0);
        };
        let before = table.len();
        table.retain(|key, _| keep.contains(key));
        Ok(before - table.len())
    }
}
