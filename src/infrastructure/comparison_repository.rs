//! SQLite-backed comparison store
//!
//! One table per entity kind, keyed by the cross-environment key. Upserts go
//! through `INSERT ... ON CONFLICT(key) DO UPDATE`, so writes for different
//! keys never interfere.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::comparison::ComparisonRecord;
use crate::domain::entities::{EntityKey, EntityKind};
use crate::domain::errors::StoreError;
use crate::domain::repositories::ComparisonStore;
use crate::infrastructure::database_connection::comparison_table;
use crate::utils::now_rfc3339;

#[derive(Clone)]
pub struct SqliteComparisonStore {
    pool: Arc<SqlitePool>,
}

impl SqliteComparisonStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    fn map_row(row: &SqliteRow) -> Result<ComparisonRecord, StoreError> {
        let record = ComparisonRecord {
            key: row.try_get("key")?,
            production_id: row.try_get("production_id")?,
            staging_id: row.try_get("staging_id")?,
            title: row.try_get("title")?,
            differences: row.try_get("differences")?,
            updated_at: row.try_get("updated_at")?,
            compared_at: row.try_get("compared_at")?,
            url: row.try_get("url")?,
        };
        ensure_identified(&record)?;
        Ok(record)
    }
}

/// A row must point at a record in at least one environment
fn ensure_identified(record: &ComparisonRecord) -> Result<(), StoreError> {
    if record.production_id.is_none() && record.staging_id.is_none() {
        return Err(StoreError::Corrupt {
            key: record.key.clone(),
            reason: "neither a production nor a staging id".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl ComparisonStore for SqliteComparisonStore {
    async fn get_all(&self, kind: EntityKind) -> Result<Vec<ComparisonRecord>, StoreError> {
        let sql = format!(
            "SELECT key, production_id, staging_id, title, differences, updated_at, compared_at, url
             FROM {} ORDER BY key ASC",
            comparison_table(kind)
        );
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn get_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<ComparisonRecord>, StoreError> {
        let sql = format!(
            "SELECT key, production_id, staging_id, title, differences, updated_at, compared_at, url
             FROM {} WHERE key = ?",
            comparison_table(kind)
        );
        let row = sqlx::query(&sql).bind(key).fetch_optional(&*self.pool).await?;
        row.as_ref().map(Self::map_row).transpose()
    }

    async fn upsert(&self, kind: EntityKind, mut record: ComparisonRecord) -> Result<ComparisonRecord, StoreError> {
        ensure_identified(&record)?;
        record.compared_at = now_rfc3339();

        let sql = format!(
            r#"
            INSERT INTO {}
                (key, production_id, staging_id, title, differences, updated_at, compared_at, url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                production_id = excluded.production_id,
                staging_id = excluded.staging_id,
                title = excluded.title,
                differences = excluded.differences,
                updated_at = excluded.updated_at,
                compared_at = excluded.compared_at,
                url = excluded.url
            "#,
            comparison_table(kind)
        );
        sqlx::query(&sql)
            .bind(&record.key)
            .bind(&record.production_id)
            .bind(&record.staging_id)
            .bind(&record.title)
            .bind(&record.differences)
            .bind(&record.updated_at)
            .bind(&record.compared_at)
            .bind(&record.url)
            .execute(&*self.pool)
            .await?;

        debug!(kind = %kind, key = %record.key, differences = %record.differences, "Upserted comparison");
        Ok(record)
    }

    async fn clear_all(&self, kind: EntityKind) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {}", comparison_table(kind));
        sqlx::query(&sql).execute(&*self.pool).await?;
        Ok(())
    }

    async fn prune_except(&self, kind: EntityKind, keep: &HashSet<EntityKey>) -> Result<usize, StoreError> {
        let table = comparison_table(kind);
        let mut tx = self.pool.begin().await?;

        let keys: Vec<String> = sqlx::query_scalar(&format!("SELECT key FROM {table}"))
            .fetch_all(&mut *tx)
            .await?;

        let delete_sql = format!("DELETE FROM {table} WHERE key = ?");
        let mut removed = 0;
        for key in keys.iter().filter(|key| !keep.contains(*key)) {
            sqlx::query(&delete_sql).bind(key).execute(&mut *tx).await?;
            removed += 1;
        }

        tx.commit().await?;
        if removed > 0 {
            debug!(kind = %kind, removed, "Pruned stale comparisons");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::{IN_SYNC, MISSING_IN_STAGING};
    use crate::infrastructure::database_connection::DatabaseConnection;

    async fn store() -> SqliteComparisonStore {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteComparisonStore::new(db.pool().clone())
    }

    fn record(key: &str, staging_id: Option<&str>, differences: &str) -> ComparisonRecord {
        ComparisonRecord {
            key: key.to_string(),
            production_id: Some(format!("gid://shopify/Page/{key}")),
            staging_id: staging_id.map(str::to_string),
            title: key.to_uppercase(),
            differences: differences.to_string(),
            updated_at: "2024-05-01T10:00:00Z".to_string(),
            compared_at: String::new(),
            url: None,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_by_key_and_stamps_compared_at() {
        let store = store().await;

        store
            .upsert(EntityKind::Page, record("about", None, MISSING_IN_STAGING))
            .await
            .unwrap();
        let stored = store
            .upsert(EntityKind::Page, record("about", Some("s-1"), IN_SYNC))
            .await
            .unwrap();
        assert!(!stored.compared_at.is_empty());

        let all = store.get_all(EntityKind::Page).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].staging_id.as_deref(), Some("s-1"));
        assert_eq!(all[0].differences, IN_SYNC);
    }

    #[tokio::test]
    async fn kinds_are_stored_separately_and_sorted() {
        let store = store().await;
        for key in ["faq", "about", "contact"] {
            store.upsert(EntityKind::Page, record(key, Some("s"), IN_SYNC)).await.unwrap();
        }
        store.upsert(EntityKind::Product, record("tee", Some("s"), IN_SYNC)).await.unwrap();

        let keys: Vec<_> = store
            .get_all(EntityKind::Page)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["about", "contact", "faq"]);
        assert!(store.get_by_key(EntityKind::Page, "tee").await.unwrap().is_none());
        assert!(store.get_by_key(EntityKind::Product, "tee").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn record_without_ids_is_rejected() {
        let store = store().await;
        let mut orphan = record("ghost", None, MISSING_IN_STAGING);
        orphan.production_id = None;

        let result = store.upsert(EntityKind::Page, orphan).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn prune_except_keeps_only_listed_keys() {
        let store = store().await;
        for key in ["a", "b", "c"] {
            store.upsert(EntityKind::Collection, record(key, Some("s"), IN_SYNC)).await.unwrap();
        }

        let keep: HashSet<String> = ["a", "c"].into_iter().map(String::from).collect();
        let removed = store.prune_except(EntityKind::Collection, &keep).await.unwrap();
        assert_eq!(removed, 1);

        store.clear_all(EntityKind::Collection).await.unwrap();
        assert!(store.get_all(EntityKind::Collection).await.unwrap().is_empty());
    }
}
