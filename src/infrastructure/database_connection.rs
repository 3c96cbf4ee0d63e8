// Database connection and pool management
// SQLite via sqlx; one comparison table per entity kind

use anyhow::{Context, Result};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use tracing::info;

use crate::domain::entities::EntityKind;

/// Table holding the comparison rows of one kind
pub const fn comparison_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Collection => "collection_comparisons",
        EntityKind::Product => "product_comparisons",
        EntityKind::Page => "page_comparisons",
        EntityKind::File => "file_comparisons",
    }
}

#[derive(Clone)]
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            let db_path = database_url
                .strip_prefix("sqlite://")
                .or_else(|| database_url.strip_prefix("sqlite:"))
                .unwrap_or(database_url);

            if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {:?}", parent))?;
            }

            if !tokio::fs::try_exists(db_path).await.unwrap_or(false) {
                tokio::fs::File::create(db_path)
                    .await
                    .with_context(|| format!("Failed to create database file {db_path}"))?;
            }
        }

        // Every in-memory connection is its own database
        let max_connections = if in_memory { 1 } else { 10 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database {database_url}"))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        for kind in EntityKind::ALL {
            let table = comparison_table(kind);
            let create_sql = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    key TEXT PRIMARY KEY NOT NULL,
                    production_id TEXT,
                    staging_id TEXT,
                    title TEXT NOT NULL DEFAULT '',
                    differences TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    compared_at TEXT NOT NULL,
                    url TEXT,
                    CHECK (production_id IS NOT NULL OR staging_id IS NOT NULL)
                )
                "#
            );
            sqlx::query(&create_sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create table {table}"))?;

            let index_sql = format!("CREATE INDEX IF NOT EXISTS idx_{table}_differences ON {table} (differences)");
            sqlx::query(&index_sql).execute(&self.pool).await?;
        }

        info!("Comparison tables ready");
        Ok(())
    }
}
