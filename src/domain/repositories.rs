//! Ports the engine depends on: the remote API and the comparison cache

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::comparison::ComparisonRecord;
use crate::domain::entities::{DetailedEntity, EntityKey, EntityKind, EntityPage};
use crate::domain::environment::Environment;
use crate::domain::errors::{RemoteError, StoreError};
use crate::domain::mutations::{Mutation, MutationOutcome};

/// Paginated reads and writes against either environment
#[async_trait]
pub trait RemoteEntityClient: Send + Sync {
    /// One page of the list query; `cursor = None` requests the first page
    async fn list_page(
        &self,
        environment: Environment,
        kind: EntityKind,
        cursor: Option<&str>,
    ) -> Result<EntityPage, RemoteError>;

    async fn get_detail(
        &self,
        environment: Environment,
        kind: EntityKind,
        id: &str,
    ) -> Result<DetailedEntity, RemoteError>;

    async fn mutate(&self, environment: Environment, mutation: Mutation) -> Result<MutationOutcome, RemoteError>;
}

/// Latest comparison result per key, one table per kind
#[async_trait]
pub trait ComparisonStore: Send + Sync {
    /// All records, ascending by key
    async fn get_all(&self, kind: EntityKind) -> Result<Vec<ComparisonRecord>, StoreError>;

    async fn get_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<ComparisonRecord>, StoreError>;

    /// Insert or replace by key, stamping `compared_at`; returns the stored row
    async fn upsert(&self, kind: EntityKind, record: ComparisonRecord) -> Result<ComparisonRecord, StoreError>;

    async fn clear_all(&self, kind: EntityKind) -> Result<(), StoreError>;

    /// Delete every row whose key is not in `keep`; returns the number removed
    async fn prune_except(&self, kind: EntityKind, keep: &HashSet<EntityKey>) -> Result<usize, StoreError>;
}
