//! Drains one environment's entity list through cursor pagination
//!
//! Pagination is strictly sequential per environment: each request needs the
//! previous page's cursor. The loop is an explicit state machine so the
//! terminal states are visible at the type level.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::domain::entities::{BasicEntity, EntityKind, EntityPage};
use crate::domain::environment::Environment;
use crate::domain::errors::{EngineResult, RemoteError, SyncEngineError};
use crate::domain::repositories::RemoteEntityClient;

enum FetchState {
    /// Next page to request; `None` is the first page
    Fetching(Option<String>),
    Done,
    Failed(RemoteError),
}

pub struct PaginatedFetcher {
    client: Arc<dyn RemoteEntityClient>,
    page_delay: Duration,
}

impl PaginatedFetcher {
    pub fn new(client: Arc<dyn RemoteEntityClient>, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    /// Every record of `kind` in `environment`, or nothing at all
    pub async fn fetch_all(&self, environment: Environment, kind: EntityKind) -> EngineResult<Vec<BasicEntity>> {
        let mut entities = Vec::new();
        let mut pages = 0usize;
        let mut state = FetchState::Fetching(None);

        loop {
            state = match state {
                FetchState::Fetching(cursor) => {
                    let result = self.client.list_page(environment, kind, cursor.as_deref()).await;
                    pages += 1;
                    match result {
                        Ok(page) => {
                            let next = Self::advance(page, &mut entities);
                            tokio::time::sleep(self.page_delay).await;
                            next
                        }
                        Err(e) => FetchState::Failed(e),
                    }
                }
                FetchState::Done => {
                    info!(
                        environment = %environment,
                        kind = %kind,
                        pages,
                        records = entities.len(),
                        "Fetched full list"
                    );
                    return Ok(entities);
                }
                FetchState::Failed(source) => {
                    error!(environment = %environment, kind = %kind, page = pages, "List fetch failed: {}", source);
                    return Err(SyncEngineError::Fetch {
                        environment,
                        kind,
                        source,
                    });
                }
            };
        }
    }

    fn advance(page: EntityPage, entities: &mut Vec<BasicEntity>) -> FetchState {
        debug!(nodes = page.nodes.len(), has_next_page = page.has_next_page, "Received page");
        entities.extend(page.nodes);

        match (page.has_next_page, page.end_cursor) {
            (false, _) => FetchState::Done,
            (true, Some(cursor)) => FetchState::Fetching(Some(cursor)),
            (true, None) => FetchState::Failed(RemoteError::MissingData("pageInfo.endCursor".to_string())),
        }
    }
}
