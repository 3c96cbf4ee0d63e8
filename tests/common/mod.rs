//! In-process stand-in for the two Admin API endpoints

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use store_sync_lib::domain::entities::{
    BasicEntity, Connection, DetailedEntity, DetailedPage, EntityKind, EntityPage, Metafield,
};
use store_sync_lib::domain::environment::Environment;
use store_sync_lib::domain::errors::RemoteError;
use store_sync_lib::domain::mutations::{EntityInput, Mutation, MutationOutcome, PageInput};
use store_sync_lib::domain::repositories::RemoteEntityClient;

pub const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct ShopState {
    lists: HashMap<(Environment, EntityKind), Vec<BasicEntity>>,
    details: HashMap<(Environment, String), DetailedEntity>,
    failing_details: HashSet<String>,
    failing_lists: HashSet<Environment>,
    rejections: HashMap<&'static str, Vec<String>>,
    mutations: Vec<(Environment, Mutation)>,
    next_id: usize,
    omit_created_ids: bool,
}

impl ShopState {
    /// Page writes land in the shop so a later compare sees them
    fn apply(&mut self, environment: Environment, mutation: &Mutation, created_id: Option<&str>) {
        match (mutation, created_id) {
            (Mutation::Create(EntityInput::Page(input)), Some(id)) => {
                self.lists
                    .entry((environment, EntityKind::Page))
                    .or_default()
                    .push(BasicEntity::handled(id, &input.handle, &input.title, WRITTEN_AT));
                self.details.insert((environment, id.to_string()), page_from_input(id, input));
            }
            (Mutation::Update { id, input: EntityInput::Page(input) }, _) => {
                let list = self.lists.entry((environment, EntityKind::Page)).or_default();
                if let Some(entity) = list.iter_mut().find(|entity| entity.id == *id) {
                    entity.title = input.title.clone();
                    entity.updated_at = Some(WRITTEN_AT.to_string());
                }
                self.details.insert((environment, id.clone()), page_from_input(id, input));
            }
            _ => {}
        }
    }
}

const WRITTEN_AT: &str = "2024-06-01T00:00:00Z";

fn page_from_input(id: &str, input: &PageInput) -> DetailedEntity {
    DetailedEntity::Page(DetailedPage {
        id: id.to_string(),
        handle: input.handle.clone(),
        title: input.title.clone(),
        updated_at: Some(WRITTEN_AT.to_string()),
        body: input.body.clone(),
        body_summary: String::new(),
        is_published: input.is_published,
        published_at: None,
        template_suffix: input.template_suffix.clone(),
        metafields: Connection::from_nodes(
            input.metafields.iter().map(|m| Metafield::new(&m.namespace, &m.key, &m.value, &m.value_type)),
        ),
    })
}

/// Serves list pages of `PAGE_SIZE`, details by id, and records every mutation
///
/// Accepted page creates and updates are applied to the shop's own lists and details.
#[derive(Default)]
pub struct FakeShop {
    state: Mutex<ShopState>,
    pub detail_calls: AtomicUsize,
}

impl FakeShop {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut ShopState {
        self.state.get_mut().unwrap()
    }

    pub fn with_list(mut self, environment: Environment, kind: EntityKind, entities: Vec<BasicEntity>) -> Self {
        self.state_mut().lists.insert((environment, kind), entities);
        self
    }

    pub fn with_detail(mut self, environment: Environment, detail: DetailedEntity) -> Self {
        let id = detail.id().to_string();
        self.state_mut().details.insert((environment, id), detail);
        self
    }

    pub fn failing_detail(mut self, id: &str) -> Self {
        self.state_mut().failing_details.insert(id.to_string());
        self
    }

    pub fn failing_list(mut self, environment: Environment) -> Self {
        self.state_mut().failing_lists.insert(environment);
        self
    }

    /// Answer every `operation` mutation with these user errors
    pub fn rejecting(mut self, operation: &'static str, messages: &[&str]) -> Self {
        self.state_mut()
            .rejections
            .insert(operation, messages.iter().map(|m| (*m).to_string()).collect());
        self
    }

    /// Creates succeed but answer without the new record's id
    pub fn omitting_created_ids(mut self) -> Self {
        self.state_mut().omit_created_ids = true;
        self
    }

    pub fn mutations(&self) -> Vec<(Environment, Mutation)> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.mutations().iter().map(|(_, m)| m.operation()).collect()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteEntityClient for FakeShop {
    async fn list_page(
        &self,
        environment: Environment,
        kind: EntityKind,
        cursor: Option<&str>,
    ) -> Result<EntityPage, RemoteError> {
        let state = self.state.lock().unwrap();
        if state.failing_lists.contains(&environment) {
            return Err(RemoteError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let all = state.lists.get(&(environment, kind)).cloned().unwrap_or_default();
        let start: usize = cursor.map_or(0, |c| c.parse().unwrap());
        let end = (start + PAGE_SIZE).min(all.len());
        let has_next_page = end < all.len();
        Ok(EntityPage {
            nodes: all[start..end].to_vec(),
            has_next_page,
            end_cursor: has_next_page.then(|| end.to_string()),
        })
    }

    async fn get_detail(
        &self,
        environment: Environment,
        _kind: EntityKind,
        id: &str,
    ) -> Result<DetailedEntity, RemoteError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_details.contains(id) {
            return Err(RemoteError::GraphQl(vec![format!("Throttled while loading {id}")]));
        }
        state
            .details
            .get(&(environment, id.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::MissingData(format!("no record {id} in {environment}")))
    }

    async fn mutate(&self, environment: Environment, mutation: Mutation) -> Result<MutationOutcome, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let operation = mutation.operation();

        if let Some(messages) = state.rejections.get(operation) {
            let messages: Vec<&str> = messages.iter().map(String::as_str).collect();
            let outcome = MutationOutcome::rejected(&messages);
            state.mutations.push((environment, mutation));
            return Ok(outcome);
        }

        let created_id = matches!(mutation, Mutation::Create(_)).then(|| {
            state.next_id += 1;
            format!("gid://fake/{environment}/{}", state.next_id)
        });
        state.apply(environment, &mutation, created_id.as_deref());
        state.mutations.push((environment, mutation));

        match created_id {
            Some(_) if state.omit_created_ids => Ok(MutationOutcome::default()),
            Some(id) => Ok(MutationOutcome::created(id)),
            None => Ok(MutationOutcome::default()),
        }
    }
}

pub fn page_detail(id: &str, handle: &str, body: &str) -> DetailedEntity {
    DetailedEntity::Page(
        serde_json::from_value(json!({
            "id": id,
            "handle": handle,
            "title": handle.to_uppercase(),
            "body": body,
            "isPublished": true
        }))
        .unwrap(),
    )
}

pub fn product_detail(id: &str, handle: &str, title: &str) -> DetailedEntity {
    DetailedEntity::Product(
        serde_json::from_value(json!({
            "id": id,
            "handle": handle,
            "title": title,
            "status": "ACTIVE",
            "options": [{ "name": "Size", "position": 1, "values": ["S", "M"] }]
        }))
        .unwrap(),
    )
}

/// `members` are `(product id, product handle)` pairs
pub fn collection_detail(id: &str, handle: &str, members: &[(&str, &str)]) -> DetailedEntity {
    let edges: Vec<_> = members
        .iter()
        .map(|(member_id, member_handle)| json!({ "node": { "id": member_id, "handle": member_handle } }))
        .collect();
    DetailedEntity::Collection(
        serde_json::from_value(json!({
            "id": id,
            "handle": handle,
            "title": handle.to_uppercase(),
            "products": { "edges": edges }
        }))
        .unwrap(),
    )
}

pub fn file_detail(id: &str, url: &str, alt: Option<&str>) -> DetailedEntity {
    DetailedEntity::File(
        serde_json::from_value(json!({
            "id": id,
            "alt": alt,
            "preview": { "image": { "url": url, "altText": alt } }
        }))
        .unwrap(),
    )
}

pub fn entity(id: &str, handle: &str, updated_at: &str) -> BasicEntity {
    BasicEntity::handled(id, handle, handle.to_uppercase(), updated_at)
}
