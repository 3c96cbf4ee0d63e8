//! Admin API GraphQL documents and response decoding
//!
//! Every list query requests 250 nodes per page; the files list is filtered
//! to unattached, processed files (`used_in:none status:ready`).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::entities::{
    BasicEntity, DetailedCollection, DetailedEntity, DetailedFile, DetailedPage, DetailedProduct,
    EntityKind, EntityPage, FilePreview,
};
use crate::domain::errors::RemoteError;
use crate::domain::mutations::{EntityInput, Mutation, MutationOutcome, UserError};

pub const FILES_FILTER: &str = "used_in:none status:ready";

const COLLECTIONS_QUERY: &str = r#"
query GetCollections($cursor: String) {
  collections(first: 250, after: $cursor) {
    edges { node { id handle title updatedAt } }
    pageInfo { hasNextPage endCursor }
  }
}"#;

const PRODUCTS_QUERY: &str = r#"
query GetProducts($cursor: String) {
  products(first: 250, after: $cursor) {
    edges { node { id handle title updatedAt } }
    pageInfo { hasNextPage endCursor }
  }
}"#;

const PAGES_QUERY: &str = r#"
query GetPages($cursor: String) {
  pages(first: 250, after: $cursor) {
    edges { node { id handle title updatedAt } }
    pageInfo { hasNextPage endCursor }
  }
}"#;

const FILES_QUERY: &str = r#"
query GetFiles($cursor: String, $query: String) {
  files(first: 250, after: $cursor, query: $query) {
    edges { node { id alt preview { image { url } status } } }
    pageInfo { hasNextPage endCursor }
  }
}"#;

const COLLECTION_DETAILS_QUERY: &str = r#"
query GetCollectionDetails($id: ID!) {
  collection(id: $id) {
    id handle title updatedAt description descriptionHtml sortOrder templateSuffix
    image { altText url }
    seo { title description }
    products(first: 250) {
      edges { node { id title handle status totalInventory } }
    }
  }
}"#;

const PRODUCT_DETAILS_QUERY: &str = r#"
query GetProductDetails($id: ID!) {
  product(id: $id) {
    id handle title updatedAt description descriptionHtml status vendor productType tags
    giftCardTemplateSuffix templateSuffix requiresSellingPlan
    category { id name }
    seo { title description }
    options { name position values linkedMetafield { namespace key } }
    media(first: 20) {
      edges { node { mediaContentType status preview { image { url altText } } } }
    }
    variants(first: 250) {
      edges { node { id title sku price compareAtPrice inventoryQuantity } }
    }
    metafields(first: 100) {
      edges { node { namespace key value type } }
    }
  }
}"#;

const PAGE_DETAILS_QUERY: &str = r#"
query GetPageDetails($id: ID!) {
  page(id: $id) {
    id handle title updatedAt body bodySummary isPublished publishedAt templateSuffix
    metafields(first: 100) {
      edges { node { namespace key value type } }
    }
  }
}"#;

const FILE_DETAILS_QUERY: &str = r#"
query GetFileDetails($id: ID!) {
  node(id: $id) {
    ... on File { id alt preview { image { url altText } status } }
  }
}"#;

const COLLECTION_CREATE: &str = r#"
mutation CreateCollection($input: CollectionInput!) {
  collectionCreate(input: $input) {
    collection { id }
    userErrors { field message }
  }
}"#;

const COLLECTION_UPDATE: &str = r#"
mutation UpdateCollection($input: CollectionInput!) {
  collectionUpdate(input: $input) {
    collection { id }
    userErrors { field message }
  }
}"#;

const COLLECTION_ADD_PRODUCTS: &str = r#"
mutation CollectionAddProducts($id: ID!, $productIds: [ID!]!) {
  collectionAddProducts(id: $id, productIds: $productIds) {
    collection { id }
    userErrors { field message }
  }
}"#;

const PRODUCT_CREATE: &str = r#"
mutation CreateProduct($input: ProductInput!, $media: [CreateMediaInput!]) {
  productCreate(input: $input, media: $media) {
    product { id }
    userErrors { field message }
  }
}"#;

const PRODUCT_UPDATE: &str = r#"
mutation UpdateProduct($input: ProductInput!, $media: [CreateMediaInput!]) {
  productUpdate(input: $input, media: $media) {
    product { id }
    userErrors { field message }
  }
}"#;

const PRODUCT_OPTIONS_CREATE: &str = r#"
mutation CreateProductOptions($productId: ID!, $options: [OptionCreateInput!]!) {
  productOptionsCreate(productId: $productId, options: $options) {
    product { id }
    userErrors { field message }
  }
}"#;

const PAGE_CREATE: &str = r#"
mutation CreatePage($page: PageCreateInput!) {
  pageCreate(page: $page) {
    page { id }
    userErrors { field message }
  }
}"#;

const PAGE_UPDATE: &str = r#"
mutation UpdatePage($id: ID!, $page: PageUpdateInput!) {
  pageUpdate(id: $id, page: $page) {
    page { id }
    userErrors { field message }
  }
}"#;

const FILE_CREATE: &str = r#"
mutation FileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files { id }
    userErrors { field message }
  }
}"#;

/// A document plus its variables, ready to post
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub query: &'static str,
    pub variables: Value,
    /// Top-level field of `data` holding the result
    pub root: &'static str,
}

impl GraphQlRequest {
    pub fn body(&self) -> Value {
        json!({ "query": self.query, "variables": self.variables })
    }
}

pub fn list_request(kind: EntityKind, cursor: Option<&str>) -> GraphQlRequest {
    let (query, variables) = match kind {
        EntityKind::Collection => (COLLECTIONS_QUERY, json!({ "cursor": cursor })),
        EntityKind::Product => (PRODUCTS_QUERY, json!({ "cursor": cursor })),
        EntityKind::Page => (PAGES_QUERY, json!({ "cursor": cursor })),
        EntityKind::File => (FILES_QUERY, json!({ "cursor": cursor, "query": FILES_FILTER })),
    };
    GraphQlRequest {
        query,
        variables,
        root: kind.plural(),
    }
}

pub fn detail_request(kind: EntityKind, id: &str) -> GraphQlRequest {
    let (query, root) = match kind {
        EntityKind::Collection => (COLLECTION_DETAILS_QUERY, "collection"),
        EntityKind::Product => (PRODUCT_DETAILS_QUERY, "product"),
        EntityKind::Page => (PAGE_DETAILS_QUERY, "page"),
        EntityKind::File => (FILE_DETAILS_QUERY, "node"),
    };
    GraphQlRequest {
        query,
        variables: json!({ "id": id }),
        root,
    }
}

fn with_id(input: &impl serde::Serialize, id: &str) -> Result<Value, RemoteError> {
    let mut value = serde_json::to_value(input)?;
    if let Value::Object(map) = &mut value {
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
    Ok(value)
}

pub fn mutation_request(mutation: &Mutation) -> Result<GraphQlRequest, RemoteError> {
    let request = match mutation {
        Mutation::Create(EntityInput::Collection(input)) => GraphQlRequest {
            query: COLLECTION_CREATE,
            variables: json!({ "input": input }),
            root: "collectionCreate",
        },
        Mutation::Update {
            id,
            input: EntityInput::Collection(input),
        } => GraphQlRequest {
            query: COLLECTION_UPDATE,
            variables: json!({ "input": with_id(input, id)? }),
            root: "collectionUpdate",
        },
        Mutation::Create(EntityInput::Product(input)) => GraphQlRequest {
            query: PRODUCT_CREATE,
            variables: json!({ "input": input, "media": input.media }),
            root: "productCreate",
        },
        Mutation::Update {
            id,
            input: EntityInput::Product(input),
        } => GraphQlRequest {
            query: PRODUCT_UPDATE,
            variables: json!({ "input": with_id(input, id)?, "media": input.media }),
            root: "productUpdate",
        },
        Mutation::Create(EntityInput::Page(input)) => GraphQlRequest {
            query: PAGE_CREATE,
            variables: json!({ "page": input }),
            root: "pageCreate",
        },
        Mutation::Update {
            id,
            input: EntityInput::Page(input),
        } => GraphQlRequest {
            query: PAGE_UPDATE,
            variables: json!({ "id": id, "page": input }),
            root: "pageUpdate",
        },
        Mutation::Create(EntityInput::File(input)) => GraphQlRequest {
            query: FILE_CREATE,
            variables: json!({ "files": [input] }),
            root: "fileCreate",
        },
        Mutation::Update {
            input: EntityInput::File(_),
            ..
        } => {
            return Err(RemoteError::Other(
                "files are replaced through fileCreate, not updated".to_string(),
            ));
        }
        Mutation::AddCollectionProducts {
            collection_id,
            product_ids,
        } => GraphQlRequest {
            query: COLLECTION_ADD_PRODUCTS,
            variables: json!({ "id": collection_id, "productIds": product_ids }),
            root: "collectionAddProducts",
        },
        Mutation::CreateProductOptions { product_id, options } => GraphQlRequest {
            query: PRODUCT_OPTIONS_CREATE,
            variables: json!({ "productId": product_id, "options": options }),
            root: "productOptionsCreate",
        },
    };
    Ok(request)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListConnection<T> {
    edges: Vec<ListEdge<T>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct ListEdge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandledNode {
    id: String,
    handle: String,
    #[serde(default)]
    title: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct FileNode {
    id: String,
    alt: Option<String>,
    preview: Option<FilePreview>,
}

fn take_root(data: &mut Value, root: &str) -> Result<Value, RemoteError> {
    match data.get_mut(root).map(Value::take) {
        Some(Value::Null) | None => Err(RemoteError::MissingData(root.to_string())),
        Some(value) => Ok(value),
    }
}

/// Decode the `data` object of a list query into one page of normalized entities
pub fn decode_list(kind: EntityKind, mut data: Value) -> Result<EntityPage, RemoteError> {
    let root = take_root(&mut data, kind.plural())?;

    let (nodes, page_info) = match kind {
        EntityKind::File => {
            let connection: ListConnection<FileNode> = serde_json::from_value(root)?;
            let nodes = connection
                .edges
                .into_iter()
                .map(|edge| {
                    let url = edge
                        .node
                        .preview
                        .and_then(|preview| preview.image)
                        .map(|image| image.url)
                        .unwrap_or_default();
                    BasicEntity::file(edge.node.id, url, edge.node.alt)
                })
                .collect();
            (nodes, connection.page_info)
        }
        _ => {
            let connection: ListConnection<HandledNode> = serde_json::from_value(root)?;
            let nodes = connection
                .edges
                .into_iter()
                .map(|edge| BasicEntity::handled(edge.node.id, edge.node.handle, edge.node.title, edge.node.updated_at))
                .collect();
            (nodes, connection.page_info)
        }
    };

    Ok(EntityPage {
        nodes,
        has_next_page: page_info.has_next_page,
        end_cursor: page_info.end_cursor,
    })
}

/// Decode the `data` object of a detail query
pub fn decode_detail(kind: EntityKind, mut data: Value) -> Result<DetailedEntity, RemoteError> {
    let root = detail_request(kind, "").root;
    let value = take_root(&mut data, root)?;
    let entity = match kind {
        EntityKind::Collection => DetailedEntity::Collection(serde_json::from_value::<DetailedCollection>(value)?),
        EntityKind::Product => DetailedEntity::Product(serde_json::from_value::<DetailedProduct>(value)?),
        EntityKind::Page => DetailedEntity::Page(serde_json::from_value::<DetailedPage>(value)?),
        EntityKind::File => DetailedEntity::File(serde_json::from_value::<DetailedFile>(value)?),
    };
    Ok(entity)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

/// Decode a mutation payload: the created/updated object's id plus any `userErrors`
pub fn decode_mutation(root: &str, mut data: Value) -> Result<MutationOutcome, RemoteError> {
    let payload: MutationPayload = serde_json::from_value(take_root(&mut data, root)?)?;

    let id = payload.rest.values().find_map(|value| match value {
        Value::Object(object) => object.get("id").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });

    Ok(MutationOutcome {
        id,
        user_errors: payload.user_errors,
    })
}

/// Top-level GraphQL envelope
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl GraphQlResponse {
    /// `data`, or the reported `errors` as a transport failure
    pub fn into_data(self) -> Result<Value, RemoteError> {
        if !self.errors.is_empty() {
            return Err(RemoteError::GraphQl(
                self.errors.into_iter().map(|error| error.message).collect(),
            ));
        }
        self.data.ok_or_else(|| RemoteError::MissingData("data".to_string()))
    }
}
