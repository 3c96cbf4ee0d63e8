//! Entities tracked across environments
//!
//! The detailed types mirror the GraphQL Admin API payloads field for field
//! (camelCase on the wire), so the remote client deserializes straight into
//! them. Only a subset of each type is *tracked* by the differ; the rest is
//! carried for building sync payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::utils::extract_file_name;

/// Stable cross-environment identifier: a handle, or a normalized filename
pub type EntityKey = String;

/// The four record families the engine reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Collection,
    Product,
    Page,
    File,
}

impl EntityKind {
    pub const ALL: [Self; 4] = [Self::Collection, Self::Product, Self::Page, Self::File];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Product => "product",
            Self::Page => "page",
            Self::File => "file",
        }
    }

    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Collection => "collections",
            Self::Product => "products",
            Self::Page => "pages",
            Self::File => "files",
        }
    }

    /// Whether list records carry an `updatedAt` usable as a shallow sync oracle
    #[must_use]
    pub const fn has_timestamp(self) -> bool {
        !matches!(self, Self::File)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| normalized == kind.as_str() || normalized == kind.plural())
            .ok_or_else(|| format!("Unknown entity kind '{s}' (expected collections, products, pages or files)"))
    }
}

/// A list-query record, normalized across kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicEntity {
    /// Environment-native opaque ID
    pub id: String,
    pub key: EntityKey,
    pub title: String,
    pub updated_at: Option<String>,
    /// Files only
    pub alt: Option<String>,
    /// Files only: preview image URL
    pub url: Option<String>,
}

impl BasicEntity {
    pub fn handled(
        id: impl Into<String>,
        handle: impl Into<String>,
        title: impl Into<String>,
        updated_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: handle.into(),
            title: title.into(),
            updated_at: Some(updated_at.into()),
            alt: None,
            url: None,
        }
    }

    /// File records are keyed by the filename derived from their preview URL
    pub fn file(id: impl Into<String>, url: impl Into<String>, alt: Option<String>) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            key: extract_file_name(&url),
            title: alt.clone().unwrap_or_default(),
            updated_at: None,
            alt,
            url: Some(url),
        }
    }
}

/// One page of a cursor-paginated list query
#[derive(Debug, Clone, Default)]
pub struct EntityPage {
    pub nodes: Vec<BasicEntity>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// GraphQL relay connection (`edges { node { … } }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = T>) -> Self {
        Self {
            edges: nodes.into_iter().map(|node| Edge { node }).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub value_type: String,
}

impl Metafield {
    pub fn new(namespace: &str, key: &str, value: &str, value_type: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            value_type: value_type.to_string(),
        }
    }

    /// `namespace:key`, the identity of a metafield within one record
    #[must_use]
    pub fn qualified_key(&self) -> String {
        format!("{}:{}", self.namespace, self.key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub alt_text: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMember {
    pub id: String,
    pub handle: String,
    #[serde(default)]
    pub title: String,
    pub status: Option<String>,
    pub total_inventory: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCollection {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    pub sort_order: Option<String>,
    pub template_suffix: Option<String>,
    pub image: Option<Image>,
    pub seo: Option<Seo>,
    #[serde(default)]
    pub products: Connection<CollectionMember>,
}

impl DetailedCollection {
    pub fn member_handles(&self) -> Vec<String> {
        self.products.nodes().map(|member| member.handle.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedMetafield {
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub name: String,
    pub position: Option<i32>,
    #[serde(default)]
    pub values: Vec<String>,
    pub linked_metafield: Option<LinkedMetafield>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPreview {
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMedia {
    pub media_content_type: String,
    pub status: Option<String>,
    pub preview: Option<MediaPreview>,
}

/// Variant data is fetched for display only and never compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    pub inventory_quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<Category>,
    pub template_suffix: Option<String>,
    pub gift_card_template_suffix: Option<String>,
    pub requires_selling_plan: Option<bool>,
    pub seo: Option<Seo>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub media: Connection<ProductMedia>,
    #[serde(default)]
    pub variants: Connection<ProductVariant>,
    #[serde(default)]
    pub metafields: Connection<Metafield>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedPage {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_summary: String,
    #[serde(default)]
    pub is_published: bool,
    pub published_at: Option<String>,
    pub template_suffix: Option<String>,
    #[serde(default)]
    pub metafields: Connection<Metafield>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePreview {
    pub image: Option<Image>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFile {
    pub id: String,
    pub alt: Option<String>,
    pub preview: Option<FilePreview>,
}

impl DetailedFile {
    /// File list records already carry every tracked field
    pub fn from_basic(entity: &BasicEntity) -> Self {
        Self {
            id: entity.id.clone(),
            alt: entity.alt.clone(),
            preview: entity.url.as_ref().map(|url| FilePreview {
                image: Some(Image {
                    alt_text: entity.alt.clone(),
                    url: url.clone(),
                }),
                status: None,
            }),
        }
    }

    pub fn url(&self) -> &str {
        self.preview
            .as_ref()
            .and_then(|preview| preview.image.as_ref())
            .map_or("", |image| image.url.as_str())
    }

    pub fn file_name(&self) -> String {
        extract_file_name(self.url())
    }
}

/// Full field set of one record, used for deep comparison and sync payloads
#[derive(Debug, Clone, PartialEq)]
pub enum DetailedEntity {
    Collection(DetailedCollection),
    Product(DetailedProduct),
    Page(DetailedPage),
    File(DetailedFile),
}

impl DetailedEntity {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Collection(_) => EntityKind::Collection,
            Self::Product(_) => EntityKind::Product,
            Self::Page(_) => EntityKind::Page,
            Self::File(_) => EntityKind::File,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Collection(c) => &c.id,
            Self::Product(p) => &p.id,
            Self::Page(p) => &p.id,
            Self::File(f) => &f.id,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Self::Collection(c) => c.handle.clone(),
            Self::Product(p) => p.handle.clone(),
            Self::Page(p) => p.handle.clone(),
            Self::File(f) => f.file_name(),
        }
    }
}
