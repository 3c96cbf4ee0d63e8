//! Write-side payloads sent to the target environment
//!
//! Field names serialize to the Admin API input shapes (camelCase), so the
//! remote client passes these structs straight through as GraphQL variables.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{EntityKind, LinkedMetafield, Metafield, Seo};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    pub alt_text: Option<String>,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInput {
    pub handle: String,
    pub title: String,
    pub description_html: String,
    pub sort_order: Option<String>,
    pub template_suffix: Option<String>,
    pub seo: Option<Seo>,
    pub image: Option<ImageInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldInput {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

impl From<&Metafield> for MetafieldInput {
    fn from(metafield: &Metafield) -> Self {
        Self {
            namespace: metafield.namespace.clone(),
            key: metafield.key.clone(),
            value: metafield.value.clone(),
            value_type: metafield.value_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValueInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptionInput {
    pub name: String,
    pub position: Option<i32>,
    pub values: Vec<OptionValueInput>,
    pub linked_metafield: Option<LinkedMetafield>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput {
    pub alt: Option<String>,
    pub media_content_type: String,
    pub original_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    pub handle: String,
    pub description_html: String,
    pub vendor: String,
    pub product_type: String,
    pub status: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub template_suffix: Option<String>,
    pub metafields: Vec<MetafieldInput>,
    pub gift_card_template_suffix: Option<String>,
    pub requires_selling_plan: Option<bool>,
    pub seo: Option<Seo>,
    /// Only accepted on create; updates push options in a follow-up mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_options: Option<Vec<ProductOptionInput>>,
    /// Sent as the separate `media` argument, never inside `input`
    #[serde(skip)]
    pub media: Vec<MediaInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    pub title: String,
    pub handle: String,
    pub body: String,
    pub is_published: bool,
    pub template_suffix: Option<String>,
    pub metafields: Vec<MetafieldInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub alt: Option<String>,
    pub content_type: String,
    pub original_source: String,
    pub filename: String,
    pub duplicate_resolution_mode: String,
}

impl FileInput {
    /// Image file create that replaces any same-named file in the target
    pub fn image(alt: Option<String>, original_source: String, filename: String) -> Self {
        Self {
            alt,
            content_type: "IMAGE".to_string(),
            original_source,
            filename,
            duplicate_resolution_mode: "REPLACE".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityInput {
    Collection(CollectionInput),
    Product(ProductInput),
    Page(PageInput),
    File(FileInput),
}

impl EntityInput {
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Collection(_) => EntityKind::Collection,
            Self::Product(_) => EntityKind::Product,
            Self::Page(_) => EntityKind::Page,
            Self::File(_) => EntityKind::File,
        }
    }
}

/// One write against an environment
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(EntityInput),
    Update { id: String, input: EntityInput },
    AddCollectionProducts { collection_id: String, product_ids: Vec<String> },
    CreateProductOptions { product_id: String, options: Vec<ProductOptionInput> },
}

impl Mutation {
    /// Short operation name for logs
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Create(EntityInput::Collection(_)) => "collectionCreate",
            Self::Create(EntityInput::Product(_)) => "productCreate",
            Self::Create(EntityInput::Page(_)) => "pageCreate",
            Self::Create(EntityInput::File(_)) => "fileCreate",
            Self::Update { input: EntityInput::Collection(_), .. } => "collectionUpdate",
            Self::Update { input: EntityInput::Product(_), .. } => "productUpdate",
            Self::Update { input: EntityInput::Page(_), .. } => "pageUpdate",
            Self::Update { input: EntityInput::File(_), .. } => "fileUpdate",
            Self::AddCollectionProducts { .. } => "collectionAddProducts",
            Self::CreateProductOptions { .. } => "productOptionsCreate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Result of a mutation that reached the API
///
/// `user_errors` are business-rule rejections and are data, not transport failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub id: Option<String>,
    pub user_errors: Vec<UserError>,
}

impl MutationOutcome {
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            user_errors: Vec::new(),
        }
    }

    pub fn rejected(messages: &[&str]) -> Self {
        Self {
            id: None,
            user_errors: messages
                .iter()
                .map(|message| UserError {
                    field: None,
                    message: (*message).to_string(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        !self.user_errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.user_errors.iter().map(|error| error.message.clone()).collect()
    }
}
