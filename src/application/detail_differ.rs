//! Field-level comparison of two detailed records
//!
//! Only tracked fields produce tags. Variants, prices, media and options are
//! carried for sync payloads and never compared.

use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

use crate::domain::comparison::tags;
use crate::domain::entities::{
    Connection, DetailedCollection, DetailedEntity, DetailedFile, DetailedPage, DetailedProduct, Metafield,
};

/// Difference tags between a production and a staging record of the same kind.
///
/// Returns `None` when the two records are of different kinds.
pub fn diff(production: &DetailedEntity, staging: &DetailedEntity) -> Option<Vec<String>> {
    let differences = match (production, staging) {
        (DetailedEntity::Collection(p), DetailedEntity::Collection(s)) => diff_collections(p, s),
        (DetailedEntity::Product(p), DetailedEntity::Product(s)) => diff_products(p, s),
        (DetailedEntity::Page(p), DetailedEntity::Page(s)) => diff_pages(p, s),
        (DetailedEntity::File(p), DetailedEntity::File(s)) => diff_files(p, s),
        _ => return None,
    };
    Some(differences)
}

fn compare_field<T: PartialEq + Debug + ?Sized>(tag: &str, production: &T, staging: &T, differences: &mut Vec<String>) {
    if production != staging {
        debug!(field = tag, production = ?production, staging = ?staging, "Field mismatch");
        differences.push(tag.to_string());
    }
}

pub fn diff_collections(production: &DetailedCollection, staging: &DetailedCollection) -> Vec<String> {
    let mut differences = Vec::new();
    compare_field(tags::TITLE, &production.title, &staging.title, &mut differences);
    compare_field(tags::DESCRIPTION, &production.description, &staging.description, &mut differences);
    compare_field(
        tags::HTML_DESCRIPTION,
        &production.description_html,
        &staging.description_html,
        &mut differences,
    );
    compare_field(tags::SORT_ORDER, &production.sort_order, &staging.sort_order, &mut differences);
    compare_field(
        tags::TEMPLATE_SUFFIX,
        &production.template_suffix,
        &staging.template_suffix,
        &mut differences,
    );

    let alt_text = |c: &DetailedCollection| c.image.as_ref().and_then(|image| image.alt_text.clone());
    compare_field(tags::IMAGE_ALT_TEXT, &alt_text(production), &alt_text(staging), &mut differences);

    let seo_title = |c: &DetailedCollection| c.seo.as_ref().and_then(|seo| seo.title.clone());
    let seo_description = |c: &DetailedCollection| c.seo.as_ref().and_then(|seo| seo.description.clone());
    compare_field(tags::SEO_TITLE, &seo_title(production), &seo_title(staging), &mut differences);
    compare_field(
        tags::SEO_DESCRIPTION,
        &seo_description(production),
        &seo_description(staging),
        &mut differences,
    );
    differences
}

pub fn diff_products(production: &DetailedProduct, staging: &DetailedProduct) -> Vec<String> {
    let mut differences = Vec::new();
    compare_field(tags::TITLE, &production.title, &staging.title, &mut differences);
    compare_field(tags::DESCRIPTION, &production.description, &staging.description, &mut differences);
    compare_field(tags::STATUS, &production.status, &staging.status, &mut differences);
    compare_field(tags::VENDOR, production.vendor.trim(), staging.vendor.trim(), &mut differences);
    compare_field(tags::PRODUCT_TYPE, &production.product_type, &staging.product_type, &mut differences);

    let mut production_tags = production.tags.clone();
    let mut staging_tags = staging.tags.clone();
    production_tags.sort();
    staging_tags.sort();
    compare_field(tags::TAGS, &production_tags, &staging_tags, &mut differences);

    compare_metafields(&production.metafields, &staging.metafields, &mut differences);
    differences
}

pub fn diff_pages(production: &DetailedPage, staging: &DetailedPage) -> Vec<String> {
    let mut differences = Vec::new();
    compare_field(tags::TITLE, &production.title, &staging.title, &mut differences);
    compare_field(tags::BODY, &production.body, &staging.body, &mut differences);
    compare_field(
        tags::PUBLISHED_STATUS,
        &production.is_published,
        &staging.is_published,
        &mut differences,
    );
    compare_field(
        tags::TEMPLATE_SUFFIX,
        &production.template_suffix,
        &staging.template_suffix,
        &mut differences,
    );
    compare_metafields(&production.metafields, &staging.metafields, &mut differences);
    differences
}

pub fn diff_files(production: &DetailedFile, staging: &DetailedFile) -> Vec<String> {
    let mut differences = Vec::new();
    compare_field(tags::FILE_NAME, &production.file_name(), &staging.file_name(), &mut differences);
    compare_field(tags::ALT_TEXT, &production.alt, &staging.alt, &mut differences);
    differences
}

fn metafield_map(metafields: &Connection<Metafield>) -> HashMap<String, &str> {
    metafields
        .nodes()
        .map(|metafield| (metafield.qualified_key(), metafield.value.as_str()))
        .collect()
}

/// Count and content are checked independently: a record can carry both tags.
fn compare_metafields(
    production: &Connection<Metafield>,
    staging: &Connection<Metafield>,
    differences: &mut Vec<String>,
) {
    let production_map = metafield_map(production);
    let staging_map = metafield_map(staging);

    if production_map.len() != staging_map.len() {
        debug!(
            production = production_map.len(),
            staging = staging_map.len(),
            "Metafields count mismatch"
        );
        differences.push(tags::METAFIELDS_COUNT.to_string());
    }

    let changed_value = production_map
        .iter()
        .find(|(key, value)| staging_map.get(*key).is_some_and(|other| other != *value));
    let same_count_other_keys = production_map.len() == staging_map.len()
        && production_map.keys().any(|key| !staging_map.contains_key(key));

    if let Some((key, value)) = changed_value {
        debug!(key = %key, production = %value, staging = ?staging_map.get(key), "Metafields content mismatch");
        differences.push(tags::METAFIELDS_CONTENT.to_string());
    } else if same_count_other_keys {
        debug!("Metafields content mismatch: key sets differ");
        differences.push(tags::METAFIELDS_CONTENT.to_string());
    }
}
