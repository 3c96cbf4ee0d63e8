//! Mapping of source-side details onto target-side mutation inputs

use crate::domain::entities::{DetailedCollection, DetailedFile, DetailedPage, DetailedProduct};
use crate::domain::mutations::{
    CollectionInput, FileInput, ImageInput, MediaInput, MetafieldInput, OptionValueInput, PageInput, ProductInput,
    ProductOptionInput,
};

pub fn collection_input(source: &DetailedCollection) -> CollectionInput {
    CollectionInput {
        handle: source.handle.clone(),
        title: source.title.clone(),
        description_html: source.description_html.clone(),
        sort_order: source.sort_order.clone(),
        template_suffix: source.template_suffix.clone(),
        seo: source.seo.clone(),
        image: source.image.as_ref().map(|image| ImageInput {
            alt_text: image.alt_text.clone(),
            src: image.url.clone(),
        }),
    }
}

pub fn product_options(source: &DetailedProduct) -> Vec<ProductOptionInput> {
    source
        .options
        .iter()
        .map(|option| ProductOptionInput {
            name: option.name.clone(),
            position: option.position,
            values: option
                .values
                .iter()
                .map(|value| OptionValueInput { name: value.clone() })
                .collect(),
            linked_metafield: option.linked_metafield.clone(),
        })
        .collect()
}

/// Media with a preview image, re-uploaded from the source CDN URL
pub fn product_media(source: &DetailedProduct) -> Vec<MediaInput> {
    source
        .media
        .nodes()
        .filter_map(|media| {
            let image = media.preview.as_ref()?.image.as_ref()?;
            (!image.url.is_empty()).then(|| MediaInput {
                alt: image.alt_text.clone(),
                media_content_type: media.media_content_type.clone(),
                original_source: image.url.clone(),
            })
        })
        .collect()
}

/// `for_create` embeds the options; updates push them in a follow-up mutation
pub fn product_input(source: &DetailedProduct, for_create: bool, include_media: bool) -> ProductInput {
    ProductInput {
        title: source.title.clone(),
        handle: source.handle.clone(),
        description_html: source.description_html.clone(),
        vendor: source.vendor.clone(),
        product_type: source.product_type.clone(),
        status: source.status.clone(),
        tags: source.tags.clone(),
        category: source.category.as_ref().and_then(|category| category.id.clone()),
        template_suffix: source.template_suffix.clone(),
        metafields: source.metafields.nodes().map(MetafieldInput::from).collect(),
        gift_card_template_suffix: source.gift_card_template_suffix.clone(),
        requires_selling_plan: source.requires_selling_plan,
        seo: source.seo.clone(),
        product_options: for_create.then(|| product_options(source)),
        media: if include_media { product_media(source) } else { Vec::new() },
    }
}

pub fn page_input(source: &DetailedPage) -> PageInput {
    PageInput {
        title: source.title.clone(),
        handle: source.handle.clone(),
        body: source.body.clone(),
        is_published: source.is_published,
        template_suffix: source.template_suffix.clone(),
        metafields: source.metafields.nodes().map(MetafieldInput::from).collect(),
    }
}

/// Files are always created from the source URL, named by their key
pub fn file_input(source: &DetailedFile, fallback_url: Option<&str>, key: &str) -> FileInput {
    let url = match source.url() {
        "" => fallback_url.unwrap_or_default(),
        url => url,
    };
    FileInput::image(source.alt.clone(), url.to_string(), key.to_string())
}
