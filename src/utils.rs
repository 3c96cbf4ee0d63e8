//! Shared helpers

use chrono::{SecondsFormat, Utc};

/// Normalized filename of a file URL: query string removed, last path segment kept.
///
/// Returns an empty string when the URL has no usable segment.
#[must_use]
pub fn extract_file_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    without_query
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Current UTC time in the RFC 3339 form the stores and APIs exchange
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Collapse duplicates, keeping the first occurrence of each value
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
