//! Turning the model's raw answer into classification items.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::taxonomy::{ClassificationItem, NOT_A_LIST, TaxonomyEntry, UNPARSABLE};

/// Matches a leading Markdown code fence, with or without a language tag.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("fence regex")
});

/// Return the body of a leading code fence, or the trimmed input when there is none.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match FENCE_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a model answer into taxonomy entries.
///
/// Never fails: a non-list answer or unparsable JSON becomes a one-element
/// error list carrying the raw body. List elements that are not complete
/// entries are kept as received.
pub fn parse_classification(raw: &str) -> Vec<ClassificationItem> {
    let body = strip_code_fence(raw);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "could not parse model response as JSON");
            return ClassificationItem::error_list(UNPARSABLE, Some(body.to_string()));
        }
    };

    let Value::Array(elements) = value else {
        warn!(output = body, "model did not return a list");
        return ClassificationItem::error_list(NOT_A_LIST, Some(body.to_string()));
    };

    elements.into_iter().map(into_item).collect()
}

fn into_item(element: Value) -> ClassificationItem {
    match TaxonomyEntry::deserialize(&element) {
        Ok(entry) => ClassificationItem::Entry(entry),
        Err(e) => {
            debug!(error = %e, "list element is not a full taxonomy entry, keeping it as is");
            ClassificationItem::Raw(element)
        }
    }
}
