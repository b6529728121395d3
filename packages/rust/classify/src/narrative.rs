//! Locating and reading the narrative a record should be classified on.

use asrskit_shared::TEXT_KEY;
use serde_json::{Map, Value};

/// Section preferred when it exists and carries narrative text.
pub const PREFERRED_NARRATIVE_FIELD: &str = "Narrative: 1";

/// Pick the narrative-bearing section of `record`.
///
/// Prefers [`PREFERRED_NARRATIVE_FIELD`], then the first section whose name
/// contains "narrative" (any case) and which has a `"text"` field. `None`
/// means the caller must name the field explicitly.
pub fn find_narrative_field(record: &Map<String, Value>) -> Option<String> {
    if record.get(PREFERRED_NARRATIVE_FIELD).is_some_and(has_text) {
        return Some(PREFERRED_NARRATIVE_FIELD.to_string());
    }

    record
        .iter()
        .find(|(key, value)| key.to_lowercase().contains("narrative") && has_text(value))
        .map(|(key, _)| key.clone())
}

fn has_text(value: &Value) -> bool {
    value.as_object().is_some_and(|section| section.contains_key(TEXT_KEY))
}

/// Narrative text stored under `field`, or an empty string when absent.
///
/// Accepts a section object whose `"text"` is a string or a list of lines,
/// or a field that is itself a string.
pub fn narrative_text(record: &Map<String, Value>, field: &str) -> String {
    let text = match record.get(field) {
        Some(Value::Object(section)) => section.get(TEXT_KEY),
        Some(other) => Some(other),
        None => None,
    };

    match text {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
