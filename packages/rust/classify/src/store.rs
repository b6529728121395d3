//! Reading and checkpointing record files.
//!
//! The classifier treats records as generic JSON objects so it preserves
//! whatever the extractor (or a previous run) wrote, key order included.

use std::path::Path;

use asrskit_shared::{AsrsError, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// A record as the classifier sees it.
pub type JsonRecord = Map<String, Value>;

/// Load a non-empty JSON array of objects.
pub fn load_records(path: &Path) -> Result<Vec<JsonRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| AsrsError::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| AsrsError::json(path, e))?;

    let Value::Array(items) = value else {
        return Err(AsrsError::validation(format!(
            "{} should contain a list of incidents",
            path.display()
        )));
    };
    if items.is_empty() {
        return Err(AsrsError::validation(format!(
            "{} contains no incidents",
            path.display()
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(AsrsError::validation(format!(
                "{}: element {idx} is not an object (found {})",
                path.display(),
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Write records as pretty-printed JSON, replacing `path` atomically.
///
/// The data goes to a sibling `.tmp` file first so an interrupted write never
/// leaves a truncated checkpoint behind.
pub fn save_records(path: &Path, records: &[JsonRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|e| AsrsError::json(path, e))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    std::fs::write(tmp_path, json).map_err(|e| AsrsError::io(tmp_path, e))?;
    std::fs::rename(tmp_path, path).map_err(|e| AsrsError::io(path, e))?;

    debug!(path = %path.display(), records = records.len(), "records saved");
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
