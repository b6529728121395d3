//! HFACS taxonomy entries and the inline error descriptor that replaces them
//! when the service response is unusable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message stored when the model answered with JSON that is not a list.
pub const NOT_A_LIST: &str = "LLM did not return a list";

/// Message stored when the model answer could not be parsed.
pub const UNPARSABLE: &str = "Failed to parse LLM JSON response";

/// One classification item contributed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    /// HFACS level, e.g. "Unsafe Acts of Operators".
    pub level: String,
    /// Category within the level, e.g. "Errors".
    pub category: String,
    /// Sub-category, when the model could narrow it down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Quote or summary from the narrative supporting the classification.
    #[serde(rename = "justification_from_narrative", alias = "justification")]
    pub justification: String,
    /// Any further keys the model added, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stands in for a classification the service failed to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// Element of a record's `hfacs_classification` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassificationItem {
    Entry(TaxonomyEntry),
    Error(ErrorDescriptor),
    /// A list element that is not a complete taxonomy entry, stored as received.
    Raw(Value),
}

impl ClassificationItem {
    /// One-element error list, the inline form of every recoverable failure.
    pub fn error_list(error: impl Into<String>, raw_output: Option<String>) -> Vec<Self> {
        vec![Self::Error(ErrorDescriptor {
            error: error.into(),
            raw_output,
        })]
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
