//! Record data model shared by the extractor and the classifier.
//!
//! Field names are discovered from the input, so sections are ordered maps
//! rather than fixed structs.

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// JSON key under which a record's identifier is written.
pub const IDENTIFIER_KEY: &str = "ACN";

/// Reserved section key holding newline-joined narrative lines.
pub const TEXT_KEY: &str = "text";

/// JSON key under which the classifier stores taxonomy entries.
pub const CLASSIFICATION_KEY: &str = "hfacs_classification";

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// Value of a section field: a scalar, or every value when the label repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Add another occurrence of the same label.
    ///
    /// A scalar becomes a two-element list; a list grows by one.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(prev) => {
                let first = std::mem::take(prev);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }

    /// The scalar value, if this field never repeated.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multiple(_) => None,
        }
    }

    /// All values in order of appearance.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A named group of fields inside a record, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(IndexMap<String, FieldValue>);

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `label : value` occurrence, promoting repeats to a list.
    pub fn push_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut slot) => slot.get_mut().push(value),
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(FieldValue::Single(value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Narrative text, if the section had any free-text lines.
    pub fn text(&self) -> Option<&str> {
        self.0.get(TEXT_KEY).and_then(FieldValue::as_single)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Section {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One incident: an optional identifier plus its sections in document order.
///
/// Serializes as a flat JSON object: `{"ACN": "...", "<section>": {...}, ...}`.
/// The `"ACN"` key is omitted when no identifier was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub id: Option<String>,
    pub sections: IndexMap<String, Section>,
}

impl Record {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            sections: IndexMap::new(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Get the named section, creating it at the end if it is new.
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // A section literally named "ACN" shadows the identifier.
        let id = self
            .id
            .as_ref()
            .filter(|_| !self.sections.contains_key(IDENTIFIER_KEY));

        let mut map = serializer.serialize_map(Some(self.sections.len() + usize::from(id.is_some())))?;
        if let Some(id) = id {
            map.serialize_entry(IDENTIFIER_KEY, id)?;
        }
        for (name, section) in &self.sections {
            map.serialize_entry(name, section)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordEntry {
    Identifier(String),
    Section(Section),
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = IndexMap::<String, RecordEntry>::deserialize(deserializer)?;
        let mut record = Record::default();

        for (key, entry) in entries {
            match entry {
                RecordEntry::Identifier(id) if key == IDENTIFIER_KEY => record.id = Some(id),
                RecordEntry::Identifier(_) => {
                    return Err(serde::de::Error::custom(format!(
                        "expected an object for section '{key}', found a string"
                    )));
                }
                RecordEntry::Section(section) => {
                    record.sections.insert(key, section);
                }
            }
        }

        Ok(record)
    }
}
