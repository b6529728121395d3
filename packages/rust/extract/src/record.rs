//! Incremental construction of one [`Record`] while walking its paragraphs.

use asrskit_shared::{FieldValue, Record, Section, TEXT_KEY};
use indexmap::IndexMap;
use tracing::debug;

use crate::lines::{DataLine, classify_line, split_data_lines};

/// Parse the identifier out of heading text such as `"ACN: 2184152 (1 of 91)"`.
///
/// Takes the first whitespace-delimited token after the first colon; trailing
/// annotations like counters are discarded.
pub fn parse_identifier(heading: &str) -> Option<String> {
    let (_, rest) = heading.split_once(':')?;
    rest.split_whitespace().next().map(str::to_string)
}

/// Section title with surrounding whitespace and trailing colons removed.
fn section_name(text: &str) -> &str {
    text.trim().trim_end_matches(':').trim_end()
}

/// A section slot: either a field or the narrative accumulator, which keeps
/// the position where the first narrative line appeared.
#[derive(Debug)]
enum Slot {
    Field(FieldValue),
    Narrative(Vec<String>),
}

#[derive(Debug, Default)]
struct SectionBuilder {
    slots: IndexMap<String, Slot>,
}

impl SectionBuilder {
    fn push(&mut self, line: DataLine) {
        match line {
            DataLine::Field { key, value } => match self.slots.get_mut(&key) {
                Some(Slot::Field(existing)) => existing.push(value),
                // classify_line keeps the narrative key out of labels
                Some(Slot::Narrative(lines)) => lines.push(format!("{key} : {value}")),
                None => {
                    self.slots.insert(key, Slot::Field(FieldValue::Single(value)));
                }
            },
            DataLine::Narrative(text) => {
                let slot = self
                    .slots
                    .entry(TEXT_KEY.to_string())
                    .or_insert_with(|| Slot::Narrative(Vec::new()));
                if let Slot::Narrative(lines) = slot {
                    lines.push(text);
                }
            }
        }
    }

    fn finish(self) -> Section {
        self.slots
            .into_iter()
            .map(|(key, slot)| match slot {
                Slot::Field(value) => (key, value),
                Slot::Narrative(lines) => (key, FieldValue::Single(lines.join("\n"))),
            })
            .collect()
    }
}

/// Builds one record from the paragraphs between its heading and the next.
#[derive(Debug)]
pub struct RecordBuilder {
    id: Option<String>,
    sections: IndexMap<String, SectionBuilder>,
    current: Option<String>,
}

impl RecordBuilder {
    /// Start a record from its heading text.
    pub fn new(heading: &str) -> Self {
        Self {
            id: parse_identifier(heading),
            sections: IndexMap::new(),
            current: None,
        }
    }

    /// Make `title` the active section. Re-entering a known section keeps its fields.
    ///
    /// A title with no name still gets an (empty) entry, but data after it is ignored.
    pub fn enter_section(&mut self, title: &str) {
        let name = section_name(title);
        self.sections.entry(name.to_string()).or_default();
        self.current = (!name.is_empty()).then(|| name.to_string());
    }

    /// Apply a data paragraph to the active section; ignored when none is active.
    pub fn push_data_block(&mut self, inner_html: &str) {
        let Some(current) = self.current.as_ref() else {
            debug!(id = ?self.id, "data block before any section, ignoring");
            return;
        };
        let Some(section) = self.sections.get_mut(current) else {
            return;
        };
        for line in split_data_lines(inner_html) {
            section.push(classify_line(&line));
        }
    }

    /// Flatten narrative lines and produce the finished record.
    pub fn finish(self) -> Record {
        let mut record = Record::new(self.id);
        for (name, builder) in self.sections {
            record.sections.insert(name, builder.finish());
        }
        record
    }
}
