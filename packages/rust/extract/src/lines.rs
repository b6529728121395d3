//! Data block splitting and per-line classification.

use asrskit_shared::TEXT_KEY;
use scraper::Html;

use crate::document::collapse_text;

/// Line-break marker as serialized by the HTML parser.
const LINE_BREAK: &str = "<br>";

/// Separator between a label and its value.
const FIELD_SEPARATOR: &str = " : ";

/// One logical line of a data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLine {
    Field { key: String, value: String },
    Narrative(String),
}

/// Split a data paragraph's inner markup into plain-text lines.
///
/// Blank segments and segments that are empty once markup is stripped are dropped.
pub fn split_data_lines(inner_html: &str) -> Vec<String> {
    inner_html
        .split(LINE_BREAK)
        .filter(|segment| !segment.trim().is_empty())
        .map(plain_text)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Strip embedded markup from a fragment, collapsing whitespace and trimming ends.
pub fn plain_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_text(parsed.root_element().text())
}

/// Classify a plain-text line, splitting on the first `" : "` only.
///
/// A label equal to the reserved narrative key stays narrative so it cannot
/// collide with the flattened `"text"` entry.
pub fn classify_line(line: &str) -> DataLine {
    match line.split_once(FIELD_SEPARATOR) {
        Some((key, value)) if key.trim() != TEXT_KEY => DataLine::Field {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => DataLine::Narrative(line.to_string()),
    }
}
