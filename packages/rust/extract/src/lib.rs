//! Record extraction from printable incident-report HTML exports.
//!
//! The export is a flat run of `<p>` elements whose class marks them as a
//! record heading, a section title, or a data block. Data blocks hold
//! `label : value` lines and free-text narrative separated by `<br>`.
//!
//! - [`extract_records`] — markup → ordered list of [`Record`]
//! - [`extract_file`] / [`write_records`] — the file-level wrappers used by the CLI

mod document;
mod lines;
mod record;

use std::path::{Path, PathBuf};

use asrskit_shared::{AsrsError, MarkerClasses, Record, Result};
use tracing::{debug, info, instrument};

pub use document::{Document, MarkerNode, Role};
pub use lines::{DataLine, classify_line, plain_text, split_data_lines};
pub use record::{RecordBuilder, parse_identifier};

/// Extract every record from `html`, in heading order.
///
/// Missing or malformed markers never fail; they only yield fewer fields.
#[instrument(skip_all, fields(len = html.len()))]
pub fn extract_records(html: &str, markers: &MarkerClasses) -> Vec<Record> {
    let document = Document::parse(html, markers);
    debug!(
        nodes = document.nodes().len(),
        headings = document.heading_count(),
        "document parsed"
    );

    let mut records = Vec::with_capacity(document.heading_count());
    let mut builder: Option<RecordBuilder> = None;

    for node in document.nodes() {
        match node.role {
            Role::Heading => {
                if let Some(done) = builder.replace(RecordBuilder::new(&node.text)) {
                    records.push(done.finish());
                }
            }
            Role::Section => {
                if let Some(b) = builder.as_mut() {
                    b.enter_section(&node.text);
                }
            }
            Role::Data => {
                if let Some(b) = builder.as_mut() {
                    b.push_data_block(&node.inner_html);
                }
            }
            Role::Other => {}
        }
    }

    if let Some(done) = builder {
        records.push(done.finish());
    }

    records
}

/// Read, decode, and extract an HTML export.
///
/// Fails only when the file cannot be read or is not valid UTF-8.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn extract_file(path: &Path, markers: &MarkerClasses) -> Result<Vec<Record>> {
    let bytes = std::fs::read(path).map_err(|e| AsrsError::io(path, e))?;
    let html = String::from_utf8(bytes).map_err(|source| AsrsError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let records = extract_records(&html, markers);
    let sections: usize = records.iter().map(|r| r.sections.len()).sum();
    info!(records = records.len(), sections, "extraction complete");

    Ok(records)
}

/// Write records as a pretty-printed UTF-8 JSON array.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|e| AsrsError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| AsrsError::io(path, e))?;
    info!(path = %path.display(), records = records.len(), "records written");
    Ok(())
}

/// Output path used when none is given: the input path with a `.json` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use asrskit_shared::{FieldValue, IDENTIFIER_KEY, TEXT_KEY};

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn fixture_records() -> Vec<Record> {
        extract_records(&load_fixture("asrs-printable.html"), &MarkerClasses::default())
    }

    fn wrap(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    // -----------------------------------------------------------------------
    // Fixture-driven tests
    // -----------------------------------------------------------------------

    #[test]
    fn fixture_yields_one_record_per_heading() {
        let records = fixture_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_deref(), Some("2184152"));
        assert_eq!(records[1].id.as_deref(), Some("2184020"));
        assert_eq!(records[2].id, None);
    }

    #[test]
    fn fixture_sections_follow_document_order() {
        let records = fixture_records();
        let names: Vec<&str> = records[0].sections.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["Time / Day", "Place", "Aircraft 1", "Events", "Narrative: 1", "Synopsis"]
        );
    }

    #[test]
    fn fixture_fields_and_duplicates() {
        let records = fixture_records();
        let aircraft = records[0].section("Aircraft 1").unwrap();
        assert_eq!(aircraft.get("Make Model Name").unwrap().as_single(), Some("B737-800"));
        assert_eq!(
            aircraft.get("Flight Phase").unwrap().values(),
            vec!["Initial Approach", "Final Approach"]
        );

        let events = records[0].section("Events").unwrap();
        assert_eq!(
            events.get("Anomaly.Deviation - Altitude").unwrap().values(),
            vec!["Excursion From Assigned Altitude", "Overshoot", "Undershoot"]
        );
        assert!(!events.contains_key(TEXT_KEY));
    }

    #[test]
    fn fixture_narrative_is_joined() {
        let records = fixture_records();
        let narrative = records[0].section("Narrative: 1").unwrap();
        assert_eq!(
            narrative.text(),
            Some(
                "During the approach we were given a descent to 3,000 ft by ATC.\n\
                 The First Officer set 4,000 ft in the MCP and I did not catch it.\n\
                 We corrected at 3,600 ft and ATC advised of the deviation."
            )
        );
    }

    #[test]
    fn fixture_repeated_section_accumulates() {
        let records = fixture_records();
        let place = records[1].section("Place").unwrap();
        assert_eq!(place.get("State Reference").unwrap().as_single(), Some("CA"));
        assert_eq!(
            place.get("Relative Position.Distance.Nautical Miles").unwrap().as_single(),
            Some("5")
        );
        assert_eq!(records[1].sections.len(), 2);
    }

    #[test]
    fn fixture_ignores_content_outside_records() {
        let records = fixture_records();
        let synopsis = records[2].section("Synopsis").unwrap();
        assert_eq!(synopsis.text(), Some("Line one.\nLine two."));
        assert_eq!(records[2].sections.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn no_headings_means_no_records() {
        let html = wrap(r#"<p class="acnsection">Place</p><p class="acndata">A : 1</p>"#);
        assert!(extract_records(&html, &MarkerClasses::default()).is_empty());
        assert!(extract_records("", &MarkerClasses::default()).is_empty());
    }

    #[test]
    fn colon_only_section_is_kept_empty() {
        let html = wrap(
            r#"<p class="acnheading">ACN: 1</p>
               <p class="acnsection">:</p>
               <p class="acndata">Dropped : yes</p>"#,
        );
        let records = extract_records(&html, &MarkerClasses::default());
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json, serde_json::json!([{ "ACN": "1", "": {} }]));
    }

    #[test]
    fn one_key_per_distinct_label() {
        let html = wrap(
            r#"<p class="acnheading">ACN: 1</p>
               <p class="acnsection">Place</p>
               <p class="acndata">Locale :  ZZZ <br> State : US<br>Altitude : 3000</p>"#,
        );
        let records = extract_records(&html, &MarkerClasses::default());
        let place = records[0].section("Place").unwrap();
        assert_eq!(place.keys().collect::<Vec<_>>(), vec!["Locale", "State", "Altitude"]);
        assert_eq!(place.get("Locale"), Some(&FieldValue::Single("ZZZ".into())));
    }

    #[test]
    fn triple_label_becomes_list() {
        let html = wrap(
            r#"<p class="acnheading">ACN: 1</p>
               <p class="acnsection">S</p>
               <p class="acndata">A : 1<br>A : 2</p>
               <p class="acndata">A : 3</p>"#,
        );
        let records = extract_records(&html, &MarkerClasses::default());
        assert_eq!(
            records[0].section("S").unwrap().get("A"),
            Some(&FieldValue::Multiple(vec!["1".into(), "2".into(), "3".into()]))
        );
    }

    #[test]
    fn heading_without_colon_has_no_identifier_key() {
        let html = wrap(r#"<p class="acnheading">Untitled report</p>"#);
        let records = extract_records(&html, &MarkerClasses::default());
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json, serde_json::json!([{}]));
        assert!(json[0].get(IDENTIFIER_KEY).is_none());
    }

    #[test]
    fn json_roundtrip_is_structurally_identical() {
        let records = fixture_records();
        let json = serde_json::to_string_pretty(&records).unwrap();
        let parsed: Vec<Record> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    // -----------------------------------------------------------------------
    // File wrappers
    // -----------------------------------------------------------------------

    #[test]
    fn extract_and_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.html");
        std::fs::write(&input, load_fixture("asrs-printable.html")).unwrap();

        let records = extract_file(&input, &MarkerClasses::default()).unwrap();
        let output = default_output_path(&input);
        assert_eq!(output, dir.path().join("export.json"));
        write_records(&output, &records).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("[\n  {\n    \"ACN\": \"2184152\""));
        let parsed: Vec<Record> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn undecodable_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.html");
        std::fs::write(&input, [0x3c, 0x70, 0xff, 0xfe]).unwrap();

        let err = extract_file(&input, &MarkerClasses::default()).unwrap_err();
        assert!(matches!(err, AsrsError::Decode { .. }));
    }

    #[test]
    fn missing_input_is_fatal() {
        let err = extract_file(Path::new("/nonexistent/export.html"), &MarkerClasses::default())
            .unwrap_err();
        assert!(matches!(err, AsrsError::Io { .. }));
    }
}
