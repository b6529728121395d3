//! Flat view of a printable export: every `<p>` in document order, tagged
//! with the marker role its class attribute carries.

use std::sync::LazyLock;

use asrskit_shared::MarkerClasses;
use scraper::{ElementRef, Html, Selector};

static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector"));

/// Interpretation of a paragraph, decided by its class attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opens a new record.
    Heading,
    /// Names the section that following data paragraphs belong to.
    Section,
    /// Carries `label : value` lines and/or narrative, separated by `<br>`.
    Data,
    Other,
}

/// One paragraph of the document.
#[derive(Debug, Clone)]
pub struct MarkerNode {
    pub role: Role,
    /// Raw inner markup, needed to split data blocks on `<br>`.
    pub inner_html: String,
    /// Whitespace-collapsed plain text.
    pub text: String,
}

/// Ordered sequence of marked paragraphs.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<MarkerNode>,
}

impl Document {
    /// Parse markup and tag each paragraph with its role.
    pub fn parse(html: &str, markers: &MarkerClasses) -> Self {
        let doc = Html::parse_document(html);
        let nodes = doc
            .select(&PARAGRAPH_SEL)
            .map(|el| MarkerNode {
                role: role_of(&el, markers),
                inner_html: el.inner_html(),
                text: collapse_text(el.text()),
            })
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[MarkerNode] {
        &self.nodes
    }

    pub fn heading_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.role == Role::Heading).count()
    }
}

/// Heading wins over section, section over data, when a paragraph carries several.
fn role_of(el: &ElementRef, markers: &MarkerClasses) -> Role {
    let has = |name: &str| el.value().classes().any(|c| c == name);

    if has(&markers.heading_class) {
        Role::Heading
    } else if has(&markers.section_class) {
        Role::Section
    } else if has(&markers.data_class) {
        Role::Data
    } else {
        Role::Other
    }
}

/// Join text nodes with single spaces, collapsing runs of whitespace and trimming ends.
pub(crate) fn collapse_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
