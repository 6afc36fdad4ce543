use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::block::{Block, Inline};
use crate::text::{NodeRef, TextExtractor};

// ASCII digits only; `\d` would also accept other Unicode digits.
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.").unwrap());

/// Why a paragraph counts as a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListMarker {
    /// Text starts with `N.`
    Numbered,
    /// First inline run (or its first child) is bold
    BoldLead,
}

/// Classify a block, returning the marker that makes it a list item.
pub fn classify(block: &Block) -> Option<ListMarker> {
    classify_with(block, &TextExtractor::default())
}

/// Whether a block is a list item of a listicle.
pub fn is_list_item(block: &Block) -> bool {
    classify(block).is_some()
}

pub(crate) fn classify_with(block: &Block, extractor: &TextExtractor) -> Option<ListMarker> {
    let Block::Paragraph { content, .. } = block else {
        return None;
    };
    let text = extractor.extract(Some(NodeRef::Block(block)));
    if NUMBERED_RE.is_match(trim_start(&text)) {
        return Some(ListMarker::Numbered);
    }
    if starts_bold(content) {
        return Some(ListMarker::BoldLead);
    }
    None
}

/// Leading whitespace and byte order marks, which CMS text sometimes starts with.
fn trim_start(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Only the first inline and that inline's own first child are looked at.
fn starts_bold(content: &[Inline]) -> bool {
    content
        .first()
        .is_some_and(|first| first.is_bold() || first.first_child_is_bold())
}
