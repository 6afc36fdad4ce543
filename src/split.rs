use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::block::Block;
use crate::text::plain_text;

// "1. Foo": digits, period, whitespace, capital letter
static INLINE_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.\s[A-Z]").unwrap());

/// Number of numbered-item starts ("3. Title") found in a block's text.
pub fn count_inline_items(block: &Block) -> usize {
    INLINE_ITEM_RE.find_iter(&plain_text(block)).count()
}

/// Returns the paragraph as a single-element result.
///
/// Paragraphs that pack several numbered items together ("1. Foo 2. Bar") are
/// detected but not split yet; they are logged and passed through unchanged.
pub fn split_numbered_paragraph(block: &Block) -> Vec<&Block> {
    let found = count_inline_items(block);
    if found >= 2 {
        warn!(
            items = found,
            "paragraph holds several numbered items, leaving it unsplit"
        );
    }
    vec![block]
}
