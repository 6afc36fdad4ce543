mod block;
mod classify;
mod config;
mod error;
mod parser;
mod render;
mod segment;
mod split;
mod text;

pub use block::{Attrs, Block, Inline, Mark, RichText, Target};
pub use classify::{ListMarker, classify, is_list_item};
pub use config::{Config, ConfigError, SegmentConfig, TextConfig};
pub use error::Error;
pub use render::{blocks_to_markdown, layout_to_markdown};
pub use segment::{Intro, Region, Section, Segmentation, Segmenter, Slot, segment};
pub use split::{count_inline_items, split_numbered_paragraph};
pub use text::{NodeRef, TextExtractor, plain_text};

/// Parse markdown text into a rich-text document.
pub fn parse_markdown(markdown: &str) -> RichText {
    parser::parse(markdown)
}

/// Parse a rich-text JSON document. A JSON `null` yields `None`; any other
/// well-formed JSON is accepted, and values that are not documents come back
/// unchanged from segmentation.
pub fn parse_json(json: &str) -> Result<Option<RichText>, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Segment a document using custom config.
pub fn segment_with_config<'a>(document: Option<&'a RichText>, config: &Config) -> Segmentation<'a> {
    Segmenter::new(config).segment(document)
}

/// Render a document as a Markdown preview of its layout using default config.
pub fn markdown_preview(document: Option<&RichText>) -> String {
    markdown_preview_with_config(document, &Config::compiled_default())
}

/// Render a document as a Markdown preview of its layout with custom config.
pub fn markdown_preview_with_config(document: Option<&RichText>, config: &Config) -> String {
    render::layout_to_markdown(&segment_with_config(document, config))
}
