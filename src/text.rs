use serde_json::Value;
use tracing::warn;

use crate::block::{Attrs, Block, Inline, TEXT};

/// Nesting depth used when no configuration is given.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Any node text can be extracted from
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Block(&'a Block),
    Inline(&'a Inline),
    Json(&'a Value),
}

impl<'a> From<&'a Block> for NodeRef<'a> {
    fn from(block: &'a Block) -> Self {
        NodeRef::Block(block)
    }
}

impl<'a> From<&'a Inline> for NodeRef<'a> {
    fn from(inline: &'a Inline) -> Self {
        NodeRef::Inline(inline)
    }
}

impl<'a> From<&'a Value> for NodeRef<'a> {
    fn from(value: &'a Value) -> Self {
        NodeRef::Json(value)
    }
}

/// Concatenates the values of all text descendants of a node.
#[derive(Debug, Clone, Copy)]
pub struct TextExtractor {
    max_depth: usize,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl TextExtractor {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Plain text of `node`, depth first, with no separators. `None` yields an empty string.
    pub fn extract(&self, node: Option<NodeRef<'_>>) -> String {
        let mut walk = Walk {
            out: String::new(),
            max_depth: self.max_depth,
            truncated: false,
        };
        match node {
            Some(NodeRef::Block(block)) => walk.block(block, 0),
            Some(NodeRef::Inline(inline)) => walk.inline(inline, 0),
            Some(NodeRef::Json(value)) => walk.json(value, 0),
            None => {}
        }
        if walk.truncated {
            warn!(
                max_depth = self.max_depth,
                "rich text nested deeper than the depth limit, text below it was skipped"
            );
        }
        walk.out
    }
}

/// Plain text of a node using the default depth limit.
pub fn plain_text<'a>(node: impl Into<NodeRef<'a>>) -> String {
    TextExtractor::default().extract(Some(node.into()))
}

struct Walk {
    out: String,
    max_depth: usize,
    truncated: bool,
}

impl Walk {
    fn enter(&mut self, depth: usize) -> bool {
        if depth >= self.max_depth {
            self.truncated = true;
            return false;
        }
        true
    }

    fn block(&mut self, block: &Block, depth: usize) {
        if !self.enter(depth) {
            return;
        }
        match block {
            Block::Paragraph { content, .. } | Block::Heading { content, .. } => {
                for inline in content {
                    self.inline(inline, depth + 1);
                }
            }
            Block::List { items: content, .. }
            | Block::ListItem { content, .. }
            | Block::Quote { content, .. }
            | Block::Table { rows: content, .. }
            | Block::TableRow { cells: content, .. }
            | Block::TableCell { content, .. } => {
                for child in content {
                    self.block(child, depth + 1);
                }
            }
            Block::Rule { attrs } | Block::Embedded { attrs, .. } => self.children(attrs, depth),
            Block::Opaque(raw) => self.json(raw, depth),
        }
    }

    fn inline(&mut self, inline: &Inline, depth: usize) {
        if !self.enter(depth) {
            return;
        }
        match inline {
            Inline::Text { value, .. } => self.out.push_str(value),
            Inline::Link { content, .. } => {
                for child in content {
                    self.inline(child, depth + 1);
                }
            }
            Inline::Embedded { attrs, .. } => self.children(attrs, depth),
            Inline::Opaque(raw) => self.json(raw, depth),
        }
    }

    fn children(&mut self, attrs: &Attrs, depth: usize) {
        for child in attrs.children() {
            self.json(child, depth + 1);
        }
    }

    fn json(&mut self, value: &Value, depth: usize) {
        if !self.enter(depth) {
            return;
        }
        if value.get("nodeType").and_then(Value::as_str) == Some(TEXT) {
            if let Some(text) = value.get("value").and_then(Value::as_str) {
                self.out.push_str(text);
            }
            return;
        }
        if let Some(children) = value.get("content").and_then(Value::as_array) {
            for child in children {
                self.json(child, depth + 1);
            }
        }
    }
}
