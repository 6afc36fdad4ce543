use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde_json::json;

use crate::block::{Block, Inline, Mark, RichText, Target};

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        // Skip past the closing --- and any trailing newline
        let after_frontmatter = &markdown[3 + end + 4..];
        after_frontmatter.trim_start_matches('\n')
    } else {
        markdown
    }
}

/// Parse markdown text into a rich-text document
pub fn parse(markdown: &str) -> RichText {
    let markdown = strip_frontmatter(markdown);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut state = ParseState::default();

    for event in parser {
        process_event(event, &mut state);
    }

    RichText::new(state.blocks)
}

#[derive(Default)]
struct ParseState {
    // Finished top-level blocks
    blocks: Vec<Block>,
    // Open container blocks, innermost last
    containers: Vec<Container>,

    // Current inline content being built
    spans: Vec<Inline>,
    // Marks applied to text as it arrives
    marks: Vec<Mark>,
    // Parent span buffers for open links
    link_stack: Vec<(String, Vec<Inline>)>,
    // Open image: url, title, spans before it
    image: Option<(String, String, Vec<Inline>)>,

    // Current heading level (if in a heading)
    heading_level: Option<u8>,

    // Code block state
    in_code_block: bool,
    code_content: String,

    // Table state
    in_table_head: bool,
}

enum ContainerKind {
    List { ordered: bool },
    Item,
    Quote,
    Table,
    Row,
}

struct Container {
    kind: ContainerKind,
    children: Vec<Block>,
}

impl ParseState {
    /// Add a finished block to the innermost open container.
    fn emit(&mut self, block: Block) {
        match self.containers.last_mut() {
            Some(container) => container.children.push(block),
            None => self.blocks.push(block),
        }
    }

    fn open(&mut self, kind: ContainerKind) {
        self.containers.push(Container {
            kind,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(Container { kind, children }) = self.containers.pop() else {
            return;
        };
        let block = match kind {
            ContainerKind::List { ordered } => Block::list(ordered, children),
            ContainerKind::Item => Block::list_item(children),
            ContainerKind::Quote => Block::quote(children),
            ContainerKind::Table => Block::table(children),
            ContainerKind::Row => Block::table_row(children),
        };
        self.emit(block);
    }

    /// Loose inline content (tight list items) becomes a paragraph.
    fn flush_paragraph(&mut self) {
        let content = std::mem::take(&mut self.spans);
        if !content.is_empty() {
            self.emit(Block::paragraph(content));
        }
    }

    fn push_text(&mut self, text: String) {
        self.spans.push(Inline::marked(text, self.marks.clone()));
    }

    fn pop_mark(&mut self, mark: Mark) {
        if let Some(pos) = self.marks.iter().rposition(|m| *m == mark) {
            self.marks.remove(pos);
        }
    }
}

fn process_event(event: Event, state: &mut ParseState) {
    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.heading_level = Some(heading_level_to_u8(level));
        }
        Event::End(TagEnd::Heading(_)) => {
            if let Some(level) = state.heading_level.take() {
                let content = std::mem::take(&mut state.spans);
                state.emit(Block::heading(level, content));
            }
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => {}
        Event::End(TagEnd::Paragraph) => state.flush_paragraph(),

        // Text content
        Event::Text(text) => {
            if state.in_code_block {
                state.code_content.push_str(&text);
            } else {
                state.push_text(text.into_string());
            }
        }

        // Inline code
        Event::Code(code) => {
            let mut marks = state.marks.clone();
            marks.push(Mark::Code);
            state.spans.push(Inline::marked(code.into_string(), marks));
        }

        // Bold, italic, strikethrough
        Event::Start(Tag::Strong) => state.marks.push(Mark::Bold),
        Event::End(TagEnd::Strong) => state.pop_mark(Mark::Bold),
        Event::Start(Tag::Emphasis) => state.marks.push(Mark::Italic),
        Event::End(TagEnd::Emphasis) => state.pop_mark(Mark::Italic),
        Event::Start(Tag::Strikethrough) => state.marks.push(Mark::Strikethrough),
        Event::End(TagEnd::Strikethrough) => state.pop_mark(Mark::Strikethrough),

        // Links
        Event::Start(Tag::Link { dest_url, .. }) => {
            let parent = std::mem::take(&mut state.spans);
            state.link_stack.push((dest_url.into_string(), parent));
        }
        Event::End(TagEnd::Link) => {
            let link_content = std::mem::take(&mut state.spans);
            if let Some((url, mut parent)) = state.link_stack.pop() {
                parent.push(Inline::hyperlink(&url, link_content));
                state.spans = parent;
            }
        }

        // Images become embedded assets, splitting the paragraph around them
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            let before = std::mem::take(&mut state.spans);
            state.image = Some((dest_url.into_string(), title.into_string(), before));
        }
        Event::End(TagEnd::Image) => {
            let alt_spans = std::mem::take(&mut state.spans);
            if let Some((url, title, before)) = state.image.take() {
                let alt: String = alt_spans
                    .iter()
                    .map(|span| crate::text::plain_text(span))
                    .collect();
                state.spans = before;
                if state.link_stack.is_empty() {
                    state.flush_paragraph();
                    state.emit(asset_block(&url, &title, &alt));
                } else {
                    // Linked image: keep the alt text inside the link
                    state.push_text(alt);
                }
            }
        }

        // Code blocks have no rich-text counterpart; keep them as code-marked paragraphs
        Event::Start(Tag::CodeBlock(_)) => {
            state.in_code_block = true;
            state.code_content.clear();
        }
        Event::End(TagEnd::CodeBlock) => {
            state.in_code_block = false;
            let content = std::mem::take(&mut state.code_content);
            let content = content.strip_suffix('\n').unwrap_or(&content).to_string();
            state.emit(Block::paragraph(vec![Inline::marked(
                content,
                vec![Mark::Code],
            )]));
        }

        // Lists
        Event::Start(Tag::List(first_item)) => {
            // Tight item text before a nested list
            state.flush_paragraph();
            state.open(ContainerKind::List {
                ordered: first_item.is_some(),
            });
        }
        Event::End(TagEnd::List(_)) => state.close(),
        Event::Start(Tag::Item) => state.open(ContainerKind::Item),
        Event::End(TagEnd::Item) => {
            state.flush_paragraph();
            state.close();
        }

        // Block quotes
        Event::Start(Tag::BlockQuote(_)) => state.open(ContainerKind::Quote),
        Event::End(TagEnd::BlockQuote(_)) => {
            state.flush_paragraph();
            state.close();
        }

        // Tables
        Event::Start(Tag::Table(_)) => state.open(ContainerKind::Table),
        Event::End(TagEnd::Table) => state.close(),

        Event::Start(Tag::TableHead) => {
            state.in_table_head = true;
            state.open(ContainerKind::Row);
        }
        Event::End(TagEnd::TableHead) => {
            state.in_table_head = false;
            state.close();
        }

        Event::Start(Tag::TableRow) => state.open(ContainerKind::Row),
        Event::End(TagEnd::TableRow) => state.close(),

        Event::Start(Tag::TableCell) => {
            state.spans.clear();
        }
        Event::End(TagEnd::TableCell) => {
            let cell_content = std::mem::take(&mut state.spans);
            let header = state.in_table_head;
            state.emit(Block::table_cell(header, vec![Block::paragraph(cell_content)]));
        }

        // Horizontal rule
        Event::Rule => state.emit(Block::rule()),

        // Soft/hard breaks
        Event::SoftBreak => state.push_text(" ".to_string()),
        Event::HardBreak => state.push_text("\n".to_string()),

        // Ignore other events
        _ => {}
    }
}

/// An embedded asset in the CMS asset shape, pointing at an external URL.
fn asset_block(url: &str, title: &str, alt: &str) -> Block {
    Block::embedded(
        Target::Asset,
        json!({
            "target": {
                "fields": {
                    "title": alt,
                    "description": title,
                    "file": { "url": url }
                }
            }
        }),
    )
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(markdown: &str) -> Vec<Block> {
        match parse(markdown) {
            RichText::Document { content, .. } => content,
            other => panic!("unexpected document {other:?}"),
        }
    }

    #[test]
    fn heading_and_paragraph() {
        assert_eq!(
            blocks("## Title\n\nSome text."),
            vec![
                Block::heading(2, vec![Inline::text("Title")]),
                Block::paragraph(vec![Inline::text("Some text.")]),
            ]
        );
    }

    #[test]
    fn nested_marks() {
        assert_eq!(
            blocks("**1. Porto** is *great*"),
            vec![Block::paragraph(vec![
                Inline::marked("1. Porto", vec![Mark::Bold]),
                Inline::text(" is "),
                Inline::marked("great", vec![Mark::Italic]),
            ])]
        );
        assert_eq!(
            blocks("***both***"),
            vec![Block::paragraph(vec![Inline::marked(
                "both",
                vec![Mark::Italic, Mark::Bold]
            )])]
        );
    }

    #[test]
    fn inline_code_and_strikethrough() {
        assert_eq!(
            blocks("`x` ~~y~~"),
            vec![Block::paragraph(vec![
                Inline::marked("x", vec![Mark::Code]),
                Inline::text(" "),
                Inline::marked("y", vec![Mark::Strikethrough]),
            ])]
        );
    }

    #[test]
    fn link() {
        assert_eq!(
            blocks("[**Faro**](https://faro.example)"),
            vec![Block::paragraph(vec![Inline::hyperlink(
                "https://faro.example",
                vec![Inline::marked("Faro", vec![Mark::Bold])]
            )])]
        );
    }

    #[test]
    fn escaped_number_stays_a_paragraph() {
        let parsed = blocks("1\\. Lisbon");
        assert_eq!(parsed.len(), 1);
        assert!(matches!(parsed[0], Block::Paragraph { .. }));
        assert_eq!(crate::text::plain_text(&parsed[0]), "1. Lisbon");
    }

    #[test]
    fn tight_list() {
        assert_eq!(
            blocks("- one\n- two"),
            vec![Block::list(
                false,
                vec![
                    Block::list_item(vec![Block::paragraph(vec![Inline::text("one")])]),
                    Block::list_item(vec![Block::paragraph(vec![Inline::text("two")])]),
                ]
            )]
        );
    }

    #[test]
    fn nested_ordered_list() {
        let parsed = blocks("1. one\n   - inner\n2. two");
        let Block::List { ordered, items, .. } = &parsed[0] else {
            panic!("expected a list");
        };
        assert!(ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            Block::list_item(vec![
                Block::paragraph(vec![Inline::text("one")]),
                Block::list(
                    false,
                    vec![Block::list_item(vec![Block::paragraph(vec![
                        Inline::text("inner")
                    ])])],
                ),
            ])
        );
    }

    #[test]
    fn block_quote() {
        assert_eq!(
            blocks("> quoted"),
            vec![Block::quote(vec![Block::paragraph(vec![Inline::text(
                "quoted"
            )])])]
        );
    }

    #[test]
    fn image_splits_paragraph() {
        let parsed = blocks("Before ![A view](https://img.example/a.jpg \"Caption\") after");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], Block::paragraph(vec![Inline::text("Before ")]));
        assert_eq!(parsed[1], asset_block("https://img.example/a.jpg", "Caption", "A view"));
        assert_eq!(parsed[2], Block::paragraph(vec![Inline::text(" after")]));
    }

    #[test]
    fn table() {
        let parsed = blocks("| A | B |\n|---|---|\n| 1 | 2 |");
        let cell = |header, text: &str| {
            Block::table_cell(header, vec![Block::paragraph(vec![Inline::text(text)])])
        };
        assert_eq!(
            parsed,
            vec![Block::table(vec![
                Block::table_row(vec![cell(true, "A"), cell(true, "B")]),
                Block::table_row(vec![cell(false, "1"), cell(false, "2")]),
            ])]
        );
    }

    #[test]
    fn code_block() {
        assert_eq!(
            blocks("```\nlet x = 1;\n```"),
            vec![Block::paragraph(vec![Inline::marked(
                "let x = 1;",
                vec![Mark::Code]
            )])]
        );
    }

    #[test]
    fn rule_and_breaks() {
        let parsed = blocks("a\nb  \nc\n\n---");
        assert_eq!(parsed.len(), 2);
        assert_eq!(crate::text::plain_text(&parsed[0]), "a b\nc");
        assert_eq!(parsed[1], Block::rule());
    }

    #[test]
    fn frontmatter_is_stripped() {
        assert_eq!(
            blocks("---\ntitle: x\n---\n\nBody"),
            vec![Block::paragraph(vec![Inline::text("Body")])]
        );
    }
}
