use serde_json::Value;

use crate::block::{Block, Inline, Mark, Target};
use crate::segment::{Segmentation, Slot};
use crate::text::plain_text;

/// Render a segmented body as Markdown, with image placeholders between sections.
pub fn layout_to_markdown(segmentation: &Segmentation) -> String {
    let mut out = String::new();

    for slot in segmentation.layout() {
        match slot {
            Slot::Text { blocks, .. } => out.push_str(&blocks_to_markdown(blocks)),
            Slot::Image(n) => {
                out.push_str(&format!("![image {n}](image-{n})\n\n"));
            }
        }
    }

    out
}

/// Convert blocks to Markdown, each block followed by a blank line
pub fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        emit_block(block, &mut out);
    }
    out
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, content, .. } => {
            for _ in 0..(*level).clamp(1, 6) {
                out.push('#');
            }
            out.push(' ');
            inlines_to_markdown(content, out);
            out.push_str("\n\n");
        }
        Block::Paragraph { content, .. } => {
            let mut text = String::new();
            inlines_to_markdown(content, &mut text);
            out.push_str(&escape_line_starts(&text));
            out.push_str("\n\n");
        }
        Block::List { ordered, items, .. } => {
            list_to_markdown(*ordered, items, out);
            out.push('\n');
        }
        Block::ListItem { .. } => {
            list_to_markdown(false, std::slice::from_ref(block), out);
            out.push('\n');
        }
        Block::Quote { content, .. } => {
            let inner = blocks_to_markdown(content);
            for line in inner.trim_end().lines() {
                if line.is_empty() {
                    out.push_str(">\n");
                } else {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        Block::Rule { .. } => {
            out.push_str("---\n\n");
        }
        Block::Table { rows, .. } => {
            table_to_markdown(rows, out);
            out.push('\n');
        }
        Block::TableRow { .. } | Block::TableCell { .. } => {
            table_to_markdown(std::slice::from_ref(block), out);
            out.push('\n');
        }
        Block::Embedded { target, attrs } => {
            out.push_str(&embedded_to_markdown(*target, attrs.data()));
            out.push_str("\n\n");
        }
        Block::Opaque(_) => {
            let text = plain_text(block);
            if !text.is_empty() {
                out.push_str(&escape(&text));
                out.push_str("\n\n");
            }
        }
    }
}

fn inlines_to_markdown(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline_to_markdown(inline, out);
    }
}

fn inline_to_markdown(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text { value, marks, .. } => {
            if value.is_empty() {
                return;
            }
            let mut text = if marks.contains(&Mark::Code) {
                // Inside code spans, backticks need a longer fence
                let fence = if value.contains('`') { "``" } else { "`" };
                format!("{fence}{value}{fence}")
            } else {
                escape(value)
            };
            if marks.contains(&Mark::Italic) {
                text = format!("*{text}*");
            }
            if marks.contains(&Mark::Bold) {
                text = format!("**{text}**");
            }
            if marks.contains(&Mark::Strikethrough) {
                text = format!("~~{text}~~");
            }
            out.push_str(&text);
        }
        Inline::Link {
            target: None,
            content,
            attrs,
        } => {
            out.push('[');
            inlines_to_markdown(content, out);
            out.push_str("](");
            out.push_str(attrs.data().get("uri").and_then(Value::as_str).unwrap_or("#"));
            out.push(')');
        }
        Inline::Link { content, .. } => inlines_to_markdown(content, out),
        Inline::Embedded { .. } => {}
        Inline::Opaque(_) => out.push_str(&escape(&plain_text(inline))),
    }
}

fn list_to_markdown(ordered: bool, items: &[Block], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", i + 1)
        } else {
            "- ".to_string()
        };
        let indent = " ".repeat(marker.len());

        let body = match item {
            Block::ListItem { content, .. } => item_body(content),
            other => item_body(std::slice::from_ref(other)),
        };
        let mut lines = body.lines();
        out.push_str(&marker);
        out.push_str(lines.next().unwrap_or(""));
        out.push('\n');
        for line in lines {
            if !line.is_empty() {
                out.push_str(&indent);
                out.push_str(line);
            }
            out.push('\n');
        }
    }
}

/// Item children on consecutive lines, keeping the list tight.
fn item_body(children: &[Block]) -> String {
    children
        .iter()
        .map(|child| blocks_to_markdown(std::slice::from_ref(child)).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_to_markdown(rows: &[Block], out: &mut String) {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| match row {
            Block::TableRow { cells, .. } => cells.iter().map(cell_to_markdown).collect(),
            other => vec![cell_to_markdown(other)],
        })
        .collect();
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return;
    }

    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for col in 0..col_count {
            out.push(' ');
            out.push_str(row.get(col).map(String::as_str).unwrap_or(""));
            out.push_str(" |");
        }
        out.push('\n');

        // The first row is always the header
        if i == 0 {
            out.push('|');
            for _ in 0..col_count {
                out.push_str("---|");
            }
            out.push('\n');
        }
    }
}

fn cell_to_markdown(cell: &Block) -> String {
    let content = match cell {
        Block::TableCell { content, .. } => content.as_slice(),
        other => std::slice::from_ref(other),
    };
    let mut out = String::new();
    for block in content {
        match block {
            Block::Paragraph { content, .. } => inlines_to_markdown(content, &mut out),
            other => out.push_str(&escape(&plain_text(other))),
        }
        out.push(' ');
    }
    out.trim_end().replace('\n', " ")
}

fn embedded_to_markdown(target: Target, data: &Value) -> String {
    let fields = &data["target"]["fields"];
    match target {
        Target::Asset => {
            let url = fields["file"]["url"].as_str().unwrap_or("");
            let alt = fields["title"].as_str().unwrap_or("");
            match fields["description"].as_str().filter(|d| !d.is_empty()) {
                Some(title) => format!("![{}]({url} \"{}\")", escape(alt), title.replace('"', "\\\"")),
                None => format!("![{}]({url})", escape(alt)),
            }
        }
        Target::Entry | Target::Resource => {
            let id = data["target"]["sys"]["id"]
                .as_str()
                .or_else(|| data["target"]["sys"]["urn"].as_str())
                .unwrap_or("unknown");
            format!("<!-- embedded {}: {id} -->", target_name(target))
        }
    }
}

fn target_name(target: Target) -> &'static str {
    match target {
        Target::Entry => "entry",
        Target::Asset => "asset",
        Target::Resource => "resource",
    }
}

/// Escape characters Markdown would treat as syntax
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>' | '#' | '~' | '|' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("  \n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape list, rule and setext markers at the start of each line of paragraph text.
fn escape_line_starts(text: &str) -> String {
    text.split('\n')
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_line_start(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t']);
    let (indent, body) = line.split_at(line.len() - body.len());
    if body.starts_with(['-', '+', '=']) {
        return format!("{indent}\\{body}");
    }
    // "12." or "12)" would turn into an ordered list
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && body[digits..].starts_with(['.', ')']) {
        format!("{indent}{}\\{}", &body[..digits], &body[digits..])
    } else {
        line.to_string()
    }
}
