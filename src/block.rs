use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const DOCUMENT: &str = "document";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADINGS: [&str; 6] = [
    "heading-1",
    "heading-2",
    "heading-3",
    "heading-4",
    "heading-5",
    "heading-6",
];
pub const ORDERED_LIST: &str = "ordered-list";
pub const UNORDERED_LIST: &str = "unordered-list";
pub const LIST_ITEM: &str = "list-item";
pub const QUOTE: &str = "blockquote";
pub const HR: &str = "hr";
pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "table-row";
pub const TABLE_CELL: &str = "table-cell";
pub const TABLE_HEADER_CELL: &str = "table-header-cell";
pub const TEXT: &str = "text";
pub const HYPERLINK: &str = "hyperlink";

/// Formatting marks carried by text nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
    Superscript,
    Subscript,
    Strikethrough,
    Other(String),
}

impl Mark {
    pub fn from_name(name: &str) -> Self {
        match name {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "code" => Mark::Code,
            "superscript" => Mark::Superscript,
            "subscript" => Mark::Subscript,
            "strikethrough" => Mark::Strikethrough,
            other => Mark::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Code => "code",
            Mark::Superscript => "superscript",
            Mark::Subscript => "subscript",
            Mark::Strikethrough => "strikethrough",
            Mark::Other(name) => name,
        }
    }
}

/// What an embedded node or a reference link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Entry,
    Asset,
    Resource,
}

/// Keys of a node outside its typed fields, `data` included, kept as they were read.
#[derive(Debug, Clone, PartialEq)]
pub struct Attrs(Map<String, Value>);

static NULL: Value = Value::Null;

impl Default for Attrs {
    fn default() -> Self {
        Self::with_data(empty_data())
    }
}

impl Attrs {
    pub fn with_data(data: Value) -> Self {
        let mut map = Map::new();
        map.insert("data".to_string(), data);
        Attrs(map)
    }

    /// Attributes of a node without child nodes: `data` plus an empty `content`.
    fn leaf(data: Value) -> Self {
        let mut attrs = Self::with_data(data);
        attrs.0.insert("content".to_string(), Value::Array(Vec::new()));
        attrs
    }

    /// The node's `data`, or `null` when it has none.
    pub fn data(&self) -> &Value {
        self.get("data").unwrap_or(&NULL)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Raw `content` children the typed model does not hold.
    pub(crate) fn children(&self) -> &[Value] {
        self.get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn into_node(self, node_type: &str) -> Map<String, Value> {
        let mut node = self.0;
        node.insert("nodeType".to_string(), Value::String(node_type.to_string()));
        node
    }
}

/// Inline nodes inside text-bearing blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Inline {
    Text {
        value: String,
        marks: Vec<Mark>,
        attrs: Attrs,
    },
    /// `hyperlink` (target `None`, URL in `data.uri`) or an entry/asset/resource hyperlink
    Link {
        target: Option<Target>,
        content: Vec<Inline>,
        attrs: Attrs,
    },
    Embedded {
        target: Target,
        attrs: Attrs,
    },
    /// Unknown or malformed node, kept as raw JSON
    Opaque(Value),
}

/// Block-level rich-text nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
        attrs: Attrs,
    },
    Heading {
        level: u8,
        content: Vec<Inline>,
        attrs: Attrs,
    },
    List {
        ordered: bool,
        items: Vec<Block>,
        attrs: Attrs,
    },
    ListItem {
        content: Vec<Block>,
        attrs: Attrs,
    },
    Quote {
        content: Vec<Block>,
        attrs: Attrs,
    },
    Rule {
        attrs: Attrs,
    },
    Table {
        rows: Vec<Block>,
        attrs: Attrs,
    },
    TableRow {
        cells: Vec<Block>,
        attrs: Attrs,
    },
    TableCell {
        header: bool,
        content: Vec<Block>,
        attrs: Attrs,
    },
    Embedded {
        target: Target,
        attrs: Attrs,
    },
    /// Unknown or malformed node, kept as raw JSON
    Opaque(Value),
}

/// A rich-text document as delivered by the CMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RichText {
    /// An object with an array `content`; `attrs` holds every other key, `nodeType` included.
    Document { content: Vec<Block>, attrs: Attrs },
    /// Anything else. It is never split and is written back as it was read.
    Raw(Value),
}

impl RichText {
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut attrs = Attrs::default();
        attrs
            .0
            .insert("nodeType".to_string(), Value::String(DOCUMENT.to_string()));
        RichText::Document {
            content: blocks,
            attrs,
        }
    }

    /// The block sequence, or `None` when the content is missing or not an array.
    pub fn blocks(&self) -> Option<&[Block]> {
        match self {
            RichText::Document { content, .. } => Some(content.as_slice()),
            RichText::Raw(_) => None,
        }
    }
}

fn empty_data() -> Value {
    Value::Object(Map::new())
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Self::marked(value, Vec::new())
    }

    pub fn marked(value: impl Into<String>, marks: Vec<Mark>) -> Self {
        Inline::Text {
            value: value.into(),
            marks,
            attrs: Attrs::default(),
        }
    }

    pub fn hyperlink(uri: &str, content: Vec<Inline>) -> Self {
        Inline::Link {
            target: None,
            content,
            attrs: Attrs::with_data(json!({ "uri": uri })),
        }
    }

    pub fn node_type(&self) -> &str {
        match self {
            Inline::Text { .. } => TEXT,
            Inline::Link { target, .. } => match target {
                None => HYPERLINK,
                Some(Target::Entry) => "entry-hyperlink",
                Some(Target::Asset) => "asset-hyperlink",
                Some(Target::Resource) => "resource-hyperlink",
            },
            Inline::Embedded { target, .. } => match target {
                Target::Entry => "embedded-entry-inline",
                Target::Asset => "embedded-asset-inline",
                Target::Resource => "embedded-resource-inline",
            },
            Inline::Opaque(raw) => raw_node_type(raw),
        }
    }

    /// Whether this node itself carries a `bold` mark.
    pub fn is_bold(&self) -> bool {
        match self {
            Inline::Text { marks, .. } => marks.contains(&Mark::Bold),
            Inline::Link { attrs, .. } | Inline::Embedded { attrs, .. } => {
                attrs.get("marks").is_some_and(marks_have_bold)
            }
            Inline::Opaque(raw) => raw_has_bold(raw),
        }
    }

    /// Whether this node's first nested content element carries a `bold` mark.
    pub fn first_child_is_bold(&self) -> bool {
        match self {
            Inline::Link { content, .. } => content.first().is_some_and(Inline::is_bold),
            Inline::Text { attrs, .. } | Inline::Embedded { attrs, .. } => {
                attrs.children().first().is_some_and(raw_has_bold)
            }
            Inline::Opaque(raw) => raw
                .get("content")
                .and_then(Value::as_array)
                .and_then(|children| children.first())
                .is_some_and(raw_has_bold),
        }
    }
}

impl Block {
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph {
            content,
            attrs: Attrs::default(),
        }
    }

    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Block::Heading {
            level,
            content,
            attrs: Attrs::default(),
        }
    }

    pub fn list(ordered: bool, items: Vec<Block>) -> Self {
        Block::List {
            ordered,
            items,
            attrs: Attrs::default(),
        }
    }

    pub fn list_item(content: Vec<Block>) -> Self {
        Block::ListItem {
            content,
            attrs: Attrs::default(),
        }
    }

    pub fn quote(content: Vec<Block>) -> Self {
        Block::Quote {
            content,
            attrs: Attrs::default(),
        }
    }

    pub fn rule() -> Self {
        Block::Rule {
            attrs: Attrs::leaf(empty_data()),
        }
    }

    pub fn table(rows: Vec<Block>) -> Self {
        Block::Table {
            rows,
            attrs: Attrs::default(),
        }
    }

    pub fn table_row(cells: Vec<Block>) -> Self {
        Block::TableRow {
            cells,
            attrs: Attrs::default(),
        }
    }

    pub fn table_cell(header: bool, content: Vec<Block>) -> Self {
        Block::TableCell {
            header,
            content,
            attrs: Attrs::default(),
        }
    }

    pub fn embedded(target: Target, data: Value) -> Self {
        Block::Embedded {
            target,
            attrs: Attrs::leaf(data),
        }
    }

    pub fn node_type(&self) -> &str {
        match self {
            Block::Paragraph { .. } => PARAGRAPH,
            Block::Heading { level, .. } => HEADINGS[usize::from((*level).clamp(1, 6) - 1)],
            Block::List { ordered: true, .. } => ORDERED_LIST,
            Block::List { ordered: false, .. } => UNORDERED_LIST,
            Block::ListItem { .. } => LIST_ITEM,
            Block::Quote { .. } => QUOTE,
            Block::Rule { .. } => HR,
            Block::Table { .. } => TABLE,
            Block::TableRow { .. } => TABLE_ROW,
            Block::TableCell { header: false, .. } => TABLE_CELL,
            Block::TableCell { header: true, .. } => TABLE_HEADER_CELL,
            Block::Embedded { target, .. } => match target {
                Target::Entry => "embedded-entry-block",
                Target::Asset => "embedded-asset-block",
                Target::Resource => "embedded-resource-block",
            },
            Block::Opaque(raw) => raw_node_type(raw),
        }
    }
}

fn raw_node_type(raw: &Value) -> &str {
    raw.get("nodeType").and_then(Value::as_str).unwrap_or("unknown")
}

fn raw_has_bold(raw: &Value) -> bool {
    raw.get("marks").is_some_and(marks_have_bold)
}

fn marks_have_bold(marks: &Value) -> bool {
    marks.as_array().is_some_and(|marks| {
        marks
            .iter()
            .any(|mark| mark.get("type").and_then(Value::as_str) == Some("bold"))
    })
}

// JSON -> nodes. Conversion is total: anything the typed model can't represent
// becomes `Opaque` with its JSON untouched. Typed nodes keep their other keys
// in `Attrs`, so converting back yields the same JSON.

#[derive(Clone, Copy)]
enum BlockShape {
    Paragraph,
    Heading(u8),
    List(bool),
    ListItem,
    Quote,
    Rule,
    Table,
    TableRow,
    TableCell(bool),
    Embedded(Target),
}

impl BlockShape {
    fn of(node_type: &str) -> Option<Self> {
        if let Some(pos) = HEADINGS.iter().position(|h| *h == node_type) {
            return Some(BlockShape::Heading(pos as u8 + 1));
        }
        let shape = match node_type {
            PARAGRAPH => BlockShape::Paragraph,
            ORDERED_LIST => BlockShape::List(true),
            UNORDERED_LIST => BlockShape::List(false),
            LIST_ITEM => BlockShape::ListItem,
            QUOTE => BlockShape::Quote,
            HR => BlockShape::Rule,
            TABLE => BlockShape::Table,
            TABLE_ROW => BlockShape::TableRow,
            TABLE_CELL => BlockShape::TableCell(false),
            TABLE_HEADER_CELL => BlockShape::TableCell(true),
            "embedded-entry-block" => BlockShape::Embedded(Target::Entry),
            "embedded-asset-block" => BlockShape::Embedded(Target::Asset),
            "embedded-resource-block" => BlockShape::Embedded(Target::Resource),
            _ => return None,
        };
        Some(shape)
    }
}

#[derive(Clone, Copy)]
enum InlineShape {
    Text,
    Link(Option<Target>),
    Embedded(Target),
}

impl InlineShape {
    fn of(node_type: &str) -> Option<Self> {
        let shape = match node_type {
            TEXT => InlineShape::Text,
            HYPERLINK => InlineShape::Link(None),
            "entry-hyperlink" => InlineShape::Link(Some(Target::Entry)),
            "asset-hyperlink" => InlineShape::Link(Some(Target::Asset)),
            "resource-hyperlink" => InlineShape::Link(Some(Target::Resource)),
            "embedded-entry-inline" => InlineShape::Embedded(Target::Entry),
            "embedded-asset-inline" => InlineShape::Embedded(Target::Asset),
            "embedded-resource-inline" => InlineShape::Embedded(Target::Resource),
            _ => return None,
        };
        Some(shape)
    }
}

/// Removes `content` if it is an array; anything else is left in place.
fn take_children(node: &mut Map<String, Value>) -> Option<Vec<Value>> {
    match node.remove("content") {
        Some(Value::Array(items)) => Some(items),
        Some(other) => {
            node.insert("content".to_string(), other);
            None
        }
        None => None,
    }
}

/// Marks written exactly as `{"type": name}`; anything else can't be written back as read.
fn parse_marks(raw: &Value) -> Option<Vec<Mark>> {
    raw.as_array()?
        .iter()
        .map(|mark| {
            let mark = mark.as_object().filter(|mark| mark.len() == 1)?;
            mark.get("type").and_then(Value::as_str).map(Mark::from_name)
        })
        .collect()
}

impl From<Value> for Block {
    fn from(value: Value) -> Self {
        let mut node = match value {
            Value::Object(node) => node,
            other => return Block::Opaque(other),
        };
        let Some(shape) = node
            .get("nodeType")
            .and_then(Value::as_str)
            .and_then(BlockShape::of)
        else {
            return Block::Opaque(Value::Object(node));
        };

        let children = match shape {
            BlockShape::Rule | BlockShape::Embedded(_) => Vec::new(),
            _ => match take_children(&mut node) {
                Some(children) => children,
                None => return Block::Opaque(Value::Object(node)),
            },
        };
        node.remove("nodeType");
        let attrs = Attrs(node);

        let inlines = |children: Vec<Value>| -> Vec<Inline> {
            children.into_iter().map(Inline::from).collect()
        };
        let blocks = |children: Vec<Value>| -> Vec<Block> {
            children.into_iter().map(Block::from).collect()
        };

        match shape {
            BlockShape::Paragraph => Block::Paragraph {
                content: inlines(children),
                attrs,
            },
            BlockShape::Heading(level) => Block::Heading {
                level,
                content: inlines(children),
                attrs,
            },
            BlockShape::List(ordered) => Block::List {
                ordered,
                items: blocks(children),
                attrs,
            },
            BlockShape::ListItem => Block::ListItem {
                content: blocks(children),
                attrs,
            },
            BlockShape::Quote => Block::Quote {
                content: blocks(children),
                attrs,
            },
            BlockShape::Rule => Block::Rule { attrs },
            BlockShape::Table => Block::Table {
                rows: blocks(children),
                attrs,
            },
            BlockShape::TableRow => Block::TableRow {
                cells: blocks(children),
                attrs,
            },
            BlockShape::TableCell(header) => Block::TableCell {
                header,
                content: blocks(children),
                attrs,
            },
            BlockShape::Embedded(target) => Block::Embedded { target, attrs },
        }
    }
}

impl From<Value> for Inline {
    fn from(value: Value) -> Self {
        let mut node = match value {
            Value::Object(node) => node,
            other => return Inline::Opaque(other),
        };
        let Some(shape) = node
            .get("nodeType")
            .and_then(Value::as_str)
            .and_then(InlineShape::of)
        else {
            return Inline::Opaque(Value::Object(node));
        };

        match shape {
            InlineShape::Text => {
                let text = node.get("value").and_then(Value::as_str).map(str::to_owned);
                let marks = node.get("marks").and_then(parse_marks);
                let (Some(value), Some(marks)) = (text, marks) else {
                    return Inline::Opaque(Value::Object(node));
                };
                for key in ["nodeType", "value", "marks"] {
                    node.remove(key);
                }
                Inline::Text {
                    value,
                    marks,
                    attrs: Attrs(node),
                }
            }
            InlineShape::Link(target) => match take_children(&mut node) {
                Some(children) => {
                    node.remove("nodeType");
                    Inline::Link {
                        target,
                        content: children.into_iter().map(Inline::from).collect(),
                        attrs: Attrs(node),
                    }
                }
                None => Inline::Opaque(Value::Object(node)),
            },
            InlineShape::Embedded(target) => {
                node.remove("nodeType");
                Inline::Embedded {
                    target,
                    attrs: Attrs(node),
                }
            }
        }
    }
}

impl From<Value> for RichText {
    fn from(value: Value) -> Self {
        let mut node = match value {
            Value::Object(node) => node,
            other => return RichText::Raw(other),
        };
        match take_children(&mut node) {
            Some(children) => RichText::Document {
                content: children.into_iter().map(Block::from).collect(),
                attrs: Attrs(node),
            },
            None => RichText::Raw(Value::Object(node)),
        }
    }
}

// Nodes -> JSON, in the CMS shape.

fn with_content(attrs: Attrs, node_type: &str, content: Vec<Value>) -> Value {
    let mut node = attrs.into_node(node_type);
    node.insert("content".to_string(), Value::Array(content));
    Value::Object(node)
}

fn values<T: Into<Value>>(nodes: Vec<T>) -> Vec<Value> {
    nodes.into_iter().map(Into::into).collect()
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        let node_type = block.node_type().to_string();
        match block {
            Block::Paragraph { content, attrs } | Block::Heading { content, attrs, .. } => {
                with_content(attrs, &node_type, values(content))
            }
            Block::List {
                items: content,
                attrs,
                ..
            }
            | Block::ListItem { content, attrs }
            | Block::Quote { content, attrs }
            | Block::Table {
                rows: content,
                attrs,
            }
            | Block::TableRow {
                cells: content,
                attrs,
            }
            | Block::TableCell { content, attrs, .. } => {
                with_content(attrs, &node_type, values(content))
            }
            // Leaf nodes keep whatever `content` they were read with
            Block::Rule { attrs } | Block::Embedded { attrs, .. } => {
                Value::Object(attrs.into_node(&node_type))
            }
            Block::Opaque(raw) => raw,
        }
    }
}

impl From<Inline> for Value {
    fn from(inline: Inline) -> Self {
        let node_type = inline.node_type().to_string();
        match inline {
            Inline::Text {
                value,
                marks,
                attrs,
            } => {
                let marks: Vec<Value> = marks
                    .iter()
                    .map(|mark| json!({ "type": mark.name() }))
                    .collect();
                let mut node = attrs.into_node(&node_type);
                node.insert("value".to_string(), Value::String(value));
                node.insert("marks".to_string(), Value::Array(marks));
                Value::Object(node)
            }
            Inline::Link { content, attrs, .. } => {
                with_content(attrs, &node_type, values(content))
            }
            Inline::Embedded { attrs, .. } => Value::Object(attrs.into_node(&node_type)),
            Inline::Opaque(raw) => raw,
        }
    }
}

impl From<RichText> for Value {
    fn from(document: RichText) -> Self {
        match document {
            RichText::Document { content, attrs } => {
                let mut node = attrs.0;
                node.insert("content".to_string(), Value::Array(values(content)));
                Value::Object(node)
            }
            RichText::Raw(raw) => raw,
        }
    }
}
