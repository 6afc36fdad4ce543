use std::ops::Range;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::debug;

use crate::block::{Attrs, Block, RichText};
use crate::classify::classify_with;
use crate::config::{Config, SegmentConfig};
use crate::text::TextExtractor;

/// A contiguous run of a document's blocks, serialized as a document of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region<'a> {
    // The source document's keys other than `content`
    attrs: &'a Attrs,
    source: &'a [Block],
    start: usize,
    blocks: &'a [Block],
}

impl<'a> Region<'a> {
    /// Clamps `range` to `source`; out-of-range spans become empty.
    fn span(attrs: &'a Attrs, source: &'a [Block], range: Range<usize>) -> Self {
        let end = range.end.min(source.len());
        let start = range.start.min(end);
        Self {
            attrs,
            source,
            start,
            blocks: &source[start..end],
        }
    }

    pub fn blocks(&self) -> &'a [Block] {
        self.blocks
    }

    /// Indices of these blocks in the source document.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.blocks.len()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// An owned document holding copies of this region's blocks.
    pub fn to_rich_text(&self) -> RichText {
        RichText::Document {
            content: self.blocks.to_vec(),
            attrs: self.attrs.clone(),
        }
    }
}

impl Serialize for Region<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.attrs.iter() {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("content", self.blocks)?;
        map.end()
    }
}

/// The intro is either a slice of the document or, when nothing was split, the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Intro<'a> {
    Unchanged(&'a RichText),
    Region(Region<'a>),
}

impl<'a> Intro<'a> {
    pub fn blocks(&self) -> &'a [Block] {
        match self {
            Intro::Unchanged(document) => document.blocks().unwrap_or(&[]),
            Intro::Region(region) => region.blocks(),
        }
    }
}

/// Named regions of a segmented article body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Intro,
    Part1,
    Part2,
    Part3,
    Closing,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Intro => "intro",
            Section::Part1 => "part1",
            Section::Part2 => "part2",
            Section::Part3 => "part3",
            Section::Closing => "closing",
        }
    }
}

/// One step of the render plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    Text {
        section: Section,
        blocks: &'a [Block],
    },
    /// Image placeholder, numbered from 1
    Image(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segmentation<'a> {
    pub intro: Option<Intro<'a>>,
    pub part1: Option<Region<'a>>,
    pub part2: Option<Region<'a>>,
    pub part3: Option<Region<'a>>,
    pub closing: Option<Region<'a>>,
    pub list_item_count: usize,
    pub is_listicle: bool,
}

impl<'a> Segmentation<'a> {
    /// Nothing split: the input comes back as the intro.
    fn unchanged(document: Option<&'a RichText>) -> Self {
        Self {
            intro: document.map(Intro::Unchanged),
            part1: None,
            part2: None,
            part3: None,
            closing: None,
            list_item_count: 0,
            is_listicle: false,
        }
    }

    /// Present sections in reading order.
    pub fn sections(&self) -> Vec<(Section, &'a [Block])> {
        let regions = [
            (Section::Part1, self.part1),
            (Section::Part2, self.part2),
            (Section::Part3, self.part3),
            (Section::Closing, self.closing),
        ];
        self.intro
            .map(|intro| (Section::Intro, intro.blocks()))
            .into_iter()
            .chain(
                regions
                    .into_iter()
                    .filter_map(|(section, region)| region.map(|r| (section, r.blocks()))),
            )
            .collect()
    }

    /// Sections interleaved with image slots, one image between each pair of sections.
    pub fn layout(&self) -> Vec<Slot<'a>> {
        let mut slots = Vec::new();
        for (i, (section, blocks)) in self.sections().into_iter().enumerate() {
            if i > 0 {
                slots.push(Slot::Image(i));
            }
            slots.push(Slot::Text { section, blocks });
        }
        slots
    }

    /// Index ranges of source blocks that no section covers.
    pub fn dropped_ranges(&self) -> Vec<Range<usize>> {
        let Some(Intro::Region(intro)) = self.intro else {
            return Vec::new();
        };
        let total = intro.source.len();

        let covered = [Some(intro), self.part1, self.part2, self.part3, self.closing];
        let mut dropped = Vec::new();
        let mut cursor = 0;
        for range in covered.iter().flatten().map(Region::range) {
            if range.start > cursor {
                dropped.push(cursor..range.start);
            }
            cursor = cursor.max(range.end);
        }
        if cursor < total {
            dropped.push(cursor..total);
        }
        dropped
    }
}

/// Splits article bodies into the golden layout, or into thirds when they are not listicles.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentConfig,
    extractor: TextExtractor,
}

impl Segmenter {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.segment.clone(),
            extractor: TextExtractor::new(config.text.max_depth),
        }
    }

    /// Indices of the blocks classified as list items, ascending.
    pub fn list_item_indices(&self, blocks: &[Block]) -> Vec<usize> {
        blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| classify_with(block, &self.extractor).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn segment<'a>(&self, document: Option<&'a RichText>) -> Segmentation<'a> {
        let Some(RichText::Document {
            content: blocks,
            attrs,
        }) = document
        else {
            debug!("document has no block content, returning it unchanged");
            return Segmentation::unchanged(document);
        };

        let items = self.list_item_indices(blocks);
        if items.len() >= self.config.golden_threshold() {
            return self.golden(attrs, blocks, &items);
        }
        if blocks.len() >= self.config.min_thirds_nodes {
            return thirds(attrs, blocks);
        }

        debug!(
            blocks = blocks.len(),
            list_items = items.len(),
            "too little content to split"
        );
        Segmentation::unchanged(document)
    }

    fn golden<'a>(
        &self,
        attrs: &'a Attrs,
        blocks: &'a [Block],
        items: &[usize],
    ) -> Segmentation<'a> {
        let per_part = self.config.items_per_part();
        let all = index_span(items);
        let first = index_span(&items[..per_part]);
        let second = index_span(&items[per_part..2 * per_part]);

        let segmentation = Segmentation {
            intro: Some(Intro::Region(Region::span(attrs, blocks, 0..all.start))),
            part1: Some(Region::span(attrs, blocks, first)),
            part2: Some(Region::span(attrs, blocks, second)),
            part3: None,
            closing: Some(Region::span(attrs, blocks, all.end..blocks.len())),
            list_item_count: items.len(),
            is_listicle: true,
        };

        let dropped = segmentation.dropped_ranges();
        debug!(
            list_items = items.len(),
            ?dropped,
            "golden layout"
        );
        segmentation
    }
}

/// Smallest index range containing every index in `indices`.
fn index_span(indices: &[usize]) -> Range<usize> {
    match (indices.iter().min(), indices.iter().max()) {
        (Some(&min), Some(&max)) => min..max + 1,
        _ => 0..0,
    }
}

fn thirds<'a>(attrs: &'a Attrs, blocks: &'a [Block]) -> Segmentation<'a> {
    let n = blocks.len();
    let third = n / 3;
    debug!(blocks = n, third, "splitting into thirds");

    Segmentation {
        intro: Some(Intro::Region(Region::span(attrs, blocks, 0..1))),
        part1: Some(Region::span(attrs, blocks, 1..third + 1)),
        part2: Some(Region::span(attrs, blocks, third + 1..2 * third + 1)),
        part3: Some(Region::span(attrs, blocks, 2 * third + 1..n)),
        closing: None,
        list_item_count: 0,
        is_listicle: false,
    }
}

/// Segment with the default thresholds.
pub fn segment(document: Option<&RichText>) -> Segmentation<'_> {
    Segmenter::default().segment(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Inline, Mark};
    use serde_json::json;

    fn item(n: usize) -> Block {
        Block::paragraph(vec![Inline::text(format!("{n}. Item {n}"))])
    }

    fn plain(text: &str) -> Block {
        Block::paragraph(vec![Inline::text(text)])
    }

    fn numbered_items(range: Range<usize>) -> Vec<Block> {
        range.map(item).collect()
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks.iter().map(|block| crate::text::plain_text(block)).collect()
    }

    #[test]
    fn no_document() {
        let result = segment(None);
        assert_eq!(result, Segmentation::unchanged(None));
        assert_eq!(result.intro, None);
        assert!(result.layout().is_empty());
    }

    #[test]
    fn malformed_content_returns_document() {
        let doc: RichText =
            serde_json::from_value(json!({ "nodeType": "document", "content": { "a": 1 } }))
                .unwrap();
        let result = segment(Some(&doc));
        assert_eq!(result.intro, Some(Intro::Unchanged(&doc)));
        assert_eq!(result.part1, None);
        assert_eq!(result.list_item_count, 0);
        assert!(!result.is_listicle);
        assert_eq!(
            serde_json::to_value(&result).unwrap()["intro"],
            json!({ "nodeType": "document", "content": { "a": 1 } })
        );
    }

    #[test]
    fn short_document_is_unchanged() {
        let doc = RichText::new(vec![plain("a"), item(1), plain("b"), item(2), plain("c")]);
        let result = segment(Some(&doc));
        assert_eq!(result, Segmentation::unchanged(Some(&doc)));
        assert_eq!(result.sections(), vec![(Section::Intro, doc.blocks().unwrap())]);
    }

    #[test]
    fn ten_numbered_items() {
        let doc = RichText::new(numbered_items(1..11));
        let result = segment(Some(&doc));

        assert!(result.is_listicle);
        assert_eq!(result.list_item_count, 10);
        assert_eq!(result.part1.unwrap().range(), 0..5);
        assert_eq!(result.part2.unwrap().range(), 5..10);
        assert_eq!(result.part3, None);
        assert!(matches!(result.intro, Some(Intro::Region(r)) if r.is_empty()));
        assert!(result.closing.unwrap().is_empty());
        assert!(result.dropped_ranges().is_empty());
    }

    #[test]
    fn interleaved_paragraphs_stay_in_part() {
        let mut blocks = numbered_items(1..3);
        blocks.extend([plain("aside one"), plain("aside two"), plain("aside three")]);
        blocks.extend(numbered_items(3..13));
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert_eq!(result.list_item_count, 12);
        let part1 = result.part1.unwrap();
        assert_eq!(part1.range(), 0..8);
        assert_eq!(
            texts(part1.blocks()),
            vec![
                "1. Item 1",
                "2. Item 2",
                "aside one",
                "aside two",
                "aside three",
                "3. Item 3",
                "4. Item 4",
                "5. Item 5",
            ]
        );
        assert_eq!(result.part2.unwrap().range(), 8..13);
        // items 11 and 12 sit between part2 and the closing
        assert_eq!(result.dropped_ranges(), vec![13..15]);
    }

    #[test]
    fn intro_and_closing_around_items() {
        let mut blocks = vec![
            Block::heading(2, vec![Inline::text("Best beaches")]),
            plain("Summer is here."),
        ];
        blocks.extend(numbered_items(1..11));
        blocks.extend([plain("That's all."), plain("Share it.")]);
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        let intro = match result.intro {
            Some(Intro::Region(region)) => region,
            other => panic!("unexpected intro {other:?}"),
        };
        assert_eq!(intro.range(), 0..2);
        assert_eq!(result.part1.unwrap().range(), 2..7);
        assert_eq!(result.part2.unwrap().range(), 7..12);
        assert_eq!(
            texts(result.closing.unwrap().blocks()),
            vec!["That's all.", "Share it."]
        );
    }

    #[test]
    fn gap_between_parts_is_dropped() {
        let mut blocks = numbered_items(1..6);
        blocks.push(plain("between"));
        blocks.extend(numbered_items(6..11));
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert_eq!(result.part1.unwrap().range(), 0..5);
        assert_eq!(result.part2.unwrap().range(), 6..11);
        assert_eq!(result.dropped_ranges(), vec![5..6]);
    }

    #[test]
    fn bold_led_items_count() {
        let mut blocks: Vec<Block> = (0..10)
            .map(|i| {
                Block::paragraph(vec![
                    Inline::marked(format!("Town {i}"), vec![Mark::Bold]),
                    Inline::text(" is worth a visit"),
                ])
            })
            .collect();
        blocks.insert(0, plain("Intro"));
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert!(result.is_listicle);
        assert_eq!(result.part1.unwrap().range(), 1..6);
        assert_eq!(result.part2.unwrap().range(), 6..11);
    }

    #[test]
    fn nine_plain_blocks_split_into_thirds() {
        let blocks: Vec<Block> = (0..9).map(|i| plain(&format!("p{i}"))).collect();
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert!(!result.is_listicle);
        assert_eq!(result.list_item_count, 0);
        assert!(matches!(result.intro, Some(Intro::Region(r)) if r.range() == (0..1)));
        assert_eq!(result.part1.unwrap().range(), 1..4);
        assert_eq!(result.part2.unwrap().range(), 4..7);
        assert_eq!(result.part3.unwrap().range(), 7..9);
        assert_eq!(result.closing, None);
    }

    #[test]
    fn too_few_items_fall_back_to_thirds() {
        let mut blocks = numbered_items(1..10);
        blocks.push(plain("end"));
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert!(!result.is_listicle);
        assert_eq!(result.list_item_count, 0);
        assert_eq!(result.part1.unwrap().range(), 1..4);
        assert_eq!(result.part2.unwrap().range(), 4..7);
        assert_eq!(result.part3.unwrap().range(), 7..10);
    }

    #[test]
    fn six_blocks_thirds() {
        let blocks: Vec<Block> = (0..6).map(|i| plain(&format!("p{i}"))).collect();
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        assert_eq!(result.part1.unwrap().range(), 1..3);
        assert_eq!(result.part2.unwrap().range(), 3..5);
        assert_eq!(result.part3.unwrap().range(), 5..6);
        assert!(result.dropped_ranges().is_empty());
    }

    #[test]
    fn listicle_layout() {
        let mut blocks = vec![plain("intro")];
        blocks.extend(numbered_items(1..11));
        blocks.push(plain("outro"));
        let doc = RichText::new(blocks);

        let result = segment(Some(&doc));
        let kinds: Vec<String> = result
            .layout()
            .iter()
            .map(|slot| match slot {
                Slot::Text { section, .. } => section.name().to_string(),
                Slot::Image(n) => format!("image {n}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["intro", "image 1", "part1", "image 2", "part2", "image 3", "closing"]
        );
    }

    #[test]
    fn thirds_layout_ends_with_part3() {
        let blocks: Vec<Block> = (0..7).map(|i| plain(&format!("p{i}"))).collect();
        let doc = RichText::new(blocks);
        let layout = segment(Some(&doc)).layout();
        assert_eq!(layout.len(), 7);
        assert!(matches!(
            layout.last(),
            Some(Slot::Text {
                section: Section::Part3,
                ..
            })
        ));
    }

    #[test]
    fn idempotent() {
        let mut blocks = vec![plain("intro")];
        blocks.extend(numbered_items(1..13));
        let doc = RichText::new(blocks);
        let before = doc.clone();

        let first = segment(Some(&doc));
        let second = segment(Some(&doc));
        assert_eq!(first, second);
        assert_eq!(doc, before);
    }

    #[test]
    fn custom_thresholds() {
        let config: Config =
            toml::from_str("[segment]\nitems_per_part = 2\nmin_list_items = 4\n").unwrap();
        let mut blocks = vec![plain("intro")];
        blocks.extend(numbered_items(1..5));
        let doc = RichText::new(blocks);

        let result = Segmenter::new(&config).segment(Some(&doc));
        assert!(result.is_listicle);
        assert_eq!(result.part1.unwrap().range(), 1..3);
        assert_eq!(result.part2.unwrap().range(), 3..5);
    }

    #[test]
    fn serializes_regions_as_documents() {
        let doc = RichText::from(json!({
            "nodeType": "document",
            "data": { "source": "cms" },
            "content": serde_json::to_value(numbered_items(1..11)).unwrap(),
        }));
        let value = serde_json::to_value(segment(Some(&doc))).unwrap();

        assert_eq!(value["isListicle"], json!(true));
        assert_eq!(value["listItemCount"], json!(10));
        assert_eq!(value["part3"], json!(null));
        assert_eq!(value["part1"]["nodeType"], json!("document"));
        assert_eq!(value["part1"]["data"], json!({ "source": "cms" }));
        assert_eq!(value["part1"]["content"].as_array().unwrap().len(), 5);
        assert_eq!(value["closing"]["content"], json!([]));
    }

    #[test]
    fn region_to_rich_text_copies_blocks() {
        let doc = RichText::new(numbered_items(1..11));
        let part2 = segment(Some(&doc)).part2.unwrap().to_rich_text();
        assert_eq!(part2.blocks(), Some(&numbered_items(6..11)[..]));
    }
}
