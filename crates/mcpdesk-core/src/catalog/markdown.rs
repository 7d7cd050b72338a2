//! Block-level view of a markdown document: headings, lists and paragraphs.
//!
//! Built from pulldown-cmark events. Only the structure the catalog parser
//! navigates is kept; inline markup is flattened to plain text, and links
//! inside list items are collected alongside.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    List(Vec<ListItem>),
    Paragraph(String),
    Code,
    Rule,
}

/// One bullet or numbered item; nested items are flattened with their depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub depth: usize,
    /// Plain text of the item itself, without nested items.
    pub text: String,
    /// Links in the item text, images excluded.
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Split a document into top-level blocks, in document order.
pub fn parse_blocks(document: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(document, Options::empty()) {
        builder.event(event);
    }
    builder.blocks
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    /// Text of the heading or paragraph being read outside any list.
    text: String,
    items: Vec<ListItem>,
    open_items: Vec<usize>,
    list_depth: usize,
    link: Option<Link>,
    image_depth: usize,
    in_code: bool,
}

impl BlockBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak => self.push_text(" "),
            Event::Rule if self.list_depth == 0 => self.blocks.push(Block::Rule),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } | Tag::Paragraph if self.list_depth == 0 => self.text.clear(),
            Tag::List(_) => self.list_depth += 1,
            Tag::Item => {
                self.items.push(ListItem {
                    depth: self.list_depth.saturating_sub(1),
                    text: String::new(),
                    links: Vec::new(),
                });
                self.open_items.push(self.items.len() - 1);
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(Link {
                    text: String::new(),
                    url: dest_url.to_string(),
                });
            }
            Tag::Image { .. } => self.image_depth += 1,
            Tag::CodeBlock(_) => {
                self.in_code = true;
                if self.list_depth == 0 {
                    self.blocks.push(Block::Code);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(level) if self.list_depth == 0 => {
                let text = collapse(&std::mem::take(&mut self.text));
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    text,
                });
            }
            TagEnd::Paragraph if self.list_depth == 0 => {
                let text = collapse(&std::mem::take(&mut self.text));
                self.blocks.push(Block::Paragraph(text));
            }
            TagEnd::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    let mut items = std::mem::take(&mut self.items);
                    for item in &mut items {
                        item.text = collapse(&item.text);
                    }
                    self.open_items.clear();
                    self.blocks.push(Block::List(items));
                }
            }
            TagEnd::Item => {
                self.open_items.pop();
            }
            TagEnd::Link => {
                if let Some(mut link) = self.link.take() {
                    link.text = collapse(&link.text);
                    if let Some(item) = self.current_item() {
                        item.links.push(link);
                    }
                }
            }
            TagEnd::Image => self.image_depth = self.image_depth.saturating_sub(1),
            TagEnd::CodeBlock => self.in_code = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_code || self.image_depth > 0 {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
        match self.current_item() {
            Some(item) => item.text.push_str(text),
            None => self.text.push_str(text),
        }
    }

    fn current_item(&mut self) -> Option<&mut ListItem> {
        let index = *self.open_items.last()?;
        self.items.get_mut(index)
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Raw inline markdown flattened to the text a reader sees.
///
/// Images and HTML tags vanish, links become their text, and emphasis
/// markers are dropped. Used where only a line of source is at hand.
pub fn plain_text(inline: &str) -> String {
    let text = IMAGE.replace_all(inline, "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = text.replace("**", "").replace("__", "").replace('`', "");
    collapse(&text)
}
