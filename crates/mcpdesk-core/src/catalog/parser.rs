//! Catalog extraction from the servers README.
//!
//! Parsing is a chain of strategies tried in order; the first one that yields
//! any record wins. The default chain walks a markdown block tree first and
//! falls back to line patterns when the tree walk finds nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{CatalogRecord, SourceType};

use super::category::estimate_category;
use super::markdown::{Block, ListItem, parse_blocks, plain_text};

/// Section headings the catalog is read from, in output order.
const SECTIONS: &[(&str, SourceType)] = &[
    ("Reference Servers", SourceType::Reference),
    ("Official Integrations", SourceType::Official),
];

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.*)$").expect("valid regex"));
static LINKED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-*][ \t]+(?:\*\*|__)?\[([^\]]+)\]\([^)]*\)(?:\*\*|__)?([^\n]*)")
        .expect("valid regex")
});

pub trait ParseStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, document: &str) -> Vec<CatalogRecord>;
}

/// Heading → next list walk over the markdown block tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredStrategy;

impl ParseStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn parse(&self, document: &str) -> Vec<CatalogRecord> {
        let blocks = parse_blocks(document);
        let mut records = Vec::new();

        for (title, source_type) in SECTIONS {
            let Some(index) = find_heading(&blocks, title) else {
                continue;
            };
            tracing::debug!(section = title, "Found catalog section");
            let Some(items) = list_after(&blocks, index) else {
                tracing::warn!(section = title, "No list found under catalog section");
                continue;
            };

            for item in items {
                let Some(link) = item.links.first() else {
                    continue;
                };
                let name = link.text.clone();
                if name.is_empty() {
                    continue;
                }
                let description = strip_separator(&item.text.replacen(&name, "", 1));
                records.push(make_record(name, description, *source_type));
            }
        }

        records
    }
}

/// Heading-to-next-heading spans scanned for `- [name](url) description` lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStrategy;

impl ParseStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn parse(&self, document: &str) -> Vec<CatalogRecord> {
        let mut records = Vec::new();

        for (title, source_type) in SECTIONS {
            let Some(section) = section_span(document, title) else {
                continue;
            };
            for caps in LINKED_ITEM.captures_iter(section) {
                let name = plain_text(&caps[1]);
                if name.is_empty() {
                    continue;
                }
                let description = strip_separator(&plain_text(&caps[2]));
                records.push(make_record(name, description, *source_type));
            }
        }

        records
    }
}

pub struct CatalogParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self::new(vec![Box::new(StructuredStrategy), Box::new(RegexStrategy)])
    }
}

impl std::fmt::Debug for CatalogParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("CatalogParser")
            .field("strategies", &names)
            .finish()
    }
}

impl CatalogParser {
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    /// Records from the first strategy that finds any; `None` when all come up empty.
    pub fn parse(&self, document: &str) -> Option<Vec<CatalogRecord>> {
        for strategy in &self.strategies {
            let records = strategy.parse(document);
            if !records.is_empty() {
                tracing::info!(
                    strategy = strategy.name(),
                    count = records.len(),
                    "Parsed catalog"
                );
                return Some(records);
            }
            tracing::info!(strategy = strategy.name(), "Strategy found no catalog records");
        }
        None
    }
}

fn make_record(name: String, description: String, source_type: SourceType) -> CatalogRecord {
    let category = estimate_category(&description);
    CatalogRecord::new(name, description, category, source_type)
}

fn title_matches(text: &str, title: &str) -> bool {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized.contains(title)
}

fn find_heading(blocks: &[Block], title: &str) -> Option<usize> {
    blocks.iter().position(|block| match block {
        Block::Heading { text, .. } => title_matches(text, title),
        _ => false,
    })
}

/// The first list after the heading at `index`, unless a heading of the
/// same or a higher level comes first.
fn list_after(blocks: &[Block], index: usize) -> Option<&[ListItem]> {
    let Block::Heading { level, .. } = &blocks[index] else {
        return None;
    };
    for block in &blocks[index + 1..] {
        match block {
            Block::Heading { level: next, .. } if next <= level => return None,
            Block::List(items) => return Some(items),
            _ => {}
        }
    }
    None
}

fn section_span<'a>(document: &'a str, title: &str) -> Option<&'a str> {
    let mut headings = HEADING_LINE.captures_iter(document);
    let start = headings
        .by_ref()
        .find(|caps| title_matches(&caps[1], title))
        .and_then(|caps| caps.get(0))
        .map(|m| m.end())?;
    let end = headings
        .next()
        .and_then(|caps| caps.get(0))
        .map(|m| m.start())
        .unwrap_or(document.len());
    Some(&document[start..end])
}

/// Drop a leading `-` or `:` separator between name and description.
fn strip_separator(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix(':'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
