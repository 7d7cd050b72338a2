//! Keyword-based category guess for catalog descriptions.

use crate::types::Category;

/// Keyword groups in priority order; the first group with a hit wins.
const KEYWORD_GROUPS: &[(Category, &[&str])] = &[
    (Category::Search, &["search", "검색"]),
    (
        Category::Vision,
        &["image", "vision", "art", "picture", "이미지", "비전"],
    ),
    (Category::Audio, &["audio", "voice", "speech", "오디오", "음성"]),
    (
        Category::Document,
        &["file", "document", "filesystem", "파일", "문서"],
    ),
    (
        Category::Database,
        &["database", "sql", "db", "data", "postgresql", "sqlite"],
    ),
    (Category::Web, &["web", "browser", "fetch", "http"]),
    (Category::Git, &["git", "github", "gitlab"]),
    (Category::Time, &["time", "date", "timezone"]),
    (Category::Map, &["map", "location", "place", "direction"]),
    (Category::Memory, &["memory", "thinking", "thought"]),
    (Category::Utility, &["tool", "utility", "도구", "유틸리티"]),
];

/// Substring match on the lower-cased description; `General` when nothing hits.
pub fn estimate_category(description: &str) -> Category {
    if description.trim().is_empty() {
        return Category::General;
    }
    let lowered = description.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}
