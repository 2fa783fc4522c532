//! Text cleaning, matching patterns and title similarity.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::HeadingLevel;

/// Similarity ratio above which an outline entry is considered a repeat of the title.
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static PAGE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Page \d+").expect("valid page label regex"));

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\s").expect("valid numbered heading regex"));

static LABELLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Appendix|Chapter|Section|Phase|Table|Figure)\s+[A-Z0-9]")
        .expect("valid labelled heading regex")
});

static DEPTH_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("valid depth regex"));
static DEPTH_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+").expect("valid depth regex"));
static DEPTH_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+").expect("valid depth regex"));

static TOC_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.]+\d+$").expect("valid toc regex"));

/// Normalize a raw line: NFC, collapsed whitespace, trimmed.
///
/// Returns an empty string for text that can never be a heading or title:
/// fewer than 3 characters, bare numbers, and `Page N` labels.
pub fn clean_text(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let collapsed = WHITESPACE.replace_all(&normalized, " ");
    let cleaned = collapsed.trim();

    if cleaned.chars().count() < 3
        || cleaned.chars().all(|c| c.is_ascii_digit())
        || PAGE_LABEL.is_match(cleaned)
    {
        return String::new();
    }
    cleaned.to_string()
}

/// Key used for dedup and similarity: lowercase with collapsed whitespace.
pub fn normalize_key(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    WHITESPACE
        .replace_all(normalized.trim(), " ")
        .to_lowercase()
}

/// Normalized edit-distance similarity in `[0, 1]` between two strings.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_key(a), &normalize_key(b))
}

/// Whether `text` is close enough to `title` to be the same heading.
pub fn is_similar(text: &str, title: &str) -> bool {
    similarity_ratio(text, title) > TITLE_SIMILARITY_THRESHOLD
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `1 Intro`, `2.3 Scope`, ... (a number followed by whitespace).
pub fn is_numbered_heading(text: &str) -> bool {
    NUMBERED.is_match(text)
}

/// `Appendix A`, `Chapter 3`, `Table 2`, ...
pub fn is_labelled_heading(text: &str) -> bool {
    LABELLED.is_match(text)
}

/// Level implied by a leading section number, if any.
pub fn numeric_level(text: &str) -> Option<HeadingLevel> {
    if DEPTH_3.is_match(text) {
        Some(HeadingLevel::H3)
    } else if DEPTH_2.is_match(text) {
        Some(HeadingLevel::H2)
    } else if DEPTH_1.is_match(text) {
        Some(HeadingLevel::H1)
    } else {
        None
    }
}

/// A printed table-of-contents row: text, leader dots or spaces, a page number.
pub fn is_toc_entry(line: &str) -> bool {
    TOC_ENTRY.is_match(line.trim())
}
