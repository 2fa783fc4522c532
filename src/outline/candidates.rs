//! Heading candidate detection on a single page.
//!
//! Two passes over the page's lines:
//! 1. captions sitting directly above an accepted table;
//! 2. every other line outside tables that passes [`is_heading_candidate`].

use std::collections::HashSet;

use crate::model::{
    placement_among, CandidateSource, HeadingCandidate, Page, TablePlacement, TableRegion, TextLine,
};

use super::text::{clean_text, is_labelled_heading, is_numbered_heading, normalize_key, word_count};

/// A line larger than this multiple of the page median can be a heading.
pub const HEADING_SIZE_RATIO: f32 = 1.15;

/// Lines whose bottom edge falls below this fraction of the page height are footers.
const FOOTER_FRACTION: f32 = 0.9;

const MAX_HEADING_WORDS: usize = 15;
const MAX_SENTENCE_WORDS: usize = 8;
const MAX_NUMBERED_WORDS: usize = 12;
const MAX_STYLED_WORDS: usize = 10;

/// Form field labels that look like headings but never are.
const STOP_WORDS: [&str; 5] = ["version", "date", "remarks", "identifier", "reference"];

/// Normalized heading texts already emitted (or deliberately suppressed) in a document.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set that already holds the document title.
    pub fn with_title(title: &str) -> Self {
        let mut seen = Self::new();
        seen.insert(title);
        seen
    }

    /// Record `text`; returns `false` if it was already present.
    pub fn insert(&mut self, text: &str) -> bool {
        let key = normalize_key(text);
        if key.is_empty() {
            return false;
        }
        self.keys.insert(key)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.keys.contains(&normalize_key(text))
    }

    /// Record every text in `texts`.
    pub fn extend<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for text in texts {
            self.insert(text.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Cleaned form-object text of a page, suitable for seeding a [`SeenSet`].
pub fn chrome_texts(page: &Page) -> Vec<String> {
    page.chrome
        .iter()
        .map(|t| clean_text(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Decide whether a cleaned line reads as a heading.
///
/// `line` supplies position and representative style; `base_font_size` is
/// the page median.
pub fn is_heading_candidate(text: &str, line: &TextLine, page_height: f32, base_font_size: f32) -> bool {
    if line.bbox.y1 > page_height * FOOTER_FRACTION {
        return false;
    }

    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    let words = word_count(text);
    if words > MAX_HEADING_WORDS || (text.ends_with('.') && words > MAX_SENTENCE_WORDS) {
        return false;
    }
    if STOP_WORDS.contains(&text.to_lowercase().as_str()) {
        return false;
    }

    if (is_numbered_heading(text) && words < MAX_NUMBERED_WORDS) || is_labelled_heading(text) {
        return true;
    }

    let prominent = line.is_bold() || line.font_size() > base_font_size * HEADING_SIZE_RATIO;
    prominent && words < MAX_STYLED_WORDS && !text.ends_with(['.', ',', ';'])
}

/// Scan one page for heading candidates.
///
/// `seen` is consulted and updated so a text is emitted at most once; the
/// page's form-object text is added to it first.
pub fn detect_candidates(page: &Page, regions: &[TableRegion], seen: &mut SeenSet) -> Vec<HeadingCandidate> {
    seen.extend(chrome_texts(page));

    let base_size = page.base_font_size();
    let mut candidates = Vec::new();

    for line in &page.lines {
        if placement_among(regions, &line.bbox) != Some(TablePlacement::Header) {
            continue;
        }
        let cleaned = clean_text(&line.text());
        if !cleaned.is_empty() && seen.insert(&cleaned) {
            log::debug!("page {}: table caption {:?}", page.number, cleaned);
            candidates.push(candidate(page, line, cleaned, CandidateSource::TableCaption));
        }
    }

    for line in &page.lines {
        let cleaned = clean_text(&line.text());
        if cleaned.is_empty() || seen.contains(&cleaned) {
            continue;
        }
        if placement_among(regions, &line.bbox).is_some() {
            continue;
        }
        if is_heading_candidate(&cleaned, line, page.height, base_size) {
            seen.insert(&cleaned);
            candidates.push(candidate(page, line, cleaned, CandidateSource::Standalone));
        }
    }

    candidates
}

fn candidate(page: &Page, line: &TextLine, text: String, source: CandidateSource) -> HeadingCandidate {
    HeadingCandidate {
        text,
        page: page.number,
        bbox: Some(line.bbox),
        anchor: None,
        font_size: line.font_size(),
        is_bold: line.is_bold(),
        level_hint: None,
        source,
    }
}
