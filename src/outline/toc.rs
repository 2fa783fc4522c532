//! Table-of-contents handling: bookmark-driven headings and printed TOC pages.

use std::collections::HashMap;

use crate::model::{CandidateSource, HeadingCandidate, HeadingLevel, Page, TextLine, DEFAULT_FONT_SIZE};
use crate::parser::Bookmark;

use super::text::{clean_text, is_toc_entry, normalize_key};

/// Fewest lines a page needs before it can be a printed TOC.
const TOC_MIN_LINES: usize = 10;
/// Share of lines ending in a page number above which a page is a TOC.
const TOC_ENTRY_RATIO: f32 = 0.4;

/// Whether the page is a printed table of contents.
pub fn is_toc_page(page: &Page) -> bool {
    let lines: Vec<String> = page
        .lines
        .iter()
        .map(|l| l.text())
        .filter(|t| !t.trim().is_empty())
        .collect();
    if lines.len() < TOC_MIN_LINES {
        return false;
    }

    let entries = lines.iter().filter(|l| is_toc_entry(l)).count();
    entries as f32 / lines.len() as f32 > TOC_ENTRY_RATIO
}

/// Turn bookmarks into heading candidates.
///
/// `last_page` bounds the accepted targets; `pages` holds the decoded
/// target pages used to locate each title. Entries with empty titles or
/// targets outside `[1, last_page]` are dropped. Entries whose title cannot
/// be found on the page keep no position and are anchored just after the
/// previous bookmark on the same page.
pub fn candidates_from_bookmarks(
    bookmarks: &[Bookmark],
    last_page: u32,
    pages: &HashMap<u32, Page>,
) -> Vec<HeadingCandidate> {
    let mut last_top: HashMap<u32, f32> = HashMap::new();

    bookmarks
        .iter()
        .filter_map(|bookmark| {
            let text = clean_text(&bookmark.title);
            if text.is_empty() {
                return None;
            }
            let page = match bookmark.page {
                Some(p) if p >= 1 && p <= last_page => p,
                other => {
                    log::debug!("dropping bookmark {:?}: target {:?} out of range", text, other);
                    return None;
                }
            };

            let located = pages.get(&page).and_then(|p| locate_title(p, &text));
            let anchor = match located {
                Some(line) => {
                    last_top.insert(page, line.bbox.y0);
                    None
                }
                None => {
                    log::debug!("bookmark {:?} not found on page {}", text, page);
                    last_top.get(&page).copied()
                }
            };

            Some(HeadingCandidate {
                text,
                page,
                bbox: located.map(|l| l.bbox),
                anchor,
                font_size: located.map(|l| l.font_size()).unwrap_or(DEFAULT_FONT_SIZE),
                is_bold: located.map(|l| l.is_bold()).unwrap_or(false),
                level_hint: Some(HeadingLevel::from_depth(bookmark.depth)),
                source: CandidateSource::Bookmark,
            })
        })
        .collect()
}

/// The line carrying a bookmark title: an exact match of the normalized
/// text, else the first line containing it.
fn locate_title<'a>(page: &'a Page, title: &str) -> Option<&'a TextLine> {
    let key = normalize_key(title);
    let keyed: Vec<(&TextLine, String)> = page.lines.iter().map(|l| (l, normalize_key(&l.text()))).collect();

    keyed
        .iter()
        .find(|(_, k)| *k == key)
        .or_else(|| keyed.iter().find(|(_, k)| k.contains(&key)))
        .map(|(l, _)| *l)
}
