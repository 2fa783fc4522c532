//! Content segmentation: the body text under each heading.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{HeadingCandidate, Page};

/// Heading candidates in document order: page ascending, then top edge ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedCandidates(Vec<HeadingCandidate>);

impl SortedCandidates {
    /// Sort candidates into document order. The sort is stable, so candidates
    /// at the same position keep their input order.
    pub fn sort(mut candidates: Vec<HeadingCandidate>) -> Self {
        candidates.sort_by(document_order);
        Self(candidates)
    }

    /// Wrap candidates that are already in document order.
    pub fn from_sorted(candidates: Vec<HeadingCandidate>) -> Result<Self> {
        if let Some(i) = candidates
            .windows(2)
            .position(|w| document_order(&w[0], &w[1]) == Ordering::Greater)
        {
            return Err(Error::UnsortedCandidates(i + 1));
        }
        Ok(Self(candidates))
    }

    pub fn as_slice(&self) -> &[HeadingCandidate] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<HeadingCandidate> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeadingCandidate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn document_order(a: &HeadingCandidate, b: &HeadingCandidate) -> Ordering {
    a.page.cmp(&b.page).then(a.top().total_cmp(&b.top()))
}

/// Body text for each candidate, in the same order.
///
/// The window of a located heading runs from its bottom edge to the top of
/// the next located heading on the same page, or to the page bottom. An
/// unlocated heading that opens its page takes everything above the next
/// located heading; one placed after another entry gets nothing, so no
/// text is claimed twice. Words are assigned by their vertical centre and
/// read top-to-bottom, left-to-right.
pub fn segment_content(candidates: &SortedCandidates, pages: &HashMap<u32, Page>) -> Vec<String> {
    let items = candidates.as_slice();

    items
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let Some(page) = pages.get(&heading.page) else {
                return String::new();
            };

            let end = items[i + 1..]
                .iter()
                .take_while(|next| next.page == heading.page)
                .find_map(|next| next.bbox.map(|b| b.y0))
                .unwrap_or(page.height);

            let start = match heading.bbox {
                Some(bbox) => bbox.y1,
                None if i > 0 && items[i - 1].page == heading.page => return String::new(),
                None => 0.0,
            };

            text_between(page, start, end)
        })
        .collect()
}

/// Words whose vertical centre lies in `[start, end)`, in reading order.
fn text_between(page: &Page, start: f32, end: f32) -> String {
    let mut words: Vec<_> = page
        .words()
        .into_iter()
        .filter(|w| {
            let center = w.bbox.center_y();
            center >= start && center < end
        })
        .collect();

    words.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, CandidateSource, TextLine, TextSpan};

    fn line(text: &str, x: f32, top: f32, size: f32) -> TextLine {
        TextLine::from_spans(vec![TextSpan::new(
            text,
            "Helvetica",
            size,
            BBox::new(x, top, x + text.chars().count() as f32 * size * 0.5, top + size),
        )])
    }

    fn heading(text: &str, page: u32, bbox: Option<BBox>) -> HeadingCandidate {
        HeadingCandidate {
            text: text.to_string(),
            page,
            bbox,
            anchor: None,
            font_size: 14.0,
            is_bold: true,
            level_hint: None,
            source: CandidateSource::Standalone,
        }
    }

    fn sample_page() -> Page {
        Page::letter(1).with_lines(vec![
            line("Overview", 72.0, 100.0, 14.0),
            line("first body line", 72.0, 120.0, 10.0),
            line("right", 300.0, 134.0, 10.0),
            line("left", 72.0, 134.0, 10.0),
            line("Details", 72.0, 200.0, 14.0),
            line("second body", 72.0, 220.0, 10.0),
        ])
    }

    #[test]
    fn test_sort_and_check() {
        let a = heading("A", 2, Some(BBox::new(0.0, 50.0, 10.0, 60.0)));
        let b = heading("B", 1, Some(BBox::new(0.0, 300.0, 10.0, 310.0)));
        let c = heading("C", 1, None);

        let sorted = SortedCandidates::sort(vec![a.clone(), b.clone(), c.clone()]);
        let order: Vec<&str> = sorted.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);

        assert!(SortedCandidates::from_sorted(vec![c.clone(), b.clone(), a.clone()]).is_ok());
        assert!(matches!(
            SortedCandidates::from_sorted(vec![a, b, c]),
            Err(Error::UnsortedCandidates(1))
        ));
    }

    #[test]
    fn test_windows_between_headings() {
        let page = sample_page();
        let overview = heading("Overview", 1, Some(page.lines[0].bbox));
        let details = heading("Details", 1, Some(page.lines[4].bbox));
        let mut pages = HashMap::new();
        pages.insert(1, page);

        let sorted = SortedCandidates::sort(vec![details, overview]);
        let content = segment_content(&sorted, &pages);
        assert_eq!(content, vec!["first body line left right", "second body"]);
    }

    #[test]
    fn test_unlocated_takes_whole_page_and_missing_page_is_empty() {
        let mut pages = HashMap::new();
        pages.insert(1, sample_page());
        let sorted = SortedCandidates::sort(vec![heading("Ghost", 1, None), heading("Lost", 5, None)]);

        let content = segment_content(&sorted, &pages);
        assert!(content[0].starts_with("Overview first body line"));
        assert!(content[0].ends_with("second body"));
        assert_eq!(content[1], "");
    }

    #[test]
    fn test_unlocated_windows_do_not_overlap() {
        let page = sample_page();
        let details = heading("Details", 1, Some(page.lines[4].bbox));
        let mut trailing = heading("Trailing", 1, None);
        trailing.anchor = Some(page.lines[4].bbox.y0);
        let mut pages = HashMap::new();
        pages.insert(1, page);

        let sorted = SortedCandidates::sort(vec![heading("Leading", 1, None), details, trailing]);
        let order: Vec<&str> = sorted.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(order, vec!["Leading", "Details", "Trailing"]);

        let content = segment_content(&sorted, &pages);
        assert_eq!(content[0], "Overview first body line left right");
        assert_eq!(content[1], "second body");
        assert_eq!(content[2], "");
    }

    #[test]
    fn test_last_heading_runs_to_page_bottom() {
        let page = sample_page();
        let details = heading("Details", 1, Some(page.lines[4].bbox));
        let mut pages = HashMap::new();
        pages.insert(1, page);

        let sorted = SortedCandidates::from_sorted(vec![details]).unwrap();
        assert_eq!(segment_content(&sorted, &pages), vec!["second body"]);
    }
}
