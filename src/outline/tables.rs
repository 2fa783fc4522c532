//! Table classifier: separates genuine tables from boxed headings.

use crate::model::{Page, TableCandidate, TableRegion};

use super::text::word_count;

/// A boxed word larger than this multiple of the page median reads as a heading.
pub const TABLE_HEADING_SIZE_RATIO: f32 = 1.1;

/// Longest single-cell text that can still be a boxed heading.
const MAX_BOXED_HEADING_WORDS: usize = 8;

/// Keep the candidates that are real tables and return their regions.
///
/// Multi-cell candidates are always tables. A lone 1×1 box is dropped only
/// when it holds a short run of text whose first word is bold or noticeably
/// larger than the page's body text.
pub fn classify_tables(candidates: &[TableCandidate], page: &Page) -> Vec<TableRegion> {
    let base_size = page.base_font_size();

    candidates
        .iter()
        .filter(|candidate| {
            let keep = is_genuine_table(candidate, page, base_size);
            if !keep {
                log::debug!(
                    "page {}: boxed heading {:?} is not a table",
                    page.number,
                    candidate.first_cell().unwrap_or_default()
                );
            }
            keep
        })
        .map(|candidate| TableRegion::new(candidate.bbox))
        .collect()
}

fn is_genuine_table(candidate: &TableCandidate, page: &Page, base_size: f32) -> bool {
    if candidate.row_count() > 1 || candidate.first_row_columns() > 1 {
        return true;
    }
    if !candidate.is_single_cell() {
        return true;
    }

    let cell = candidate.first_cell().unwrap_or_default().trim();
    if cell.is_empty() || word_count(cell) > MAX_BOXED_HEADING_WORDS {
        return true;
    }

    match page.first_word_in(&candidate.bbox) {
        None => true,
        Some(word) => !(word.is_bold || word.font_size > base_size * TABLE_HEADING_SIZE_RATIO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, TextLine, TextSpan};

    fn body_page(extra: Vec<TextSpan>) -> Page {
        let mut lines: Vec<TextLine> = (0..5)
            .map(|i| {
                let top = 300.0 + i as f32 * 14.0;
                TextLine::from_spans(vec![TextSpan::new(
                    "plain body text line",
                    "Helvetica",
                    10.0,
                    BBox::new(72.0, top, 200.0, top + 10.0),
                )])
            })
            .collect();
        lines.extend(extra.into_iter().map(|s| TextLine::from_spans(vec![s])));
        Page::letter(1).with_lines(lines)
    }

    #[test]
    fn test_multi_cell_always_table() {
        let page = body_page(vec![]);
        let grid = TableCandidate::new(
            BBox::new(50.0, 400.0, 500.0, 480.0),
            vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]],
        );
        let one_row = TableCandidate::new(
            BBox::new(50.0, 500.0, 500.0, 520.0),
            vec![vec!["a".into(), "b".into()]],
        );
        assert_eq!(classify_tables(&[grid, one_row], &page).len(), 2);
    }

    #[test]
    fn test_bold_box_rejected() {
        let area = BBox::new(60.0, 100.0, 400.0, 124.0);
        let page = body_page(vec![TextSpan::new(
            "Background",
            "Arial-BoldMT",
            10.0,
            BBox::new(70.0, 105.0, 130.0, 115.0),
        )]);
        let boxed = TableCandidate::single_cell(area, "Background");
        assert!(classify_tables(&[boxed], &page).is_empty());
    }

    #[test]
    fn test_large_box_rejected() {
        let area = BBox::new(60.0, 100.0, 400.0, 124.0);
        let page = body_page(vec![TextSpan::new(
            "Overview",
            "Helvetica",
            11.5,
            BBox::new(70.0, 104.0, 130.0, 116.0),
        )]);
        let boxed = TableCandidate::single_cell(area, "Overview");
        assert!(classify_tables(&[boxed], &page).is_empty());
    }

    #[test]
    fn test_plain_or_long_or_empty_box_kept() {
        let area = BBox::new(60.0, 100.0, 400.0, 124.0);
        let page = body_page(vec![TextSpan::new(
            "Note",
            "Helvetica",
            10.0,
            BBox::new(70.0, 105.0, 100.0, 115.0),
        )]);

        let plain = TableCandidate::single_cell(area, "Note");
        let long = TableCandidate::single_cell(area, "one two three four five six seven eight nine");
        let empty = TableCandidate::single_cell(BBox::new(300.0, 600.0, 400.0, 700.0), "");
        let no_words = TableCandidate::single_cell(BBox::new(300.0, 600.0, 400.0, 700.0), "ghost");
        let shapeless = TableCandidate::new(BBox::new(0.0, 0.0, 10.0, 10.0), vec![]);

        let regions = classify_tables(&[plain, long, empty, no_words, shapeless], &page);
        assert_eq!(regions.len(), 5);
    }
}
