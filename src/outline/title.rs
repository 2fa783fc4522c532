//! Document title from metadata or the first page's layout.

use crate::model::{placement_among, Page, TableRegion, UNTITLED};

use super::text::clean_text;

/// Lines above this size on the upper half of page 1 are title material.
const TITLE_MIN_SIZE: f32 = 14.0;

/// Lines within this many points of the largest title line join the title.
const TITLE_SIZE_TOLERANCE: f32 = 2.0;

/// Metadata titles that authoring tools fill in on their own.
const GENERIC_TITLES: [&str; 2] = ["untitled", "microsoft word document"];

/// Pick the document title.
///
/// `first_page` is `None` when page 1 could not be read. `regions` are the
/// accepted tables on page 1.
pub fn extract_title(metadata: Option<&str>, first_page: Option<&Page>, regions: &[TableRegion]) -> String {
    if let Some(title) = metadata.and_then(title_from_metadata) {
        return title;
    }

    let Some(page) = first_page else {
        return UNTITLED.to_string();
    };

    title_from_layout(page, regions).unwrap_or_else(|| UNTITLED.to_string())
}

fn title_from_metadata(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || GENERIC_TITLES.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    let cleaned = clean_text(trimmed);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn title_from_layout(page: &Page, regions: &[TableRegion]) -> Option<String> {
    let midpoint = page.height * 0.5;
    let upper = || {
        page.lines
            .iter()
            .filter(move |l| !l.spans.is_empty() && l.bbox.y0 <= midpoint)
    };

    let prominent: Vec<(String, f32)> = upper()
        .map(|l| (l.text().trim().to_string(), l.font_size()))
        .filter(|(text, size)| !text.is_empty() && *size > TITLE_MIN_SIZE)
        .collect();

    if let Some(max_size) = prominent.iter().map(|(_, s)| *s).reduce(f32::max) {
        let joined = prominent
            .iter()
            .filter(|(_, size)| (max_size - size).abs() < TITLE_SIZE_TOLERANCE)
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = clean_text(&joined);
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
    }

    log::debug!("no prominent title line on page 1, using first non-table line");
    upper()
        .filter(|l| placement_among(regions, &l.bbox).is_none())
        .map(|l| clean_text(&l.text()))
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, TextLine, TextSpan};

    fn line(text: &str, size: f32, top: f32) -> TextLine {
        TextLine::from_spans(vec![TextSpan::new(
            text,
            "Helvetica",
            size,
            BBox::new(72.0, top, 72.0 + text.len() as f32 * size * 0.5, top + size),
        )])
    }

    #[test]
    fn test_metadata_wins() {
        let page = Page::letter(1).with_lines(vec![line("Annual Report 2023", 24.0, 80.0)]);
        assert_eq!(extract_title(Some("  Field   Study "), Some(&page), &[]), "Field Study");
    }

    #[test]
    fn test_generic_metadata_ignored() {
        let page = Page::letter(1).with_lines(vec![line("Annual Report 2023", 24.0, 80.0)]);
        assert_eq!(
            extract_title(Some("Microsoft Word Document"), Some(&page), &[]),
            "Annual Report 2023"
        );
        assert_eq!(extract_title(Some("untitled"), Some(&page), &[]), "Annual Report 2023");
    }

    #[test]
    fn test_multi_line_title_in_document_order() {
        let page = Page::letter(1).with_lines(vec![
            line("Overview of the", 22.0, 80.0),
            line("Foundation Level Extensions", 23.0, 110.0),
            line("Version 1.0", 16.0, 150.0),
            line("Body text here", 10.0, 200.0),
        ]);
        assert_eq!(
            extract_title(None, Some(&page), &[]),
            "Overview of the Foundation Level Extensions"
        );
    }

    #[test]
    fn test_lower_half_ignored() {
        let page = Page::letter(1).with_lines(vec![
            line("Application form", 12.0, 60.0),
            line("Huge footer banner", 30.0, 600.0),
        ]);
        assert_eq!(extract_title(None, Some(&page), &[]), "Application form");
    }

    #[test]
    fn test_form_fallback_skips_tables() {
        let page = Page::letter(1).with_lines(vec![
            line("Name of employee", 10.0, 60.0),
            line("Application for leave", 12.0, 140.0),
        ]);
        let regions = [TableRegion::new(BBox::new(50.0, 55.0, 500.0, 100.0))];
        assert_eq!(extract_title(None, Some(&page), &regions), "Application for leave");
    }

    #[test]
    fn test_untitled() {
        assert_eq!(extract_title(None, None, &[]), UNTITLED);
        assert_eq!(extract_title(None, Some(&Page::letter(1)), &[]), UNTITLED);
    }
}
