//! Heading level assignment.

use crate::model::{HeadingCandidate, HeadingLevel, Page, DEFAULT_FONT_SIZE};

use super::text::numeric_level;

/// Size ratios against the page median for H1, H2 and H3 on prose pages.
pub const H1_SIZE_RATIO: f32 = 1.8;
pub const H2_SIZE_RATIO: f32 = 1.5;
pub const H3_SIZE_RATIO: f32 = 1.2;

/// Pages with at most this many spans may be posters.
const POSTER_MAX_SPANS: usize = 60;
/// Smallest top font size for a poster (the H2 step of a 36/24/18pt scale).
const POSTER_MIN_SIZE: f32 = 24.0;
/// Required ratio of the largest size to the median on a poster.
const POSTER_SPREAD: f32 = 2.0;

/// Layout style of a page, deciding how font sizes map to levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    /// Running text with occasional larger headings
    Prose,
    /// Few spans in very large, widely spread type
    Poster,
    /// No text layer
    Scanned,
}

impl PageStyle {
    pub fn classify(page: &Page) -> Self {
        if !page.has_text() {
            return PageStyle::Scanned;
        }
        let max = page.max_font_size();
        if page.span_count() <= POSTER_MAX_SPANS
            && max >= POSTER_MIN_SIZE
            && max >= page.base_font_size() * POSTER_SPREAD
        {
            PageStyle::Poster
        } else {
            PageStyle::Prose
        }
    }
}

/// How font size maps to a level on one page.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelStrategy {
    /// Thresholds relative to the page's median size
    Relative { base: f32 },
    /// Rank among the distinct candidate sizes on the page, largest first
    FontRank { sizes: Vec<f32> },
}

impl LevelStrategy {
    /// Strategy for a page given the candidates found on it.
    ///
    /// A page that could not be decoded falls back to relative sizing
    /// against the default font size.
    pub fn for_page(page: Option<&Page>, candidates: &[&HeadingCandidate]) -> Self {
        let Some(page) = page else {
            return LevelStrategy::Relative {
                base: DEFAULT_FONT_SIZE,
            };
        };

        match PageStyle::classify(page) {
            PageStyle::Poster => {
                let mut sizes: Vec<f32> = candidates.iter().map(|c| round_half(c.font_size)).collect();
                sizes.sort_by(|a, b| b.total_cmp(a));
                sizes.dedup();
                log::debug!("page {}: poster layout, size ranks {:?}", page.number, sizes);
                LevelStrategy::FontRank { sizes }
            }
            PageStyle::Prose | PageStyle::Scanned => LevelStrategy::Relative {
                base: page.base_font_size(),
            },
        }
    }

    /// Level implied by font size alone.
    pub fn font_level(&self, size: f32) -> HeadingLevel {
        match self {
            LevelStrategy::Relative { base } => {
                if size > base * H1_SIZE_RATIO {
                    HeadingLevel::H1
                } else if size > base * H2_SIZE_RATIO {
                    HeadingLevel::H2
                } else if size > base * H3_SIZE_RATIO {
                    HeadingLevel::H3
                } else {
                    HeadingLevel::H4
                }
            }
            LevelStrategy::FontRank { sizes } => {
                let size = round_half(size);
                sizes
                    .iter()
                    .position(|s| *s == size)
                    .map(|rank| HeadingLevel::from_depth(rank + 1))
                    .unwrap_or(HeadingLevel::H4)
            }
        }
    }
}

/// Final level: explicit hint, then section numbering, then font size.
pub fn assign_level(candidate: &HeadingCandidate, strategy: &LevelStrategy) -> HeadingLevel {
    candidate
        .level_hint
        .or_else(|| numeric_level(&candidate.text))
        .unwrap_or_else(|| strategy.font_level(candidate.font_size))
}

fn round_half(size: f32) -> f32 {
    (size * 2.0).round() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, CandidateSource, TextLine, TextSpan};

    fn candidate(text: &str, size: f32) -> HeadingCandidate {
        HeadingCandidate {
            text: text.to_string(),
            page: 1,
            bbox: Some(BBox::new(72.0, 100.0, 300.0, 100.0 + size)),
            anchor: None,
            font_size: size,
            is_bold: false,
            level_hint: None,
            source: CandidateSource::Standalone,
        }
    }

    fn page_with_sizes(sizes: &[f32]) -> Page {
        let lines = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let top = 40.0 + i as f32 * 30.0;
                TextLine::from_spans(vec![TextSpan::new(
                    "word",
                    "Helvetica",
                    *size,
                    BBox::new(72.0, top, 120.0, top + size),
                )])
            })
            .collect();
        Page::letter(1).with_lines(lines)
    }

    #[test]
    fn test_relative_thresholds() {
        let strategy = LevelStrategy::Relative { base: 10.0 };
        assert_eq!(strategy.font_level(19.0), HeadingLevel::H1);
        assert_eq!(strategy.font_level(16.0), HeadingLevel::H2);
        assert_eq!(strategy.font_level(12.5), HeadingLevel::H3);
        assert_eq!(strategy.font_level(12.0), HeadingLevel::H4);
        assert_eq!(strategy.font_level(10.0), HeadingLevel::H4);
    }

    #[test]
    fn test_numeric_overrides_font() {
        let strategy = LevelStrategy::Relative { base: 10.0 };
        assert_eq!(assign_level(&candidate("2.3.1 Overview", 30.0), &strategy), HeadingLevel::H3);
        assert_eq!(assign_level(&candidate("2.3 Overview", 10.0), &strategy), HeadingLevel::H2);
        assert_eq!(assign_level(&candidate("2 Overview", 10.0), &strategy), HeadingLevel::H1);
    }

    #[test]
    fn test_hint_overrides_everything() {
        let strategy = LevelStrategy::Relative { base: 10.0 };
        let mut c = candidate("1 Introduction", 30.0);
        c.level_hint = Some(HeadingLevel::H4);
        assert_eq!(assign_level(&c, &strategy), HeadingLevel::H4);
    }

    #[test]
    fn test_page_style() {
        assert_eq!(PageStyle::classify(&Page::letter(1)), PageStyle::Scanned);
        assert_eq!(
            PageStyle::classify(&page_with_sizes(&[40.0, 28.0, 12.0, 12.0, 12.0])),
            PageStyle::Poster
        );
        assert_eq!(
            PageStyle::classify(&page_with_sizes(&[14.0, 10.0, 10.0, 10.0])),
            PageStyle::Prose
        );
    }

    #[test]
    fn test_font_rank_on_poster() {
        let page = page_with_sizes(&[40.0, 28.0, 20.0, 12.0, 12.0, 12.0]);
        let big = candidate("Hope To See You There", 40.0);
        let mid = candidate("Pigeon Forge", 28.2);
        let small = candidate("Ticket Info", 20.0);
        let refs = [&big, &mid, &small];

        let strategy = LevelStrategy::for_page(Some(&page), &refs);
        assert_eq!(
            strategy,
            LevelStrategy::FontRank {
                sizes: vec![40.0, 28.0, 20.0]
            }
        );
        assert_eq!(assign_level(&big, &strategy), HeadingLevel::H1);
        assert_eq!(assign_level(&mid, &strategy), HeadingLevel::H2);
        assert_eq!(assign_level(&small, &strategy), HeadingLevel::H3);
        assert_eq!(strategy.font_level(9.0), HeadingLevel::H4);
    }

    #[test]
    fn test_unreadable_page_uses_default_base() {
        assert_eq!(
            LevelStrategy::for_page(None, &[]),
            LevelStrategy::Relative {
                base: DEFAULT_FONT_SIZE
            }
        );
    }
}
