//! Outline types: heading candidates, levels and the final result.

use super::BBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used when neither metadata nor layout yields one.
pub const UNTITLED: &str = "Untitled Document";

/// Heading level of an outline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Level for a 1-based depth, saturating at H4.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            _ => HeadingLevel::H4,
        }
    }

    /// 1-based depth.
    pub fn depth(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
            HeadingLevel::H4 => "H4",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detector produced a heading candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Caption line directly above a table
    TableCaption,
    /// Standalone line passing the heading rules
    Standalone,
    /// Embedded bookmark entry
    Bookmark,
    /// Line recognized on a rasterized page
    Ocr,
}

/// A line provisionally identified as a heading, before level assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    /// Cleaned heading text
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Position on the page; `None` when it could not be located
    pub bbox: Option<BBox>,
    /// Sort position of an unlocated candidate, taken from the entry before
    /// it on the same page
    pub anchor: Option<f32>,
    /// Representative font size
    pub font_size: f32,
    /// Representative bold flag
    pub is_bold: bool,
    /// Level fixed by the source (bookmark depth, OCR)
    pub level_hint: Option<HeadingLevel>,
    pub source: CandidateSource,
}

impl HeadingCandidate {
    /// Top edge used for ordering. Unlocated candidates use their anchor,
    /// or sort first on their page when they have none.
    pub fn top(&self) -> f32 {
        self.bbox.map(|b| b.y0).or(self.anchor).unwrap_or(0.0)
    }
}

/// One entry of the extracted outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// Body text between this heading and the next one (never null, may be empty)
    pub content: String,
    /// Page number (1-indexed)
    pub page: u32,
}

/// The result of extracting one document.
///
/// Failures are reported through `error` rather than by panicking or
/// returning early, so downstream consumers always get the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn new(title: impl Into<String>, outline: Vec<OutlineEntry>) -> Self {
        Self {
            title: title.into(),
            outline,
            error: None,
        }
    }

    /// A result carrying only an error.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            title: String::new(),
            outline: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_depth_saturates() {
        assert_eq!(HeadingLevel::from_depth(1), HeadingLevel::H1);
        assert_eq!(HeadingLevel::from_depth(3), HeadingLevel::H3);
        assert_eq!(HeadingLevel::from_depth(7), HeadingLevel::H4);
        assert_eq!(HeadingLevel::H2.depth(), 2);
    }

    #[test]
    fn test_result_json_shape() {
        let result = ExtractionResult::new(
            "Annual Report 2023",
            vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "Executive Summary".into(),
                content: "Revenue grew.".into(),
                page: 1,
            }],
        );
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Annual Report 2023","outline":[{"level":"H1","text":"Executive Summary","content":"Revenue grew.","page":1}]}"#
        );
    }

    #[test]
    fn test_failed_result_has_error_field() {
        let result = ExtractionResult::failed("Failed to open PDF: truncated");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "Failed to open PDF: truncated");
        assert!(json["outline"].as_array().unwrap().is_empty());
    }
}
