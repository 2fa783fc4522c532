//! Page-level layout types: spans, lines, words and pages.

use super::BBox;
use serde::{Deserialize, Serialize};

/// Font size assumed when a page carries no span data.
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// A run of text drawn with a single font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Bounding box in top-down page coordinates
    pub bbox: BBox,
}

impl TextSpan {
    /// Create a new span; boldness is inferred from the font name.
    pub fn new(text: impl Into<String>, font_name: impl Into<String>, font_size: f32, bbox: BBox) -> Self {
        let font_name = font_name.into();
        let is_bold = is_bold_font_name(&font_name);
        Self {
            text: text.into(),
            font_name,
            font_size,
            is_bold,
            bbox,
        }
    }

    /// Override the inferred bold flag (e.g. from a font descriptor).
    pub fn with_bold(mut self, is_bold: bool) -> Self {
        self.is_bold = is_bold;
        self
    }
}

/// Whether a PostScript font name denotes a bold face.
pub fn is_bold_font_name(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    lower.contains("bold") || lower.contains("black") || lower.contains("heavy")
}

/// A text line composed of spans sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// The spans in this line, sorted left to right
    pub spans: Vec<TextSpan>,
    /// Union of the span boxes
    pub bbox: BBox,
}

impl TextLine {
    /// Create a line from spans, ordering them left to right.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        let bbox = BBox::union_all(spans.iter().map(|s| &s.bbox)).unwrap_or_default();
        Self { spans, bbox }
    }

    /// The first span, which stands in for the line's style.
    pub fn representative(&self) -> Option<&TextSpan> {
        self.spans.first()
    }

    /// Representative font size, defaulting to 10pt for empty lines.
    pub fn font_size(&self) -> f32 {
        self.representative()
            .map(|s| s.font_size)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Representative bold flag.
    pub fn is_bold(&self) -> bool {
        self.representative().map(|s| s.is_bold).unwrap_or(false)
    }

    /// Get the combined text of all spans with appropriate spacing.
    ///
    /// A space is inserted when the horizontal gap between two spans exceeds
    /// a fifth of the average character width, except between characters of
    /// scripts written without word spaces.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }

            let prev = &self.spans[i - 1];
            let gap = span.bbox.x0 - prev.bbox.x1;

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.bbox.width() > 0.0 {
                span.bbox.width() / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let both_spaceless = prev.text.chars().last().map(is_spaceless_script_char).unwrap_or(false)
                && span.text.chars().next().map(is_spaceless_script_char).unwrap_or(false);
            let already_spaced = prev.text.ends_with([' ', '\u{00A0}'])
                || span.text.starts_with([' ', '\u{00A0}']);

            if gap > avg_char_width * 0.2 && !both_spaceless && !already_spaced {
                result.push(' ');
            }
            result.push_str(&span.text);
        }

        result
    }

    /// Split the line into words, distributing each span's width over its
    /// characters.
    pub fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        for span in &self.spans {
            let chars: Vec<char> = span.text.chars().collect();
            if chars.is_empty() {
                continue;
            }
            let char_width = span.bbox.width() / chars.len() as f32;

            let mut start: Option<usize> = None;
            for i in 0..=chars.len() {
                let boundary = i == chars.len() || chars[i].is_whitespace();
                match (start, boundary) {
                    (None, false) => start = Some(i),
                    (Some(s), true) => {
                        let text: String = chars[s..i].iter().collect();
                        let x0 = span.bbox.x0 + s as f32 * char_width;
                        let x1 = span.bbox.x0 + i as f32 * char_width;
                        words.push(Word {
                            text,
                            bbox: BBox::new(x0, span.bbox.y0, x1, span.bbox.y1),
                            font_size: span.font_size,
                            is_bold: span.is_bold,
                        });
                        start = None;
                    }
                    _ => {}
                }
            }
        }
        words
    }
}

/// A whitespace-delimited token with its position and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    pub is_bold: bool,
}

/// A single decoded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Text lines, top to bottom
    pub lines: Vec<TextLine>,

    /// Rectangles drawn on the page (ruled boxes, cell borders)
    pub rects: Vec<BBox>,

    /// Text drawn by reusable form objects (letterheads, running headers)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chrome: Vec<String>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            lines: Vec::new(),
            rects: Vec::new(),
            chrome: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Attach lines, keeping them in reading order.
    pub fn with_lines(mut self, lines: Vec<TextLine>) -> Self {
        self.lines = lines;
        self.sort_lines();
        self
    }

    /// Attach drawn rectangles.
    pub fn with_rects(mut self, rects: Vec<BBox>) -> Self {
        self.rects = rects;
        self
    }

    /// Attach form-object text.
    pub fn with_chrome(mut self, chrome: Vec<String>) -> Self {
        self.chrome = chrome;
        self
    }

    /// Add a line, keeping reading order.
    pub fn push_line(&mut self, line: TextLine) {
        self.lines.push(line);
        self.sort_lines();
    }

    fn sort_lines(&mut self) {
        self.lines.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
    }

    /// Whether the page has any extractable text.
    pub fn has_text(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.spans.iter().any(|s| !s.text.trim().is_empty()))
    }

    /// All spans on the page.
    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }

    pub fn span_count(&self) -> usize {
        self.lines.iter().map(|l| l.spans.len()).sum()
    }

    /// Median span font size, used as the "normal text" baseline.
    ///
    /// Defaults to 10pt when the page has no spans.
    pub fn base_font_size(&self) -> f32 {
        let mut sizes: Vec<f32> = self.spans().map(|s| s.font_size).collect();
        if sizes.is_empty() {
            return DEFAULT_FONT_SIZE;
        }
        sizes.sort_by(|a, b| a.total_cmp(b));
        sizes[sizes.len() / 2]
    }

    /// Largest span font size on the page.
    pub fn max_font_size(&self) -> f32 {
        self.spans()
            .map(|s| s.font_size)
            .fold(0.0_f32, f32::max)
    }

    /// All words on the page, in line order.
    pub fn words(&self) -> Vec<Word> {
        self.lines.iter().flat_map(|l| l.words()).collect()
    }

    /// First word (reading order) lying inside `area`.
    pub fn first_word_in(&self, area: &BBox) -> Option<Word> {
        self.lines
            .iter()
            .flat_map(|l| l.words())
            .find(|w| w.bbox.is_inside(area, 1.0))
    }

    /// Text of every line lying inside `area`, joined with spaces.
    pub fn text_in(&self, area: &BBox) -> String {
        self.lines
            .iter()
            .filter(|l| l.bbox.is_inside(area, 1.0))
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
