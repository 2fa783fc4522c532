//! OCR fallback for pages without a text layer.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{BBox, CandidateSource, HeadingCandidate, HeadingLevel, Page, TextLine, TextSpan};
use crate::parser::{CancelToken, ExtractOptions};
use crate::process::run_tool;

use super::candidates::SeenSet;
use super::text::{clean_text, word_count};

/// Font name given to recognized text.
pub const OCR_FONT: &str = "OCR";
const OCR_FONT_SIZE: f32 = 10.0;
const OCR_MARGIN: f32 = 36.0;
const OCR_LINE_PITCH: f32 = 14.0;

/// Longest recognized line still treated as a heading.
const MAX_OCR_HEADING_WORDS: usize = 10;

/// Text recognition over a rendered page image.
pub trait OcrEngine: Sync {
    /// Recognize the text of `image`, one output line per text line.
    fn recognize(&self, image: &Path, cancel: &CancelToken) -> Result<String>;
}

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    cmd: PathBuf,
    lang: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(cmd: impl Into<PathBuf>, lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            cmd: cmd.into(),
            lang: lang.into(),
            timeout,
        }
    }

    /// Engine configured from extraction options.
    pub fn from_options(options: &ExtractOptions) -> Self {
        Self::new(&options.tesseract_cmd, &options.ocr_lang, options.ocr_timeout)
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &Path, cancel: &CancelToken) -> Result<String> {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        let dir = image.parent().unwrap_or_else(|| Path::new("."));
        let out_base = dir.join(format!("{}-ocr", stem));

        let mut cmd = Command::new(&self.cmd);
        cmd.arg(image).arg(&out_base).arg("-l").arg(&self.lang);
        run_tool(
            cmd,
            "tesseract",
            self.timeout,
            cancel,
            &dir.join(format!("{}-ocr.err", stem)),
        )?;

        let text_path = out_base.with_extension("txt");
        std::fs::read_to_string(&text_path)
            .map_err(|e| Error::Ocr(format!("tesseract produced no text for {}: {}", image.display(), e)))
    }
}

/// Lay recognized text out as a page: one line per non-empty output line,
/// stacked at a uniform pitch from the top margin.
pub fn ocr_page_layout(number: u32, width: f32, height: f32, text: &str) -> Page {
    let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let usable = (height - 2.0 * OCR_MARGIN).max(OCR_FONT_SIZE);
    let pitch = if rows.is_empty() {
        OCR_LINE_PITCH
    } else {
        OCR_LINE_PITCH.min(usable / rows.len() as f32)
    };
    let char_width = OCR_FONT_SIZE * 0.5;

    let lines = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let top = OCR_MARGIN + i as f32 * pitch;
            let right = (OCR_MARGIN + row.chars().count() as f32 * char_width).min(width);
            let bottom = top + OCR_FONT_SIZE.min(pitch);
            TextLine::from_spans(vec![TextSpan::new(
                *row,
                OCR_FONT,
                OCR_FONT_SIZE,
                BBox::new(OCR_MARGIN, top, right, bottom),
            )])
        })
        .collect();

    Page::new(number, width, height).with_lines(lines)
}

/// Heading candidates from an OCR page: short lines that don't end like a sentence.
pub fn ocr_candidates(page: &Page, seen: &mut SeenSet) -> Vec<HeadingCandidate> {
    let mut candidates = Vec::new();

    for line in &page.lines {
        let cleaned = clean_text(&line.text());
        let words = word_count(&cleaned);
        if cleaned.is_empty() || seen.contains(&cleaned) {
            continue;
        }
        if words < MAX_OCR_HEADING_WORDS && !cleaned.ends_with(['.', '!', '?']) {
            seen.insert(&cleaned);
            candidates.push(HeadingCandidate {
                text: cleaned,
                page: page.number,
                bbox: Some(line.bbox),
                anchor: None,
                font_size: line.font_size(),
                is_bold: false,
                level_hint: Some(HeadingLevel::H4),
                source: CandidateSource::Ocr,
            });
        }
    }

    candidates
}
