//! # pdf-outline
//!
//! Extracts a structured outline from PDF documents: a title plus a
//! hierarchy of H1–H4 headings, each paired with its body text and page.
//!
//! The document does not need to declare its structure. Headings come from
//! the embedded bookmark tree when there is one, and otherwise from layout
//! heuristics (font size, weight, section numbering, table captions), with
//! OCR for pages that carry no text layer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::{extract_outline, render};
//!
//! let result = extract_outline("report.pdf");
//! if let Some(error) = &result.error {
//!     eprintln!("{}", error);
//! }
//! println!("{}", render::to_text(&result));
//! ```
//!
//! ## Features
//!
//! - **Bookmark-first**: embedded outlines are trusted as ground truth
//! - **Table-aware**: boxed headings are told apart from real tables
//! - **Poster pages**: large-type layouts are leveled by font rank
//! - **OCR fallback**: scanned pages go through `pdftoppm` and `tesseract`
//! - **Parallel processing**: uses Rayon for per-page scans

pub mod detect;
pub mod error;
pub mod model;
pub mod outline;
pub mod parser;
mod process;
pub mod render;

// Re-export commonly used types
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use model::{ExtractionResult, HeadingLevel, OutlineEntry, UNTITLED};
pub use outline::{OcrEngine, Pipeline, TesseractOcr};
pub use parser::{
    Bookmark, CancelToken, DocumentSource, ExtractOptions, MemoryDocument, OcrMode, PdfParser,
};
pub use render::JsonFormat;

use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Extract the outline of a PDF file with default options.
///
/// Never panics on bad input: a document that cannot be opened yields a
/// result whose `error` field is set.
///
/// # Example
///
/// ```no_run
/// let result = pdf_outline::extract_outline("report.pdf");
/// for entry in &result.outline {
///     println!("[{}] {} (page {})", entry.level, entry.text, entry.page);
/// }
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> ExtractionResult {
    extract_outline_with_options(path, &ExtractOptions::default())
}

/// Extract the outline of a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{extract_outline_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().with_max_pages(10).with_dpi(200);
/// let result = extract_outline_with_options("scan.pdf", &options);
/// ```
pub fn extract_outline_with_options<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> ExtractionResult {
    let ocr = TesseractOcr::from_options(options);
    Pipeline::new(options, &ocr).run_path(path.as_ref())
}

/// Extract the outline of a PDF held in memory.
pub fn extract_outline_from_bytes(data: &[u8], options: &ExtractOptions) -> ExtractionResult {
    match PdfParser::from_bytes(data) {
        Ok(parser) => {
            let ocr = TesseractOcr::from_options(options);
            Pipeline::new(options, &ocr).run(&parser)
        }
        Err(e) => ExtractionResult::failed(e),
    }
}

/// Extract the outline of a PDF read from `reader`.
pub fn extract_outline_from_reader<R: Read>(reader: R, options: &ExtractOptions) -> ExtractionResult {
    match PdfParser::from_reader(reader) {
        Ok(parser) => {
            let ocr = TesseractOcr::from_options(options);
            Pipeline::new(options, &ocr).run(&parser)
        }
        Err(e) => ExtractionResult::failed(e),
    }
}

/// Builder for configuring and running extractions.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::OutlineExtractor;
///
/// let result = OutlineExtractor::new()
///     .max_pages(20)
///     .dpi(200)
///     .ocr_lang("deu")
///     .extract("bericht.pdf");
/// println!("{}", result.title);
/// ```
pub struct OutlineExtractor {
    options: ExtractOptions,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl OutlineExtractor {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            ocr: None,
        }
    }

    /// Start from existing options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options, ocr: None }
    }

    /// Only scan the first `n` pages.
    pub fn max_pages(mut self, n: u32) -> Self {
        self.options = self.options.with_max_pages(n);
        self
    }

    /// Rasterization resolution for OCR.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options = self.options.with_dpi(dpi);
        self
    }

    /// Never run OCR.
    pub fn without_ocr(mut self) -> Self {
        self.options = self.options.without_ocr();
        self
    }

    /// Tesseract language code.
    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.options = self.options.with_ocr_lang(lang);
        self
    }

    /// Per-page OCR timeout.
    pub fn ocr_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_ocr_timeout(timeout);
        self
    }

    /// Use a custom OCR engine instead of `tesseract`.
    pub fn with_ocr_engine(mut self, engine: impl OcrEngine + 'static) -> Self {
        self.ocr = Some(Box::new(engine));
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Attach a cancellation token.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.options = self.options.with_cancel_token(token);
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the outline of a PDF file.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> ExtractionResult {
        self.with_pipeline(|pipeline| pipeline.run_path(path.as_ref()))
    }

    /// Extract the outline of a PDF held in memory.
    pub fn extract_bytes(&self, data: &[u8]) -> ExtractionResult {
        match PdfParser::from_bytes(data) {
            Ok(parser) => self.extract_source(&parser),
            Err(e) => ExtractionResult::failed(e),
        }
    }

    /// Extract the outline of any document source.
    pub fn extract_source(&self, source: &dyn DocumentSource) -> ExtractionResult {
        self.with_pipeline(|pipeline| pipeline.run(source))
    }

    fn with_pipeline<T>(&self, f: impl FnOnce(&Pipeline<'_>) -> T) -> T {
        match &self.ocr {
            Some(engine) => f(&Pipeline::new(&self.options, engine.as_ref())),
            None => {
                let engine = TesseractOcr::from_options(&self.options);
                f(&Pipeline::new(&self.options, &engine))
            }
        }
    }
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::new()
    }
}
