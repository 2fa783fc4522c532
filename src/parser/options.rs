//! Extraction options and configuration.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default rasterization resolution for OCR.
pub const DEFAULT_DPI: u32 = 300;

/// Default wall-clock budget for OCR on a single page.
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for extracting an outline.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only scan the first N pages (None = all pages)
    pub max_pages: Option<u32>,

    /// Rasterization resolution for OCR
    pub dpi: u32,

    /// Whether pages without a text layer fall back to OCR
    pub ocr: OcrMode,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    pub ocr_lang: String,

    /// Per-page OCR time budget
    pub ocr_timeout: Duration,

    /// OCR engine executable
    pub tesseract_cmd: PathBuf,

    /// Rasterizer executable
    pub pdftoppm_cmd: PathBuf,

    /// Whether to scan pages in parallel
    pub parallel: bool,

    /// Cancellation handle shared with the caller
    pub cancel: CancelToken,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the scan to the first `n` pages.
    pub fn with_max_pages(mut self, n: u32) -> Self {
        self.max_pages = Some(n);
        self
    }

    /// Set the OCR rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Disable the OCR fallback.
    pub fn without_ocr(mut self) -> Self {
        self.ocr = OcrMode::Disabled;
        self
    }

    /// Set the OCR language.
    pub fn with_ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.ocr_lang = lang.into();
        self
    }

    /// Set the per-page OCR time budget.
    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    /// Use a specific tesseract executable.
    pub fn with_tesseract(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.tesseract_cmd = cmd.into();
        self
    }

    /// Use a specific pdftoppm executable.
    pub fn with_pdftoppm(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.pdftoppm_cmd = cmd.into();
        self
    }

    /// Enable or disable parallel page scanning.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Number of pages to scan in a document of `page_count` pages.
    pub fn page_limit(&self, page_count: u32) -> u32 {
        self.max_pages
            .map(|n| n.min(page_count))
            .unwrap_or(page_count)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            dpi: DEFAULT_DPI,
            ocr: OcrMode::Auto,
            ocr_lang: "eng".to_string(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            parallel: true,
            cancel: CancelToken::new(),
        }
    }
}

/// When to run OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrMode {
    /// OCR pages whose text layer is empty or unreadable
    #[default]
    Auto,
    /// Never OCR; such pages contribute nothing
    Disabled,
}

/// A cloneable flag for cancelling an extraction from another thread.
///
/// Pending pages are skipped once the token fires, and any OCR subprocess
/// in flight is killed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
