//! PDF parsing module.

pub mod backend;
mod layout;
mod options;
mod pdf_parser;
mod source;
mod table_detector;

pub use layout::{group_spans_into_lines, LayoutAnalyzer};
pub use options::{CancelToken, ExtractOptions, OcrMode, DEFAULT_DPI, DEFAULT_OCR_TIMEOUT};
pub use pdf_parser::PdfParser;
pub use source::{Bookmark, DocumentSource, MemoryDocument, RasterRequest};
pub use table_detector::{TableDetector, TableDetectorConfig};
