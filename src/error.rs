//! Error types for pdf-outline.

use std::io;
use thiserror::Error;

/// Result type alias for pdf-outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during outline extraction.
///
/// Only [`Error::DocumentOpen`] (and the format/IO errors it wraps) aborts a
/// document. Page-level and OCR errors are logged and the page is skipped.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be decoded.
    #[error("Document is encrypted")]
    Encrypted,

    /// The document container could not be decoded at all.
    #[error("Failed to open PDF: {0}")]
    DocumentOpen(String),

    /// A single page could not be read (malformed content stream, missing
    /// page object, ...).
    #[error("Failed to read page {0}: {1}")]
    PageRead(u32, String),

    /// Rasterization or text recognition failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The extraction was cancelled by the caller.
    #[error("Extraction cancelled")]
    Cancelled,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Heading candidates were handed to content segmentation out of order.
    #[error("Heading candidates are not sorted by page and position (index {0})")]
    UnsortedCandidates(usize),

    /// Error during rendering (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error ends the whole document run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DocumentOpen(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::Encrypted
                | Error::Io(_)
                | Error::Cancelled
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
