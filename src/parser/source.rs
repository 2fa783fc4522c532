//! Document access seam used by the extraction pipeline.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::Page;

use super::options::CancelToken;

/// One entry of an embedded bookmark tree, flattened in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// 1-based nesting depth
    pub depth: usize,
    pub title: String,
    /// Target page (1-indexed); `None` when the destination cannot be resolved
    pub page: Option<u32>,
}

impl Bookmark {
    pub fn new(depth: usize, title: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            depth,
            title: title.into(),
            page,
        }
    }
}

/// Parameters for rendering a page to an image.
#[derive(Debug, Clone, Copy)]
pub struct RasterRequest<'a> {
    pub dpi: u32,
    pub pdftoppm: &'a Path,
    pub timeout: Duration,
    pub cancel: &'a CancelToken,
    /// Directory receiving the image
    pub out_dir: &'a Path,
}

/// Read access to a paginated document.
///
/// Page numbers are 1-indexed. Implementations decode pages lazily; a page
/// that cannot be decoded returns [`Error::PageRead`] without affecting the
/// others.
pub trait DocumentSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// The metadata title, if present.
    fn metadata_title(&self) -> Option<String>;

    /// The embedded bookmark tree, flattened depth-first; empty when absent.
    fn bookmarks(&self) -> Vec<Bookmark>;

    /// Decode a single page.
    fn page(&self, number: u32) -> Result<Page>;

    /// Render a page to an image file for OCR.
    fn rasterize(&self, number: u32, request: &RasterRequest<'_>) -> Result<PathBuf> {
        let _ = request;
        Err(Error::Ocr(format!("page {} cannot be rasterized", number)))
    }
}

/// A document assembled in memory from already-laid-out pages.
///
/// Useful for feeding the pipeline from another decoder, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    page_count: u32,
    title: Option<String>,
    pages: BTreeMap<u32, Page>,
    bookmarks: Vec<Bookmark>,
    images: HashMap<u32, PathBuf>,
}

impl MemoryDocument {
    /// Create a document with `page_count` pages; pages not supplied fail to read.
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }

    /// Build a document from pages, numbered by their `number` field.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let page_count = pages.iter().map(|p| p.number).max().unwrap_or(0);
        pages
            .into_iter()
            .fold(Self::new(page_count), |doc, page| doc.with_page(page))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page_count = self.page_count.max(page.number);
        self.pages.insert(page.number, page);
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: Vec<Bookmark>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Supply the rendered image returned when page `number` is rasterized.
    pub fn with_page_image(mut self, number: u32, image: impl Into<PathBuf>) -> Self {
        self.images.insert(number, image.into());
        self
    }
}

impl DocumentSource for MemoryDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn metadata_title(&self) -> Option<String> {
        self.title.clone()
    }

    fn bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.clone()
    }

    fn page(&self, number: u32) -> Result<Page> {
        if number == 0 || number > self.page_count {
            return Err(Error::PageOutOfRange(number, self.page_count));
        }
        self.pages
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::PageRead(number, "page content unavailable".to_string()))
    }

    fn rasterize(&self, number: u32, _request: &RasterRequest<'_>) -> Result<PathBuf> {
        self.images
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::Ocr(format!("no image for page {}", number)))
    }
}
