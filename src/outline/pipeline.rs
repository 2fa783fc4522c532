//! The extraction state machine.
//!
//! open → title → source select (bookmarks or visual scan) → merge and sort
//! → level → segment content → filter against the title.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::model::{ExtractionResult, HeadingCandidate, OutlineEntry, Page};
use crate::parser::{DocumentSource, ExtractOptions, OcrMode, PdfParser, RasterRequest, TableDetector};

use super::candidates::{chrome_texts, detect_candidates, SeenSet};
use super::content::{segment_content, SortedCandidates};
use super::levels::{assign_level, LevelStrategy};
use super::ocr::{ocr_candidates, ocr_page_layout, OcrEngine};
use super::tables::classify_tables;
use super::text::is_similar;
use super::title::extract_title;
use super::toc::{candidates_from_bookmarks, is_toc_page};

/// A page ready for scanning.
enum PageJob {
    Text(Page),
    Image {
        number: u32,
        width: f32,
        height: f32,
        image: PathBuf,
    },
}

/// What one page contributed.
struct PageScan {
    page: Page,
    candidates: Vec<HeadingCandidate>,
    chrome: Vec<String>,
}

/// Runs extraction over a [`DocumentSource`].
pub struct Pipeline<'a> {
    options: &'a ExtractOptions,
    ocr: &'a dyn OcrEngine,
    detector: TableDetector,
}

impl<'a> Pipeline<'a> {
    pub fn new(options: &'a ExtractOptions, ocr: &'a dyn OcrEngine) -> Self {
        Self {
            options,
            ocr,
            detector: TableDetector::new(),
        }
    }

    /// Open `path` and extract its outline. Open failures become an error result.
    pub fn run_path(&self, path: &Path) -> ExtractionResult {
        match PdfParser::open(path) {
            Ok(parser) => self.run(&parser),
            Err(e) => {
                log::error!("cannot open {}: {}", path.display(), e);
                ExtractionResult::failed(e)
            }
        }
    }

    /// Extract the outline of an opened document.
    pub fn run(&self, source: &dyn DocumentSource) -> ExtractionResult {
        let page_count = source.page_count();
        let last_page = self.options.page_limit(page_count);

        let first_page = if page_count > 0 {
            source
                .page(1)
                .map_err(|e| log::warn!("page 1 unreadable, title from metadata only: {}", e))
                .ok()
        } else {
            None
        };
        let title = self.title(source, first_page.as_ref());
        log::debug!("title: {:?}", title);

        let mut cancelled = false;
        let mut pages: HashMap<u32, Page> = HashMap::new();

        let bookmarks = source.bookmarks();
        let mut candidates = Vec::new();
        if !bookmarks.is_empty() {
            let targets: BTreeSet<u32> = bookmarks
                .iter()
                .filter_map(|b| b.page)
                .filter(|p| *p >= 1 && *p <= last_page)
                .collect();
            for number in targets {
                if self.options.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let page = match (number, &first_page) {
                    (1, Some(p)) => Ok(p.clone()),
                    _ => source.page(number),
                };
                match page {
                    Ok(page) => {
                        pages.insert(number, page);
                    }
                    Err(e) => log::warn!("skipping bookmark target page {}: {}", number, e),
                }
            }

            let mut seen = SeenSet::new();
            candidates = candidates_from_bookmarks(&bookmarks, last_page, &pages)
                .into_iter()
                .filter(|c| seen.insert(&c.text))
                .collect();
        }

        if !candidates.is_empty() {
            log::info!("using {} bookmark entries as the outline source", candidates.len());
        } else {
            log::info!("no usable bookmarks, scanning {} pages visually", last_page);
            pages.clear();
            let (loaded, stopped) = self.load_pages(source, last_page, first_page);
            cancelled |= stopped;
            let scans = self.scan_pages(loaded.jobs, &title);
            cancelled |= self.options.cancel.is_cancelled();
            candidates = merge_scans(scans, &title, &mut pages);
        }

        let outline = build_outline(candidates, &pages, &title);

        let mut result = ExtractionResult::new(title, outline);
        if cancelled {
            result.error = Some(Error::Cancelled.to_string());
        }
        result
    }

    fn title(&self, source: &dyn DocumentSource, first_page: Option<&Page>) -> String {
        let regions = first_page
            .map(|p| classify_tables(&self.detector.detect(p), p))
            .unwrap_or_default();
        extract_title(source.metadata_title().as_deref(), first_page, &regions)
    }

    /// Decode pages in order, rendering those without text for OCR.
    ///
    /// Returns the jobs and whether the run was cancelled.
    fn load_pages(&self, source: &dyn DocumentSource, last_page: u32, first_page: Option<Page>) -> (LoadedPages, bool) {
        let mut loaded = LoadedPages::default();
        let mut first_page = first_page;

        for number in 1..=last_page {
            if self.options.cancel.is_cancelled() {
                return (loaded, true);
            }

            let decoded = match (number, first_page.take()) {
                (1, Some(p)) => Ok(p),
                _ => source.page(number),
            };

            let (width, height) = match decoded {
                Ok(page) if page.has_text() => {
                    loaded.jobs.push(PageJob::Text(page));
                    continue;
                }
                Ok(page) => {
                    log::debug!("page {} has no text layer", number);
                    (page.width, page.height)
                }
                Err(Error::Cancelled) => return (loaded, true),
                Err(e) => {
                    log::warn!("{}", e);
                    let letter = Page::letter(number);
                    (letter.width, letter.height)
                }
            };

            if self.options.ocr == OcrMode::Disabled {
                continue;
            }
            match self.rasterize(source, number, &mut loaded.scratch) {
                Ok(image) => loaded.jobs.push(PageJob::Image {
                    number,
                    width,
                    height,
                    image,
                }),
                Err(Error::Cancelled) => return (loaded, true),
                Err(e) => log::warn!("page {}: OCR skipped: {}", number, e),
            }
        }

        (loaded, false)
    }

    fn rasterize(&self, source: &dyn DocumentSource, number: u32, scratch: &mut Option<TempDir>) -> Result<PathBuf> {
        let dir = match scratch {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                let dir = tempfile::tempdir()?;
                let path = dir.path().to_path_buf();
                *scratch = Some(dir);
                path
            }
        };

        let request = RasterRequest {
            dpi: self.options.dpi,
            pdftoppm: &self.options.pdftoppm_cmd,
            timeout: self.options.ocr_timeout,
            cancel: &self.options.cancel,
            out_dir: &dir,
        };
        source.rasterize(number, &request)
    }

    fn scan_pages(&self, jobs: Vec<PageJob>, title: &str) -> Vec<PageScan> {
        if self.options.parallel {
            jobs.into_par_iter().map(|job| self.scan_page(job, title)).collect()
        } else {
            jobs.into_iter().map(|job| self.scan_page(job, title)).collect()
        }
    }

    /// Scan one page with a page-local seen set.
    fn scan_page(&self, job: PageJob, title: &str) -> PageScan {
        let mut seen = SeenSet::with_title(title);

        match job {
            PageJob::Text(page) => {
                let chrome = chrome_texts(&page);
                if self.options.cancel.is_cancelled() {
                    return PageScan { page, candidates: Vec::new(), chrome };
                }
                if is_toc_page(&page) {
                    log::info!("page {} is a table of contents, skipping", page.number);
                    return PageScan { page, candidates: Vec::new(), chrome };
                }
                let regions = classify_tables(&self.detector.detect(&page), &page);
                let candidates = detect_candidates(&page, &regions, &mut seen);
                log::debug!("page {}: {} heading candidates", page.number, candidates.len());
                PageScan { page, candidates, chrome }
            }
            PageJob::Image {
                number,
                width,
                height,
                image,
            } => {
                let text = match self.ocr.recognize(&image, &self.options.cancel) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("page {}: OCR failed: {}", number, e);
                        String::new()
                    }
                };
                let page = ocr_page_layout(number, width, height, &text);
                let candidates = ocr_candidates(&page, &mut seen);
                log::debug!("page {}: {} OCR heading candidates", number, candidates.len());
                PageScan {
                    page,
                    candidates,
                    chrome: Vec::new(),
                }
            }
        }
    }
}

#[derive(Default)]
struct LoadedPages {
    jobs: Vec<PageJob>,
    /// Holds rendered images until the scan is done
    scratch: Option<TempDir>,
}

/// Merge per-page scans in page order, applying the document-wide seen set.
fn merge_scans(scans: Vec<PageScan>, title: &str, pages: &mut HashMap<u32, Page>) -> Vec<HeadingCandidate> {
    let mut seen = SeenSet::with_title(title);
    let mut merged = Vec::new();

    for scan in scans {
        seen.extend(&scan.chrome);
        merged.extend(scan.candidates.into_iter().filter(|c| seen.insert(&c.text)));
        pages.insert(scan.page.number, scan.page);
    }
    merged
}

/// Level, segment and filter candidates into outline entries.
fn build_outline(candidates: Vec<HeadingCandidate>, pages: &HashMap<u32, Page>, title: &str) -> Vec<OutlineEntry> {
    let sorted = SortedCandidates::sort(candidates);
    let contents = segment_content(&sorted, pages);

    let mut strategies: HashMap<u32, LevelStrategy> = HashMap::new();
    for page_number in sorted.iter().map(|c| c.page) {
        strategies.entry(page_number).or_insert_with(|| {
            let on_page: Vec<&HeadingCandidate> = sorted.iter().filter(|c| c.page == page_number).collect();
            LevelStrategy::for_page(pages.get(&page_number), &on_page)
        });
    }

    sorted
        .iter()
        .zip(contents)
        .filter(|(candidate, _)| !is_similar(&candidate.text, title))
        .map(|(candidate, content)| {
            let level = strategies
                .get(&candidate.page)
                .map(|s| assign_level(candidate, s))
                .unwrap_or_else(|| assign_level(candidate, &LevelStrategy::for_page(None, &[])));
            OutlineEntry {
                level,
                text: candidate.text.clone(),
                content,
                page: candidate.page,
            }
        })
        .collect()
}
