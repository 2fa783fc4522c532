//! The outline extraction engine.
//!
//! Everything here works on decoded [`Page`](crate::model::Page)s, so the
//! heuristics can be exercised without a PDF in hand.

pub mod candidates;
pub mod content;
pub mod levels;
pub mod ocr;
mod pipeline;
pub mod tables;
pub mod text;
pub mod title;
pub mod toc;

pub use candidates::{detect_candidates, is_heading_candidate, SeenSet, HEADING_SIZE_RATIO};
pub use content::{segment_content, SortedCandidates};
pub use levels::{assign_level, LevelStrategy, PageStyle};
pub use ocr::{ocr_candidates, ocr_page_layout, OcrEngine, TesseractOcr};
pub use pipeline::Pipeline;
pub use tables::{classify_tables, TABLE_HEADING_SIZE_RATIO};
pub use text::{clean_text, similarity_ratio, TITLE_SIMILARITY_THRESHOLD};
pub use title::extract_title;
pub use toc::{candidates_from_bookmarks, is_toc_page};
