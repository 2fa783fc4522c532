//! Data model for outline extraction.
//!
//! Layout types (`Page`, `TextLine`, `TextSpan`, `Word`) are read-only views
//! derived from a page once per extraction pass. Outline types
//! (`HeadingCandidate`, `OutlineEntry`, `ExtractionResult`) live only for the
//! duration of one extraction call.

mod geometry;
mod outline;
mod page;
mod table;

pub use geometry::BBox;
pub use outline::{
    CandidateSource, ExtractionResult, HeadingCandidate, HeadingLevel, OutlineEntry, UNTITLED,
};
pub use page::{
    is_bold_font_name, is_spaceless_script_char, Page, TextLine, TextSpan, Word,
    DEFAULT_FONT_SIZE,
};
pub use table::{placement_among, TableCandidate, TablePlacement, TableRegion, CAPTION_MARGIN};
