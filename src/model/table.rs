//! Table geometry types.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A geometric table candidate: a box plus the text of its cells, row by row.
///
/// Single boxes drawn around a line of text come out as 1×1 candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCandidate {
    /// Bounding box of the whole candidate
    pub bbox: BBox,
    /// Cell text, one vector per row
    pub rows: Vec<Vec<String>>,
}

impl TableCandidate {
    pub fn new(bbox: BBox, rows: Vec<Vec<String>>) -> Self {
        Self { bbox, rows }
    }

    /// A single-cell candidate.
    pub fn single_cell(bbox: BBox, text: impl Into<String>) -> Self {
        Self::new(bbox, vec![vec![text.into()]])
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells in the first row.
    pub fn first_row_columns(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether this is a lone 1×1 box.
    pub fn is_single_cell(&self) -> bool {
        self.row_count() == 1 && self.first_row_columns() == 1
    }

    /// Text of the first cell, if any.
    pub fn first_cell(&self) -> Option<&str> {
        self.rows.first().and_then(|r| r.first()).map(|s| s.as_str())
    }
}

/// A candidate accepted as a genuine table.
///
/// Only the box survives; it is used for caption adjacency and exclusion
/// tests and never becomes heading data itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    pub bbox: BBox,
}

/// Where a line sits relative to the accepted tables on its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePlacement {
    /// Directly above a table, acting as its caption
    Header,
    /// Inside a table's area
    Inside,
}

/// Vertical reach above a table's top edge within which a line counts as its caption.
pub const CAPTION_MARGIN: f32 = 15.0;

/// Slack below the top edge still treated as "above" (caption boxes often touch the table).
const CAPTION_OVERLAP: f32 = 5.0;

impl TableRegion {
    pub fn new(bbox: BBox) -> Self {
        Self { bbox }
    }

    /// Classify `line` against this region.
    pub fn placement_of(&self, line: &BBox) -> Option<TablePlacement> {
        let table = &self.bbox;
        let just_above =
            line.y1 >= table.y0 - CAPTION_MARGIN && line.y1 <= table.y0 + CAPTION_OVERLAP;
        if line.overlaps_horizontally(table) && just_above {
            return Some(TablePlacement::Header);
        }
        if line.is_inside(table, 0.0) {
            return Some(TablePlacement::Inside);
        }
        None
    }
}

/// Placement of `line` against a set of regions; the first matching region wins.
pub fn placement_among(regions: &[TableRegion], line: &BBox) -> Option<TablePlacement> {
    regions.iter().find_map(|r| r.placement_of(line))
}
