//! Table detection from page geometry.
//!
//! Two sources feed the detector:
//! - ruled boxes: rectangles drawn on the page, clustered into grids (a lone
//!   box becomes a 1×1 candidate);
//! - stream mode: text alignment patterns without graphical lines, in the
//!   manner of Camelot's Stream mode.
//!
//! The detector only proposes candidates. Deciding which ones are real
//! tables is left to the outline engine.

use std::collections::{HashMap, HashSet};

use crate::model::{BBox, Page, TableCandidate, TextSpan};

/// A row of text spans in a stream-mode table.
#[derive(Debug, Clone)]
struct TableRowData {
    /// Spans in this row, sorted by X
    spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Whether to look for unruled tables in text alignment
    pub stream_mode: bool,
    /// Rectangles narrower or shorter than this are rules, not boxes (points)
    pub min_box_side: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            stream_mode: true,
            min_box_side: 6.0,
        }
    }
}

/// Proposes table candidates for a page.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect table candidates on a page: ruled grids first, then unruled
    /// regions that don't overlap any of them.
    pub fn detect(&self, page: &Page) -> Vec<TableCandidate> {
        let mut candidates = self.detect_ruled(page);

        if self.config.stream_mode {
            let spans: Vec<TextSpan> = page.spans().cloned().collect();
            for table in self.detect_stream(spans) {
                if candidates.iter().all(|c| !c.bbox.intersects(&table.bbox)) {
                    candidates.push(table);
                }
            }
        }

        log::debug!(
            "TableDetector: page {} has {} candidates",
            page.number,
            candidates.len()
        );
        candidates
    }

    // ---------------------------------------------------------------------
    // Ruled boxes
    // ---------------------------------------------------------------------

    fn detect_ruled(&self, page: &Page) -> Vec<TableCandidate> {
        let boxes: Vec<BBox> = page
            .rects
            .iter()
            .copied()
            .filter(|r| r.width() >= self.config.min_box_side && r.height() >= self.config.min_box_side)
            .filter(|r| !(r.width() > page.width * 0.9 && r.height() > page.height * 0.9))
            .collect();

        cluster_touching(&boxes)
            .into_iter()
            .map(|cluster| {
                let cells = innermost(&cluster);
                let bbox = BBox::union_all(cluster.iter()).unwrap_or_default();
                TableCandidate::new(bbox, grid_rows(page, &cells))
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Stream mode
    // ---------------------------------------------------------------------

    /// Detect unruled tables in the given spans.
    fn detect_stream(&self, spans: Vec<TextSpan>) -> Vec<TableCandidate> {
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let regions = self.find_table_regions(&rows, &columns);
        log::debug!("TableDetector: found {} table regions", regions.len());

        let mut tables = Vec::new();
        for (start_row, end_row) in regions {
            let table_rows = &rows[start_row..=end_row];

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let bbox = BBox::union_all(table_rows.iter().flat_map(|r| r.spans.iter().map(|s| &s.bbox)))
                .unwrap_or_default();
            let cells = self.cells_by_column(table_rows, &table_columns, bbox.x1);
            tables.push(TableCandidate::new(bbox, cells));
        }

        tables
    }

    /// Group spans into rows by their bottom edge.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        if spans.is_empty() {
            return vec![];
        }

        let mut sorted_spans = spans.to_vec();
        sorted_spans.sort_by(|a, b| {
            a.bbox
                .y1
                .total_cmp(&b.bbox.y1)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current_row_spans: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted_spans {
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;

            match current_y {
                Some(y) if (span.bbox.y1 - y).abs() <= y_tolerance => {
                    current_row_spans.push(span);
                }
                _ => {
                    if !current_row_spans.is_empty() {
                        rows.push(row_from_spans(std::mem::take(&mut current_row_spans)));
                    }
                    current_y = Some(span.bbox.y1);
                    current_row_spans.push(span);
                }
            }
        }

        if !current_row_spans.is_empty() {
            rows.push(row_from_spans(current_row_spans));
        }

        rows
    }

    /// Detect column boundaries from text edges.
    ///
    /// Rows with several spans are the best evidence; when there are too few
    /// of them every row votes.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        if rows.is_empty() {
            return vec![];
        }

        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let (voters, once_per_row): (Vec<&TableRowData>, bool) =
            if multi_span_rows.len() < self.config.min_rows {
                (rows.iter().collect(), false)
            } else {
                (multi_span_rows, true)
            };

        let bucket_size = 5.0;
        let mut edge_counts: HashMap<i32, usize> = HashMap::new();

        for row in &voters {
            let mut row_buckets: HashSet<i32> = HashSet::new();
            for span in &row.spans {
                let bucket = (span.bbox.x0 / bucket_size).round() as i32;
                if !once_per_row || row_buckets.insert(bucket) {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        let min_occurrences =
            ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * bucket_size)
            .collect();
        column_edges.sort_by(|a, b| a.total_cmp(b));

        // Merge close edges
        let mut merged_edges: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged_edges.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged_edges.push(edge),
            }
        }

        merged_edges
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        if rows.is_empty() || columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut regions: Vec<(usize, usize)> = Vec::new();
        let mut current_start: Option<usize> = None;
        let mut consecutive_table_rows = 0;

        for (i, row) in rows.iter().enumerate() {
            let alignment_score = self.calculate_alignment_score(row, columns);

            if alignment_score >= self.config.min_alignment_ratio && row.spans.len() >= 2 {
                if current_start.is_none() {
                    current_start = Some(i);
                }
                consecutive_table_rows += 1;
            } else {
                if let Some(start) = current_start {
                    if consecutive_table_rows >= self.config.min_rows {
                        regions.push((start, i - 1));
                    }
                }
                current_start = None;
                consecutive_table_rows = 0;
            }
        }

        if let Some(start) = current_start {
            if consecutive_table_rows >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Calculate how well a row aligns with the detected columns.
    fn calculate_alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let tolerance = 5.0;
        let aligned_spans = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.bbox.x0 - col).abs() <= tolerance))
            .count();

        aligned_spans as f32 / row.spans.len() as f32
    }

    /// Cell text per row, one cell per column.
    fn cells_by_column(&self, rows: &[TableRowData], columns: &[f32], right_x: f32) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| {
                let mut cell_contents: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    let col_idx = find_column_for_span(span.bbox.x0, columns, right_x);
                    if let Some(cell) = cell_contents.get_mut(col_idx) {
                        cell.push(span.text.trim().to_string());
                    }
                }
                cell_contents.into_iter().map(|c| c.join(" ")).collect()
            })
            .collect()
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// When a PDF has a numbered list like "1. Item", the number and text often
    /// become separate spans at different X positions, which looks like a
    /// multi-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            // spans are sorted by x, so the first one is the marker column
            if let Some(span) = row.spans.first() {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;
        log::debug!(
            "TableDetector: list markers: bullets={}, numbers={}, total rows={}",
            bullet_count,
            number_count,
            rows.len()
        );

        if bullet_ratio >= 0.5 {
            return true;
        }

        // Only 2-column regions: real tables often have a numbered first column.
        columns.len() == 2 && total_ratio >= 0.5
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn row_from_spans(mut spans: Vec<TextSpan>) -> TableRowData {
    spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    TableRowData { spans }
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    if columns.is_empty() {
        return 0;
    }

    // Allow 10pt of slack for spans slightly before the column start
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Partition boxes into groups of mutually touching boxes (1pt slack).
fn cluster_touching(boxes: &[BBox]) -> Vec<Vec<BBox>> {
    let mut parent: Vec<usize> = (0..boxes.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..boxes.len() {
        let grown = BBox::new(
            boxes[i].x0 - 1.0,
            boxes[i].y0 - 1.0,
            boxes[i].x1 + 1.0,
            boxes[i].y1 + 1.0,
        );
        for j in (i + 1)..boxes.len() {
            if grown.intersects(&boxes[j]) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<BBox>)> = Vec::new();
    for (i, b) in boxes.iter().enumerate() {
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(*b),
            None => groups.push((root, vec![*b])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

/// Drop boxes that merely frame other boxes of the same cluster.
fn innermost(cluster: &[BBox]) -> Vec<BBox> {
    if cluster.len() == 1 {
        return cluster.to_vec();
    }
    cluster
        .iter()
        .enumerate()
        .filter(|(i, outer)| {
            !cluster
                .iter()
                .enumerate()
                .any(|(j, inner)| j != *i && inner != *outer && inner.is_inside(outer, 0.5))
        })
        .map(|(_, b)| *b)
        .collect()
}

/// Arrange cells into rows by their top edge and read each cell's text.
fn grid_rows(page: &Page, cells: &[BBox]) -> Vec<Vec<String>> {
    let mut cells = cells.to_vec();
    cells.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row_top: Option<f32> = None;
    for cell in cells {
        let text = page.text_in(&cell);
        match row_top {
            Some(top) if (cell.y0 - top).abs() <= 2.0 => {
                if let Some(row) = rows.last_mut() {
                    row.push(text);
                }
            }
            _ => {
                row_top = Some(cell.y0);
                rows.push(vec![text]);
            }
        }
    }
    rows
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Remove internal whitespace for pattern matching (handles "1 .")
    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // Letter marker: "a.", "B)"
    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextLine;

    /// A 12pt span whose bottom edge sits at `y`.
    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        let width = text.chars().count() as f32 * 6.0;
        TextSpan::new(text, "Helvetica", 12.0, BBox::new(x, y - 12.0, x + width, y))
    }

    fn page_of(spans: Vec<TextSpan>, rects: Vec<BBox>) -> Page {
        let lines = crate::parser::group_spans_into_lines(spans);
        Page::letter(1).with_lines(lines).with_rects(rects)
    }

    fn is_list_marker(text: &str) -> bool {
        is_bullet_marker(text) || is_number_marker(text)
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("A1", 10.0, 100.0),
            make_span("B1", 60.0, 100.0),
            make_span("A2", 10.0, 115.0),
            make_span("B2", 60.0, 115.0),
        ];

        let rows = detector.group_into_rows(&spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans.len(), 2);
        assert!(rows[0].spans.iter().all(|s| s.text.ends_with('1')));
        assert_eq!(rows[1].spans.len(), 2);
        assert!(rows[1].spans.iter().all(|s| s.text.ends_with('2')));
    }

    #[test]
    fn test_detect_columns() {
        let detector = TableDetector::new();
        let rows: Vec<TableRowData> = [100.0, 115.0, 130.0]
            .iter()
            .map(|&y| row_from_spans(vec![make_span("A", 10.0, y), make_span("B", 60.0, y)]))
            .collect();

        assert_eq!(detector.detect_columns(&rows).len(), 2);
    }

    #[test]
    fn test_detect_simple_stream_table() {
        let detector = TableDetector::new();
        let page = page_of(
            vec![
                make_span("Name", 10.0, 100.0),
                make_span("Age", 80.0, 100.0),
                make_span("Alice", 10.0, 115.0),
                make_span("30", 80.0, 115.0),
                make_span("Bob", 10.0, 130.0),
                make_span("25", 80.0, 130.0),
            ],
            vec![],
        );

        let tables = detector.detect(&page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 3);
        assert_eq!(tables[0].rows[1], vec!["Alice".to_string(), "30".to_string()]);
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let page = page_of(
            vec![
                make_span("Line 1", 10.0, 100.0),
                make_span("Line 2", 10.0, 115.0),
                make_span("Line 3", 10.0, 130.0),
            ],
            vec![],
        );
        assert!(detector.detect(&page).is_empty());
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let mut spans = Vec::new();
        for (i, item) in ["장비관리설정", "Object관리", "정책관리 및 라우팅", "VPN", "운영관리"]
            .iter()
            .enumerate()
        {
            let y = 100.0 + i as f32 * 30.0;
            spans.push(make_span(&format!("{}.", i + 1), 50.0, y));
            spans.push(make_span(item, 80.0, y));
        }

        let tables = detector.detect(&page_of(spans, vec![]));
        assert!(tables.is_empty(), "Numbered list should not be detected as a table");
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("-", 50.0, 100.0),
            make_span("Management", 80.0, 100.0),
            make_span("-", 50.0, 130.0),
            make_span("Interface/Service Option", 80.0, 130.0),
            make_span("-", 50.0, 160.0),
            make_span("Firmware", 80.0, 160.0),
        ];

        let tables = detector.detect(&page_of(spans, vec![]));
        assert!(tables.is_empty(), "Bullet list should not be detected as a table");
    }

    #[test]
    fn test_single_box_is_one_by_one() {
        let detector = TableDetector::new();
        let heading = TextSpan::new(
            "Background",
            "Helvetica-Bold",
            14.0,
            BBox::new(60.0, 102.0, 160.0, 116.0),
        );
        let page = Page::letter(1)
            .with_lines(vec![TextLine::from_spans(vec![heading])])
            .with_rects(vec![BBox::new(50.0, 95.0, 560.0, 122.0)]);

        let tables = detector.detect(&page);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].is_single_cell());
        assert_eq!(tables[0].first_cell(), Some("Background"));
    }

    #[test]
    fn test_ruled_grid_rows_and_columns() {
        let detector = TableDetector::new();
        let mut rects = vec![BBox::new(50.0, 200.0, 350.0, 260.0)]; // frame
        for row in 0..3 {
            for col in 0..3 {
                let x = 50.0 + col as f32 * 100.0;
                let y = 200.0 + row as f32 * 20.0;
                rects.push(BBox::new(x, y, x + 100.0, y + 20.0));
            }
        }
        let page = page_of(vec![make_span("Q1", 55.0, 216.0)], rects);

        let tables = detector.detect(&page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 3);
        assert_eq!(tables[0].first_row_columns(), 3);
        assert_eq!(tables[0].rows[0][0], "Q1");
        assert_eq!(tables[0].bbox, BBox::new(50.0, 200.0, 350.0, 260.0));
    }

    #[test]
    fn test_page_border_and_rules_ignored() {
        let detector = TableDetector::new();
        let page = page_of(
            vec![],
            vec![
                BBox::new(5.0, 5.0, 607.0, 787.0),
                BBox::new(50.0, 300.0, 560.0, 301.0),
            ],
        );
        assert!(detector.detect(&page).is_empty());
    }

    #[test]
    fn test_is_list_marker() {
        assert!(is_list_marker("1."));
        assert!(is_list_marker("12."));
        assert!(is_list_marker("1)"));
        assert!(is_list_marker("1 ."));
        assert!(is_list_marker("3"));

        assert!(is_list_marker("-"));
        assert!(is_list_marker("•"));
        assert!(is_list_marker("*"));
        assert!(is_list_marker("–"));

        assert!(is_list_marker("a."));
        assert!(is_list_marker("B)"));

        assert!(!is_list_marker("Name"));
        assert!(!is_list_marker("Hello World"));
        assert!(!is_list_marker("Alice"));
        assert!(!is_list_marker(""));
    }
}
