//! Human-readable outline rendering.

use std::fmt::Write;

use crate::model::ExtractionResult;

const RULE_WIDTH: usize = 50;

/// Render the title and one line per outline entry.
///
/// A failed result renders as its error message.
pub fn to_text(result: &ExtractionResult) -> String {
    if let Some(error) = &result.error {
        if result.title.is_empty() && result.outline.is_empty() {
            return format!("An error occurred: {}\n", error);
        }
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "DOCUMENT TITLE: {}", result.title);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);
    let _ = writeln!(out, "EXTRACTED OUTLINE:");
    for entry in &result.outline {
        let _ = writeln!(out, "  - [Page {}] [{}] {}", entry.page, entry.level, entry.text);
    }
    if let Some(error) = &result.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "Incomplete: {}", error);
    }
    out
}
