//! Plain-text report.
//!
//! ```text
//! ==================================================
//! DUPLICATE SEARCH REPORT
//! ==================================================
//!
//! File name: clients.dbf
//! ...
//! ==================================================
//! DUPLICATES FOUND
//! ==================================================
//!
//! Duplicated values found: 1
//!
//! 1. Value: "1001"
//!    Rows: 2, 4
//! ```

use std::fmt;

use super::ScanReport;
use crate::source::SourceFormat;

const BANNER_WIDTH: usize = 50;

/// Text rendering of a [`ScanReport`].
pub struct TextReport<'a> {
    report: &'a ScanReport,
}

impl<'a> TextReport<'a> {
    /// Wrap a report for rendering.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Render the full report.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;

        banner(f, "DUPLICATE SEARCH REPORT")?;
        writeln!(f, "File name: {}", r.file_name)?;
        writeln!(f, "File path: {}", r.path.display())?;
        writeln!(f, "File size: {}", r.size_display())?;
        writeln!(f, "File encoding: {}", r.encoding)?;
        writeln!(f, "{}: {}", row_count_label(r.format), r.row_count)?;
        writeln!(
            f,
            "Search duration: {:.2} s",
            r.scan_duration().as_secs_f64()
        )?;
        writeln!(f, "Analysed column: {}", r.column_name)?;
        writeln!(
            f,
            "Generated: {}",
            r.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        if r.summary.rows_skipped > 0 {
            writeln!(f, "Rows skipped (unreadable cell): {}", r.summary.rows_skipped)?;
        }
        if r.summary.blank_cells > 0 {
            writeln!(f, "Empty cells ignored: {}", r.summary.blank_cells)?;
        }
        writeln!(f)?;

        banner(f, "DUPLICATES FOUND")?;
        if r.groups.is_empty() {
            writeln!(f, "No duplicates found.")?;
        } else {
            writeln!(f, "Duplicated values found: {}\n", r.groups.len())?;
            for (i, group) in r.groups.iter().enumerate() {
                writeln!(f, "{}. Value: {}", i + 1, group.value.literal())?;
                writeln!(f, "   Rows: {}\n", group.rows_display())?;
            }
        }

        if !r.summary.warnings.is_empty() {
            writeln!(f)?;
            banner(f, "SKIPPED ROWS")?;
            for warning in &r.summary.warnings {
                writeln!(f, "Row {}: {}", warning.row, warning.reason)?;
            }
        }
        Ok(())
    }
}

/// Label for the row count line. Spreadsheets count their header line,
/// dBASE tables count records only.
#[must_use]
pub fn row_count_label(format: SourceFormat) -> &'static str {
    if format.has_header_row() {
        "Rows in table (including header)"
    } else {
        "Records in table"
    }
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = "=".repeat(BANNER_WIDTH);
    write!(f, "{rule}\n{title}\n{rule}\n\n")
}
