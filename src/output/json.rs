//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "file": {
//!     "name": "clients.dbf",
//!     "path": "/data/clients.dbf",
//!     "size": 2048,
//!     "format": "dbf",
//!     "encoding": "cp866",
//!     "row_count": 5
//!   },
//!   "column": { "position": 1, "name": "ID" },
//!   "duplicates": [
//!     { "value": "1001", "value_type": "text", "rows": [2, 4] }
//!   ],
//!   "summary": {
//!     "rows_scanned": 5,
//!     "duplicate_values": 1,
//!     "scan_duration_ms": 3,
//!     "exit_code": 0,
//!     "exit_code_name": "TD000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::ScanReport;
use crate::duplicates::{CellExtractionWarning, DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::source::SourceFormat;

/// The scanned file.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// File name
    pub name: String,
    /// Full path
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Table format
    pub format: SourceFormat,
    /// Encoding label
    pub encoding: String,
    /// Row count as reported by the source
    pub row_count: usize,
}

/// The analysed column.
#[derive(Debug, Clone, Serialize)]
pub struct JsonColumn {
    /// 1-based position
    pub position: usize,
    /// Header label
    pub name: String,
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Value as displayed
    pub value: String,
    /// Value type (`text`, `number`, ...)
    pub value_type: &'static str,
    /// Display row numbers, ascending
    pub rows: Vec<usize>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a `DuplicateGroup`.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            value: group.value.to_string(),
            value_type: group.value.type_name(),
            rows: group.rows.clone(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Data rows read
    pub rows_scanned: usize,
    /// Rows skipped because the cell could not be read
    pub rows_skipped: usize,
    /// Rows shorter than the analysed column
    pub rows_short: usize,
    /// Blank cells ignored
    pub blank_cells: usize,
    /// Distinct values in the column
    pub distinct_values: usize,
    /// Values occurring more than once
    pub duplicate_values: usize,
    /// Rows belonging to a duplicate group
    pub duplicate_rows: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a `ScanSummary` and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            rows_scanned: summary.rows_scanned,
            rows_skipped: summary.rows_skipped,
            rows_short: summary.rows_short,
            blank_cells: summary.blank_cells,
            distinct_values: summary.distinct_values,
            duplicate_values: summary.duplicate_values,
            duplicate_rows: summary.duplicate_rows,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// The scanned file
    pub file: JsonFile,
    /// The analysed column
    pub column: JsonColumn,
    /// Duplicate groups in first-seen order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Rows that were skipped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CellExtractionWarning>,
    /// Report timestamp (RFC 3339)
    pub generated_at: String,
}

impl JsonOutput {
    /// Create JSON output for a report.
    #[must_use]
    pub fn new(report: &ScanReport) -> Self {
        Self {
            file: JsonFile {
                name: report.file_name.clone(),
                path: report.path.to_string_lossy().into_owned(),
                size: report.size,
                format: report.format,
                encoding: report.encoding.clone(),
                row_count: report.row_count,
            },
            column: JsonColumn {
                position: report.column_index + 1,
                name: report.column_name.clone(),
            },
            duplicates: report
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(&report.summary, report.exit_code()),
            warnings: report.summary.warnings.clone(),
            generated_at: report.generated_at.to_rfc3339(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: W, pretty: bool) -> Result<(), serde_json::Error> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)
        } else {
            serde_json::to_writer(writer, self)
        }
    }
}
