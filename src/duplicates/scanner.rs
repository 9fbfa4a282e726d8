//! Single-pass duplicate detection over one column.
//!
//! # Overview
//!
//! The scanner walks the rows of a [`TabularSource`] once, in file order,
//! and records the display row number of every value seen in the selected
//! column. Values seen on two or more rows become [`DuplicateGroups`].
//!
//! Rows whose selected cell cannot be decoded are skipped with a
//! [`CellExtractionWarning`]; they never shift the numbering of other rows.
//! A failure of the source as a whole aborts the scan.
//!
//! # Example
//!
//! ```no_run
//! use tabdupe::duplicates::{DuplicateScanner, ScanOptions};
//! use tabdupe::source::open_source;
//! use std::path::Path;
//!
//! let mut source = open_source(Path::new("clients.dbf")).unwrap();
//! let scanner = DuplicateScanner::new(ScanOptions::default());
//! let (groups, summary) = scanner.scan(source.as_mut(), 0).unwrap();
//!
//! for group in &groups {
//!     println!("{} -> rows {}", group.value.literal(), group.rows_display());
//! }
//! println!("{} rows in {:?}", summary.rows_scanned, summary.scan_duration);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use super::groups::DuplicateGroups;
use crate::progress::ProgressCallback;
use crate::source::{CellError, CellValue, SourceReadError, TabularSource};

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The column index is outside the header.
    #[error("Column index {column} is out of range (the table has {columns} columns)")]
    ColumnOutOfRange {
        /// Requested zero-based column
        column: usize,
        /// Number of columns in the header
        columns: usize,
    },

    /// The source became unreadable.
    #[error(transparent)]
    Source(#[from] SourceReadError),
}

/// A row skipped because its selected cell could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellExtractionWarning {
    /// Display row number
    pub row: usize,
    /// Zero-based column index
    pub column: usize,
    /// What went wrong
    pub reason: CellError,
}

impl fmt::Display for CellExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

impl std::error::Error for CellExtractionWarning {}

/// Options for a scan.
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Ignore empty and whitespace-only cells instead of grouping them.
    pub skip_empty: bool,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("skip_empty", &self.skip_empty)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ScanOptions {
    /// Ignore blank cells.
    #[must_use]
    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Statistics from a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    /// Data rows read from the source
    pub rows_scanned: usize,
    /// Rows skipped because the selected cell could not be extracted
    pub rows_skipped: usize,
    /// Rows too short to contain the selected column
    pub rows_short: usize,
    /// Blank cells ignored because of `skip_empty`
    pub blank_cells: usize,
    /// Distinct values seen in the column
    pub distinct_values: usize,
    /// Values that occur on two or more rows
    pub duplicate_values: usize,
    /// Rows that belong to some duplicate group
    pub duplicate_rows: usize,
    /// Per-row extraction problems
    pub warnings: Vec<CellExtractionWarning>,
    /// Wall-clock time of the scan
    #[serde(serialize_with = "serialize_secs")]
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether any row had to be skipped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.rows_skipped > 0
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Duplicate detector for a single column.
#[derive(Debug, Clone, Default)]
pub struct DuplicateScanner {
    options: ScanOptions,
}

impl DuplicateScanner {
    /// Create a scanner with the given options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Scan `column` (zero-based) of `source`.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ColumnOutOfRange` for an invalid column and
    /// `ScanError::Source` if the source cannot be read.
    pub fn scan(
        &self,
        source: &mut dyn TabularSource,
        column: usize,
    ) -> Result<(DuplicateGroups, ScanSummary), ScanError> {
        let columns = source.columns().len();
        if column >= columns {
            return Err(ScanError::ColumnOutOfRange { column, columns });
        }

        let start = Instant::now();
        let expected_rows = if source.format().has_header_row() {
            source.row_count().saturating_sub(1)
        } else {
            source.row_count()
        };
        let file_name = source
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!(
            "Scanning column {} of {} ({} rows)",
            column + 1,
            file_name,
            expected_rows
        );

        let progress = self.options.progress_callback.as_deref();
        if let Some(p) = progress {
            p.on_scan_start(&file_name, expected_rows);
        }

        let mut summary = ScanSummary::default();
        let mut index: HashMap<CellValue, usize> = HashMap::new();
        let mut occurrences: Vec<(CellValue, Vec<usize>)> = Vec::new();

        for row in source.rows()? {
            let row = row?;
            summary.rows_scanned += 1;
            if let Some(p) = progress {
                p.on_row(summary.rows_scanned);
            }

            let value = match row.cell(column) {
                None => {
                    log::trace!("Row {} has no column {}", row.number, column + 1);
                    summary.rows_short += 1;
                    continue;
                }
                Some(Err(reason)) => {
                    let warning = CellExtractionWarning {
                        row: row.number,
                        column,
                        reason: reason.clone(),
                    };
                    log::warn!("Skipping {}", warning);
                    if let Some(p) = progress {
                        p.on_warning(&warning.to_string());
                    }
                    summary.rows_skipped += 1;
                    summary.warnings.push(warning);
                    continue;
                }
                Some(Ok(value)) => value,
            };

            if self.options.skip_empty && value.is_blank() {
                summary.blank_cells += 1;
                continue;
            }

            match index.get(value) {
                Some(&slot) => occurrences[slot].1.push(row.number),
                None => {
                    index.insert(value.clone(), occurrences.len());
                    occurrences.push((value.clone(), vec![row.number]));
                }
            }
        }

        if let Some(p) = progress {
            p.on_scan_end();
        }

        summary.distinct_values = occurrences.len();
        let groups = DuplicateGroups::from_occurrences(occurrences);
        summary.duplicate_values = groups.len();
        summary.duplicate_rows = groups.duplicate_rows();
        summary.scan_duration = start.elapsed();

        log::info!(
            "Found {} duplicated values across {} rows in {:.2}s",
            summary.duplicate_values,
            summary.duplicate_rows,
            summary.scan_duration.as_secs_f64()
        );

        Ok((groups, summary))
    }
}
