//! Tabular sources: one header plus an ordered stream of data rows.
//!
//! Three on-disk formats are supported, each behind the [`TabularSource`]
//! trait so the duplicate scanner never sees format quirks:
//!
//! - [`SourceFormat::Xls`]: legacy BIFF workbooks, first sheet only
//! - [`SourceFormat::Xlsx`]: OOXML workbooks, first sheet only
//! - [`SourceFormat::Dbf`]: dBASE / FoxPro tables
//!
//! Every row carries its *display* row number, the number a spreadsheet
//! viewer would show next to it. For all three formats the first data row
//! is row 2 (row 1 being the header line in a viewer).
//!
//! # Example
//!
//! ```no_run
//! use tabdupe::source::open_source;
//! use std::path::Path;
//!
//! let mut source = open_source(Path::new("people.xlsx")).unwrap();
//! println!("columns: {:?}", source.columns());
//! for row in source.rows().unwrap() {
//!     let row = row.unwrap();
//!     println!("row {}: {:?}", row.number, row.cell(0));
//! }
//! ```

pub mod column;
pub mod dbf;
pub mod encoding;
pub mod spreadsheet;
pub mod value;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use column::{resolve_column, ColumnError, ColumnSelector};
pub use dbf::DbfSource;
pub use spreadsheet::SpreadsheetSource;
pub use value::CellValue;

/// Display row number of the first data row in every supported format.
pub const FIRST_DATA_ROW: usize = 2;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Legacy binary spreadsheet (`.xls`).
    Xls,
    /// Modern OOXML spreadsheet (`.xlsx`).
    Xlsx,
    /// dBASE table (`.dbf`).
    Dbf,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    ///
    /// ```
    /// use tabdupe::source::SourceFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(SourceFormat::from_path(Path::new("a.XLSX")), Some(SourceFormat::Xlsx));
    /// assert_eq!(SourceFormat::from_path(Path::new("a.csv")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            "dbf" => Some(Self::Dbf),
            _ => None,
        }
    }

    /// Whether the reported row count includes a header row.
    #[must_use]
    pub fn has_header_row(self) -> bool {
        !matches!(self, Self::Dbf)
    }

    /// Lowercase extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Dbf => "dbf",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xls => "XLS",
            Self::Xlsx => "XLSX",
            Self::Dbf => "DBF",
        })
    }
}

/// Failure to open or parse a tabular source as a whole.
///
/// Every format-library error is converted into this type at the reader
/// boundary.
#[derive(Debug, Error)]
pub enum SourceReadError {
    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The workbook could not be opened or its first sheet loaded.
    #[error("Failed to read workbook {path}: {message}")]
    Workbook {
        /// Path to the workbook
        path: PathBuf,
        /// Error reported by the spreadsheet reader
        message: String,
    },

    /// The workbook contains no worksheet.
    #[error("Workbook {0} contains no worksheets")]
    NoSheets(PathBuf),

    /// The dBASE structure is invalid.
    #[error("Invalid dBASE table {path}: {message}")]
    Dbf {
        /// Path to the table
        path: PathBuf,
        /// What was wrong with the structure
        message: String,
    },

    /// The file extension is not one of the supported formats.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl SourceReadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn dbf(path: &Path, message: impl Into<String>) -> Self {
        Self::Dbf {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Failure to decode a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum CellError {
    /// The stored bytes do not form a valid value of the field type.
    #[error("malformed {kind} value {raw:?} in field {field}")]
    Malformed {
        /// Field (column) name
        field: String,
        /// Human name of the expected type
        kind: &'static str,
        /// Raw content, lossily decoded
        raw: String,
    },

    /// The record ended before this field.
    #[error("record truncated after {available} of {expected} bytes")]
    Truncated {
        /// Bytes actually present
        available: usize,
        /// Bytes the record should have
        expected: usize,
    },
}

/// One data row with its display row number.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    /// Row number as a spreadsheet viewer shows it.
    pub number: usize,
    cells: Vec<Result<CellValue, CellError>>,
}

impl DataRow {
    /// Create a row from already decoded cells.
    #[must_use]
    pub fn new(number: usize, cells: Vec<Result<CellValue, CellError>>) -> Self {
        Self { number, cells }
    }

    /// Cell at a zero-based column position, `None` if the row is shorter.
    #[must_use]
    pub fn cell(&self, column: usize) -> Option<&Result<CellValue, CellError>> {
        self.cells.get(column)
    }

    /// Number of cells in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Iterator over the data rows of a source.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<DataRow, SourceReadError>> + 'a>;

/// Format-agnostic view of a table.
///
/// Implementations hold no open file handle between calls; [`rows`](Self::rows)
/// opens what it needs and releases it when the iterator is dropped.
pub trait TabularSource {
    /// The on-disk format.
    fn format(&self) -> SourceFormat;

    /// Path the source was opened from.
    fn path(&self) -> &Path;

    /// Column labels in order.
    fn columns(&self) -> &[String];

    /// Total row count (including the header line for spreadsheets).
    fn row_count(&self) -> usize;

    /// Declared or detected text encoding label, `"unknown"` when undetermined.
    fn encoding(&self) -> &str;

    /// Iterate data rows in file order.
    ///
    /// # Errors
    ///
    /// Returns `SourceReadError` if the data area cannot be opened. Items
    /// are errors only for failures that make the rest of the file unreadable.
    fn rows(&mut self) -> Result<RowIter<'_>, SourceReadError>;
}

/// Open a file with the reader matching its extension.
///
/// # Errors
///
/// Returns `SourceReadError` if the format is unsupported or the file cannot
/// be opened and parsed.
pub fn open_source(path: &Path) -> Result<Box<dyn TabularSource>, SourceReadError> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| SourceReadError::UnsupportedFormat(path.to_path_buf()))?;

    log::debug!("Opening {} as {}", path.display(), format);

    let source: Box<dyn TabularSource> = match format {
        SourceFormat::Xls | SourceFormat::Xlsx => Box::new(SpreadsheetSource::open(path, format)?),
        SourceFormat::Dbf => Box::new(DbfSource::open(path)?),
    };

    log::debug!(
        "{}: {} columns, {} rows, encoding {}",
        path.display(),
        source.columns().len(),
        source.row_count(),
        source.encoding()
    );

    Ok(source)
}
