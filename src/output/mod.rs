//! Scan reports and where they go.
//!
//! A [`ScanReport`] gathers everything known about one finished scan. It is
//! rendered by one of three formatters:
//! - [`text`]: the human report saved under the reports directory
//! - [`json`]: a JSON document for automation and scripting
//! - [`csv`]: one line per duplicate occurrence
//!
//! Rendered reports are handed to a [`ReportSink`]. [`DirectorySink`] saves
//! the text report as a timestamped file; [`WriterSink`] streams any format
//! to a writer such as stdout.
//!
//! # Example
//!
//! ```no_run
//! use tabdupe::duplicates::DuplicateScanner;
//! use tabdupe::output::{DirectorySink, ReportSink, ScanReport};
//! use tabdupe::source::open_source;
//! use std::path::Path;
//!
//! let mut source = open_source(Path::new("clients.dbf")).unwrap();
//! let (groups, summary) = DuplicateScanner::default().scan(source.as_mut(), 0).unwrap();
//! let report = ScanReport::from_scan(source.as_ref(), 0, groups, summary).unwrap();
//!
//! let mut sink = DirectorySink::new("Reports");
//! let saved = sink.deliver(&report).unwrap();
//! println!("saved to {:?}", saved);
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytesize::ByteSize;
use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::duplicates::{DuplicateGroups, ScanSummary};
use crate::error::ExitCode;
use crate::source::{SourceFormat, TabularSource};

pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::JsonOutput;
pub use self::text::TextReport;

/// Name of the default reports directory.
pub const REPORTS_DIR_NAME: &str = "Reports";

/// Errors while delivering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A report file or directory could not be written.
    #[error("Failed to write report {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing to the output stream failed.
    #[error("Failed to write output: {0}")]
    Write(#[from] io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error(transparent)]
    Csv(#[from] CsvOutputError),
}

/// Everything known about one finished scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// File name without directory
    pub file_name: String,
    /// Path the table was read from
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Table format
    pub format: SourceFormat,
    /// Encoding label, `"unknown"` when undetermined
    pub encoding: String,
    /// Row count as the source reports it (header included for spreadsheets)
    pub row_count: usize,
    /// Zero-based index of the analysed column
    pub column_index: usize,
    /// Header label of the analysed column
    pub column_name: String,
    /// Duplicate groups in first-seen order
    pub groups: DuplicateGroups,
    /// Scan statistics
    pub summary: ScanSummary,
    /// When the report was produced
    pub generated_at: DateTime<Local>,
}

impl ScanReport {
    /// Build a report from an opened source and its scan results.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file size cannot be read.
    pub fn from_scan(
        source: &dyn TabularSource,
        column_index: usize,
        groups: DuplicateGroups,
        summary: ScanSummary,
    ) -> io::Result<Self> {
        let path = source.path().to_path_buf();
        let size = fs::metadata(&path)?.len();
        Ok(Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size,
            format: source.format(),
            encoding: source.encoding().to_string(),
            row_count: source.row_count(),
            column_index,
            column_name: source
                .columns()
                .get(column_index)
                .cloned()
                .unwrap_or_default(),
            groups,
            summary,
            generated_at: Local::now(),
            path,
        })
    }

    /// Human-readable file size.
    #[must_use]
    pub fn size_display(&self) -> String {
        ByteSize::b(self.size).to_string()
    }

    /// Scan duration.
    #[must_use]
    pub fn scan_duration(&self) -> Duration {
        self.summary.scan_duration
    }

    /// The exit code this report corresponds to.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.summary.is_partial() {
            ExitCode::PartialSuccess
        } else if self.groups.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        }
    }

    /// File name under which the text report is saved.
    #[must_use]
    pub fn file_name_for_report(&self) -> String {
        report_file_name(&self.file_name, &self.generated_at)
    }
}

/// Report file name: `report_<base>_<YYYYMMDD_HHMMSS>.txt`.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use tabdupe::output::report_file_name;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(report_file_name("clients.dbf", &at), "report_clients_20240305_140709.txt");
/// ```
#[must_use]
pub fn report_file_name(file_name: &str, timestamp: &DateTime<Local>) -> String {
    let base = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    format!("report_{}_{}.txt", base, timestamp.format("%Y%m%d_%H%M%S"))
}

/// `Reports` next to the running executable, or in the working directory
/// when the executable path is unavailable.
#[must_use]
pub fn default_reports_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(REPORTS_DIR_NAME)
}

/// Destination for a finished report.
pub trait ReportSink {
    /// Deliver the report. Returns the path of a saved file, if any.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if rendering or writing fails.
    fn deliver(&mut self, report: &ScanReport) -> Result<Option<PathBuf>, ReportError>;
}

/// Saves the text report as a timestamped file in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `dir` (created on first delivery).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for DirectorySink {
    fn deliver(&mut self, report: &ScanReport) -> Result<Option<PathBuf>, ReportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ReportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(report.file_name_for_report());
        let body = TextReport::new(report).render();
        fs::write(&path, body).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Report saved to {}", path.display());
        Ok(Some(path))
    }
}

/// Renders a report in a chosen format to a writer.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    /// Sink writing `format` to `writer`.
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn deliver(&mut self, report: &ScanReport) -> Result<Option<PathBuf>, ReportError> {
        match self.format {
            OutputFormat::Text => {
                self.writer
                    .write_all(TextReport::new(report).render().as_bytes())?;
            }
            OutputFormat::Json => {
                JsonOutput::new(report).write_to(&mut self.writer, true)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Csv => {
                CsvOutput::new(&report.groups).write_to(&mut self.writer)?;
            }
        }
        self.writer.flush()?;
        Ok(None)
    }
}
