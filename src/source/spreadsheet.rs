//! XLS and XLSX sources backed by calamine.
//!
//! Only the first worksheet is read. Cells are addressed by absolute
//! position, so a sheet whose used area starts at `B3` still reports column
//! `A` as column 0 and row 1 as the header.

use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, ExcelDateTime, Range, Reader, Xls, Xlsx};
use chrono::NaiveDateTime;

use super::{CellValue, DataRow, RowIter, SourceFormat, SourceReadError, TabularSource};

/// Encoding label reported for legacy workbooks.
pub const XLS_ENCODING: &str = "cp1251";
/// Encoding label reported for OOXML workbooks.
pub const XLSX_ENCODING: &str = "utf-8";

/// First worksheet of a workbook, loaded into memory.
pub struct SpreadsheetSource {
    path: PathBuf,
    format: SourceFormat,
    columns: Vec<String>,
    range: Range<Data>,
}

impl SpreadsheetSource {
    /// Open a workbook and load its first sheet.
    ///
    /// The underlying file is closed before this returns.
    ///
    /// # Errors
    ///
    /// Returns `SourceReadError` if the workbook cannot be parsed or has no
    /// worksheets. Panics raised inside the workbook parser are converted too.
    pub fn open(path: &Path, format: SourceFormat) -> Result<Self, SourceReadError> {
        let loaded = panic::catch_unwind(AssertUnwindSafe(|| match format {
            SourceFormat::Xlsx => load_first_sheet::<Xlsx<_>>(path),
            _ => load_first_sheet::<Xls<_>>(path),
        }));

        let range = match loaded {
            Ok(result) => result?,
            Err(_) => {
                return Err(SourceReadError::Workbook {
                    path: path.to_path_buf(),
                    message: "workbook parser aborted on malformed content".to_string(),
                })
            }
        };

        let columns = header_labels(&range);

        Ok(Self {
            path: path.to_path_buf(),
            format,
            columns,
            range,
        })
    }

    fn last_row(&self) -> Option<u32> {
        self.range.end().map(|(row, _)| row)
    }
}

impl TabularSource for SpreadsheetSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.last_row().map_or(0, |row| row as usize + 1)
    }

    fn encoding(&self) -> &str {
        match self.format {
            SourceFormat::Xlsx => XLSX_ENCODING,
            _ => XLS_ENCODING,
        }
    }

    fn rows(&mut self) -> Result<RowIter<'_>, SourceReadError> {
        let width = self.columns.len() as u32;
        let last_row = match self.last_row() {
            Some(row) => row,
            None => return Ok(Box::new(std::iter::empty())),
        };
        let range = &self.range;

        Ok(Box::new((1..=last_row).map(move |row| {
            let cells = (0..width)
                .map(|col| Ok(range.get_value((row, col)).map_or(CellValue::Empty, cell_value)))
                .collect();
            Ok(DataRow::new(row as usize + 1, cells))
        })))
    }
}

fn load_first_sheet<R>(path: &Path) -> Result<Range<Data>, SourceReadError>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    let workbook_error = |e: R::Error| SourceReadError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook: R = open_workbook(path).map_err(workbook_error)?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceReadError::NoSheets(path.to_path_buf()))?
        .map_err(workbook_error)
}

fn header_labels(range: &Range<Data>) -> Vec<String> {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_col)
        .map(|col| {
            range
                .get_value((0, col))
                .map(|data| cell_value(data).to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Convert a calamine cell into a [`CellValue`].
#[must_use]
pub fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_datetime(dt),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Serial dates honour the workbook's 1900 or 1904 date system.
fn excel_datetime(dt: &ExcelDateTime) -> CellValue {
    if dt.is_duration() {
        return CellValue::Number(dt.as_f64());
    }
    dt.as_datetime()
        .map_or(CellValue::Number(dt.as_f64()), CellValue::DateTime)
}
