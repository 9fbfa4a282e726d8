//! CSV output formatter for duplicate groups.
//!
//! One line is written per duplicate occurrence, so a value found on three
//! rows produces three lines sharing a `group_id`.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number, in first-seen order
//! - `value`: the value as displayed
//! - `value_type`: `text`, `number`, `boolean`, `date`, `datetime`, `empty` or `error`
//! - `row`: display row number

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroups;

const HEADER: [&str; 4] = ["group_id", "value", "value_type", "row"];

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    value: &'a str,
    value_type: &'static str,
    row: usize,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a DuplicateGroups,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a DuplicateGroups) -> Self {
        Self { groups }
    }

    /// Write the CSV output to the given writer. The header line is always
    /// written, even when there are no groups.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(HEADER)?;

        for (idx, group) in self.groups.iter().enumerate() {
            let value = group.value.to_string();
            for &row in &group.rows {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    value: &value,
                    value_type: group.value.type_name(),
                    row,
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
