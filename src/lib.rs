//! tabdupe - duplicate value finder for spreadsheet and dBASE tables
//!
//! Reads one column of an XLS, XLSX or DBF file and reports every value that
//! occurs on more than one row, using the row numbers a spreadsheet viewer
//! would show (the first data row is row 2 in every format).

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod source;

pub use app::run_app;
