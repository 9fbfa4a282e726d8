//! Command-line interface definitions for tabdupe.
//!
//! Defines all CLI arguments and subcommands with the clap derive API. Global
//! options (verbosity, color, error format, config file) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Pick folder, file and column interactively
//! tabdupe scan
//!
//! # Fully scripted: check column 2 of a DBF table, JSON to stdout
//! tabdupe scan ./data --file clients.dbf --column 2 --output json
//!
//! # Select a column by name
//! tabdupe scan ./data/orders.xlsx --column "Invoice No"
//!
//! # Inspect a table before scanning
//! tabdupe columns ./data/clients.dbf
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::source::ColumnSelector;

/// Find repeated values in one column of an XLS, XLSX or DBF table.
///
/// tabdupe reports every value that appears on more than one row, together
/// with the row numbers a spreadsheet viewer would show, and saves a text
/// report next to the program.
#[derive(Debug, Parser)]
#[command(name = "tabdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Use this configuration file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate values in one column of a table
    Scan(ScanArgs),
    /// List the XLS, XLSX and DBF files in a folder
    Files(FilesArgs),
    /// Show the columns, row count and encoding of a table
    Columns(ColumnsArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Folder to pick a table from, or the table itself
    ///
    /// Asked for interactively when omitted.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Name of the table inside PATH (when PATH is a folder)
    #[arg(short, long, value_name = "NAME")]
    pub file: Option<String>,

    /// Column to check: 1-based position or header name
    #[arg(short, long, value_name = "N|NAME", value_parser = parse_column)]
    pub column: Option<ColumnSelector>,

    /// Output format (text for people, json/csv for scripting)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Directory for the text report
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long)]
    pub no_report: bool,

    /// Ignore empty cells instead of reporting them as duplicates
    #[arg(long)]
    pub skip_empty: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pub pause: bool,
}

/// Arguments for the files subcommand.
#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Folder to list
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

/// Arguments for the columns subcommand.
#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Table to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Also write it to the configuration file (--config or the platform default)
    #[arg(long)]
    pub save: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored summary on the console plus a text report
    #[default]
    Text,
    /// JSON document for scripting
    Json,
    /// One CSV line per duplicate occurrence
    Csv,
}

impl OutputFormat {
    /// Whether the format is meant for machines (stdout must stay clean).
    #[must_use]
    pub fn is_machine_readable(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a column argument: digits select by position, anything else by name.
///
/// # Examples
///
/// ```
/// use tabdupe::cli::parse_column;
/// use tabdupe::source::ColumnSelector;
///
/// assert_eq!(parse_column("3").unwrap(), ColumnSelector::Position(3));
/// assert_eq!(parse_column("Phone").unwrap(), ColumnSelector::Name("Phone".into()));
/// ```
///
/// # Errors
///
/// Returns an error for an empty argument.
pub fn parse_column(s: &str) -> Result<ColumnSelector, String> {
    s.parse()
}
