//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Scanning one column of a tabular source in a single pass
//! - Grouping row numbers by repeated value

pub mod groups;
pub mod scanner;

pub use groups::{DuplicateGroup, DuplicateGroups};
pub use scanner::{CellExtractionWarning, DuplicateScanner, ScanError, ScanOptions, ScanSummary};
