//! Column selection by displayed position or by name.

use std::str::FromStr;

use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// How a user refers to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// 1-based position, as shown in column listings.
    Position(usize),
    /// Header label.
    Name(String),
}

impl FromStr for ColumnSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Column cannot be empty".to_string());
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse::<usize>()
                .map(Self::Position)
                .map_err(|_| format!("Invalid column number: '{s}'"))
        } else {
            Ok(Self::Name(s.to_string()))
        }
    }
}

/// Errors from column resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    /// Position outside `1..=count`.
    #[error("Column {position} is out of range (the table has {count} columns)")]
    OutOfRange {
        /// Requested 1-based position
        position: usize,
        /// Number of columns available
        count: usize,
    },

    /// No column carries this name.
    #[error("No column named '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownName {
        /// Requested name
        name: String,
        /// Closest existing name, if any is close enough
        suggestion: Option<String>,
    },
}

/// Resolve a selector to a zero-based column index.
///
/// Names match exactly first, then ignoring case.
///
/// # Errors
///
/// Returns `ColumnError` when the position is out of range or no name matches.
///
/// # Examples
///
/// ```
/// use tabdupe::source::{resolve_column, ColumnSelector};
///
/// let columns = vec!["ID".to_string(), "Name".to_string()];
/// assert_eq!(resolve_column(&columns, &ColumnSelector::Position(2)).unwrap(), 1);
/// assert_eq!(resolve_column(&columns, &"name".parse().unwrap()).unwrap(), 1);
/// ```
pub fn resolve_column(columns: &[String], selector: &ColumnSelector) -> Result<usize, ColumnError> {
    match selector {
        ColumnSelector::Position(position) => {
            if (1..=columns.len()).contains(position) {
                Ok(position - 1)
            } else {
                Err(ColumnError::OutOfRange {
                    position: *position,
                    count: columns.len(),
                })
            }
        }
        ColumnSelector::Name(name) => columns
            .iter()
            .position(|c| c == name)
            .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
            .or_else(|| {
                let lower = name.to_lowercase();
                columns.iter().position(|c| c.to_lowercase() == lower)
            })
            .ok_or_else(|| ColumnError::UnknownName {
                name: name.clone(),
                suggestion: suggest(columns, name),
            }),
    }
}

fn suggest(columns: &[String], name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    columns
        .iter()
        .map(|c| (c, strsim::jaro_winkler(&c.to_lowercase(), &lower)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.clone())
}
