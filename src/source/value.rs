//! Cell values as read from a tabular source.
//!
//! Values are compared by their raw content: integer and float cells share the
//! [`CellValue::Number`] variant, but a number never equals the text that
//! prints the same way, and booleans are never numbers.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single cell value.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Empty cell (or a blank numeric/logical/date field).
    Empty,
    /// Text content, kept exactly as decoded.
    Text(String),
    /// Any numeric value.
    Number(f64),
    /// Logical value.
    Bool(bool),
    /// Calendar date without time.
    Date(NaiveDate),
    /// Date with time of day.
    DateTime(NaiveDateTime),
    /// Spreadsheet error cell such as `#N/A`.
    Error(String),
}

impl CellValue {
    /// Short name of the value type, used in machine-readable output.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Error(_) => "error",
        }
    }

    /// Whether the cell holds nothing meaningful (empty or whitespace-only text).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Unambiguous representation for reports.
    ///
    /// Text is quoted so `"1"` and `1` can be told apart.
    ///
    /// ```
    /// use tabdupe::source::CellValue;
    ///
    /// assert_eq!(CellValue::Text("1".into()).literal(), "\"1\"");
    /// assert_eq!(CellValue::Number(1.0).literal(), "1");
    /// assert_eq!(CellValue::Empty.literal(), "<empty>");
    /// ```
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::Empty => "<empty>".to_string(),
            Self::Text(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }

    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else if n.is_nan() {
            f64::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }
}

/// Format a number the way spreadsheet viewers show it: integral values
/// without a fractional part.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Self::Error(e) => f.write_str(e),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => Self::number_bits(*a) == Self::number_bits(*b),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Empty => {}
            Self::Text(s) | Self::Error(s) => s.hash(state),
            Self::Number(n) => Self::number_bits(*n).hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Date(d) => d.hash(state),
            Self::DateTime(dt) => dt.hash(state),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
