//! Duplicate groups: values that occur on two or more rows.
//!
//! # Example
//!
//! ```
//! use tabdupe::duplicates::DuplicateGroups;
//! use tabdupe::source::CellValue;
//!
//! let occurrences = vec![
//!     (CellValue::from("1"), vec![2, 4]),
//!     (CellValue::from("2"), vec![3]),
//! ];
//! let groups = DuplicateGroups::from_occurrences(occurrences);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups.get(&CellValue::from("1")).unwrap().rows, vec![2, 4]);
//! ```

use serde::Serialize;

use crate::source::CellValue;

/// One repeated value and the rows it appears on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// The repeated cell value
    pub value: CellValue,
    /// Display row numbers, ascending and unique
    pub rows: Vec<usize>,
}

impl DuplicateGroup {
    /// Create a group, normalising the row list to ascending unique order.
    #[must_use]
    pub fn new(value: CellValue, mut rows: Vec<usize>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Self { value, rows }
    }

    /// Number of rows holding this value.
    #[must_use]
    pub fn occurrences(&self) -> usize {
        self.rows.len()
    }

    /// Rows beyond the first occurrence.
    #[must_use]
    pub fn extra_copies(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Rows joined for display, e.g. `"2, 4, 7"`.
    #[must_use]
    pub fn rows_display(&self) -> String {
        self.rows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// All duplicate groups of a scan, in first-seen order of their values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateGroups {
    /// Build groups from every distinct value and its rows, keeping only
    /// values seen on two or more distinct rows. Input order is preserved.
    #[must_use]
    pub fn from_occurrences(occurrences: Vec<(CellValue, Vec<usize>)>) -> Self {
        let groups = occurrences
            .into_iter()
            .map(|(value, rows)| DuplicateGroup::new(value, rows))
            .filter(|group| group.occurrences() > 1)
            .collect();
        Self { groups }
    }

    /// Number of duplicated values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no value repeats.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate groups in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// Group for a given value.
    #[must_use]
    pub fn get(&self, value: &CellValue) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| &g.value == value)
    }

    /// Total rows that belong to some group.
    #[must_use]
    pub fn duplicate_rows(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::occurrences).sum()
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
