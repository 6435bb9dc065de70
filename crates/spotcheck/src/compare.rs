//! Comparing query output against expected fixtures.

use std::fmt;

use crate::{Record, Value};

/// A difference between the expected and the actual rows.
#[derive(Debug, Clone, PartialEq)]
pub enum RowMismatch {
    /// Different number of rows.
    Count { expected: usize, actual: usize },

    /// Row `row` has a different set of columns.
    Columns {
        row: usize,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Row `row` has the right columns but a different value in `column`.
    Value {
        row: usize,
        column: String,
        expected: Value,
        actual: Value,
    },
}

impl fmt::Display for RowMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMismatch::Count { expected, actual } => {
                write!(f, "expected {expected} row(s), got {actual}")
            }
            RowMismatch::Columns {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {row}: expected columns [{}], got [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
            RowMismatch::Value {
                row,
                column,
                expected,
                actual,
            } => write!(f, "row {row}, column {column}: expected {expected}, got {actual}"),
        }
    }
}

/// Compare rows by value, including row order.
///
/// Rows are paired by position. An empty result means the rows match.
pub fn diff_rows(expected: &[Record], actual: &[Record]) -> Vec<RowMismatch> {
    let mut mismatches = Vec::new();

    if expected.len() != actual.len() {
        mismatches.push(RowMismatch::Count {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    for (row, (want, got)) in expected.iter().zip(actual).enumerate() {
        let same_columns =
            want.len() == got.len() && want.keys().all(|column| got.contains_key(column));
        if !same_columns {
            mismatches.push(RowMismatch::Columns {
                row,
                expected: want.keys().cloned().collect(),
                actual: got.keys().cloned().collect(),
            });
            continue;
        }

        for (column, value) in want {
            let other = &got[column];
            if value != other {
                mismatches.push(RowMismatch::Value {
                    row,
                    column: column.clone(),
                    expected: value.clone(),
                    actual: other.clone(),
                });
            }
        }
    }

    mismatches
}

/// Columns of `expected` that `actual` lacks.
pub fn missing_columns<'a>(expected: &[&'a str], actual: &[String]) -> Vec<&'a str> {
    expected
        .iter()
        .copied()
        .filter(|column| !actual.iter().any(|a| a.as_str() == *column))
        .collect()
}
