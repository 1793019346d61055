//! Domain types for hydroskill-io.

use chrono::{DateTime, Utc};
use hydroskill_match::Position;

use crate::IoError;

/// A validated run name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunName(String);

impl RunName {
    /// Parse and validate a run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidRunName`] if the name is empty or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidRunName { name });
        }
        Ok(Self(name))
    }

    /// Return the run name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw columns of a series file.
///
/// Produced by [`SeriesReader`](crate::SeriesReader). `times[i]` pairs with
/// `values[i]` and, for files with `x`/`y` columns, `positions[i]`. A NaN
/// value marks a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    /// Timestamps in file order.
    pub times: Vec<DateTime<Utc>>,
    /// Values in file order; NaN for empty cells.
    pub values: Vec<f64>,
    /// Per-row coordinates, present only when the file has `x` and `y` columns.
    pub positions: Option<Vec<Position>>,
}

impl SeriesData {
    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Return true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Output file name component for an observation name: anything outside
/// `[a-zA-Z0-9_-]` becomes `_`.
pub(crate) fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
