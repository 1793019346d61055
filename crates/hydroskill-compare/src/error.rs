//! Error types for comparers, collections, and grouping.

use hydroskill_match::MatchError;

/// Errors from building, filtering, and aggregating comparers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    /// Returned when a comparer is added under an observation name already present.
    #[error("a comparer for observation \"{name}\" already exists")]
    DuplicateName {
        /// The duplicated observation name.
        name: String,
    },

    /// Returned when a named observation or model does not exist.
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        /// `"observation"` or `"model"`.
        kind: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// Returned when an operation does not apply to this comparer.
    #[error("{operation} not supported: {reason}")]
    UnsupportedOperation {
        /// The attempted operation.
        operation: &'static str,
        /// Why it does not apply.
        reason: &'static str,
    },

    /// Returned when two comparers cannot be merged.
    #[error("comparers cannot be combined: {reason}")]
    Incompatible {
        /// What differs between them.
        reason: String,
    },

    /// Returned when an area has invalid bounds or too few vertices.
    #[error("invalid area: {reason}")]
    InvalidArea {
        /// What is wrong with the area.
        reason: &'static str,
    },

    /// Returned when a spatial grid has zero bins or a non-positive bin size.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// What is wrong with the grid.
        reason: &'static str,
    },

    /// Returned when a grouping specification cannot be parsed.
    #[error("invalid grouping \"{spec}\": expected observation, model, or freq:<H|D|M|Y|N[smhd]>")]
    InvalidGroupBy {
        /// The rejected specification.
        spec: String,
    },

    /// Wraps an error from building the aligned table.
    #[error("matching error: {0}")]
    Match(#[from] MatchError),
}
