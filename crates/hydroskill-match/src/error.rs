//! Error types for series validation and time alignment.

use chrono::{DateTime, Utc};

/// Errors from constructing series and aligning them in time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    /// Returned when timestamps and values differ in length.
    #[error("series has {times} timestamps but {values} values")]
    LengthMismatch {
        /// Number of timestamps.
        times: usize,
        /// Number of values.
        values: usize,
    },

    /// Returned when a timestamp is not strictly after its predecessor.
    #[error("timestamp {time} at index {index} is not after the previous one")]
    NonIncreasingTime {
        /// Position of the offending timestamp.
        index: usize,
        /// The offending timestamp.
        time: DateTime<Utc>,
    },

    /// Returned when a value is positive or negative infinity. NaN marks a
    /// gap and is accepted.
    #[error("infinite value at index {index}")]
    InfiniteValue {
        /// Position of the first infinite value.
        index: usize,
    },

    /// Returned when a track has a different number of positions than timestamps.
    #[error("track has {positions} positions for {times} timestamps")]
    PositionCount {
        /// Number of positions supplied.
        positions: usize,
        /// Number of timestamps in the series.
        times: usize,
    },

    /// Returned when a position coordinate is NaN or infinite.
    #[error("non-finite position at index {index}")]
    NonFinitePosition {
        /// Position of the offending coordinate pair.
        index: usize,
    },

    /// Returned when an observation or model name is empty.
    #[error("name must be non-empty")]
    EmptyName,

    /// Returned when an observation weight is negative or not finite.
    #[error("weight must be finite and non-negative, got {weight}")]
    InvalidWeight {
        /// The rejected weight.
        weight: f64,
    },

    /// Returned when alignment is requested with no model results.
    #[error("no model results supplied for observation \"{observation}\"")]
    NoModels {
        /// Name of the observation.
        observation: String,
    },

    /// Returned when two model results share a name.
    #[error("duplicate model name \"{name}\"")]
    DuplicateModel {
        /// The duplicated name.
        name: String,
    },

    /// Returned when a model result measures a different quantity than the observation.
    #[error("model \"{model}\" has quantity {found}, observation expects {expected}")]
    QuantityMismatch {
        /// Name of the model result.
        model: String,
        /// Quantity of the observation.
        expected: String,
        /// Quantity of the model result.
        found: String,
    },

    /// Returned when no observation timestamp could be matched by any model.
    #[error("no overlapping data between observation \"{observation}\" and its models")]
    NoOverlap {
        /// Name of the observation.
        observation: String,
    },

    /// Returned when a tolerance or gap limit is negative.
    #[error("{parameter} must be non-negative")]
    NegativeDuration {
        /// The offending configuration parameter.
        parameter: &'static str,
    },
}
