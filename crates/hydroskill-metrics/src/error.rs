//! Error types for skill metric computation.

/// Errors from computing a skill metric over paired values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    /// Returned when fewer paired values are available than the metric needs.
    #[error("{metric} needs at least {required} paired values, got {n}")]
    InsufficientData {
        /// Name of the metric being computed.
        metric: &'static str,
        /// Number of paired values supplied.
        n: usize,
        /// Minimum number of paired values required.
        required: usize,
    },

    /// Returned when the metric is mathematically undefined for the input,
    /// e.g. correlation of a constant series.
    #[error("{metric} is undefined: {reason}")]
    Undefined {
        /// Name of the metric being computed.
        metric: &'static str,
        /// Why the metric has no value.
        reason: &'static str,
    },

    /// Returned when the observed and modelled slices differ in length.
    #[error("observed has {obs} values but modelled has {model}")]
    LengthMismatch {
        /// Length of the observed slice.
        obs: usize,
        /// Length of the modelled slice.
        model: usize,
    },

    /// Returned when either slice contains NaN or infinity.
    #[error("non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a metric name does not match any known metric.
    #[error("unknown metric \"{name}\"")]
    UnknownMetric {
        /// The name that failed to parse.
        name: String,
    },
}
