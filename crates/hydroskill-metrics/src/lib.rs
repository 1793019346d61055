//! Skill metrics for paired observed/modelled series.
//!
//! Pure math library with zero I/O. Every function takes two equal-length,
//! fully finite slices and either returns a score or a [`MetricError`]
//! explaining why the score does not exist. Undefined scores are never
//! replaced by a plausible number.

mod error;
mod metric;
mod stats;

pub use error::MetricError;
pub use metric::{DEFAULT_METRICS, Metric, MIN_SAMPLES};
pub use stats::{
    bias, cc, kge, mae, mape, max_error, nse, r2, rmse, si, urmse, willmott,
};
