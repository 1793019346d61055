//! Observation and model-result data types, and time alignment.
//!
//! Pure library with zero I/O. Observations and model results are already
//! co-located in space by an external extraction step; this crate pairs them
//! in time, producing a [`MatchedData`] table with one row per observation
//! timestamp that at least one model could be matched to.

mod align;
mod config;
mod error;
mod matched;
mod model;
mod observation;
mod quantity;
mod series;

pub use config::{MatchConfig, MatchPolicy};
pub use error::MatchError;
pub use matched::MatchedData;
pub use model::ModelResult;
pub use observation::{Geometry, Observation, Position};
pub use quantity::Quantity;
pub use series::TimeSeries;
