//! File I/O, validation, and serialization for the hydroskill pipeline.

mod domain;
mod error;
mod matched;
mod reader;
mod time;
mod writer;

pub use domain::{RunName, SeriesData};
pub use error::IoError;
pub use matched::MatchedReader;
pub use reader::SeriesReader;
pub use writer::ResultWriter;
