//! Comparers, comparer collections, and skill tables.
//!
//! Pure library with zero I/O. A [`Comparer`] binds one observation to its
//! time-aligned model columns; a [`ComparerCollection`] holds many of them.
//! Both produce [`SkillTable`]s, either pooled per group
//! ([`ComparerCollection::skill`]) or scored per observation and then
//! averaged ([`ComparerCollection::mean_skill`]).

mod area;
mod collection;
mod comparer;
mod error;
mod grid;
mod group;
mod scoring;
mod skill;

pub use area::Area;
pub use collection::ComparerCollection;
pub use comparer::{Comparer, RowView};
pub use error::CompareError;
pub use grid::{GridLayout, GridSpec};
pub use group::{GroupBy, KeyValue, TimeBin};
pub use skill::{SkillRow, SkillTable};
