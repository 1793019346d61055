//! Observations: measured series at a fixed point or along a moving track.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::quantity::Quantity;
use crate::series::TimeSeries;

/// A horizontal location, typically longitude (`x`) and latitude (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Easting or longitude.
    pub x: f64,
    /// Northing or latitude.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Where an observation was taken.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A fixed station.
    Point(Position),
    /// A moving platform, one position per timestamp of the series.
    Track(Vec<Position>),
}

impl Geometry {
    /// Return `"point"` or `"track"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::Track(_) => "track",
        }
    }
}

/// A named series of measured values.
///
/// Construct via [`Observation::point`] or [`Observation::track`], then
/// optionally chain [`Observation::with_quantity`] and
/// [`Observation::with_weight`].
///
/// # Defaults
///
/// | Parameter  | Default                  |
/// |------------|--------------------------|
/// | `quantity` | [`Quantity::undefined`]  |
/// | `weight`   | 1.0                      |
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    name: String,
    quantity: Quantity,
    series: TimeSeries,
    geometry: Geometry,
    weight: f64,
}

impl Observation {
    /// Create a fixed-point observation.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MatchError::EmptyName`] | `name` is empty |
    /// | [`MatchError::NonFinitePosition`] | `position` has a non-finite coordinate |
    pub fn point(
        name: impl Into<String>,
        series: TimeSeries,
        position: Position,
    ) -> Result<Self, MatchError> {
        if !position.is_finite() {
            return Err(MatchError::NonFinitePosition { index: 0 });
        }
        Self::build(name.into(), series, Geometry::Point(position))
    }

    /// Create a track observation with one position per timestamp.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MatchError::EmptyName`] | `name` is empty |
    /// | [`MatchError::PositionCount`] | `positions.len() != series.len()` |
    /// | [`MatchError::NonFinitePosition`] | A position has a non-finite coordinate |
    pub fn track(
        name: impl Into<String>,
        series: TimeSeries,
        positions: Vec<Position>,
    ) -> Result<Self, MatchError> {
        if positions.len() != series.len() {
            return Err(MatchError::PositionCount {
                positions: positions.len(),
                times: series.len(),
            });
        }
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(MatchError::NonFinitePosition { index });
        }
        Self::build(name.into(), series, Geometry::Track(positions))
    }

    fn build(name: String, series: TimeSeries, geometry: Geometry) -> Result<Self, MatchError> {
        if name.is_empty() {
            return Err(MatchError::EmptyName);
        }
        Ok(Self {
            name,
            quantity: Quantity::undefined(),
            series,
            geometry,
            weight: 1.0,
        })
    }

    /// Set the measured quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the weight used when averaging per-observation scores.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidWeight`] if `weight` is negative or not finite.
    pub fn with_weight(mut self, weight: f64) -> Result<Self, MatchError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(MatchError::InvalidWeight { weight });
        }
        self.weight = weight;
        Ok(self)
    }

    /// Return the observation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the measured quantity.
    #[must_use]
    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    /// Return the measured series.
    #[must_use]
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Return the observation geometry.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Return the averaging weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }
}
