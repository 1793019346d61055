//! Model results already extracted at an observation's location.

use crate::error::MatchError;
use crate::quantity::Quantity;
use crate::series::TimeSeries;

/// A named series of simulated values co-located with an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    name: String,
    quantity: Quantity,
    series: TimeSeries,
}

impl ModelResult {
    /// Create a model result with an undefined quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::EmptyName`] if `name` is empty.
    pub fn new(name: impl Into<String>, series: TimeSeries) -> Result<Self, MatchError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MatchError::EmptyName);
        }
        Ok(Self {
            name,
            quantity: Quantity::undefined(),
            series,
        })
    }

    /// Set the simulated quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Return the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the simulated quantity.
    #[must_use]
    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    /// Return the simulated series.
    #[must_use]
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }
}
