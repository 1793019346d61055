//! Physical quantity identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

const UNDEFINED: &str = "Undefined";

/// The physical quantity a series measures, e.g. significant wave height in metres.
///
/// Two defined quantities are compatible when name and unit agree.
/// [`Quantity::undefined`] is compatible with every quantity, so untyped data
/// can be compared against typed data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity {
    name: String,
    unit: String,
    #[serde(default)]
    is_directional: bool,
}

impl Quantity {
    /// Create a non-directional quantity.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            is_directional: false,
        }
    }

    /// The wildcard quantity, compatible with everything.
    #[must_use]
    pub fn undefined() -> Self {
        Self::new(UNDEFINED, UNDEFINED)
    }

    /// Mark the quantity as directional (degrees, wrapping at 360).
    #[must_use]
    pub fn with_directional(mut self, is_directional: bool) -> Self {
        self.is_directional = is_directional;
        self
    }

    /// Return the quantity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Return whether values are directions in degrees.
    #[must_use]
    pub fn is_directional(&self) -> bool {
        self.is_directional
    }

    /// Return whether this is the wildcard quantity.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.name == UNDEFINED && self.unit == UNDEFINED
    }

    /// Return whether values of `other` may be compared against values of `self`.
    #[must_use]
    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.is_undefined()
            || other.is_undefined()
            || (self.name == other.name && self.unit == other.unit)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::undefined()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_and_unit_compatible() {
        let a = Quantity::new("Significant wave height", "m");
        let b = Quantity::new("Significant wave height", "m");
        assert!(a.is_compatible(&b));
    }

    #[test]
    fn different_unit_incompatible() {
        let a = Quantity::new("Water level", "m");
        let b = Quantity::new("Water level", "ft");
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn undefined_is_wildcard_both_ways() {
        let wl = Quantity::new("Water level", "m");
        assert!(Quantity::undefined().is_compatible(&wl));
        assert!(wl.is_compatible(&Quantity::undefined()));
        assert!(Quantity::default().is_undefined());
    }

    #[test]
    fn display_shows_unit_in_brackets() {
        assert_eq!(Quantity::new("Water level", "m").to_string(), "Water level [m]");
    }
}
