//! The aligned observation/model table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::MatchError;
use crate::observation::{Geometry, Position};
use crate::quantity::Quantity;

/// Observed values paired in time with one or more model columns.
///
/// Guarantees, enforced by [`MatchedData::new`]:
/// - timestamps strictly increasing
/// - every observed value finite
/// - every row has at least one model value; `None` marks a model that
///   could not be matched at that row
/// - for tracks, one position per row
///
/// Rows violating the value invariants are dropped on construction rather
/// than rejected, so a table may have zero rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedData {
    name: String,
    quantity: Quantity,
    weight: f64,
    times: Vec<DateTime<Utc>>,
    observed: Vec<f64>,
    model_names: Vec<String>,
    model_values: Vec<Vec<Option<f64>>>,
    geometry: Geometry,
}

impl MatchedData {
    /// Build a matched table from column data.
    ///
    /// `models` holds `(name, values)` pairs, each with one entry per
    /// timestamp. `Some(NaN)` is treated as `None`. For
    /// [`Geometry::Track`], positions are per timestamp and are dropped along
    /// with their rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MatchError::EmptyName`] | `name` or a model name is empty |
    /// | [`MatchError::NoModels`] | `models` is empty |
    /// | [`MatchError::DuplicateModel`] | Two models share a name |
    /// | [`MatchError::LengthMismatch`] | A column length differs from `times.len()` |
    /// | [`MatchError::PositionCount`] | Track positions differ in count from `times` |
    /// | [`MatchError::NonIncreasingTime`] | Timestamps not strictly increasing |
    pub fn new(
        name: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        observed: Vec<f64>,
        geometry: Geometry,
        models: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, MatchError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MatchError::EmptyName);
        }
        if models.is_empty() {
            return Err(MatchError::NoModels { observation: name });
        }
        let mut seen = HashSet::new();
        for (model, values) in &models {
            if model.is_empty() {
                return Err(MatchError::EmptyName);
            }
            if !seen.insert(model.as_str()) {
                return Err(MatchError::DuplicateModel {
                    name: model.clone(),
                });
            }
            if values.len() != times.len() {
                return Err(MatchError::LengthMismatch {
                    times: times.len(),
                    values: values.len(),
                });
            }
        }
        if observed.len() != times.len() {
            return Err(MatchError::LengthMismatch {
                times: times.len(),
                values: observed.len(),
            });
        }
        if let Geometry::Track(positions) = &geometry
            && positions.len() != times.len()
        {
            return Err(MatchError::PositionCount {
                positions: positions.len(),
                times: times.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MatchError::NonIncreasingTime {
                index: i + 1,
                time: times[i + 1],
            });
        }

        let (model_names, raw_values): (Vec<String>, Vec<Vec<Option<f64>>>) = models
            .into_iter()
            .map(|(model, values)| {
                let cleaned = values
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect();
                (model, cleaned)
            })
            .unzip();

        let keep: Vec<bool> = (0..times.len())
            .map(|i| observed[i].is_finite() && raw_values.iter().any(|col| col[i].is_some()))
            .collect();

        Ok(Self {
            name,
            quantity: Quantity::undefined(),
            weight: 1.0,
            times: retain(times, &keep),
            observed: retain(observed, &keep),
            model_names,
            model_values: raw_values.into_iter().map(|col| retain(col, &keep)).collect(),
            geometry: match geometry {
                Geometry::Track(positions) => Geometry::Track(retain(positions, &keep)),
                point => point,
            },
        })
    }

    /// Set the quantity of the observed and modelled values.
    #[must_use]
    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the averaging weight of the observation.
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

    /// Return the quantity.
    #[must_use]
    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    /// Return the observation weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Return the row timestamps.
    #[must_use]
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Return the observed column.
    #[must_use]
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Return the model names in column order.
    #[must_use]
    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    /// Return the column index of model `name`.
    #[must_use]
    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.model_names.iter().position(|m| m == name)
    }

    /// Return the values of the model at column `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.n_models()`.
    #[must_use]
    pub fn model_column(&self, index: usize) -> &[Option<f64>] {
        &self.model_values[index]
    }

    /// Return the geometry, with per-row positions for tracks.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Return the position of row `row`.
    #[must_use]
    pub fn position(&self, row: usize) -> Position {
        match &self.geometry {
            Geometry::Point(p) => *p,
            Geometry::Track(positions) => positions[row],
        }
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.times.len()
    }

    /// Return the number of model columns.
    #[must_use]
    pub fn n_models(&self) -> usize {
        self.model_names.len()
    }

    /// Return true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Keep the rows flagged in `keep` and the model columns listed in
    /// `models`, in that order. Rows left without any model value are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `keep.len() != self.n_rows()` or a model index is out of range.
    #[must_use]
    pub fn select(&self, keep: &[bool], models: &[usize]) -> MatchedData {
        assert_eq!(keep.len(), self.n_rows(), "row mask length");
        let keep: Vec<bool> = (0..self.n_rows())
            .map(|i| keep[i] && models.iter().any(|&m| self.model_values[m][i].is_some()))
            .collect();
        MatchedData {
            name: self.name.clone(),
            quantity: self.quantity.clone(),
            weight: self.weight,
            times: retain(self.times.clone(), &keep),
            observed: retain(self.observed.clone(), &keep),
            model_names: models.iter().map(|&m| self.model_names[m].clone()).collect(),
            model_values: models
                .iter()
                .map(|&m| retain(self.model_values[m].clone(), &keep))
                .collect(),
            geometry: match &self.geometry {
                Geometry::Track(positions) => Geometry::Track(retain(positions.clone(), &keep)),
                point => point.clone(),
            },
        }
    }

    /// Apply `f(column, value)` to every matched model value.
    ///
    /// Results that are not finite turn into unmatched cells, and rows left
    /// without any model value are dropped.
    #[must_use]
    pub fn map_model_values(&self, f: impl Fn(usize, f64) -> f64) -> MatchedData {
        let mut out = self.clone();
        for (m, column) in out.model_values.iter_mut().enumerate() {
            for cell in column.iter_mut() {
                *cell = cell.map(|v| f(m, v)).filter(|v| v.is_finite());
            }
        }
        let all: Vec<usize> = (0..out.n_models()).collect();
        out.select(&vec![true; out.n_rows()], &all)
    }

    /// Return the paired `(observed, modelled)` values of column `index`,
    /// skipping rows where the model is unmatched.
    #[must_use]
    pub fn pairs(&self, index: usize) -> (Vec<f64>, Vec<f64>) {
        self.observed
            .iter()
            .zip(&self.model_values[index])
            .filter_map(|(&o, m)| m.map(|m| (o, m)))
            .unzip()
    }
}

fn retain<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(v, &k)| k.then_some(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn point() -> Geometry {
        Geometry::Point(Position::new(0.0, 0.0))
    }

    #[test]
    fn rows_without_any_model_are_dropped() {
        let md = MatchedData::new(
            "obs",
            vec![t(0), t(1), t(2)],
            vec![1.0, 2.0, 3.0],
            point(),
            vec![
                ("a".to_string(), vec![Some(1.0), None, Some(3.0)]),
                ("b".to_string(), vec![None, None, Some(3.5)]),
            ],
        )
        .unwrap();
        assert_eq!(md.n_rows(), 2);
        assert_eq!(md.times(), &[t(0), t(2)]);
        assert_eq!(md.model_column(1), &[None, Some(3.5)]);
    }

    #[test]
    fn nan_observed_and_nan_model_are_dropped() {
        let md = MatchedData::new(
            "obs",
            vec![t(0), t(1), t(2)],
            vec![f64::NAN, 2.0, 3.0],
            point(),
            vec![("a".to_string(), vec![Some(1.0), Some(f64::NAN), Some(3.0)])],
        )
        .unwrap();
        assert_eq!(md.n_rows(), 1);
        assert_eq!(md.observed(), &[3.0]);
    }

    #[test]
    fn track_positions_follow_rows() {
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(2.0, 2.0),
        ];
        let md = MatchedData::new(
            "track",
            vec![t(0), t(1), t(2)],
            vec![1.0, 2.0, 3.0],
            Geometry::Track(positions),
            vec![("a".to_string(), vec![Some(1.0), None, Some(3.0)])],
        )
        .unwrap();
        assert_eq!(md.position(1), Position::new(2.0, 2.0));
    }

    #[test]
    fn duplicate_model_rejected() {
        let err = MatchedData::new(
            "obs",
            vec![t(0)],
            vec![1.0],
            point(),
            vec![
                ("a".to_string(), vec![Some(1.0)]),
                ("a".to_string(), vec![Some(1.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::DuplicateModel { .. }));
    }

    #[test]
    fn select_drops_rows_left_without_models() {
        let md = MatchedData::new(
            "obs",
            vec![t(0), t(1), t(2)],
            vec![1.0, 2.0, 3.0],
            point(),
            vec![
                ("a".to_string(), vec![Some(1.0), None, None]),
                ("b".to_string(), vec![Some(1.5), Some(2.5), None]),
            ],
        )
        .unwrap();
        assert_eq!(md.n_rows(), 2);
        let only_a = md.select(&[true, true], &[0]);
        assert_eq!(only_a.n_rows(), 1);
        assert_eq!(only_a.model_names(), &["a".to_string()]);
        let reordered = md.select(&[true, false], &[1, 0]);
        assert_eq!(reordered.model_names()[0], "b");
        assert_eq!(reordered.n_rows(), 1);
    }

    #[test]
    fn map_model_values_shifts_every_column() {
        let md = MatchedData::new(
            "obs",
            vec![t(0), t(1)],
            vec![1.0, 2.0],
            point(),
            vec![("a".to_string(), vec![Some(1.5), Some(2.5)])],
        )
        .unwrap();
        let shifted = md.map_model_values(|_, v| v - 0.5);
        assert_eq!(shifted.model_column(0), &[Some(1.0), Some(2.0)]);
    }

    #[test]
    fn pairs_skip_unmatched_rows() {
        let md = MatchedData::new(
            "obs",
            vec![t(0), t(1), t(2)],
            vec![1.0, 2.0, 3.0],
            point(),
            vec![
                ("a".to_string(), vec![Some(1.1), Some(2.1), Some(3.1)]),
                ("b".to_string(), vec![None, Some(2.2), None]),
            ],
        )
        .unwrap();
        let (obs, model) = md.pairs(1);
        assert_eq!(obs, vec![2.0]);
        assert_eq!(model, vec![2.2]);
    }
}
