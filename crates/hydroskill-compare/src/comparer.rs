//! A single observation paired with its aligned model columns.

use chrono::{DateTime, Utc};
use hydroskill_match::{
    Geometry, MatchConfig, MatchedData, ModelResult, Observation, Position, Quantity,
};
use hydroskill_metrics::{Metric, MetricError};
use tracing::{debug, instrument};

use crate::area::Area;
use crate::error::CompareError;
use crate::grid::GridSpec;
use crate::group::GroupBy;
use crate::scoring;
use crate::skill::SkillTable;

/// One observation bound to one or more aligned model columns.
///
/// Every row has a finite observed value and at least one model value.
/// Comparers are immutable: filtering and selection return new comparers.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparer {
    data: MatchedData,
}

/// Borrowed view of one comparer row, passed to [`Comparer::filter`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    data: &'a MatchedData,
    row: usize,
}

impl RowView<'_> {
    /// Return the row timestamp.
    #[must_use]
    pub fn time(&self) -> DateTime<Utc> {
        self.data.times()[self.row]
    }

    /// Return the observed value.
    #[must_use]
    pub fn observed(&self) -> f64 {
        self.data.observed()[self.row]
    }

    /// Return the value of model `name`, if that model is matched at this row.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<f64> {
        let index = self.data.model_index(name)?;
        self.data.model_column(index)[self.row]
    }

    /// Return the row position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.data.position(self.row)
    }
}

impl From<MatchedData> for Comparer {
    fn from(data: MatchedData) -> Self {
        Self { data }
    }
}

impl Comparer {
    /// Align `observation` with `models` and wrap the result.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Match`] with any error from [`MatchConfig::align`].
    pub fn align(
        observation: &Observation,
        models: &[ModelResult],
        config: &MatchConfig,
    ) -> Result<Self, CompareError> {
        Ok(Self {
            data: config.align(observation, models)?,
        })
    }

    /// Build a comparer from already aligned columns.
    ///
    /// Rows without a finite observed value or without any model value are
    /// dropped, exactly as alignment would.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Match`] with any error from [`MatchedData::new`].
    pub fn from_matched(
        name: impl Into<String>,
        times: Vec<DateTime<Utc>>,
        observed: Vec<f64>,
        geometry: Geometry,
        models: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, CompareError> {
        Ok(Self {
            data: MatchedData::new(name, times, observed, geometry, models)?,
        })
    }

    /// Return a copy with the given quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: Quantity) -> Comparer {
        Self {
            data: self.data.clone().with_quantity(quantity),
        }
    }

    /// Return a copy with the given averaging weight.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Match`] if `weight` is negative or not finite.
    pub fn with_weight(&self, weight: f64) -> Result<Comparer, CompareError> {
        Ok(Self {
            data: self.data.clone().with_weight(weight)?,
        })
    }

    /// Return the underlying aligned table.
    #[must_use]
    pub fn data(&self) -> &MatchedData {
        &self.data
    }

    /// Return the observation name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.data.name()
    }

    /// Return the quantity.
    #[must_use]
    pub fn quantity(&self) -> &Quantity {
        self.data.quantity()
    }

    /// Return the observation weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.data.weight()
    }

    /// Return the model names in column order.
    #[must_use]
    pub fn model_names(&self) -> &[String] {
        self.data.model_names()
    }

    /// Return the number of model columns.
    #[must_use]
    pub fn n_models(&self) -> usize {
        self.data.n_models()
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.data.n_rows()
    }

    /// Return the row timestamps.
    #[must_use]
    pub fn times(&self) -> &[DateTime<Utc>] {
        self.data.times()
    }

    /// Return the observed values.
    #[must_use]
    pub fn observed(&self) -> &[f64] {
        self.data.observed()
    }

    /// Return the geometry, with per-row positions for tracks.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        self.data.geometry()
    }

    /// Return one position per row.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        (0..self.n_points()).map(|row| self.data.position(row)).collect()
    }

    fn model_index(&self, name: &str) -> Result<usize, CompareError> {
        self.data.model_index(name).ok_or_else(|| CompareError::NotFound {
            kind: "model",
            name: name.to_string(),
        })
    }

    /// Return the values of model `name`, `None` where unmatched.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::NotFound`] if the model is absent.
    pub fn model_values(&self, name: &str) -> Result<&[Option<f64>], CompareError> {
        Ok(self.data.model_column(self.model_index(name)?))
    }

    /// Return `model - observed` for model `name`, `None` where unmatched.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::NotFound`] if the model is absent.
    pub fn residuals(&self, name: &str) -> Result<Vec<Option<f64>>, CompareError> {
        let values = self.model_values(name)?;
        Ok(values
            .iter()
            .zip(self.observed())
            .map(|(m, o)| m.map(|m| m - o))
            .collect())
    }

    /// Score every model with `metrics`, one row per model keyed by
    /// observation and model. Each model's `n` counts only its own pairs.
    #[must_use]
    pub fn skill(&self, metrics: &[Metric]) -> SkillTable {
        self.skill_by(metrics, &[GroupBy::Observation, GroupBy::Model])
    }

    /// Group this comparer's pairs by `by` and score each group.
    #[must_use]
    pub fn skill_by(&self, metrics: &[Metric], by: &[GroupBy]) -> SkillTable {
        scoring::pooled(&[self], metrics, by)
    }

    /// Return one metric per model, in model order.
    #[must_use]
    pub fn score(&self, metric: Metric) -> Vec<(String, Result<f64, MetricError>)> {
        (0..self.n_models())
            .map(|m| {
                let (obs, model) = self.data.pairs(m);
                (self.model_names()[m].clone(), metric.compute(&obs, &model))
            })
            .collect()
    }

    /// Score per occupied grid cell and model.
    #[must_use]
    pub fn spatial_skill(&self, metrics: &[Metric], grid: GridSpec) -> SkillTable {
        self.skill_by(metrics, &[GroupBy::Model, GroupBy::Space(grid)])
    }

    fn all_models(&self) -> Vec<usize> {
        (0..self.n_models()).collect()
    }

    /// Keep rows with `start <= time <= end`. The result may be empty.
    #[must_use]
    pub fn filter_by_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Comparer {
        let keep: Vec<bool> = self.times().iter().map(|t| *t >= start && *t <= end).collect();
        Self {
            data: self.data.select(&keep, &self.all_models()),
        }
    }

    /// Keep track rows whose position lies inside `area`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::UnsupportedOperation`] for point comparers.
    #[instrument(skip_all, fields(observation = self.name()))]
    pub fn filter_by_area(&self, area: &Area) -> Result<Comparer, CompareError> {
        let Geometry::Track(positions) = self.geometry() else {
            return Err(CompareError::UnsupportedOperation {
                operation: "filter_by_area",
                reason: "point observations have a single fixed position",
            });
        };
        let keep: Vec<bool> = positions.iter().map(|p| area.contains(*p)).collect();
        let data = self.data.select(&keep, &self.all_models());
        debug!(n_before = self.n_points(), n_after = data.n_rows(), "area filter applied");
        Ok(Self { data })
    }

    /// Keep rows for which `predicate` returns true.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(RowView<'_>) -> bool) -> Comparer {
        let keep: Vec<bool> = (0..self.n_points())
            .map(|row| predicate(RowView { data: &self.data, row }))
            .collect();
        Self {
            data: self.data.select(&keep, &self.all_models()),
        }
    }

    /// Drop model `name`. Rows left without any model value are dropped.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CompareError::NotFound`] | The model is absent |
    /// | [`CompareError::UnsupportedOperation`] | It is the only model |
    pub fn remove_model(&self, name: &str) -> Result<Comparer, CompareError> {
        let index = self.model_index(name)?;
        if self.n_models() == 1 {
            return Err(CompareError::UnsupportedOperation {
                operation: "remove_model",
                reason: "a comparer needs at least one model",
            });
        }
        let models: Vec<usize> = self.all_models().into_iter().filter(|&m| m != index).collect();
        Ok(Self {
            data: self.data.select(&vec![true; self.n_points()], &models),
        })
    }

    /// Keep only the named models, in the given order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CompareError::NotFound`] | A named model is absent |
    /// | [`CompareError::UnsupportedOperation`] | `names` is empty |
    pub fn select_models(&self, names: &[&str]) -> Result<Comparer, CompareError> {
        if names.is_empty() {
            return Err(CompareError::UnsupportedOperation {
                operation: "select_models",
                reason: "a comparer needs at least one model",
            });
        }
        let models = names
            .iter()
            .map(|name| self.model_index(name))
            .collect::<Result<Vec<usize>, _>>()?;
        Ok(Self {
            data: self.data.select(&vec![true; self.n_points()], &models),
        })
    }

    /// Shift every model column by its own mean bias, so each model has zero bias.
    ///
    /// Models with no paired values are left unchanged.
    #[must_use]
    pub fn remove_bias(&self) -> Comparer {
        let biases: Vec<f64> = (0..self.n_models())
            .map(|m| {
                let (obs, model) = self.data.pairs(m);
                if obs.is_empty() {
                    return 0.0;
                }
                model.iter().zip(&obs).map(|(m, o)| m - o).sum::<f64>() / obs.len() as f64
            })
            .collect();
        Self {
            data: self.data.map_model_values(|m, v| v - biases[m]),
        }
    }

    /// Merge `other` into this comparer along time.
    ///
    /// Both must describe the same observation with the same models. Rows
    /// are ordered by time; where both have a row at the same timestamp,
    /// this comparer's row wins.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Incompatible`] if names, models, geometry kind,
    /// point position, or quantity differ.
    #[instrument(skip_all, fields(observation = self.name()))]
    pub fn concat(&self, other: &Comparer) -> Result<Comparer, CompareError> {
        if self.name() != other.name() {
            return Err(CompareError::Incompatible {
                reason: format!("observation \"{}\" vs \"{}\"", self.name(), other.name()),
            });
        }
        let other_models = self
            .model_names()
            .iter()
            .map(|name| other.data.model_index(name))
            .collect::<Option<Vec<usize>>>()
            .filter(|m| m.len() == other.n_models())
            .ok_or_else(|| CompareError::Incompatible {
                reason: "model names differ".to_string(),
            })?;
        if !self.quantity().is_compatible(other.quantity()) {
            return Err(CompareError::Incompatible {
                reason: format!("quantity {} vs {}", self.quantity(), other.quantity()),
            });
        }
        match (self.geometry(), other.geometry()) {
            (Geometry::Point(a), Geometry::Point(b)) if a != b => {
                return Err(CompareError::Incompatible {
                    reason: "point positions differ".to_string(),
                });
            }
            (Geometry::Point(_), Geometry::Track(_)) | (Geometry::Track(_), Geometry::Point(_)) => {
                return Err(CompareError::Incompatible {
                    reason: "point and track observations".to_string(),
                });
            }
            _ => {}
        }

        // (source, row) in time order, ours first on equal timestamps
        let mut order: Vec<(usize, usize)> = (0..self.n_points())
            .map(|r| (0, r))
            .chain((0..other.n_points()).map(|r| (1, r)))
            .collect();
        let time_of = |(src, row): (usize, usize)| {
            if src == 0 { self.times()[row] } else { other.times()[row] }
        };
        order.sort_by_key(|&(src, row)| (time_of((src, row)), src));
        order.dedup_by_key(|entry| time_of(*entry));

        let pick = |src: usize| if src == 0 { &self.data } else { &other.data };
        let times: Vec<DateTime<Utc>> = order.iter().map(|&e| time_of(e)).collect();
        let observed: Vec<f64> = order.iter().map(|&(s, r)| pick(s).observed()[r]).collect();
        let models: Vec<(String, Vec<Option<f64>>)> = self
            .model_names()
            .iter()
            .enumerate()
            .map(|(m, name)| {
                let values = order
                    .iter()
                    .map(|&(src, row)| {
                        let column = if src == 0 { m } else { other_models[m] };
                        pick(src).model_column(column)[row]
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect();
        let geometry = match self.geometry() {
            Geometry::Track(_) => Geometry::Track(
                order.iter().map(|&(s, r)| pick(s).position(r)).collect(),
            ),
            point => point.clone(),
        };

        let data = MatchedData::new(self.name(), times, observed, geometry, models)?
            .with_quantity(self.quantity().clone())
            .with_weight(self.weight())?;
        debug!(n_rows = data.n_rows(), "comparers concatenated");
        Ok(Self { data })
    }
}
