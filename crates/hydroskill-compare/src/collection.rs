//! An ordered set of comparers keyed by observation name.

use chrono::{DateTime, Utc};
use hydroskill_metrics::Metric;
use tracing::{info, instrument};

use crate::comparer::Comparer;
use crate::error::CompareError;
use crate::grid::GridSpec;
use crate::group::GroupBy;
use crate::scoring;
use crate::skill::SkillTable;

/// Comparers for many observations, in insertion order.
///
/// Observation names are unique within a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparerCollection {
    comparers: Vec<Comparer>,
}

impl ComparerCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection by adding each comparer in turn.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::DuplicateName`] on the first repeated observation name.
    pub fn from_comparers(
        comparers: impl IntoIterator<Item = Comparer>,
    ) -> Result<Self, CompareError> {
        let mut collection = Self::new();
        for comparer in comparers {
            collection.add(comparer)?;
        }
        Ok(collection)
    }

    /// Add a comparer.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::DuplicateName`] if its observation name is already present.
    pub fn add(&mut self, comparer: Comparer) -> Result<(), CompareError> {
        if self.comparers.iter().any(|c| c.name() == comparer.name()) {
            return Err(CompareError::DuplicateName {
                name: comparer.name().to_string(),
            });
        }
        self.comparers.push(comparer);
        Ok(())
    }

    /// Return the comparer for observation `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::NotFound`] if no comparer has that name.
    pub fn get(&self, name: &str) -> Result<&Comparer, CompareError> {
        self.comparers
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CompareError::NotFound {
                kind: "observation",
                name: name.to_string(),
            })
    }

    /// Return the observation names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.comparers.iter().map(Comparer::name).collect()
    }

    /// Return every model name, in first-seen order.
    #[must_use]
    pub fn model_names(&self) -> Vec<String> {
        scoring::model_registry(&self.refs())
    }

    /// Return the number of comparers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comparers.len()
    }

    /// Return true if the collection has no comparers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comparers.is_empty()
    }

    /// Return the total number of rows across comparers.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.comparers.iter().map(Comparer::n_points).sum()
    }

    /// Iterate over comparers in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Comparer> {
        self.comparers.iter()
    }

    fn refs(&self) -> Vec<&Comparer> {
        self.comparers.iter().collect()
    }

    /// Pool paired values per group and score each group.
    ///
    /// Rows of every comparer sharing a key are concatenated before the
    /// metrics are computed, so observations with more rows weigh more. An
    /// empty `by` pools everything into a single row.
    #[instrument(skip_all, fields(n_comparers = self.len()))]
    pub fn skill(&self, metrics: &[Metric], by: &[GroupBy]) -> SkillTable {
        let table = scoring::pooled(&self.refs(), metrics, by);
        info!(n_rows = table.len(), "pooled skill computed");
        table
    }

    /// Score each observation separately, then average per model using
    /// observation weights.
    ///
    /// Unlike [`ComparerCollection::skill`] grouped by model, every
    /// observation contributes in proportion to its weight regardless of
    /// its row count.
    #[instrument(skip_all, fields(n_comparers = self.len()))]
    pub fn mean_skill(&self, metrics: &[Metric]) -> SkillTable {
        let table = scoring::weighted_mean(&self.refs(), metrics);
        info!(n_rows = table.len(), "mean skill computed");
        table
    }

    /// Pool paired values per model and occupied grid cell.
    #[must_use]
    pub fn spatial_skill(&self, metrics: &[Metric], grid: GridSpec) -> SkillTable {
        self.skill(metrics, &[GroupBy::Model, GroupBy::Space(grid)])
    }

    /// Restrict every comparer to `start <= time <= end`.
    #[must_use]
    pub fn filter_by_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ComparerCollection {
        Self {
            comparers: self
                .comparers
                .iter()
                .map(|c| c.filter_by_time(start, end))
                .collect(),
        }
    }

    /// Keep only the named models. Comparers holding none of them are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::NotFound`] if a name matches no model in the collection.
    pub fn select_models(&self, names: &[&str]) -> Result<ComparerCollection, CompareError> {
        let known = self.model_names();
        if let Some(missing) = names.iter().find(|n| !known.iter().any(|k| k == *n)) {
            return Err(CompareError::NotFound {
                kind: "model",
                name: missing.to_string(),
            });
        }
        let comparers = self
            .comparers
            .iter()
            .filter_map(|c| {
                let present: Vec<&str> = names
                    .iter()
                    .copied()
                    .filter(|n| c.model_names().iter().any(|m| m == n))
                    .collect();
                if present.is_empty() {
                    None
                } else {
                    Some(c.select_models(&present))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { comparers })
    }
}

impl<'a> IntoIterator for &'a ComparerCollection {
    type Item = &'a Comparer;
    type IntoIter = std::slice::Iter<'a, Comparer>;

    fn into_iter(self) -> Self::IntoIter {
        self.comparers.iter()
    }
}

#[cfg(test)]
mod tests {
    use hydroskill_match::{Geometry, Position};

    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn cmp(name: &str, models: &[(&str, f64)], n: usize) -> Comparer {
        let times: Vec<DateTime<Utc>> = (0..n as i64).map(|i| t(i * 60)).collect();
        let observed: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
        let columns = models
            .iter()
            .map(|(m, offset)| {
                (m.to_string(), observed.iter().map(|o| Some(o + offset)).collect())
            })
            .collect();
        Comparer::from_matched(name, times, observed, Geometry::Point(Position::new(0.0, 0.0)), columns)
            .unwrap()
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut cc = ComparerCollection::new();
        cc.add(cmp("A", &[("m", 0.0)], 3)).unwrap();
        let err = cc.add(cmp("A", &[("m", 0.0)], 3)).unwrap_err();
        assert!(matches!(err, CompareError::DuplicateName { ref name } if name == "A"));
    }

    #[test]
    fn get_missing_is_not_found() {
        let cc = ComparerCollection::from_comparers([cmp("A", &[("m", 0.0)], 3)]).unwrap();
        assert!(matches!(cc.get("B"), Err(CompareError::NotFound { kind: "observation", .. })));
        assert_eq!(cc.get("A").unwrap().n_points(), 3);
    }

    #[test]
    fn insertion_order_preserved() {
        let cc = ComparerCollection::from_comparers([
            cmp("Z", &[("m", 0.0)], 2),
            cmp("A", &[("m", 0.0)], 2),
        ])
        .unwrap();
        assert_eq!(cc.names(), vec!["Z", "A"]);
        let table = cc.skill(&[Metric::Bias], &[GroupBy::Observation]);
        assert_eq!(table.rows()[0].key()[0].to_string(), "Z");
    }

    #[test]
    fn mean_skill_weights_observations() {
        let a = cmp("A", &[("m", 1.0)], 4);
        let b = cmp("B", &[("m", 3.0)], 2).with_weight(3.0).unwrap();
        let cc = ComparerCollection::from_comparers([a, b]).unwrap();
        let table = cc.mean_skill(&[Metric::Bias]);
        let row = table.find(&["m"]).unwrap();
        assert_eq!(row.n(), 6);
        // (1 * 1.0 + 3 * 3.0) / 4
        assert!((row.value(Metric::Bias).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn mean_skill_skips_undefined_observations() {
        let a = cmp("A", &[("m", 1.0)], 4);
        let b = cmp("B", &[("m", 3.0)], 1);
        let cc = ComparerCollection::from_comparers([a, b]).unwrap();
        let row = cc.mean_skill(&[Metric::Bias]).find(&["m"]).cloned().unwrap();
        assert!((row.value(Metric::Bias).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn select_models_drops_comparers_without_them() {
        let cc = ComparerCollection::from_comparers([
            cmp("A", &[("m1", 0.0), ("m2", 0.0)], 2),
            cmp("B", &[("m2", 0.0)], 2),
        ])
        .unwrap();
        let only_m1 = cc.select_models(&["m1"]).unwrap();
        assert_eq!(only_m1.names(), vec!["A"]);
        assert!(matches!(cc.select_models(&["m3"]), Err(CompareError::NotFound { .. })));
    }

    #[test]
    fn model_names_first_seen_order() {
        let cc = ComparerCollection::from_comparers([
            cmp("A", &[("m2", 0.0)], 2),
            cmp("B", &[("m1", 0.0), ("m2", 0.0)], 2),
        ])
        .unwrap();
        assert_eq!(cc.model_names(), vec!["m2".to_string(), "m1".to_string()]);
    }
}
