//! Alignment configuration and the alignment entry points.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::align;
use crate::error::MatchError;
use crate::matched::MatchedData;
use crate::model::ModelResult;
use crate::observation::Observation;

/// How a model value is chosen for an observation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Take the closest model sample within the tolerance (default).
    #[default]
    Nearest,
    /// Linearly interpolate between the surrounding model samples.
    Interpolate,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Nearest => f.write_str("nearest"),
            MatchPolicy::Interpolate => f.write_str("interpolate"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(MatchPolicy::Nearest),
            "interpolate" | "linear" => Ok(MatchPolicy::Interpolate),
            other => Err(format!(
                "unknown match policy: {other} (expected nearest or interpolate)"
            )),
        }
    }
}

/// Configuration for aligning observations with model results in time.
///
/// Construct via [`MatchConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter       | Default                                                  |
/// |-----------------|----------------------------------------------------------|
/// | `policy`        | [`MatchPolicy::Nearest`]                                 |
/// | `tolerance`     | half the median observation interval (exact if < 2 timestamps) |
/// | `max_model_gap` | unlimited                                                |
///
/// The tolerance only applies to [`MatchPolicy::Nearest`].
#[derive(Debug, Clone, Default)]
pub struct MatchConfig {
    policy: MatchPolicy,
    tolerance: Option<TimeDelta>,
    max_model_gap: Option<TimeDelta>,
}

impl MatchConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the matching policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set a fixed tolerance for nearest matching, replacing the derived default.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: TimeDelta) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Leave observation timestamps unmatched when the surrounding model
    /// samples are more than `max_model_gap` apart.
    #[must_use]
    pub fn with_max_model_gap(mut self, max_model_gap: TimeDelta) -> Self {
        self.max_model_gap = Some(max_model_gap);
        self
    }

    /// Return the matching policy.
    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Return the fixed tolerance, if one was set.
    #[must_use]
    pub fn tolerance(&self) -> Option<TimeDelta> {
        self.tolerance
    }

    /// Return the model gap limit, if one was set.
    #[must_use]
    pub fn max_model_gap(&self) -> Option<TimeDelta> {
        self.max_model_gap
    }

    /// Return the tolerance used for `observation`: the configured value, or
    /// half its median sampling interval.
    #[must_use]
    pub fn effective_tolerance(&self, observation: &Observation) -> TimeDelta {
        self.tolerance.unwrap_or_else(|| {
            observation
                .series()
                .typical_interval()
                .map_or(TimeDelta::zero(), |dt| dt / 2)
        })
    }

    fn validate(&self) -> Result<(), MatchError> {
        if self.tolerance.is_some_and(|t| t < TimeDelta::zero()) {
            return Err(MatchError::NegativeDuration {
                parameter: "tolerance",
            });
        }
        if self.max_model_gap.is_some_and(|g| g < TimeDelta::zero()) {
            return Err(MatchError::NegativeDuration {
                parameter: "max_model_gap",
            });
        }
        Ok(())
    }

    /// Align `observation` with `models` on the observation's timestamps.
    ///
    /// Rows whose observed value is a gap, or that no model could be
    /// matched to, are dropped. Rows matched by only some models keep
    /// `None` for the others. Track positions travel with their rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MatchError::NegativeDuration`] | Tolerance or gap limit is negative |
    /// | [`MatchError::NoModels`] | `models` is empty |
    /// | [`MatchError::DuplicateModel`] | Two models share a name |
    /// | [`MatchError::QuantityMismatch`] | A model quantity is incompatible with the observation's |
    /// | [`MatchError::NoOverlap`] | No rows survive |
    #[instrument(skip_all, fields(observation = observation.name(), n_models = models.len(), policy = %self.policy))]
    pub fn align(
        &self,
        observation: &Observation,
        models: &[ModelResult],
    ) -> Result<MatchedData, MatchError> {
        self.validate()?;
        if models.is_empty() {
            return Err(MatchError::NoModels {
                observation: observation.name().to_string(),
            });
        }
        let mut seen = HashSet::new();
        for model in models {
            if !seen.insert(model.name()) {
                return Err(MatchError::DuplicateModel {
                    name: model.name().to_string(),
                });
            }
            if !observation.quantity().is_compatible(model.quantity()) {
                return Err(MatchError::QuantityMismatch {
                    model: model.name().to_string(),
                    expected: observation.quantity().to_string(),
                    found: model.quantity().to_string(),
                });
            }
        }

        let targets = observation.series().times();
        let tolerance = self.effective_tolerance(observation);
        let directional = observation.quantity().is_directional();
        debug!(tolerance_s = tolerance.num_seconds(), n_obs = targets.len(), "aligning");

        let columns: Vec<(String, Vec<Option<f64>>)> = models
            .iter()
            .map(|model| {
                let values = match self.policy {
                    MatchPolicy::Nearest => {
                        align::nearest(targets, model.series(), tolerance, self.max_model_gap)
                    }
                    MatchPolicy::Interpolate => align::interpolate(
                        targets,
                        model.series(),
                        self.max_model_gap,
                        directional,
                    ),
                };
                let n_matched = values.iter().filter(|v| v.is_some()).count();
                debug!(model = model.name(), n_matched, "model matched");
                (model.name().to_string(), values)
            })
            .collect();

        let matched = MatchedData::new(
            observation.name(),
            targets.to_vec(),
            observation.series().values().to_vec(),
            observation.geometry().clone(),
            columns,
        )?
        .with_quantity(observation.quantity().clone())
        .with_weight(observation.weight())?;

        if matched.is_empty() {
            warn!("no overlapping rows");
            return Err(MatchError::NoOverlap {
                observation: observation.name().to_string(),
            });
        }
        let n_dropped = targets.len() - matched.n_rows();
        info!(n_rows = matched.n_rows(), n_dropped, "alignment complete");
        Ok(matched)
    }

    /// Align many observations in parallel, one result per input in input order.
    #[instrument(skip_all, fields(n_observations = pairs.len()))]
    pub fn align_all(
        &self,
        pairs: &[(Observation, Vec<ModelResult>)],
    ) -> Vec<Result<MatchedData, MatchError>> {
        pairs
            .par_iter()
            .map(|(observation, models)| self.align(observation, models))
            .collect()
    }
}
