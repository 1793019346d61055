//! The [`Metric`] enum: a named, selectable skill metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::stats;

/// Minimum number of paired values any metric accepts.
pub const MIN_SAMPLES: usize = 2;

/// Metrics reported when the caller does not choose any, in column order.
pub const DEFAULT_METRICS: [Metric; 7] = [
    Metric::Bias,
    Metric::Rmse,
    Metric::Urmse,
    Metric::Mae,
    Metric::Cc,
    Metric::Si,
    Metric::R2,
];

/// A skill metric comparing modelled values against observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Mean error, `mean(model - obs)`.
    Bias,
    /// Root mean squared error.
    Rmse,
    /// Unbiased (centred) root mean squared error.
    Urmse,
    /// Mean absolute error.
    Mae,
    /// Pearson correlation coefficient.
    Cc,
    /// Scatter index, `urmse / mean(obs)`.
    Si,
    /// Coefficient of determination.
    R2,
    /// Nash-Sutcliffe efficiency.
    Nse,
    /// Largest absolute error.
    MaxError,
    /// Mean absolute percentage error.
    Mape,
    /// Kling-Gupta efficiency.
    Kge,
    /// Willmott's index of agreement.
    Willmott,
}

impl Metric {
    /// Every metric, defaults first.
    pub const ALL: [Metric; 12] = [
        Metric::Bias,
        Metric::Rmse,
        Metric::Urmse,
        Metric::Mae,
        Metric::Cc,
        Metric::Si,
        Metric::R2,
        Metric::Nse,
        Metric::MaxError,
        Metric::Mape,
        Metric::Kge,
        Metric::Willmott,
    ];

    /// Return the canonical lower-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Metric::Bias => "bias",
            Metric::Rmse => "rmse",
            Metric::Urmse => "urmse",
            Metric::Mae => "mae",
            Metric::Cc => "cc",
            Metric::Si => "si",
            Metric::R2 => "r2",
            Metric::Nse => "nse",
            Metric::MaxError => "max_error",
            Metric::Mape => "mape",
            Metric::Kge => "kge",
            Metric::Willmott => "willmott",
        }
    }

    /// Whether a larger value means better skill.
    ///
    /// Error metrics (bias excluded, which is signed) are better when small.
    #[must_use]
    pub fn higher_is_better(self) -> bool {
        matches!(
            self,
            Metric::Cc | Metric::R2 | Metric::Nse | Metric::Kge | Metric::Willmott
        )
    }

    /// Compute this metric over paired values.
    ///
    /// # Errors
    ///
    /// See the corresponding function in this crate; every metric shares the
    /// length, finiteness, and [`MIN_SAMPLES`] validation.
    pub fn compute(self, obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
        match self {
            Metric::Bias => stats::bias(obs, model),
            Metric::Rmse => stats::rmse(obs, model),
            Metric::Urmse => stats::urmse(obs, model),
            Metric::Mae => stats::mae(obs, model),
            Metric::Cc => stats::cc(obs, model),
            Metric::Si => stats::si(obs, model),
            Metric::R2 => stats::r2(obs, model),
            Metric::Nse => stats::nse(obs, model),
            Metric::MaxError => stats::max_error(obs, model),
            Metric::Mape => stats::mape(obs, model),
            Metric::Kge => stats::kge(obs, model),
            Metric::Willmott => stats::willmott(obs, model),
        }
    }

    /// Parse a comma-separated list such as `"rmse, bias,cc"`.
    ///
    /// An empty or whitespace-only string yields [`DEFAULT_METRICS`].
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::UnknownMetric`] for the first unrecognised name.
    pub fn parse_list(list: &str) -> Result<Vec<Metric>, MetricError> {
        if list.trim().is_empty() {
            return Ok(DEFAULT_METRICS.to_vec());
        }
        list.split(',').map(|s| s.trim().parse()).collect()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let metric = match lower.as_str() {
            "bias" | "me" => Metric::Bias,
            "rmse" => Metric::Rmse,
            "urmse" => Metric::Urmse,
            "mae" => Metric::Mae,
            "cc" | "corrcoef" => Metric::Cc,
            "si" | "scatter_index" => Metric::Si,
            "r2" => Metric::R2,
            "nse" => Metric::Nse,
            "max_error" => Metric::MaxError,
            "mape" => Metric::Mape,
            "kge" => Metric::Kge,
            "willmott" => Metric::Willmott,
            _ => {
                return Err(MetricError::UnknownMetric {
                    name: s.to_string(),
                });
            }
        };
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn parse_is_case_insensitive_with_aliases() {
        assert_eq!("RMSE".parse::<Metric>().unwrap(), Metric::Rmse);
        assert_eq!("corrcoef".parse::<Metric>().unwrap(), Metric::Cc);
        assert_eq!(" scatter_index ".parse::<Metric>().unwrap(), Metric::Si);
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "nash".parse::<Metric>().unwrap_err();
        assert!(matches!(err, MetricError::UnknownMetric { ref name } if name == "nash"));
    }

    #[test]
    fn parse_list_keeps_order() {
        let metrics = Metric::parse_list("cc, bias,rmse").unwrap();
        assert_eq!(metrics, vec![Metric::Cc, Metric::Bias, Metric::Rmse]);
    }

    #[test]
    fn parse_list_empty_gives_defaults() {
        assert_eq!(Metric::parse_list("  ").unwrap(), DEFAULT_METRICS.to_vec());
    }

    #[test]
    fn compute_dispatches() {
        let obs = [1.0, 2.0, 3.0];
        let model = [2.0, 3.0, 4.0];
        assert!((Metric::Bias.compute(&obs, &model).unwrap() - 1.0).abs() < 1e-12);
        assert!((Metric::Cc.compute(&obs, &model).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_uses_canonical_name() {
        assert_eq!(Metric::MaxError.to_string(), "max_error");
    }
}
