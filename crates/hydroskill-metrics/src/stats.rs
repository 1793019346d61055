//! Skill metric functions over paired observed/modelled slices.
//!
//! Every function validates its input the same way before computing:
//! equal lengths, all values finite, at least [`MIN_SAMPLES`] pairs.

use crate::error::MetricError;
use crate::metric::MIN_SAMPLES;

/// Validate a pair of slices for metric `metric`.
fn check(metric: &'static str, obs: &[f64], model: &[f64]) -> Result<(), MetricError> {
    if obs.len() != model.len() {
        return Err(MetricError::LengthMismatch {
            obs: obs.len(),
            model: model.len(),
        });
    }
    if let Some(index) = obs
        .iter()
        .zip(model)
        .position(|(o, m)| !o.is_finite() || !m.is_finite())
    {
        return Err(MetricError::NonFiniteValue { index });
    }
    if obs.len() < MIN_SAMPLES {
        return Err(MetricError::InsufficientData {
            metric,
            n: obs.len(),
            required: MIN_SAMPLES,
        });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
fn sum_sq_dev(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean) * (v - mean)).sum()
}

/// A denominator the metric can divide by: non-zero and finite.
fn divisible(denom: f64) -> bool {
    denom != 0.0 && denom.is_finite()
}

/// Return `value`, or `Undefined` when it came out non-finite.
fn finite(metric: &'static str, value: f64, reason: &'static str) -> Result<f64, MetricError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MetricError::Undefined { metric, reason })
    }
}

/// A series has zero variance when every value equals the first one.
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

/// Mean error, `mean(model - obs)`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::LengthMismatch`] | Slices differ in length |
/// | [`MetricError::NonFiniteValue`] | Any value is NaN or infinite |
/// | [`MetricError::InsufficientData`] | Fewer than two pairs |
pub fn bias(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("bias", obs, model)?;
    let sum: f64 = obs.iter().zip(model).map(|(o, m)| m - o).sum();
    Ok(sum / obs.len() as f64)
}

/// Root mean squared error.
///
/// # Errors
///
/// Same validation as [`bias`].
pub fn rmse(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("rmse", obs, model)?;
    let sum: f64 = obs.iter().zip(model).map(|(o, m)| (m - o) * (m - o)).sum();
    Ok((sum / obs.len() as f64).sqrt())
}

/// Unbiased root mean squared error: RMSE after removing each series' mean.
///
/// # Errors
///
/// Same validation as [`bias`].
pub fn urmse(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("urmse", obs, model)?;
    Ok(urmse_unchecked(obs, model))
}

fn urmse_unchecked(obs: &[f64], model: &[f64]) -> f64 {
    let residuals: Vec<f64> = obs.iter().zip(model).map(|(o, m)| m - o).collect();
    let mean_residual = mean(&residuals);
    (sum_sq_dev(&residuals, mean_residual) / residuals.len() as f64).sqrt()
}

/// Mean absolute error.
///
/// # Errors
///
/// Same validation as [`bias`].
pub fn mae(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("mae", obs, model)?;
    let sum: f64 = obs.iter().zip(model).map(|(o, m)| (m - o).abs()).sum();
    Ok(sum / obs.len() as f64)
}

/// Pearson correlation coefficient.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | Either series has zero variance, or the variance underflows |
pub fn cc(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("cc", obs, model)?;
    pearson("cc", obs, model)
}

fn pearson(metric: &'static str, obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    if is_constant(obs) {
        return Err(MetricError::Undefined {
            metric,
            reason: "observed series has zero variance",
        });
    }
    if is_constant(model) {
        return Err(MetricError::Undefined {
            metric,
            reason: "modelled series has zero variance",
        });
    }
    let mean_obs = mean(obs);
    let mean_model = mean(model);
    let cov: f64 = obs
        .iter()
        .zip(model)
        .map(|(o, m)| (o - mean_obs) * (m - mean_model))
        .sum();
    let denom = (sum_sq_dev(obs, mean_obs) * sum_sq_dev(model, mean_model)).sqrt();
    if !divisible(denom) {
        return Err(MetricError::Undefined {
            metric,
            reason: "variance is not representable",
        });
    }
    let r = finite(metric, cov / denom, "variance is not representable")?;
    Ok(r.clamp(-1.0, 1.0))
}

/// Scatter index, `urmse / mean(obs)`.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | The observed mean is zero |
pub fn si(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("si", obs, model)?;
    let mean_obs = mean(obs);
    if !divisible(mean_obs) {
        return Err(MetricError::Undefined {
            metric: "si",
            reason: "observed mean is zero",
        });
    }
    finite("si", urmse_unchecked(obs, model) / mean_obs, "observed mean is too small")
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | The observed series has zero variance |
pub fn r2(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("r2", obs, model)?;
    efficiency("r2", obs, model)
}

/// Nash-Sutcliffe efficiency. Numerically identical to [`r2`].
///
/// # Errors
///
/// Same as [`r2`].
pub fn nse(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("nse", obs, model)?;
    efficiency("nse", obs, model)
}

fn efficiency(metric: &'static str, obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    if is_constant(obs) {
        return Err(MetricError::Undefined {
            metric,
            reason: "observed series has zero variance",
        });
    }
    let ss_tot = sum_sq_dev(obs, mean(obs));
    if !divisible(ss_tot) {
        return Err(MetricError::Undefined {
            metric,
            reason: "observed variance is not representable",
        });
    }
    let ss_res: f64 = obs.iter().zip(model).map(|(o, m)| (m - o) * (m - o)).sum();
    finite(metric, 1.0 - ss_res / ss_tot, "observed variance is not representable")
}

/// Largest absolute error.
///
/// # Errors
///
/// Same validation as [`bias`].
pub fn max_error(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("max_error", obs, model)?;
    Ok(obs
        .iter()
        .zip(model)
        .map(|(o, m)| (m - o).abs())
        .fold(0.0, f64::max))
}

/// Mean absolute percentage error, in percent.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | Any observed value is zero |
pub fn mape(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("mape", obs, model)?;
    if obs.contains(&0.0) {
        return Err(MetricError::Undefined {
            metric: "mape",
            reason: "observed series contains zero",
        });
    }
    let sum: f64 = obs.iter().zip(model).map(|(o, m)| ((m - o) / o).abs()).sum();
    Ok(100.0 * sum / obs.len() as f64)
}

/// Kling-Gupta efficiency.
///
/// `1 - sqrt((cc - 1)^2 + (alpha - 1)^2 + (beta - 1)^2)` with
/// `alpha = std(model) / std(obs)` and `beta = mean(model) / mean(obs)`.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | Either series has zero variance, or the observed mean is zero |
pub fn kge(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("kge", obs, model)?;
    let r = pearson("kge", obs, model)?;
    let mean_obs = mean(obs);
    if !divisible(mean_obs) {
        return Err(MetricError::Undefined {
            metric: "kge",
            reason: "observed mean is zero",
        });
    }
    let mean_model = mean(model);
    let ss_obs = sum_sq_dev(obs, mean_obs);
    if !divisible(ss_obs) {
        return Err(MetricError::Undefined {
            metric: "kge",
            reason: "observed variance is not representable",
        });
    }
    let alpha = (sum_sq_dev(model, mean_model) / ss_obs).sqrt();
    let beta = mean_model / mean_obs;
    let score = 1.0 - ((r - 1.0).powi(2) + (alpha - 1.0).powi(2) + (beta - 1.0).powi(2)).sqrt();
    finite("kge", score, "variance ratio is not representable")
}

/// Willmott's index of agreement.
///
/// # Errors
///
/// In addition to the validation of [`bias`]:
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::Undefined`] | Both series are constant and equal to the observed mean |
pub fn willmott(obs: &[f64], model: &[f64]) -> Result<f64, MetricError> {
    check("willmott", obs, model)?;
    let mean_obs = mean(obs);
    let ss_res: f64 = obs.iter().zip(model).map(|(o, m)| (m - o) * (m - o)).sum();
    let potential: f64 = obs
        .iter()
        .zip(model)
        .map(|(o, m)| {
            let d = (m - mean_obs).abs() + (o - mean_obs).abs();
            d * d
        })
        .sum();
    if !divisible(potential) {
        return Err(MetricError::Undefined {
            metric: "willmott",
            reason: "potential error is zero",
        });
    }
    finite("willmott", 1.0 - ss_res / potential, "potential error is not representable")
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identical_series_are_perfect() {
        assert_close(bias(&OBS, &OBS).unwrap(), 0.0);
        assert_close(rmse(&OBS, &OBS).unwrap(), 0.0);
        assert_close(urmse(&OBS, &OBS).unwrap(), 0.0);
        assert_close(mae(&OBS, &OBS).unwrap(), 0.0);
        assert_close(cc(&OBS, &OBS).unwrap(), 1.0);
        assert_close(si(&OBS, &OBS).unwrap(), 0.0);
        assert_close(r2(&OBS, &OBS).unwrap(), 1.0);
        assert_close(kge(&OBS, &OBS).unwrap(), 1.0);
        assert_close(willmott(&OBS, &OBS).unwrap(), 1.0);
        assert_close(max_error(&OBS, &OBS).unwrap(), 0.0);
        assert_close(mape(&OBS, &OBS).unwrap(), 0.0);
    }

    #[test]
    fn constant_offset_is_pure_bias() {
        let model: Vec<f64> = OBS.iter().map(|v| v + 0.5).collect();
        assert_close(bias(&OBS, &model).unwrap(), 0.5);
        assert_close(rmse(&OBS, &model).unwrap(), 0.5);
        assert_close(urmse(&OBS, &model).unwrap(), 0.0);
        assert_close(mae(&OBS, &model).unwrap(), 0.5);
        assert_close(cc(&OBS, &model).unwrap(), 1.0);
        // SS_res = 5 * 0.25, SS_tot = 10
        assert_close(r2(&OBS, &model).unwrap(), 1.0 - 1.25 / 10.0);
    }

    #[test]
    fn hand_computed_values() {
        let obs = [1.0, 2.0, 3.0, 4.0];
        let model = [2.0, 2.0, 2.0, 6.0];
        // residuals 1, 0, -1, 2
        assert_close(bias(&obs, &model).unwrap(), 0.5);
        assert_close(rmse(&obs, &model).unwrap(), (6.0f64 / 4.0).sqrt());
        assert_close(mae(&obs, &model).unwrap(), 1.0);
        // residual deviations 0.5, -0.5, -1.5, 1.5 -> mean square 1.25
        assert_close(urmse(&obs, &model).unwrap(), 1.25f64.sqrt());
        assert_close(si(&obs, &model).unwrap(), 1.25f64.sqrt() / 2.5);
        assert_close(max_error(&obs, &model).unwrap(), 2.0);
    }

    #[test]
    fn anti_correlated_series() {
        let model: Vec<f64> = OBS.iter().rev().copied().collect();
        assert_close(cc(&OBS, &model).unwrap(), -1.0);
    }

    #[test]
    fn cc_constant_observed_is_undefined() {
        let obs = [1.0; 5];
        let err = cc(&obs, &OBS).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { metric: "cc", .. }));
    }

    #[test]
    fn cc_constant_model_is_undefined() {
        let err = cc(&OBS, &[3.0; 5]).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { .. }));
    }

    #[test]
    fn si_zero_mean_is_undefined() {
        let obs = [-1.0, 1.0, -2.0, 2.0];
        let err = si(&obs, &obs).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { metric: "si", .. }));
    }

    #[test]
    fn r2_constant_observed_is_undefined() {
        let err = r2(&[2.0; 4], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { metric: "r2", .. }));
    }

    #[test]
    fn mape_zero_observation_is_undefined() {
        let err = mape(&[0.0, 1.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { metric: "mape", .. }));
    }

    #[test]
    fn willmott_all_equal_is_undefined() {
        let err = willmott(&[2.0; 3], &[2.0; 3]).unwrap_err();
        assert!(matches!(err, MetricError::Undefined { .. }));
    }

    #[test]
    fn underflowing_variance_is_undefined_not_nan() {
        let tiny = [0.0, 1e-170];
        assert!(matches!(cc(&tiny, &tiny), Err(MetricError::Undefined { metric: "cc", .. })));
        assert!(matches!(r2(&tiny, &tiny), Err(MetricError::Undefined { metric: "r2", .. })));
        assert!(matches!(nse(&tiny, &tiny), Err(MetricError::Undefined { metric: "nse", .. })));
        assert!(matches!(kge(&tiny, &tiny), Err(MetricError::Undefined { metric: "kge", .. })));
        assert!(matches!(
            willmott(&tiny, &tiny),
            Err(MetricError::Undefined { metric: "willmott", .. })
        ));
    }

    #[test]
    fn tiny_observed_mean_never_yields_non_finite_si() {
        let obs = [-1e-300, 1.5e-300];
        let model = [1.0, -1.0];
        match si(&obs, &model) {
            Ok(v) => assert!(v.is_finite()),
            Err(e) => assert!(matches!(e, MetricError::Undefined { metric: "si", .. })),
        }
    }

    #[test]
    fn single_pair_is_insufficient() {
        let err = rmse(&[1.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            MetricError::InsufficientData { metric: "rmse", n: 1, required: 2 }
        ));
    }

    #[test]
    fn empty_is_insufficient() {
        let err = bias(&[], &[]).unwrap_err();
        assert!(matches!(err, MetricError::InsufficientData { n: 0, .. }));
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = mae(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, MetricError::LengthMismatch { obs: 2, model: 1 }));
    }

    #[test]
    fn nan_rejected_with_index() {
        let err = bias(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0]).unwrap_err();
        assert!(matches!(err, MetricError::NonFiniteValue { index: 1 }));
    }

    #[test]
    fn rmse_never_below_urmse() {
        let obs = [0.3, 1.7, 2.2, 5.1, 4.4, 3.9];
        let model = [0.9, 1.1, 2.8, 4.0, 5.5, 3.0];
        assert!(rmse(&obs, &model).unwrap() + 1e-12 >= urmse(&obs, &model).unwrap());
    }
}
