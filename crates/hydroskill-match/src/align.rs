//! Per-model time matching onto observation timestamps.

use chrono::{DateTime, TimeDelta, Utc};

use crate::series::TimeSeries;

/// Nearest non-gap sample on either side of every model index.
///
/// Built once per model series so that matching stays linear in the number of
/// targets even across long runs of gap values.
struct ValidNeighbours {
    /// `before[i]`: last non-gap index strictly before `i`.
    before: Vec<Option<usize>>,
    /// `from[i]`: first non-gap index at or after `i`; `from[len]` is `None`.
    from: Vec<Option<usize>>,
}

impl ValidNeighbours {
    fn new(values: &[f64]) -> Self {
        let mut before = Vec::with_capacity(values.len() + 1);
        let mut last = None;
        for (j, v) in values.iter().enumerate() {
            before.push(last);
            if !v.is_nan() {
                last = Some(j);
            }
        }
        before.push(last);

        let mut from = vec![None; values.len() + 1];
        for j in (0..values.len()).rev() {
            from[j] = if values[j].is_nan() { from[j + 1] } else { Some(j) };
        }
        Self { before, from }
    }

    fn before(&self, idx: usize) -> Option<usize> {
        self.before[idx]
    }

    fn at_or_after(&self, idx: usize) -> Option<usize> {
        self.from[idx]
    }
}

fn within(gap: TimeDelta, limit: Option<TimeDelta>) -> bool {
    limit.is_none_or(|limit| gap <= limit)
}

/// Match each of `targets` to the closest non-gap model sample within `tolerance`.
///
/// Ties go to the earlier sample. When `max_gap` is set, a target lying
/// strictly between two model samples further apart than `max_gap` is left
/// unmatched; exact timestamp hits are always kept.
pub(crate) fn nearest(
    targets: &[DateTime<Utc>],
    model: &TimeSeries,
    tolerance: TimeDelta,
    max_gap: Option<TimeDelta>,
) -> Vec<Option<f64>> {
    let times = model.times();
    let values = model.values();
    let valid = ValidNeighbours::new(values);

    targets
        .iter()
        .map(|&t| {
            let idx = times.partition_point(|m| *m < t);
            let before = valid.before(idx);
            let after = valid.at_or_after(idx);

            if let Some(a) = after
                && times[a] == t
            {
                return Some(values[a]);
            }
            if let (Some(b), Some(a)) = (before, after)
                && !within(times[a] - times[b], max_gap)
            {
                return None;
            }

            let before_dt = before.map(|b| t - times[b]).filter(|dt| *dt <= tolerance);
            let after_dt = after.map(|a| times[a] - t).filter(|dt| *dt <= tolerance);
            match (before_dt, after_dt) {
                (Some(db), Some(da)) if da < db => after.map(|a| values[a]),
                (Some(_), _) => before.map(|b| values[b]),
                (None, Some(_)) => after.map(|a| values[a]),
                (None, None) => None,
            }
        })
        .collect()
}

/// Linearly interpolate the model onto each of `targets`.
///
/// Only targets inside the model's span of non-gap samples are matched; there
/// is no extrapolation. Gaps (NaN) are bridged by the surrounding valid
/// samples unless they are further apart than `max_gap`. Directional values
/// (degrees) are interpolated along the shorter arc.
pub(crate) fn interpolate(
    targets: &[DateTime<Utc>],
    model: &TimeSeries,
    max_gap: Option<TimeDelta>,
    directional: bool,
) -> Vec<Option<f64>> {
    let times = model.times();
    let values = model.values();
    let valid = ValidNeighbours::new(values);

    targets
        .iter()
        .map(|&t| {
            let idx = times.partition_point(|m| *m < t);
            let a = valid.at_or_after(idx)?;
            if times[a] == t {
                return Some(values[a]);
            }
            let b = valid.before(idx)?;
            let span = times[a] - times[b];
            if !within(span, max_gap) {
                return None;
            }
            let frac = seconds(t - times[b]) / seconds(span);
            Some(lerp(values[b], values[a], frac, directional))
        })
        .collect()
}

/// Full-precision seconds; spans too long for nanoseconds fall back to milliseconds.
fn seconds(dt: TimeDelta) -> f64 {
    dt.num_nanoseconds()
        .map_or_else(|| dt.num_milliseconds() as f64 / 1e3, |ns| ns as f64 / 1e9)
}

/// Directional results lie in `[0, 360)`.
fn lerp(from: f64, to: f64, frac: f64, directional: bool) -> f64 {
    if !directional {
        return from + (to - from) * frac;
    }
    let diff = (to - from + 540.0).rem_euclid(360.0) - 180.0;
    let angle = (from + diff * frac).rem_euclid(360.0);
    // rem_euclid rounds tiny negative angles up to exactly 360.0
    if angle >= 360.0 { 0.0 } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn model(secs: &[i64], values: &[f64]) -> TimeSeries {
        TimeSeries::new(secs.iter().map(|&s| t(s)).collect(), values.to_vec()).unwrap()
    }

    #[test]
    fn nearest_exact_hit() {
        let m = model(&[0, 5, 10], &[1.0, 2.0, 3.0]);
        let got = nearest(&[t(5)], &m, TimeDelta::zero(), None);
        assert_eq!(got, vec![Some(2.0)]);
    }

    #[test]
    fn nearest_picks_closest_within_tolerance() {
        let m = model(&[0, 10], &[1.0, 2.0]);
        let got = nearest(&[t(3), t(8), t(5)], &m, TimeDelta::seconds(5), None);
        // 5 s is a tie: earlier sample wins
        assert_eq!(got, vec![Some(1.0), Some(2.0), Some(1.0)]);
    }

    #[test]
    fn nearest_outside_tolerance_unmatched() {
        let m = model(&[0, 10], &[1.0, 2.0]);
        let got = nearest(&[t(4), t(30)], &m, TimeDelta::seconds(2), None);
        assert_eq!(got, vec![None, None]);
    }

    #[test]
    fn nearest_skips_gap_values() {
        let m = model(&[0, 4, 10], &[1.0, f64::NAN, 3.0]);
        let got = nearest(&[t(4)], &m, TimeDelta::seconds(4), None);
        assert_eq!(got, vec![Some(1.0)]);
    }

    #[test]
    fn nearest_respects_max_gap() {
        let m = model(&[0, 100], &[1.0, 2.0]);
        let got = nearest(&[t(1), t(100)], &m, TimeDelta::seconds(5), Some(TimeDelta::seconds(10)));
        assert_eq!(got, vec![None, Some(2.0)]);
    }

    #[test]
    fn interpolate_linear_between_samples() {
        let m = model(&[0, 10], &[0.0, 10.0]);
        let got = interpolate(&[t(0), t(3), t(10)], &m, None, false);
        assert_eq!(got, vec![Some(0.0), Some(3.0), Some(10.0)]);
    }

    #[test]
    fn interpolate_never_extrapolates() {
        let m = model(&[10, 20], &[1.0, 2.0]);
        let got = interpolate(&[t(5), t(25)], &m, None, false);
        assert_eq!(got, vec![None, None]);
    }

    #[test]
    fn interpolate_bridges_gap_unless_too_wide() {
        let m = model(&[0, 10, 20], &[0.0, f64::NAN, 20.0]);
        assert_eq!(interpolate(&[t(10)], &m, None, false), vec![Some(10.0)]);
        let limited = interpolate(&[t(10)], &m, Some(TimeDelta::seconds(15)), false);
        assert_eq!(limited, vec![None]);
    }

    #[test]
    fn interpolate_directional_wraps() {
        let m = model(&[0, 10], &[350.0, 10.0]);
        let got = interpolate(&[t(5)], &m, None, true);
        let v = got[0].unwrap();
        assert!(v.abs() < 1e-9 || (v - 360.0).abs() < 1e-9, "direction was {v}");
    }

    #[test]
    fn interpolate_resolves_sub_millisecond_offsets() {
        let start = t(0);
        let m = TimeSeries::new(
            vec![start, start + TimeDelta::microseconds(800)],
            vec![0.0, 8.0],
        )
        .unwrap();
        let got = interpolate(&[start + TimeDelta::microseconds(400)], &m, None, false);
        let v = got[0].unwrap();
        assert!((v - 4.0).abs() < 1e-9, "interpolated {v}");
    }

    #[test]
    fn long_gap_runs_resolve_to_outer_valid_samples() {
        let n = 10_000;
        let secs: Vec<i64> = (0..n).collect();
        let mut values = vec![f64::NAN; n as usize];
        values[0] = 0.0;
        values[n as usize - 1] = (n - 1) as f64;
        let m = model(&secs, &values);
        let targets: Vec<_> = (0..n).step_by(1000).map(t).collect();

        let lin = interpolate(&targets, &m, None, false);
        for (target, got) in (0..n).step_by(1000).zip(&lin) {
            let v = got.unwrap();
            assert!((v - target as f64).abs() < 1e-6, "at {target}: {v}");
        }

        let near = nearest(&[t(1), t(n - 2), t(n / 2)], &m, TimeDelta::seconds(2), None);
        assert_eq!(near, vec![Some(0.0), Some((n - 1) as f64), None]);
    }

    #[test]
    fn directional_lerp_stays_below_full_circle() {
        let v = lerp(0.0, 359.0, 1e-17, true);
        assert!((0.0..360.0).contains(&v), "direction was {v}");
        assert_eq!(lerp(10.0, 350.0, 0.5, true), 0.0);
    }
}
