//! Timestamped series with validation guarantees.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::MatchError;

/// Owned, validated time series.
///
/// Guarantees:
/// - one value per timestamp
/// - timestamps strictly increasing (hence unique)
/// - every value is finite or NaN; NaN marks a gap in the record
///
/// An empty series is valid; it simply never overlaps anything.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a new series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MatchError::LengthMismatch`] | `times` and `values` differ in length |
    /// | [`MatchError::NonIncreasingTime`] | A timestamp is not after its predecessor |
    /// | [`MatchError::InfiniteValue`] | A value is infinite |
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, MatchError> {
        if times.len() != values.len() {
            return Err(MatchError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MatchError::NonIncreasingTime {
                index: i + 1,
                time: times[i + 1],
            });
        }
        if let Some(index) = values.iter().position(|v| v.is_infinite()) {
            return Err(MatchError::InfiniteValue { index });
        }
        Ok(Self { times, values })
    }

    /// Return the timestamps.
    #[must_use]
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Return the values, NaN marking gaps.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Return the number of timestamps, gaps included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Return true if the series has no timestamps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Return the number of non-gap values.
    #[must_use]
    pub fn n_valid(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// First timestamp, if any.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.times.first().copied()
    }

    /// Last timestamp, if any.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.times.last().copied()
    }

    /// Median spacing between consecutive timestamps.
    ///
    /// Returns `None` for series with fewer than two timestamps.
    #[must_use]
    pub fn typical_interval(&self) -> Option<TimeDelta> {
        let mut steps: Vec<TimeDelta> = self.times.windows(2).map(|w| w[1] - w[0]).collect();
        if steps.is_empty() {
            return None;
        }
        steps.sort_unstable();
        let mid = steps.len() / 2;
        if steps.len() % 2 == 1 {
            Some(steps[mid])
        } else {
            Some((steps[mid - 1] + steps[mid]) / 2)
        }
    }

    /// Iterate over `(time, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}
