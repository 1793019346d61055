//! Grouping dimensions for skill tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::error::CompareError;
use crate::grid::GridSpec;

/// Calendar or fixed-width time bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBin {
    /// Whole hours.
    Hour,
    /// Whole days (UTC).
    Day,
    /// Calendar months.
    Month,
    /// Calendar years.
    Year,
    /// Fixed-width bins anchored at the Unix epoch. Widths below one second
    /// are treated as one second.
    Every(TimeDelta),
}

impl TimeBin {
    /// Return the start of the bin containing `t`.
    #[must_use]
    pub fn floor(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeBin::Hour => floor_to(t, 3_600),
            TimeBin::Day => floor_to(t, 86_400),
            TimeBin::Month => month_start(t.year(), t.month()).unwrap_or(t),
            TimeBin::Year => month_start(t.year(), 1).unwrap_or(t),
            TimeBin::Every(step) => floor_to(t, step.num_seconds().max(1)),
        }
    }
}

fn floor_to(t: DateTime<Utc>, step_secs: i64) -> DateTime<Utc> {
    let secs = t.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(step_secs), 0).unwrap_or(t)
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Some(NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?.and_utc())
}

/// A dimension to group skill rows by.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupBy {
    /// One group per observation.
    Observation,
    /// One group per model.
    Model,
    /// One group per time bin.
    Time(TimeBin),
    /// One group per occupied grid cell.
    Space(GridSpec),
}

impl GroupBy {
    /// Return the key column name.
    #[must_use]
    pub fn key_name(&self) -> &'static str {
        match self {
            GroupBy::Observation => "observation",
            GroupBy::Model => "model",
            GroupBy::Time(_) => "time",
            GroupBy::Space(_) => "cell",
        }
    }
}

impl FromStr for GroupBy {
    type Err = CompareError;

    /// Parse `observation`, `model`, or `freq:<unit>` where unit is one of
    /// `H`, `D`, `M`, `Y` or a width such as `6h`, `30m`, `90s`, `2d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompareError::InvalidGroupBy {
            spec: s.to_string(),
        };
        match s.trim() {
            "observation" | "obs" => return Ok(GroupBy::Observation),
            "model" | "mod" => return Ok(GroupBy::Model),
            _ => {}
        }
        let freq = s.trim().strip_prefix("freq:").ok_or_else(invalid)?;
        let bin = match freq {
            "H" | "h" => TimeBin::Hour,
            "D" | "d" => TimeBin::Day,
            "M" => TimeBin::Month,
            "Y" | "y" => TimeBin::Year,
            width => {
                let (split, _) = width.char_indices().last().ok_or_else(invalid)?;
                let (count, unit) = width.split_at(split);
                let count: i64 = count.parse().map_err(|_| invalid())?;
                if count <= 0 {
                    return Err(invalid());
                }
                let step = match unit {
                    "s" => TimeDelta::seconds(count),
                    "m" => TimeDelta::minutes(count),
                    "h" => TimeDelta::hours(count),
                    "d" => TimeDelta::days(count),
                    _ => return Err(invalid()),
                };
                TimeBin::Every(step)
            }
        };
        Ok(GroupBy::Time(bin))
    }
}

/// The value of one key column in a skill row.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// An observation or model name.
    Text(String),
    /// Start of a time bin.
    Time(DateTime<Utc>),
    /// Centre of a grid cell.
    Cell {
        /// Cell centre x.
        x: f64,
        /// Cell centre y.
        y: f64,
    },
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            KeyValue::Cell { x, y } => write!(f, "({x:.4}, {y:.4})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn day_and_month_floors() {
        let t = Utc.with_ymd_and_hms(2017, 10, 28, 17, 45, 12).unwrap();
        assert_eq!(TimeBin::Day.floor(t), Utc.with_ymd_and_hms(2017, 10, 28, 0, 0, 0).unwrap());
        assert_eq!(TimeBin::Month.floor(t), Utc.with_ymd_and_hms(2017, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(TimeBin::Year.floor(t), Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(TimeBin::Hour.floor(t), Utc.with_ymd_and_hms(2017, 10, 28, 17, 0, 0).unwrap());
    }

    #[test]
    fn fixed_width_floor() {
        let t = Utc.with_ymd_and_hms(2017, 10, 28, 17, 45, 12).unwrap();
        let bin = TimeBin::Every(TimeDelta::hours(6));
        assert_eq!(bin.floor(t), Utc.with_ymd_and_hms(2017, 10, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn parse_group_specs() {
        assert_eq!("observation".parse::<GroupBy>().unwrap(), GroupBy::Observation);
        assert_eq!("model".parse::<GroupBy>().unwrap(), GroupBy::Model);
        assert_eq!("freq:D".parse::<GroupBy>().unwrap(), GroupBy::Time(TimeBin::Day));
        assert_eq!("freq:M".parse::<GroupBy>().unwrap(), GroupBy::Time(TimeBin::Month));
        assert_eq!(
            "freq:30m".parse::<GroupBy>().unwrap(),
            GroupBy::Time(TimeBin::Every(TimeDelta::minutes(30)))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        for spec in ["station", "freq:", "freq:0h", "freq:3w", "freq:xh"] {
            assert!(
                matches!(spec.parse::<GroupBy>(), Err(CompareError::InvalidGroupBy { .. })),
                "{spec} should be rejected"
            );
        }
    }
}
