//! CSV series reader for observations and model results.

use std::path::{Path, PathBuf};

use hydroskill_match::{ModelResult, Observation, Position, TimeSeries};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::SeriesData;
use crate::time::{parse_coordinate, parse_timestamp, parse_value};

/// Reads one time series from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column names are matched case-insensitively
/// - `time,value` for point observations and model results
/// - `time,x,y,value` for tracks (column order is free)
/// - Timestamps are RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC
/// - Empty or `NaN` value cells are gaps
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | No `time` or `value` column, or only one of `x`/`y` |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InvalidTimestamp`] | Unparseable timestamp |
/// | [`IoError::InvalidValue`] | Unparseable or infinite value, or bad coordinate |
/// | [`IoError::Series`] | Timestamps not strictly increasing, or bad name |
pub struct SeriesReader {
    path: PathBuf,
}

impl SeriesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning its raw columns.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<SeriesData, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength fire instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));
        let time_col = find("time").ok_or_else(|| self.missing("time"))?;
        let value_col = find("value").ok_or_else(|| self.missing("value"))?;
        let xy_cols = match (find("x"), find("y")) {
            (Some(x), Some(y)) => Some((x, y)),
            (None, None) => None,
            (Some(_), None) => return Err(self.missing("y")),
            (None, Some(_)) => return Err(self.missing("x")),
        };
        debug!(n_columns = header.len(), has_positions = xy_cols.is_some(), "read CSV header");

        let mut times = Vec::new();
        let mut values = Vec::new();
        let mut positions = xy_cols.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != header.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: header.len(),
                    got: record.len(),
                });
            }

            let raw_time = record.get(time_col).unwrap_or("");
            let time = parse_timestamp(raw_time).ok_or_else(|| IoError::InvalidTimestamp {
                path: self.path.clone(),
                row_index,
                raw: raw_time.to_string(),
            })?;
            let raw_value = record.get(value_col).unwrap_or("");
            let value = parse_value(raw_value)
                .ok_or_else(|| self.invalid(row_index, &header[value_col], raw_value))?;

            if let (Some((x_col, y_col)), Some(positions)) = (xy_cols, positions.as_mut()) {
                let coordinate = |col: usize| {
                    let raw = record.get(col).unwrap_or("");
                    parse_coordinate(raw).ok_or_else(|| self.invalid(row_index, &header[col], raw))
                };
                positions.push(Position::new(coordinate(x_col)?, coordinate(y_col)?));
            }
            times.push(time);
            values.push(value);
        }

        if times.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_rows = times.len(), "series loaded");
        Ok(SeriesData { times, values, positions })
    }

    /// Read the file as a fixed-point observation at `position`.
    ///
    /// # Errors
    ///
    /// As [`SeriesReader::read`]; also [`IoError::Series`] for an empty name
    /// or non-finite position.
    pub fn read_point_observation(
        &self,
        name: &str,
        position: Position,
    ) -> Result<Observation, IoError> {
        let data = self.read()?;
        let series = self.series(data.times, data.values)?;
        Observation::point(name, series, position).map_err(|e| self.series_error(e))
    }

    /// Read the file as a track observation using its `x`/`y` columns.
    ///
    /// # Errors
    ///
    /// As [`SeriesReader::read`]; also [`IoError::MissingColumn`] when the
    /// file has no `x`/`y` columns.
    pub fn read_track_observation(&self, name: &str) -> Result<Observation, IoError> {
        let data = self.read()?;
        let positions = data.positions.ok_or_else(|| self.missing("x"))?;
        let series = self.series(data.times, data.values)?;
        Observation::track(name, series, positions).map_err(|e| self.series_error(e))
    }

    /// Read the file as a model result. Position columns, if any, are ignored.
    ///
    /// # Errors
    ///
    /// As [`SeriesReader::read`]; also [`IoError::Series`] for an empty name.
    pub fn read_model(&self, name: &str) -> Result<ModelResult, IoError> {
        let data = self.read()?;
        let series = self.series(data.times, data.values)?;
        ModelResult::new(name, series).map_err(|e| self.series_error(e))
    }

    fn series(
        &self,
        times: Vec<chrono::DateTime<chrono::Utc>>,
        values: Vec<f64>,
    ) -> Result<TimeSeries, IoError> {
        TimeSeries::new(times, values).map_err(|e| self.series_error(e))
    }

    fn series_error(&self, source: hydroskill_match::MatchError) -> IoError {
        IoError::Series {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn missing(&self, column: &'static str) -> IoError {
        IoError::MissingColumn {
            path: self.path.clone(),
            column,
        }
    }

    fn invalid(&self, row_index: usize, column: &str, raw: &str) -> IoError {
        IoError::InvalidValue {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use hydroskill_match::{Geometry, MatchError};
    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_point_series_with_gaps() {
        let f = write_csv("time,value\n2017-01-01 00:00:00,1.0\n2017-01-01 01:00:00,\n2017-01-01 02:00:00,NaN\n2017-01-01 03:00:00,4.0\n");
        let data = SeriesReader::new(f.path()).read().unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.values[0], 1.0);
        assert!(data.values[1].is_nan());
        assert!(data.values[2].is_nan());
        assert!(data.positions.is_none());
    }

    #[test]
    fn header_is_case_insensitive_and_order_free() {
        let f = write_csv("Value,TIME\n2.5,2017-01-01T00:00:00Z\n");
        let data = SeriesReader::new(f.path()).read().unwrap();
        assert_eq!(data.values, vec![2.5]);
    }

    #[test]
    fn reads_track_positions() {
        let f = write_csv("time,x,y,value\n2017-01-01T00:00:00Z,1.0,50.0,0.4\n2017-01-01T00:00:10Z,1.5,50.5,0.6\n");
        let obs = SeriesReader::new(f.path()).read_track_observation("c2").unwrap();
        match obs.geometry() {
            Geometry::Track(positions) => {
                assert_eq!(positions.len(), 2);
                assert_eq!(positions[1], Position::new(1.5, 50.5));
            }
            other => panic!("expected track, got {other:?}"),
        }
    }

    #[test]
    fn track_requires_positions() {
        let f = write_csv("time,value\n2017-01-01T00:00:00Z,0.4\n");
        let err = SeriesReader::new(f.path()).read_track_observation("c2").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "x", .. }));
    }

    #[test]
    fn lone_coordinate_column_rejected() {
        let f = write_csv("time,x,value\n2017-01-01T00:00:00Z,1.0,0.4\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "y", .. }));
    }

    #[test]
    fn missing_value_column() {
        let f = write_csv("time,level\n2017-01-01T00:00:00Z,0.4\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "value", .. }));
    }

    #[test]
    fn file_not_found() {
        let err = SeriesReader::new(Path::new("/nonexistent/station.csv")).read().unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn empty_dataset() {
        let f = write_csv("time,value\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn inconsistent_row_length() {
        let f = write_csv("time,value\n2017-01-01T00:00:00Z,1.0,9\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength { row_index: 0, expected: 2, got: 3, .. }
        ));
    }

    #[test]
    fn invalid_timestamp_reports_row() {
        let f = write_csv("time,value\n2017-01-01T00:00:00Z,1.0\nnoon,2.0\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidTimestamp { row_index: 1, ref raw, .. } if raw == "noon"));
    }

    #[test]
    fn infinite_value_rejected() {
        let f = write_csv("time,value\n2017-01-01T00:00:00Z,inf\n");
        let err = SeriesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidValue { row_index: 0, .. }));
    }

    #[test]
    fn unordered_timestamps_rejected_as_series() {
        let f = write_csv("time,value\n2017-01-01T01:00:00Z,1.0\n2017-01-01T00:00:00Z,2.0\n");
        let err = SeriesReader::new(f.path()).read_model("SW_1").unwrap_err();
        assert!(matches!(
            err,
            IoError::Series { source: MatchError::NonIncreasingTime { index: 1, .. }, .. }
        ));
    }
}
