//! Reader for already matched observation/model tables.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hydroskill_compare::Comparer;
use hydroskill_match::{Geometry, Position};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::time::{parse_coordinate, parse_timestamp, parse_value};

const RESERVED: [&str; 4] = ["time", "x", "y", "observation"];

/// Reads a matched table, as written by
/// [`ResultWriter::write_matched`](crate::ResultWriter::write_matched),
/// into a [`Comparer`].
///
/// Expected CSV format:
/// - `time,observation,<model>...` for point observations
/// - `time,x,y,observation,<model>...` for tracks
/// - Every column other than `time`, `x`, `y` and `observation` is a model
/// - Empty model cells mean the model had no value at that time
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | No `time`/`observation` column, no model column, or no `x`/`y` for a track |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InvalidTimestamp`] | Unparseable timestamp |
/// | [`IoError::InvalidValue`] | Unparseable or infinite cell |
/// | [`IoError::Matched`] | Rows do not form valid matched data |
pub struct MatchedReader {
    path: PathBuf,
}

struct Table {
    times: Vec<DateTime<Utc>>,
    observed: Vec<f64>,
    positions: Option<Vec<Position>>,
    models: Vec<(String, Vec<Option<f64>>)>,
}

impl MatchedReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read a point comparer located at `position`.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_point(&self, name: &str, position: Position) -> Result<Comparer, IoError> {
        let table = self.read_table()?;
        self.build(name, table.times, table.observed, Geometry::Point(position), table.models)
    }

    /// Read a track comparer using the `x`/`y` columns.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_track(&self, name: &str) -> Result<Comparer, IoError> {
        let table = self.read_table()?;
        let positions = table.positions.ok_or_else(|| self.missing("x"))?;
        self.build(name, table.times, table.observed, Geometry::Track(positions), table.models)
    }

    fn build(
        &self,
        name: &str,
        times: Vec<DateTime<Utc>>,
        observed: Vec<f64>,
        geometry: Geometry,
        models: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Comparer, IoError> {
        let comparer = Comparer::from_matched(name, times, observed, geometry, models).map_err(
            |source| IoError::Matched {
                path: self.path.clone(),
                source,
            },
        )?;
        info!(
            n_points = comparer.n_points(),
            n_models = comparer.n_models(),
            "matched data loaded"
        );
        Ok(comparer)
    }

    fn read_table(&self) -> Result<Table, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));
        let time_col = find("time").ok_or_else(|| self.missing("time"))?;
        let obs_col = find("observation").ok_or_else(|| self.missing("observation"))?;
        let xy_cols = find("x").zip(find("y"));
        let model_cols: Vec<usize> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !RESERVED.iter().any(|r| h.eq_ignore_ascii_case(r)))
            .map(|(i, _)| i)
            .collect();
        if model_cols.is_empty() {
            return Err(self.missing("model"));
        }
        debug!(n_models = model_cols.len(), has_positions = xy_cols.is_some(), "read CSV header");

        let mut table = Table {
            times: Vec::new(),
            observed: Vec::new(),
            positions: xy_cols.map(|_| Vec::new()),
            models: model_cols
                .iter()
                .map(|&c| (header[c].to_string(), Vec::new()))
                .collect(),
        };

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
            let cell = |col: usize| record.get(col).unwrap_or("");
            let invalid = |col: usize| IoError::InvalidValue {
                path: self.path.clone(),
                row_index,
                column: header[col].to_string(),
                raw: cell(col).to_string(),
            };

            let time = parse_timestamp(cell(time_col)).ok_or_else(|| IoError::InvalidTimestamp {
                path: self.path.clone(),
                row_index,
                raw: cell(time_col).to_string(),
            })?;
            let observed = parse_value(cell(obs_col)).ok_or_else(|| invalid(obs_col))?;
            if let (Some((x_col, y_col)), Some(positions)) = (xy_cols, table.positions.as_mut()) {
                let x = parse_coordinate(cell(x_col)).ok_or_else(|| invalid(x_col))?;
                let y = parse_coordinate(cell(y_col)).ok_or_else(|| invalid(y_col))?;
                positions.push(Position::new(x, y));
            }
            for (&col, (_, values)) in model_cols.iter().zip(table.models.iter_mut()) {
                let value = parse_value(cell(col)).ok_or_else(|| invalid(col))?;
                values.push((!value.is_nan()).then_some(value));
            }
            table.times.push(time);
            table.observed.push(observed);
        }

        if table.times.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        Ok(table)
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
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use hydroskill_compare::CompareError;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_point_table_with_missing_model_cells() {
        let f = write_csv(
            "time,observation,SW_1,SW_2\n\
             2017-01-01T00:00:00Z,1.0,1.1,\n\
             2017-01-01T01:00:00Z,2.0,2.2,1.9\n\
             2017-01-01T02:00:00Z,3.0,,\n",
        );
        let cmp = MatchedReader::new(f.path())
            .read_point("HKNA", Position::new(4.2, 52.7))
            .unwrap();
        // The last row has no model value and is dropped.
        assert_eq!(cmp.n_points(), 2);
        assert_eq!(cmp.model_names(), ["SW_1".to_string(), "SW_2".to_string()]);
        assert_eq!(cmp.model_values("SW_2").unwrap(), [None, Some(1.9)]);
    }

    #[test]
    fn reads_track_table() {
        let f = write_csv(
            "time,x,y,observation,SW_1\n\
             2017-01-01T00:00:00Z,1.0,50.0,0.4,0.5\n\
             2017-01-01T00:00:10Z,1.1,50.1,0.6,0.5\n",
        );
        let cmp = MatchedReader::new(f.path()).read_track("c2").unwrap();
        assert_eq!(cmp.positions()[1], Position::new(1.1, 50.1));
    }

    #[test]
    fn no_model_columns() {
        let f = write_csv("time,observation\n2017-01-01T00:00:00Z,1.0\n");
        let err = MatchedReader::new(f.path())
            .read_point("HKNA", Position::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "model", .. }));
    }

    #[test]
    fn unordered_rows_rejected() {
        let f = write_csv(
            "time,observation,SW_1\n\
             2017-01-01T01:00:00Z,1.0,1.0\n\
             2017-01-01T00:00:00Z,2.0,2.0\n",
        );
        let err = MatchedReader::new(f.path())
            .read_point("HKNA", Position::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, IoError::Matched { source: CompareError::Match(_), .. }));
    }
}
