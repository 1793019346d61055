//! JSON skill-table writer and matched-data CSV writer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use hydroskill_compare::{Comparer, KeyValue, SkillTable};
use hydroskill_match::Geometry;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{RunName, file_stem};

/// Writes skill tables to JSON and matched data to CSV.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{run}_skill.json`, `{run}_mean_skill.json`,
/// `{run}_gridded.json` and `{run}_{observation}_matched.csv`.
pub struct ResultWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Write a pooled skill table to `{run}_skill.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    pub fn write_skill(&self, table: &SkillTable) -> Result<PathBuf, IoError> {
        self.write_table("skill", table)
    }

    /// Write a weighted mean skill table to `{run}_mean_skill.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    pub fn write_mean_skill(&self, table: &SkillTable) -> Result<PathBuf, IoError> {
        self.write_table("mean_skill", table)
    }

    /// Write a gridded skill table to `{run}_gridded.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    pub fn write_gridded(&self, table: &SkillTable) -> Result<PathBuf, IoError> {
        self.write_table("gridded", table)
    }

    #[instrument(skip(self, table), fields(n_rows = table.len()))]
    fn write_table(&self, kind: &'static str, table: &SkillTable) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.run.as_str()));

        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut scores = BTreeMap::new();
                let mut undefined = BTreeMap::new();
                for (metric, cell) in row.scores() {
                    match cell {
                        Ok(v) => {
                            scores.insert(metric.name(), Some(*v));
                        }
                        Err(e) => {
                            scores.insert(metric.name(), None);
                            undefined.insert(metric.name(), e.to_string());
                        }
                    }
                }
                RowArtifact {
                    key: row.key().iter().map(KeyArtifact::from).collect(),
                    n: row.n(),
                    scores,
                    undefined,
                }
            })
            .collect();

        let artifact = TableArtifact {
            run: self.run.as_str(),
            kind,
            key_names: table.key_names(),
            metrics: table.metrics().iter().map(|m| m.name()).collect(),
            rows,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            what: kind,
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "skill table written");
        Ok(path)
    }

    /// Write a comparer's matched rows to `{run}_{observation}_matched.csv`.
    ///
    /// Columns are `time`, then `x,y` for tracks, then `observation` and one
    /// column per model. Missing model values are empty cells. The file reads
    /// back with [`MatchedReader`](crate::MatchedReader).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::WriteFile`] | The file cannot be created |
    /// | [`IoError::CsvWrite`] | A record cannot be written |
    #[instrument(skip_all, fields(observation = comparer.name()))]
    pub fn write_matched(&self, comparer: &Comparer) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(format!(
            "{}_{}_matched.csv",
            self.run.as_str(),
            file_stem(comparer.name())
        ));
        let csv_error = |source: csv::Error| IoError::CsvWrite {
            path: path.clone(),
            source,
        };

        let file = fs::File::create(&path).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        let mut wtr = csv::Writer::from_writer(file);

        let is_track = matches!(comparer.geometry(), Geometry::Track(_));
        let mut header = vec!["time".to_string()];
        if is_track {
            header.extend(["x".to_string(), "y".to_string()]);
        }
        header.push("observation".to_string());
        header.extend(comparer.model_names().iter().cloned());
        wtr.write_record(&header).map_err(csv_error)?;

        let data = comparer.data();
        for row in 0..comparer.n_points() {
            let mut record = vec![
                comparer.times()[row].to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ];
            if is_track {
                let p = data.position(row);
                record.extend([p.x.to_string(), p.y.to_string()]);
            }
            record.push(comparer.observed()[row].to_string());
            record.extend(
                (0..comparer.n_models())
                    .map(|m| data.model_column(m)[row].map_or_else(String::new, |v| v.to_string())),
            );
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_rows = comparer.n_points(), "matched data written");
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Serialization artifacts (private)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TableArtifact<'a> {
    run: &'a str,
    kind: &'static str,
    key_names: &'a [&'static str],
    metrics: Vec<&'static str>,
    rows: Vec<RowArtifact>,
}

#[derive(Serialize)]
struct RowArtifact {
    key: Vec<KeyArtifact>,
    n: usize,
    /// `null` where the metric has no value.
    scores: BTreeMap<&'static str, Option<f64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    undefined: BTreeMap<&'static str, String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum KeyArtifact {
    Text(String),
    Cell { x: f64, y: f64 },
}

impl From<&KeyValue> for KeyArtifact {
    fn from(value: &KeyValue) -> Self {
        match value {
            KeyValue::Text(s) => KeyArtifact::Text(s.clone()),
            KeyValue::Time(t) => KeyArtifact::Text(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            KeyValue::Cell { x, y } => KeyArtifact::Cell { x: *x, y: *y },
        }
    }
}
