//! Skill tables: metric values per group.

use std::cmp::Ordering;
use std::fmt;

use hydroskill_metrics::{Metric, MetricError};

use crate::group::KeyValue;

/// One group's scores.
///
/// Each metric cell is either a value or the reason the metric could not be
/// computed for this group (too few pairs, or mathematically undefined).
#[derive(Debug, Clone, PartialEq)]
pub struct SkillRow {
    pub(crate) key: Vec<KeyValue>,
    pub(crate) n: usize,
    pub(crate) scores: Vec<(Metric, Result<f64, MetricError>)>,
}

impl SkillRow {
    /// Return the key values, one per key column.
    #[must_use]
    pub fn key(&self) -> &[KeyValue] {
        &self.key
    }

    /// Return the number of paired values in the group.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Return every metric cell in column order.
    #[must_use]
    pub fn scores(&self) -> &[(Metric, Result<f64, MetricError>)] {
        &self.scores
    }

    /// Return the cell for `metric`, if the table has that column.
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<&Result<f64, MetricError>> {
        self.scores.iter().find(|(m, _)| *m == metric).map(|(_, r)| r)
    }

    /// Return the value of `metric`, or `None` if absent or not computable.
    #[must_use]
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.get(metric).and_then(|r| r.as_ref().ok().copied())
    }

    /// Return the value of `metric`, with NaN for cells that could not be computed.
    #[must_use]
    pub fn value_or_nan(&self, metric: Metric) -> f64 {
        self.value(metric).unwrap_or(f64::NAN)
    }
}

/// Metric values for a set of groups.
///
/// Rows are groups, identified by one value per key column. Columns are `n`
/// followed by the requested metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTable {
    pub(crate) key_names: Vec<&'static str>,
    pub(crate) metrics: Vec<Metric>,
    pub(crate) rows: Vec<SkillRow>,
}

impl SkillTable {
    /// Return the key column names.
    #[must_use]
    pub fn key_names(&self) -> &[&'static str] {
        &self.key_names
    }

    /// Return the metric columns.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Return the rows.
    #[must_use]
    pub fn rows(&self) -> &[SkillRow] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the row whose key renders as `labels`, e.g. `["HKNA", "SW_1"]`.
    #[must_use]
    pub fn find(&self, labels: &[&str]) -> Option<&SkillRow> {
        self.rows.iter().find(|row| {
            row.key.len() == labels.len()
                && row.key.iter().zip(labels).all(|(k, l)| k.to_string() == *l)
        })
    }

    /// Return the `metric` cell of the row whose key renders as `labels`.
    #[must_use]
    pub fn get(&self, metric: Metric, labels: &[&str]) -> Option<&Result<f64, MetricError>> {
        self.find(labels).and_then(|row| row.get(metric))
    }

    /// Return a copy sorted ascending by `metric`. Cells without a value sort last.
    #[must_use]
    pub fn sort_by(&self, metric: Metric) -> SkillTable {
        self.sorted(metric, false)
    }

    /// Return a copy sorted descending by `metric`. Cells without a value sort last.
    #[must_use]
    pub fn sort_by_desc(&self, metric: Metric) -> SkillTable {
        self.sorted(metric, true)
    }

    fn sorted(&self, metric: Metric, descending: bool) -> SkillTable {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| match (a.value(metric), b.value(metric)) {
            (Some(x), Some(y)) if descending => y.total_cmp(&x),
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        SkillTable {
            key_names: self.key_names.clone(),
            metrics: self.metrics.clone(),
            rows,
        }
    }

    /// Return a copy with every value rounded to `decimals` places.
    #[must_use]
    pub fn round(&self, decimals: u32) -> SkillTable {
        let scale = 10f64.powi(decimals as i32);
        let rows = self
            .rows
            .iter()
            .map(|row| SkillRow {
                key: row.key.clone(),
                n: row.n,
                scores: row
                    .scores
                    .iter()
                    .map(|(m, r)| (*m, r.clone().map(|v| (v * scale).round() / scale)))
                    .collect(),
            })
            .collect();
        SkillTable {
            key_names: self.key_names.clone(),
            metrics: self.metrics.clone(),
            rows,
        }
    }
}

impl fmt::Display for SkillTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header: Vec<String> = self.key_names.iter().map(|k| k.to_string()).collect();
        header.push("n".to_string());
        header.extend(self.metrics.iter().map(|m| m.to_string()));

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.key.iter().map(|k| k.to_string()).collect();
                cells.push(row.n.to_string());
                cells.extend(row.scores.iter().map(|(_, r)| match r {
                    Ok(v) => format!("{v:.6}"),
                    Err(_) => "NaN".to_string(),
                }));
                cells
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|c| {
                body.iter()
                    .map(|cells| cells[c].len())
                    .chain(std::iter::once(header[c].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let n_keys = self.key_names.len();
        for cells in std::iter::once(&header).chain(&body) {
            let line: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    if c < n_keys {
                        format!("{cell:<w$}", w = widths[c])
                    } else {
                        format!("{cell:>w$}", w = widths[c])
                    }
                })
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}
