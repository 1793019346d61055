//! Group-then-score and score-then-average engines.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hydroskill_metrics::{Metric, MetricError};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::comparer::Comparer;
use crate::grid::ResolvedGrid;
use crate::group::{GroupBy, KeyValue};
use crate::skill::{SkillRow, SkillTable};

/// One component of a group key. Names are stored as ordinals (first-seen
/// order) so groups sort in observation and model order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Ordinal(usize),
    Time(DateTime<Utc>),
    Cell(i64, i64),
}

#[derive(Default)]
struct Group {
    obs: Vec<f64>,
    model: Vec<f64>,
}

/// Model names across `comparers` in first-seen order.
pub(crate) fn model_registry(comparers: &[&Comparer]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cmp in comparers {
        for name in cmp.model_names() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

fn extent(comparers: &[&Comparer]) -> Option<[f64; 4]> {
    comparers
        .iter()
        .flat_map(|cmp| (0..cmp.n_points()).map(|row| cmp.data().position(row)))
        .fold(None, |acc, p| {
            Some(match acc {
                None => [p.x, p.y, p.x, p.y],
                Some([x0, y0, x1, y1]) => [x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)],
            })
        })
}

fn score_group(metrics: &[Metric], group: &Group) -> (usize, Vec<(Metric, Result<f64, MetricError>)>) {
    let scores = metrics
        .iter()
        .map(|&m| (m, m.compute(&group.obs, &group.model)))
        .collect();
    (group.obs.len(), scores)
}

/// Pool the paired values of `comparers` per group key, then score each group.
///
/// Groups are ordered by key: observations and models in first-seen order,
/// time bins chronologically, cells by `(ix, iy)`. Without time or space
/// dimensions every observation/model combination present gets a row, even
/// with zero pairs.
#[instrument(skip_all, fields(n_comparers = comparers.len(), n_metrics = metrics.len()))]
pub(crate) fn pooled(comparers: &[&Comparer], metrics: &[Metric], by: &[GroupBy]) -> SkillTable {
    let models = model_registry(comparers);
    let bounds = extent(comparers);
    let grids: Vec<Option<ResolvedGrid>> = by
        .iter()
        .map(|g| match g {
            GroupBy::Space(spec) => Some(spec.resolve(bounds)),
            _ => None,
        })
        .collect();
    let n_min = by
        .iter()
        .filter_map(|g| match g {
            GroupBy::Space(spec) => Some(spec.n_min()),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let seed_empty = by
        .iter()
        .all(|g| matches!(g, GroupBy::Observation | GroupBy::Model));

    let mut groups: BTreeMap<Vec<KeyPart>, Group> = BTreeMap::new();
    for (ci, cmp) in comparers.iter().enumerate() {
        let data = cmp.data();
        for (local, name) in cmp.model_names().iter().enumerate() {
            let mi = models.iter().position(|m| m == name).unwrap_or(0);
            let key_for = |row: usize| -> Vec<KeyPart> {
                by.iter()
                    .zip(&grids)
                    .map(|(g, grid)| match g {
                        GroupBy::Observation => KeyPart::Ordinal(ci),
                        GroupBy::Model => KeyPart::Ordinal(mi),
                        GroupBy::Time(bin) => KeyPart::Time(bin.floor(data.times()[row])),
                        GroupBy::Space(_) => {
                            let (ix, iy) = grid
                                .as_ref()
                                .map_or((0, 0), |g| g.cell(data.position(row)));
                            KeyPart::Cell(ix, iy)
                        }
                    })
                    .collect()
            };
            if seed_empty {
                groups.entry(key_for(0)).or_default();
            }
            for (row, value) in data.model_column(local).iter().enumerate() {
                if let Some(m) = value {
                    let group = groups.entry(key_for(row)).or_default();
                    group.obs.push(data.observed()[row]);
                    group.model.push(*m);
                }
            }
        }
    }

    let before = groups.len();
    let groups: Vec<(Vec<KeyPart>, Group)> = groups
        .into_iter()
        .filter(|(_, g)| g.obs.len() >= n_min)
        .collect();
    debug!(n_groups = groups.len(), n_omitted = before - groups.len(), "grouped");

    let rows: Vec<SkillRow> = groups
        .par_iter()
        .map(|(key, group)| {
            let (n, scores) = score_group(metrics, group);
            SkillRow {
                key: key
                    .iter()
                    .zip(by.iter().zip(&grids))
                    .map(|(part, (g, grid))| match (part, g) {
                        (KeyPart::Ordinal(i), GroupBy::Observation) => {
                            KeyValue::Text(comparers[*i].name().to_string())
                        }
                        (KeyPart::Ordinal(i), _) => KeyValue::Text(models[*i].clone()),
                        (KeyPart::Time(t), _) => KeyValue::Time(*t),
                        (KeyPart::Cell(ix, iy), _) => {
                            let (x, y) = grid.as_ref().map_or((0.0, 0.0), |g| g.centre(*ix, *iy));
                            KeyValue::Cell { x, y }
                        }
                    })
                    .collect(),
                n,
                scores,
            }
        })
        .collect();

    SkillTable {
        key_names: by.iter().map(GroupBy::key_name).collect(),
        metrics: metrics.to_vec(),
        rows,
    }
}

/// Score every observation/model pair separately, then average per model
/// using observation weights.
///
/// Per metric, only observations with a value contribute. If none do, the
/// cell carries the first observation's error. `n` is the sum of the
/// contributing pair counts.
#[instrument(skip_all, fields(n_comparers = comparers.len(), n_metrics = metrics.len()))]
pub(crate) fn weighted_mean(comparers: &[&Comparer], metrics: &[Metric]) -> SkillTable {
    let models = model_registry(comparers);

    let rows: Vec<SkillRow> = models
        .par_iter()
        .map(|model| {
            let per_obs: Vec<(f64, usize, Vec<(Metric, Result<f64, MetricError>)>)> = comparers
                .iter()
                .filter_map(|cmp| {
                    let index = cmp.data().model_index(model)?;
                    let (obs, modelled) = cmp.data().pairs(index);
                    let (n, scores) = score_group(metrics, &Group { obs, model: modelled });
                    Some((cmp.weight(), n, scores))
                })
                .collect();

            let n = per_obs.iter().map(|(_, n, _)| n).sum();
            let scores = metrics
                .iter()
                .enumerate()
                .map(|(k, &metric)| {
                    let mut total_weight = 0.0;
                    let mut weighted_sum = 0.0;
                    let mut first_err = None;
                    for (weight, _, scores) in &per_obs {
                        match &scores[k].1 {
                            Ok(v) => {
                                total_weight += weight;
                                weighted_sum += weight * v;
                            }
                            Err(e) if first_err.is_none() => first_err = Some(e.clone()),
                            Err(_) => {}
                        }
                    }
                    let cell = if total_weight > 0.0 {
                        Ok(weighted_sum / total_weight)
                    } else {
                        Err(first_err.unwrap_or(MetricError::Undefined {
                            metric: metric.name(),
                            reason: "every contributing observation has zero weight",
                        }))
                    };
                    (metric, cell)
                })
                .collect();

            SkillRow {
                key: vec![KeyValue::Text(model.clone())],
                n,
                scores,
            }
        })
        .collect();

    SkillTable {
        key_names: vec![GroupBy::Model.key_name()],
        metrics: metrics.to_vec(),
        rows,
    }
}
