use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use hydroskill_compare::{Comparer, ComparerCollection, GridSpec, GroupBy, SkillTable};
use hydroskill_io::{ResultWriter, RunName, SeriesReader};
use hydroskill_match::{MatchConfig, MatchPolicy, ModelResult, Observation, Position, Quantity};
use hydroskill_metrics::Metric;

#[derive(Parser)]
#[command(name = "hydroskill")]
#[command(about = "Skill assessment of model results against observations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Observation, model and matching inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct MatchArgs {
    /// Point observation as NAME=PATH@X,Y (repeatable)
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<PointArg>,

    /// Track observation as NAME=PATH, with x/y columns in the file (repeatable)
    #[arg(long = "track", value_parser = parse_track)]
    tracks: Vec<TrackArg>,

    /// Model result for one observation as OBS:MODEL=PATH (repeatable)
    #[arg(long = "model", value_parser = parse_model, required = true)]
    models: Vec<ModelArg>,

    /// Observation weight for mean skill as OBS=WEIGHT (repeatable)
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,

    /// Matching policy: "nearest" or "interpolate"
    #[arg(long, default_value = "nearest")]
    policy: MatchPolicy,

    /// Nearest-match tolerance in seconds (defaults to half the observation interval)
    #[arg(long)]
    tolerance_secs: Option<i64>,

    /// Leave observations unmatched where model samples are further apart than this
    #[arg(long)]
    max_gap_secs: Option<i64>,

    /// Quantity name shared by observations and models
    #[arg(long)]
    quantity: Option<String>,

    /// Unit of the quantity
    #[arg(long, default_value = "")]
    unit: String,

    /// Treat the quantity as a direction in degrees
    #[arg(long, default_value_t = false)]
    directional: bool,

    /// Keep only rows at or after this time (RFC 3339)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Keep only rows at or before this time (RFC 3339)
    #[arg(long)]
    end: Option<DateTime<Utc>>,

    /// Comma-separated metrics (defaults to bias,rmse,urmse,mae,cc,si,r2)
    #[arg(long, default_value = "")]
    metrics: String,

    /// Run name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    run: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write each observation's matched rows as CSV
    #[arg(long, default_value_t = false)]
    write_matched: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Pool matched pairs per group and score each group
    Skill {
        /// Grouping, comma-separated: observation, model, freq:<H|D|M|Y|6h|30m...>
        #[arg(long, default_value = "observation,model")]
        by: String,

        #[command(flatten)]
        inputs: MatchArgs,
    },

    /// Score each observation separately, then average per model by weight
    MeanSkill {
        #[command(flatten)]
        inputs: MatchArgs,
    },

    /// Pool matched pairs per model and spatial grid cell
    Gridded {
        /// Grid cell counts as NXxNY, e.g. "5x5"
        #[arg(long, conflicts_with = "bin_size")]
        bins: Option<String>,

        /// Square cell size in coordinate units
        #[arg(long)]
        bin_size: Option<f64>,

        /// Minimum number of pairs for a cell to be reported
        #[arg(long, default_value_t = 1)]
        n_min: usize,

        #[command(flatten)]
        inputs: MatchArgs,
    },
}

#[derive(Debug, Clone)]
struct PointArg {
    name: String,
    path: PathBuf,
    position: Position,
}

#[derive(Debug, Clone)]
struct TrackArg {
    name: String,
    path: PathBuf,
}

#[derive(Debug, Clone)]
struct ModelArg {
    observation: String,
    name: String,
    path: PathBuf,
}

fn parse_point(s: &str) -> Result<PointArg, String> {
    let (name, rest) = s.split_once('=').ok_or("expected NAME=PATH@X,Y")?;
    let (path, coords) = rest.rsplit_once('@').ok_or("expected NAME=PATH@X,Y")?;
    let (x, y) = coords.split_once(',').ok_or("expected X,Y after '@'")?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x coordinate: {x}"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y coordinate: {y}"))?;
    Ok(PointArg {
        name: name.to_string(),
        path: PathBuf::from(path),
        position: Position::new(x, y),
    })
}

fn parse_track(s: &str) -> Result<TrackArg, String> {
    let (name, path) = s.split_once('=').ok_or("expected NAME=PATH")?;
    Ok(TrackArg {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

fn parse_model(s: &str) -> Result<ModelArg, String> {
    let (target, path) = s.split_once('=').ok_or("expected OBS:MODEL=PATH")?;
    let (observation, name) = target.split_once(':').ok_or("expected OBS:MODEL=PATH")?;
    Ok(ModelArg {
        observation: observation.to_string(),
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (name, weight) = s.split_once('=').ok_or("expected OBS=WEIGHT")?;
    let weight: f64 = weight.parse().map_err(|_| format!("invalid weight: {weight}"))?;
    Ok((name.to_string(), weight))
}

fn parse_bins(s: &str) -> Result<(usize, usize)> {
    let (nx, ny) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("invalid --bins {s:?}, expected NXxNY"))?;
    Ok((
        nx.trim().parse().with_context(|| format!("invalid bin count: {nx}"))?,
        ny.trim().parse().with_context(|| format!("invalid bin count: {ny}"))?,
    ))
}

fn parse_by(s: &str) -> Result<Vec<GroupBy>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<GroupBy>().map_err(anyhow::Error::from))
        .collect()
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct SkillOutput {
    run: String,
    kind: &'static str,
    n_observations: usize,
    n_points: usize,
    models: Vec<String>,
    n_rows: usize,
    output: PathBuf,
    matched: Vec<PathBuf>,
}

/// Read every observation and its models, align them, and collect the comparers.
fn build_collection(inputs: &MatchArgs) -> Result<ComparerCollection> {
    let quantity = inputs.quantity.as_ref().map_or_else(Quantity::undefined, |name| {
        Quantity::new(name.clone(), inputs.unit.clone()).with_directional(inputs.directional)
    });

    let mut observations: Vec<Observation> = Vec::new();
    for point in &inputs.points {
        let obs = SeriesReader::new(&point.path)
            .read_point_observation(&point.name, point.position)
            .with_context(|| format!("failed to read observation {}", point.name))?;
        observations.push(obs);
    }
    for track in &inputs.tracks {
        let obs = SeriesReader::new(&track.path)
            .read_track_observation(&track.name)
            .with_context(|| format!("failed to read observation {}", track.name))?;
        observations.push(obs);
    }
    if observations.is_empty() {
        anyhow::bail!("at least one --point or --track observation is required");
    }
    if let Some(model) = inputs
        .models
        .iter()
        .find(|m| !observations.iter().any(|o| o.name() == m.observation))
    {
        anyhow::bail!("model {} refers to unknown observation {}", model.name, model.observation);
    }

    let mut pairs: Vec<(Observation, Vec<ModelResult>)> = Vec::with_capacity(observations.len());
    for obs in observations {
        let weight = inputs
            .weights
            .iter()
            .rev()
            .find(|(name, _)| name == obs.name())
            .map_or(1.0, |(_, w)| *w);
        let name = obs.name().to_string();
        let obs = obs
            .with_quantity(quantity.clone())
            .with_weight(weight)
            .with_context(|| format!("invalid weight for observation {name}"))?;
        let models = inputs
            .models
            .iter()
            .filter(|m| m.observation == obs.name())
            .map(|m| {
                SeriesReader::new(&m.path)
                    .read_model(&m.name)
                    .map(|model| model.with_quantity(quantity.clone()))
                    .with_context(|| format!("failed to read model {} for {}", m.name, m.observation))
            })
            .collect::<Result<Vec<_>>>()?;
        pairs.push((obs, models));
    }

    let mut config = MatchConfig::new().with_policy(inputs.policy);
    if let Some(secs) = inputs.tolerance_secs {
        config = config.with_tolerance(TimeDelta::seconds(secs));
    }
    if let Some(secs) = inputs.max_gap_secs {
        config = config.with_max_model_gap(TimeDelta::seconds(secs));
    }

    let mut comparers = Vec::with_capacity(pairs.len());
    for ((obs, _), result) in pairs.iter().zip(config.align_all(&pairs)) {
        let matched = result.with_context(|| format!("failed to align observation {}", obs.name()))?;
        let mut comparer = Comparer::from(matched);
        if inputs.start.is_some() || inputs.end.is_some() {
            let start = inputs.start.unwrap_or(DateTime::<Utc>::MIN_UTC);
            let end = inputs.end.unwrap_or(DateTime::<Utc>::MAX_UTC);
            comparer = comparer.filter_by_time(start, end);
        }
        if comparer.n_points() == 0 {
            warn!(observation = comparer.name(), "no matched rows in the selected period");
        }
        comparers.push(comparer);
    }

    let collection = ComparerCollection::from_comparers(comparers)?;
    info!(
        n_observations = collection.len(),
        n_points = collection.n_points(),
        "comparers ready"
    );
    Ok(collection)
}

fn finish(
    inputs: &MatchArgs,
    collection: &ComparerCollection,
    writer: &ResultWriter,
    kind: &'static str,
    table: &SkillTable,
    output: PathBuf,
) -> Result<()> {
    let matched = if inputs.write_matched {
        collection
            .iter()
            .map(|c| writer.write_matched(c).map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    if !table.is_empty() {
        eprint!("{table}");
    }
    let summary = SkillOutput {
        run: inputs.run.clone(),
        kind,
        n_observations: collection.len(),
        n_points: collection.n_points(),
        models: collection.model_names(),
        n_rows: table.len(),
        output,
        matched,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Skill { by, inputs } => {
            let run = RunName::new(inputs.run.clone())?;
            let metrics = Metric::parse_list(&inputs.metrics)?;
            let by = parse_by(&by)?;
            let collection = build_collection(&inputs)?;

            let table = collection.skill(&metrics, &by);
            let writer = ResultWriter::new(&inputs.output_dir, run)?;
            let output = writer.write_skill(&table)?;
            finish(&inputs, &collection, &writer, "skill", &table, output)?;
        }

        Command::MeanSkill { inputs } => {
            let run = RunName::new(inputs.run.clone())?;
            let metrics = Metric::parse_list(&inputs.metrics)?;
            let collection = build_collection(&inputs)?;

            let table = collection.mean_skill(&metrics);
            let writer = ResultWriter::new(&inputs.output_dir, run)?;
            let output = writer.write_mean_skill(&table)?;
            finish(&inputs, &collection, &writer, "mean_skill", &table, output)?;
        }

        Command::Gridded {
            bins,
            bin_size,
            n_min,
            inputs,
        } => {
            let run = RunName::new(inputs.run.clone())?;
            let metrics = Metric::parse_list(&inputs.metrics)?;
            let grid = match (bins, bin_size) {
                (_, Some(size)) => GridSpec::bin_size(size)?,
                (Some(bins), None) => {
                    let (nx, ny) = parse_bins(&bins)?;
                    GridSpec::bins(nx, ny)?
                }
                (None, None) => GridSpec::bins(5, 5)?,
            }
            .with_n_min(n_min);
            let collection = build_collection(&inputs)?;

            let table = collection.spatial_skill(&metrics, grid);
            let writer = ResultWriter::new(&inputs.output_dir, run)?;
            let output = writer.write_gridded(&table)?;
            finish(&inputs, &collection, &writer, "gridded", &table, output)?;
        }
    }

    Ok(())
}
