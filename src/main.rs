use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use arachne_forest::{WeightedForestConfig, WeightedForestEngine};
use arachne_io::{ExperimentName, MatrixReader, NetworkWriter};
use arachne_net::{
    FailurePolicy, FeatureRange, HistoryMode, MtryPolicy, NetworkConfig, PvalueCulling,
    RefineConfig, ResponseData, TaskKind, encode_class_labels,
};

#[derive(Parser)]
#[command(name = "arachne")]
#[command(about = "Iteratively reweighted random-forest network inference")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

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

/// Shared tuning parameters for the refinement loop and the forest engine.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Maximum reweighting rounds per response feature
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Number of trees per forest
    #[arg(long, default_value_t = 500)]
    trees: usize,

    /// Split-candidate policy: "default", a proportion in (0, 1], or an
    /// absolute count (1 reads as the full active set)
    #[arg(long, default_value = "default")]
    mtry: String,

    /// Treat each response column as categorical
    #[arg(long, default_value_t = false)]
    classification: bool,

    /// Cull predictors by FDR-corrected permutation p-values between rounds
    #[arg(long, default_value_t = false)]
    pvalue_culling: bool,

    /// Permutations per p-value computation
    #[arg(long, default_value_t = 500)]
    permutations: usize,

    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long, default_value_t = 1)]
    min_node_size: usize,

    /// Fraction of samples drawn per tree
    #[arg(long, default_value_t = 1.0)]
    sample_fraction: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Build the full directed network, one model per feature
    Infer {
        /// Path to the input CSV matrix (sample id column + feature columns)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Restrict response columns to FIRST:LAST (one-based, inclusive)
        #[arg(long)]
        range: Option<String>,

        /// What a failed per-feature run does: "abort" or "skip"
        #[arg(long, default_value = "abort")]
        on_failure: String,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Refine a single response feature and report every round
    Sharpen {
        /// Path to the input CSV matrix
        #[arg(long)]
        data: PathBuf,

        /// Name of the feature column to model as response
        #[arg(long)]
        response: String,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct InferOutput {
    experiment: String,
    n_samples: usize,
    n_features: usize,
    n_edges: usize,
    iterations: usize,
    trees: usize,
}

#[derive(Serialize)]
struct SharpenOutput {
    experiment: String,
    response: String,
    rounds_completed: usize,
    best_round: Option<usize>,
    best_fit_quality: Option<f64>,
    active_predictors: Option<usize>,
}

fn parse_mtry(s: &str) -> Result<MtryPolicy> {
    if s == "default" {
        return Ok(MtryPolicy::Default);
    }
    if let Ok(count) = s.parse::<usize>() {
        return match count {
            0 => anyhow::bail!("mtry must be positive"),
            // A bare 1 reads as "100% of the active predictors".
            1 => Ok(MtryPolicy::Proportion(1.0)),
            _ => Ok(MtryPolicy::Absolute(count)),
        };
    }
    let proportion: f64 = s
        .parse()
        .with_context(|| format!("unknown mtry policy: {s}"))?;
    if proportion > 0.0 && proportion <= 1.0 {
        Ok(MtryPolicy::Proportion(proportion))
    } else {
        anyhow::bail!("mtry proportion must be in (0, 1], got {proportion}")
    }
}

fn parse_failure_policy(s: &str) -> Result<FailurePolicy> {
    match s {
        "abort" => Ok(FailurePolicy::Abort),
        "skip" => Ok(FailurePolicy::Skip),
        other => anyhow::bail!("unknown failure policy: {other} (expected abort or skip)"),
    }
}

fn parse_range(s: &str) -> Result<FeatureRange> {
    let (first, last) = s
        .split_once(':')
        .with_context(|| format!("range must be FIRST:LAST, got {s}"))?;
    let first: usize = first
        .trim()
        .parse()
        .with_context(|| format!("invalid range start: {first}"))?;
    let last: usize = last
        .trim()
        .parse()
        .with_context(|| format!("invalid range end: {last}"))?;
    Ok(FeatureRange::new(first, last))
}

fn build_engine(tuning: &TuningArgs) -> Result<WeightedForestEngine> {
    let config = WeightedForestConfig::new(tuning.trees)?
        .with_max_depth(tuning.max_depth)
        .with_min_samples_leaf(tuning.min_node_size)
        .with_sample_fraction(tuning.sample_fraction);
    Ok(WeightedForestEngine::new(config))
}

fn task_kind(tuning: &TuningArgs) -> TaskKind {
    if tuning.classification {
        TaskKind::Classification
    } else {
        TaskKind::Regression
    }
}

fn culling(tuning: &TuningArgs) -> PvalueCulling {
    if tuning.pvalue_culling {
        PvalueCulling::Enabled {
            permutations: tuning.permutations,
        }
    } else {
        PvalueCulling::Disabled
    }
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

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Infer {
            data,
            experiment,
            output_dir,
            range,
            on_failure,
            tuning,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let dataset = MatrixReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            let matrix = dataset.matrix();
            info!(
                n_samples = matrix.n_samples(),
                n_features = matrix.n_features(),
                "matrix loaded"
            );

            let mut config = NetworkConfig::new(tuning.iterations)?
                .with_mtry(parse_mtry(&tuning.mtry)?)
                .with_task(task_kind(&tuning))
                .with_pvalue_culling(culling(&tuning))
                .with_failure_policy(parse_failure_policy(&on_failure)?)
                .with_seed(cli.seed);
            if let Some(range_spec) = range.as_deref() {
                config = config.with_feature_range(parse_range(range_spec)?);
            }

            let engine = build_engine(&tuning)?;
            let edges = config
                .build(matrix, &engine)
                .context("network inference failed")?;
            info!(n_edges = edges.len(), "network inferred");

            let writer = NetworkWriter::new(&output_dir, experiment_name)?;
            writer.write_network(matrix.n_features(), matrix.n_samples(), &edges)?;
            writer.write_edges_csv(&edges)?;

            let output = InferOutput {
                experiment,
                n_samples: matrix.n_samples(),
                n_features: matrix.n_features(),
                n_edges: edges.len(),
                iterations: tuning.iterations,
                trees: tuning.trees,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Sharpen {
            data,
            response,
            experiment,
            output_dir,
            tuning,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let dataset = MatrixReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            let matrix = dataset.matrix();

            let target = matrix
                .column_index(&response)
                .with_context(|| format!("no feature column named \"{response}\""))?;
            let (predictor_rows, predictor_names, response_column) = matrix.partition(target);

            let labels;
            let response_data = match task_kind(&tuning) {
                TaskKind::Regression => ResponseData::Continuous(&response_column),
                TaskKind::Classification => {
                    labels = encode_class_labels(&response_column);
                    ResponseData::Classes(&labels)
                }
            };

            let refine = RefineConfig::new(tuning.iterations)?
                .with_mtry(parse_mtry(&tuning.mtry)?)
                .with_task(task_kind(&tuning))
                .with_pvalue_culling(culling(&tuning))
                .with_history(HistoryMode::Full)
                .with_seed(cli.seed);

            let engine = build_engine(&tuning)?;
            let history = refine
                .run(&predictor_rows, &predictor_names, response_data, &engine)
                .with_context(|| format!("refinement failed for \"{response}\""))?;
            let best = history.best();
            info!(
                rounds = history.rounds_completed(),
                best_round = best.map(|r| r.round),
                "refinement complete"
            );

            let writer = NetworkWriter::new(&output_dir, experiment_name)?;
            writer.write_refinement(
                &response,
                &predictor_names,
                history.rounds_completed(),
                best.map(|r| r.round),
                history.records(),
            )?;

            let output = SharpenOutput {
                experiment,
                response,
                rounds_completed: history.rounds_completed(),
                best_round: best.map(|r| r.round),
                best_fit_quality: best.map(|r| r.fit_quality),
                active_predictors: best.map(|r| r.active_predictors),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
