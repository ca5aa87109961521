//! systgen CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sg_datagen::io::{read_frame, save_partition};
use sg_datagen::{DataGenerator, GeneratorSettings, PartitionConfig, benchmark_settings, partition};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "systgen")]
#[command(about = "systgen - signal/background datasets with systematics")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate original (train) and biased (test) datasets from a settings file
    Generate {
        /// Settings JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Dataset root directory (created if missing)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Suffix file stems with this index (`train_<i>.csv`, ...)
        #[arg(long)]
        file_index: Option<usize>,

        /// Number of realizations. Replica `r` uses seed `seed + r` and index `file_index + r`.
        #[arg(long, default_value = "1")]
        replicas: usize,

        /// RNG seed. Overrides the settings file.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the 2-D benchmark settings
    Preset {
        /// Case number, echoed into the settings
        #[arg(long, default_value = "1")]
        case: u32,

        /// Total number of events
        #[arg(long, default_value = "1000")]
        events: usize,

        /// Background fraction
        #[arg(long, default_value = "0.5")]
        p_b: f64,

        /// Translation magnitude along x2
        #[arg(long, default_value = "1.0")]
        z: f64,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a weighted dataset into a reweighted train set and test folds
    Partition {
        /// Points CSV (with header)
        #[arg(long)]
        data: PathBuf,

        /// Labels file (one 0/1 per line)
        #[arg(long)]
        labels: PathBuf,

        /// Weights file (one weight per line). Defaults to 1.0 per row.
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Output root directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Fraction of rows in the test block
        #[arg(long, default_value = "0.3")]
        test_fraction: f64,

        /// Number of test folds, including the mu-calibration fold
        #[arg(long, default_value = "10")]
        folds: usize,

        /// Shuffle seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Ground-truth mu per test fold after the calibration fold (folds - 1 values)
        #[arg(long, num_args = 1..)]
        mu: Vec<f64>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate { config, output_dir, file_index, replicas, seed } => {
            cmd_generate(&config, &output_dir, file_index, replicas, seed)
        }
        Commands::Preset { case, events, p_b, z, output } => {
            cmd_preset(case, events, p_b, z, output.as_ref())
        }
        Commands::Partition {
            data,
            labels,
            weights,
            output_dir,
            test_fraction,
            folds,
            seed,
            mu,
        } => cmd_partition(
            &data,
            &labels,
            weights.as_deref(),
            &output_dir,
            PartitionConfig { test_fraction, n_folds: folds, seed, mu },
        ),
        Commands::Version => {
            println!("systgen {}", sg_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_generate(
    config: &Path,
    output_dir: &Path,
    file_index: Option<usize>,
    replicas: usize,
    seed: Option<u64>,
) -> Result<()> {
    if replicas == 0 {
        anyhow::bail!("--replicas must be >= 1");
    }
    tracing::info!(path = %config.display(), "loading settings");
    let settings = GeneratorSettings::from_path(config)
        .with_context(|| format!("failed to load settings from {}", config.display()))?;

    // Replica r runs with base_seed + r.
    let base_seed = seed.or(settings.seed);
    let base_seed = match (base_seed, replicas) {
        (Some(s), _) => Some(s),
        (None, 1) => None,
        (None, _) => Some(rand::random()),
    };

    let mut runs = Vec::with_capacity(replicas);
    for r in 0..replicas {
        let mut s = settings.clone();
        s.seed = base_seed.map(|b| b.wrapping_add(r as u64));
        let index = match (file_index, replicas) {
            (Some(i), _) => Some(i + r),
            (None, 1) => None,
            (None, _) => Some(r),
        };

        let mut generator = DataGenerator::new(s).context("invalid settings")?;
        let data = generator.generate_data()?;
        let rows = data.original.len();
        let used_seed = data.report.settings.seed;
        let paths = generator
            .save_data(output_dir, index)
            .with_context(|| format!("failed to save dataset under {}", output_dir.display()))?;
        tracing::info!(replica = r, rows, seed = ?used_seed, "dataset written");

        runs.push(serde_json::json!({
            "file_index": index,
            "seed": used_seed,
            "rows": rows,
            "train_data": paths.train_data,
            "test_data": paths.test_data,
            "settings": paths.settings,
        }));
    }

    write_json(None, serde_json::json!({ "output_dir": output_dir, "runs": runs }))
}

fn cmd_preset(case: u32, events: usize, p_b: f64, z: f64, output: Option<&PathBuf>) -> Result<()> {
    let settings = benchmark_settings(case, events, p_b, z);
    settings.validate()?;
    write_json(output, serde_json::to_value(&settings)?)
}

fn cmd_partition(
    data: &Path,
    labels: &Path,
    weights: Option<&Path>,
    output_dir: &Path,
    config: PartitionConfig,
) -> Result<()> {
    tracing::info!(path = %data.display(), "loading dataset");
    let frame = read_frame(data, labels, weights, 1.0)
        .with_context(|| format!("failed to load dataset {}", data.display()))?;
    tracing::info!(rows = frame.len(), "dataset loaded");

    let p = partition(&frame, &config)?;
    save_partition(output_dir, &p)?;

    let folds: Vec<serde_json::Value> = p
        .test_folds
        .iter()
        .map(|f| serde_json::json!({ "rows": f.frame.len(), "mu": f.mu }))
        .collect();
    write_json(
        None,
        serde_json::json!({
            "output_dir": output_dir,
            "reference_signal": p.reference.signal,
            "reference_background": p.reference.background,
            "train_rows": p.train.len(),
            "mu_calc_rows": p.mu_calibration.len(),
            "test_folds": folds,
        }),
    )
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
