//! k-fold cross-validated training of the ship/iceberg radar classifier.

use std::fs::OpenOptions;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use iceberg_cv::data::KFold;
use iceberg_cv::train::{
    CheckpointManager, CrossValidator, JsonLinesSink, LogSink, MetricsLogger, RadarFoldSetup, TrainConfig,
};
use iceberg_cv::{Config, RadarDataset};

#[derive(Parser)]
#[command(name = "iceberg-cv")]
#[command(about = "Cross-validated training of a ship/iceberg radar image classifier", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train every configured fold and report the best validation losses
    Train {
        /// Config file path
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Override number of epochs per fold
        #[arg(long)]
        epochs: Option<usize>,
        /// Override learning rate
        #[arg(long)]
        lr: Option<f64>,
        /// Folds to run, e.g. `0..5`
        #[arg(long, value_parser = parse_fold_range)]
        folds: Option<Range<usize>>,
        /// Override training batch size
        #[arg(long)]
        batch_size: Option<usize>,
        /// Override validation batch size
        #[arg(long)]
        val_batch_size: Option<usize>,
    },
    /// Write the default configuration
    InitConfig {
        /// Output path
        path: PathBuf,
    },
    /// Print the metadata of a checkpoint file
    Inspect {
        checkpoint: PathBuf,
    },
}

fn parse_fold_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s.split_once("..").ok_or_else(|| format!("expected A..B, got '{s}'"))?;
    let start = start.trim().parse().map_err(|e| format!("bad fold '{start}': {e}"))?;
    let end = end.trim().parse().map_err(|e| format!("bad fold '{end}': {e}"))?;
    Ok(start..end)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Train { config, epochs, lr, folds, batch_size, val_batch_size } => {
            let mut config = load_config(&config)?;
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(lr) = lr {
                config.training.learning_rate = lr;
            }
            if let Some(folds) = folds {
                config.cross_validation.start_fold = folds.start;
                config.cross_validation.end_fold = Some(folds.end);
            }
            if let Some(batch_size) = batch_size {
                config.training.batch_size = batch_size;
            }
            if let Some(val_batch_size) = val_batch_size {
                config.training.val_batch_size = val_batch_size;
            }
            config.validate()?;
            train(&config)
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            Config::default().save(&path)?;
            println!("Created default config at {}", path.display());
            Ok(())
        }
        Commands::Inspect { checkpoint } => {
            let checkpoint = CheckpointManager::load(&checkpoint)?;
            let meta = checkpoint.meta;
            println!("fold:     {}", meta.fold);
            println!("epoch:    {}", meta.epoch);
            println!("val_loss: {:.6}", meta.val_loss);
            println!("best:     {}", meta.is_best);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        info!("{} not found, using default configuration", path.display());
        Ok(Config::default())
    }
}

fn train(config: &Config) -> anyhow::Result<()> {
    let mut dataset = RadarDataset::load(&config.data.train_path)
        .with_context(|| format!("loading dataset {}", config.data.train_path))?;
    if config.data.standardize {
        dataset.standardize();
    }

    let cv = &config.cross_validation;
    let mut kfold = KFold::new(cv.n_splits)?;
    if let Some(seed) = cv.shuffle_seed {
        kfold = kfold.with_shuffle(seed);
    }

    let t = &config.training;
    let mut setup = RadarFoldSetup::new(Arc::new(dataset), kfold);
    setup.network = config.model.clone();
    setup.learning_rate = t.learning_rate;
    setup.momentum = t.momentum;
    setup.batch_size = t.batch_size;
    setup.val_batch_size = t.val_batch_size;
    setup.augmentations = t.augmentations.clone();
    setup.shuffle_seed = t.shuffle_seed;
    setup.drop_last = t.drop_last;

    let mut sinks: Vec<Box<dyn MetricsLogger>> = vec![Box::new(LogSink)];
    if let Some(path) = &config.logging.metrics_path {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening metrics file {path}"))?;
        sinks.push(Box::new(JsonLinesSink::new(file)));
    }

    let mut run_config = TrainConfig::new(config.fold_range(), t.epochs);
    run_config.isolate_failures = cv.isolate_failures;
    let checkpoints = CheckpointManager::new(&config.checkpoint.dir, config.checkpoint.prefix.as_str())
        .with_extension(config.checkpoint.extension.as_str());

    let loss_fn = t.loss.build();
    let report = CrossValidator::new(run_config, checkpoints).run(&mut setup, loss_fn.as_ref(), &mut sinks)?;

    for failure in &report.failures {
        println!("fold {} failed: {}", failure.fold, failure.error);
    }
    for fold in &report.folds {
        println!("fold {}: best val_loss {:.5} (epoch {})", fold.fold, fold.best_val_loss, fold.best_epoch);
    }
    println!("best losses: {:?}", report.best_losses());
    if let Some(mean) = report.mean_best_loss() {
        println!("mean best val_loss: {mean:.5}");
    }
    Ok(())
}
