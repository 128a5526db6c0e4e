//! Maternal Risk Trainer CLI
//!
//! Deterministic offline trainer producing the artifacts loaded by the
//! prediction service.

use anyhow::{Context, Result};
use clap::Parser;
use maternal_risk_trainer::{Dataset, TrainingConfig, TrainingPipeline};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "risk-trainer")]
#[command(author = "Maternal Risk Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic trainer for the maternal health risk classifier", long_about = None)]
struct Args {
    /// Input CSV dataset (header with Age, SystolicBP, DiastolicBP, BS, BodyTemp, HeartRate, RiskLevel)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for artifacts, manifest and evaluation report
    #[arg(short, long, default_value = "artifacts")]
    output: PathBuf,

    /// Random seed for balancing, splitting and the randomized learners
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    /// Number of extremely randomized trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Number of gradient boosting rounds
    #[arg(long, default_value = "100")]
    boosting_rounds: usize,

    /// Gradient boosting learning rate
    #[arg(long, default_value = "0.1")]
    learning_rate: f64,

    /// Maximum depth of boosting trees
    #[arg(long, default_value = "3")]
    max_depth: usize,

    /// Cross-validation folds for the stacking meta learner
    #[arg(long, default_value = "5")]
    cv_folds: usize,

    /// Neighbours considered by synthetic oversampling
    #[arg(long, default_value = "5")]
    smote_neighbors: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            seed: self.seed,
            test_fraction: self.test_fraction,
            smote_neighbors: self.smote_neighbors,
            n_trees: self.trees,
            boosting_rounds: self.boosting_rounds,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            cv_folds: self.cv_folds,
            ..TrainingConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Maternal Risk Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");

    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;
    info!("Loaded {} labelled records", dataset.len());

    let config = args.training_config();
    info!("Training configuration:");
    info!("  Seed: {}", config.seed);
    info!("  Test fraction: {}", config.test_fraction);
    info!("  Extra trees: {}", config.n_trees);
    info!(
        "  Boosting: {} rounds, lr {}, depth {}",
        config.boosting_rounds, config.learning_rate, config.max_depth
    );
    info!("  CV folds: {}", config.cv_folds);
    info!("  SMOTE neighbours: {}", config.smote_neighbors);

    info!("═══════════════════════════════════════════");
    let pipeline = TrainingPipeline::new(config);
    let (outcome, manifest) = pipeline
        .fit_and_save(&dataset, &args.output)
        .context("Training failed")?;

    info!("═══════════════════════════════════════════");
    info!("✓ Training completed successfully");
    info!("  Run id: {}", manifest.run_id);
    info!("  Labels: {}", manifest.labels.join(", "));
    info!("  Test accuracy: {:.4}", outcome.report.accuracy);
    info!("  Artifacts: {}", args.output.display());

    Ok(())
}
