use anyhow::{Context, Result};
use clap::Parser;
use maternal_risk_core::PredictionService;
use maternal_risk_service::{start_server, AppState, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "risk-service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP prediction service for maternal health risk", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::load(args.config.as_deref())?;

    init_logging(&config.log_level);

    info!("Starting Maternal Risk Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Loading artifacts from {}", config.artifacts_dir.display());

    let service = PredictionService::load(&config.artifacts_dir)
        .map_err(|e| {
            error!("Failed to load artifacts: {}", e);
            e
        })
        .context("Cannot start without a consistent artifact set")?;

    info!(
        run_id = %service.run_id(),
        labels = %service.labels().join(", "),
        features = service.feature_count(),
        "Artifacts loaded"
    );

    let state = AppState::new(Arc::new(service));
    start_server(state, &config.bind_addr).await?;

    info!("Maternal Risk Service stopped");
    Ok(())
}

fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
