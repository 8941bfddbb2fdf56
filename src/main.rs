//! Oncopipe - Main Entry Point
//!
//! Runs the breast-cancer diagnosis training pipeline end to end.

use clap::Parser;
use oncopipe::config::{DataSchema, PipelineConfig};
use oncopipe::ingestion::HubClient;
use oncopipe::pipeline::TrainingPipeline;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oncopipe", about = "Breast-cancer diagnosis training pipeline")]
struct Cli {
    /// Pipeline configuration file
    #[arg(long, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Dataset schema file
    #[arg(long, default_value = "config/schema.yaml")]
    schema: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oncopipe=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = PipelineConfig::from_yaml(&cli.config)?;
    let schema = DataSchema::from_yaml(&cli.schema)?;

    let pipeline = TrainingPipeline::new(config, schema, HubClient::new());
    let artifact = pipeline.run()?;

    println!(
        "Trained model saved to {} (test accuracy {:.4})",
        artifact.trained_model_path.display(),
        artifact.metrics.accuracy
    );

    Ok(())
}
