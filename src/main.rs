mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use docship::config::Config;
use docship::observability::Metrics;
use docship::pipeline::Pipeline;
use docship::report::{self, ExecutionStatus};
use docship::api;
use docship::transport::HttpUploadClient;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Server(args) => {
            let mut config = config;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            api::run(config).await?;
        }
        Commands::Run(args) => {
            let manifest_path = args
                .manifest
                .or_else(|| config.manifest.path.clone())
                .ok_or("no manifest path given; pass --manifest or set manifest.path")?;

            let config = Arc::new(config);
            let transport = Arc::new(HttpUploadClient::new(&config.upload)?);
            let pipeline = Pipeline::new(config, transport, Arc::new(Metrics::default()));

            let outcome = pipeline.run_from_manifest(&manifest_path).await;
            println!("{}", report::render_summary(&outcome.report));
            if let Some(path) = &outcome.report_path {
                println!("Report: {}", path.display());
            }

            if outcome.status() != ExecutionStatus::Completed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
