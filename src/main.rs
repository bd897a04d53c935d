//! llm-rate-lens command-line entry point

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use llm_rate_lens::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!(?cli, "Parsed arguments");

    match cli.command {
        Commands::Benchmark(args) => commands::benchmark::run(args, !cli.no_score).await,
        Commands::Init(args) => commands::init::run(args),
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
