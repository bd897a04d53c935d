//! Benchmark command implementation

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::time::Duration;
use tracing::{error, info};

use crate::adapters::create_driver;
use crate::benchmarks::{self, BenchmarkConfig};
use crate::cli::BenchmarkArgs;
use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};
use crate::error::ConfigError;
use crate::output;
use crate::sampling::SamplingConfig;

/// Build engine settings from command-line arguments
pub fn benchmark_config(args: &BenchmarkArgs) -> BenchmarkConfig {
    BenchmarkConfig {
        sampling: SamplingConfig {
            request_delay: Duration::from_millis(args.request_delay_ms),
            ..SamplingConfig::default()
        },
        timeout_secs: args.timeout,
        ..BenchmarkConfig::default()
    }
}

/// Run the benchmark command
pub async fn run(args: BenchmarkArgs, show_score: bool) -> Result<()> {
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            println!("{}", "Example configuration:".bright_cyan().bold());
            println!("{DEFAULT_CONFIG_TEMPLATE}");
            bail!("Configuration file not found: {path}. Run `llm-rate-lens init` to create one");
        }
        Err(e) => return Err(e).context("Error loading configuration"),
    };
    info!(driver = %config.driver, parameters = config.matrix.len(), "Loaded configuration");

    let mut driver = create_driver(&config.driver)?;
    let bench_config = benchmark_config(&args);

    let results = match benchmarks::run_matrix(driver.as_mut(), &config.matrix, &bench_config).await
    {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Matrix benchmark failed");
            benchmarks::io::write_failure_log(&args.results, &e.to_string())?;
            return Err(e).context("Matrix benchmark failed");
        }
    };

    let rendered = output::render(&results, args.format, show_score)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }

    let path = benchmarks::write_results_log(&args.results, &results, show_score)?;
    info!(path = %path.display(), "Results have been saved");

    Ok(())
}
