//! Command-line interface definitions

pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::benchmarks::DEFAULT_RESULTS_PATH;
use crate::config::DEFAULT_CONFIG_PATH;
use crate::output::OutputFormat;
use crate::probe::DEFAULT_TIMEOUT_SECS;

/// Per-token latency profiler for OpenAI-compatible chat completion endpoints
#[derive(Debug, Parser)]
#[command(name = "llm-rate-lens")]
#[command(about = "Estimate prompt, cached prompt and completion token rates of LLM endpoints")]
#[command(version)]
pub struct Cli {
    /// Log level (RUST_LOG overrides)
    #[arg(short, long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Hide the composite score in rendered output
    #[arg(long, global = true)]
    pub no_score: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the benchmark matrix from a configuration file
    Benchmark(BenchmarkArgs),

    /// Write a default configuration file
    Init(InitArgs),

    /// Print version information
    Version,
}

#[derive(Debug, Args)]
pub struct BenchmarkArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Detailed results log path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_RESULTS_PATH)]
    pub results: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Pause after each request in milliseconds
    #[arg(long, default_value_t = 500)]
    pub request_delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Where to write the configuration
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Default `EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
