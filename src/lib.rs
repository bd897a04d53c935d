//! LLM Rate Lens
//!
//! Estimates how fast an OpenAI-compatible chat completion endpoint
//! processes prompt tokens, cached prompt tokens and completion tokens by
//! fitting a linear latency model to adaptively sampled probes.
//!
//! The pipeline for one endpoint:
//!
//! 1. [`probe`] builds prompts of known length and times completions
//! 2. [`sampling`] chooses which probes to run and when to stop
//! 3. [`analysis`] fits per-token rates and folds them into a score
//!
//! [`benchmarks`] repeats that for every combination of a parameter matrix,
//! with [`adapters`] preparing the environment around each run.

pub mod adapters;
pub mod analysis;
pub mod benchmarks;
pub mod cli;
pub mod config;
pub mod error;
pub mod observation;
pub mod output;
pub mod probe;
pub mod sampling;

pub use analysis::{ModelFit, ScoreCalculator, ScoreConfig};
pub use benchmarks::{run_matrix, run_scaling_benchmark, BenchmarkConfig, MatrixResult};
pub use error::{BenchmarkError, ConfigError, DriverError, ProbeError};
pub use observation::{Observation, TokenSignature};
pub use probe::{CompletionClient, HttpCompletionClient};
pub use sampling::{ContextClass, SamplingConfig, SamplingController};
