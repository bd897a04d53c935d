//! Benchmark orchestration for LLM Rate Lens
//!
//! - [`run_scaling_benchmark`] samples one endpoint in both context classes
//! - [`run_matrix`] repeats that for every parameter combination, wrapping
//!   each run in driver setup and teardown and scoring the fits

pub mod io;
pub mod matrix;
pub mod result;

pub use io::{write_results_log, DEFAULT_RESULTS_PATH};
pub use matrix::{expand, output_flags, ParamSet};
pub use result::{ContextObservation, MatrixResult};

use std::collections::BTreeMap;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::Driver;
use crate::analysis::{ModelFit, ScoreCalculator, ScoreConfig};
use crate::config::ParameterConfig;
use crate::error::{BenchmarkError, ProbeError};
use crate::probe::{ClientConfig, CompletionClient, HttpCompletionClient, DEFAULT_TIMEOUT_SECS};
use crate::sampling::{ContextClass, SamplingConfig, SamplingController};

/// Settings shared by every combination of a matrix run
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub sampling: SamplingConfig,
    pub score: ScoreConfig,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            score: ScoreConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Observations and fits from both context classes of one endpoint
#[derive(Debug, Clone, Default)]
pub struct ScalingRun {
    pub observations: Vec<ContextObservation>,
    pub short_fit: Option<ModelFit>,
    pub long_fit: Option<ModelFit>,
}

/// Warm up, then sample the short and long context classes in turn
///
/// Fails with [`BenchmarkError::AllProbesFailed`] only when neither class
/// produced a single observation.
pub async fn run_scaling_benchmark(
    client: &dyn CompletionClient,
    config: &SamplingConfig,
) -> Result<ScalingRun, BenchmarkError> {
    let mut controller = SamplingController::new(client, config.clone());
    controller.warmup().await;

    let mut run = ScalingRun::default();
    for context in [ContextClass::Short, ContextClass::Long] {
        let outcome = controller.run(context, &context.default_probes()).await;
        info!(
            context = %context,
            observations = outcome.observations.len(),
            iterations = outcome.iterations,
            failed_requests = outcome.failed_requests,
            early_stop = outcome.early_stop,
            "Context sampling finished"
        );

        run.observations.extend(
            outcome
                .observations
                .iter()
                .map(|obs| ContextObservation::new(context, *obs)),
        );
        match context {
            ContextClass::Short => run.short_fit = outcome.fit,
            ContextClass::Long => run.long_fit = outcome.fit,
        }
    }

    if run.observations.is_empty() {
        error!("No successful observations in either context");
        return Err(BenchmarkError::AllProbesFailed);
    }

    Ok(run)
}

/// Run every matrix combination against HTTP endpoints resolved by the driver
pub async fn run_matrix(
    driver: &mut dyn Driver,
    matrix: &BTreeMap<String, ParameterConfig>,
    config: &BenchmarkConfig,
) -> Result<Vec<MatrixResult>, BenchmarkError> {
    let timeout_secs = config.timeout_secs;
    run_matrix_with(driver, matrix, config, |client_config: ClientConfig| {
        let client = HttpCompletionClient::new(client_config.with_timeout_secs(timeout_secs))?;
        Ok(Box::new(client) as Box<dyn CompletionClient>)
    })
    .await
}

/// Run every matrix combination, building each client with `connect`
///
/// Per-combination failures land on that combination's
/// [`MatrixResult::error`]; only an empty matrix fails the whole run.
pub async fn run_matrix_with<F>(
    driver: &mut dyn Driver,
    matrix: &BTreeMap<String, ParameterConfig>,
    config: &BenchmarkConfig,
    connect: F,
) -> Result<Vec<MatrixResult>, BenchmarkError>
where
    F: Fn(ClientConfig) -> Result<Box<dyn CompletionClient>, ProbeError>,
{
    let combinations = expand(matrix);
    if combinations.is_empty() {
        return Err(BenchmarkError::EmptyMatrix);
    }

    let flags = output_flags(matrix);
    let calculator = ScoreCalculator::new(config.score.clone());
    let run_id = Uuid::new_v4();
    let total = combinations.len();

    info!(run_id = %run_id, driver = driver.name(), combinations = total, "Starting matrix benchmark");

    let mut results = Vec::with_capacity(total);
    for (index, params) in combinations.into_iter().enumerate() {
        info!(combination = index + 1, total, params = ?params, "Benchmarking parameter combination");

        let mut result = MatrixResult::new(run_id, params, flags.clone());
        match run_combination(driver, &result.params, &config.sampling, &connect).await {
            Ok(run) => {
                result.observations = run.observations;
                result.short_fit = run.short_fit;
                result.long_fit = run.long_fit;
                if result.short_fit.is_some() || result.long_fit.is_some() {
                    result.score = calculator.score(&[result.short_fit, result.long_fit]);
                }
                info!(
                    combination = index + 1,
                    observations = result.observations.len(),
                    score = ?result.score,
                    "Combination completed"
                );
            }
            Err(e) => {
                error!(combination = index + 1, error = %e, "Combination failed");
                result = result.with_error(e);
            }
        }
        result.timestamp = chrono::Utc::now();
        results.push(result);
    }

    info!(
        "Completed matrix benchmark: {}/{} successful",
        results.iter().filter(|r| r.is_success()).count(),
        results.len()
    );

    Ok(results)
}

async fn run_combination<F>(
    driver: &mut dyn Driver,
    params: &ParamSet,
    sampling: &SamplingConfig,
    connect: &F,
) -> Result<ScalingRun, BenchmarkError>
where
    F: Fn(ClientConfig) -> Result<Box<dyn CompletionClient>, ProbeError>,
{
    if let Err(e) = driver.setup(params).await {
        if let Err(teardown) = driver.teardown().await {
            warn!(error = %teardown, "Driver teardown failed after setup failure");
        }
        return Err(BenchmarkError::DriverSetup(e));
    }

    let outcome = match connect(ClientConfig::new(driver.url(), driver.model())) {
        Ok(client) => run_scaling_benchmark(client.as_ref(), sampling).await,
        Err(e) => Err(BenchmarkError::Client(e)),
    };

    if let Err(e) = driver.teardown().await {
        warn!(error = %e, "Driver teardown failed");
    }

    outcome
}
