//! Adaptive sampling controller
//!
//! Runs the probe set of one context class, keeping the fastest observation
//! per token signature, and refits after every probe once enough distinct
//! signatures exist. Sampling ends on the first intermediate fit that
//! reaches the R² threshold, or after the last iteration.
//!
//! A probe configuration is executed at most once per run: later iterations
//! only pick up configurations that were never visited.

use super::{ContextClass, ProbeConfig, SamplingConfig, PROBE_SUFFIX, WARMUP_PROBE, WARMUP_SUFFIX};
use crate::analysis::regression::{self, ModelFit};
use crate::error::ProbeError;
use crate::observation::{Observation, TokenSignature};
use crate::probe::{generate_probe_content, ChatMessage, CompletionClient, CompletionParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};
use tracing::{error, info, warn};

/// Fastest observation seen per token signature
#[derive(Debug, Clone, Default)]
pub struct BestObservations {
    by_signature: BTreeMap<TokenSignature, Observation>,
}

impl BestObservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; returns true if it is new or faster than the retained one
    pub fn insert(&mut self, observation: Observation) -> bool {
        let signature = observation.signature();
        match self.by_signature.get(&signature) {
            Some(existing) if existing.response_time <= observation.response_time => false,
            _ => {
                self.by_signature.insert(signature, observation);
                true
            }
        }
    }

    /// Number of distinct signatures
    pub fn len(&self) -> usize {
        self.by_signature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_signature.is_empty()
    }

    /// Retained observation for a signature
    pub fn get(&self, signature: &TokenSignature) -> Option<&Observation> {
        self.by_signature.get(signature)
    }

    /// Retained observations ordered by signature
    pub fn to_vec(&self) -> Vec<Observation> {
        self.by_signature.values().copied().collect()
    }
}

/// Terminal state of one context-class run
#[derive(Debug, Clone)]
pub struct SamplingOutcome {
    pub context: ContextClass,
    /// Best observation per signature
    pub observations: Vec<Observation>,
    /// Final or early-stop fit; `None` with fewer than the final minimum of signatures
    pub fit: Option<ModelFit>,
    /// Iterations started
    pub iterations: u32,
    /// Distinct configurations executed
    pub configs_run: usize,
    /// Requests that failed (cold or repeat)
    pub failed_requests: usize,
    /// True when the R² threshold ended sampling
    pub early_stop: bool,
}

/// Drives probes through a completion client
pub struct SamplingController<'a> {
    client: &'a dyn CompletionClient,
    config: SamplingConfig,
    rng: StdRng,
}

impl<'a> SamplingController<'a> {
    /// Create a controller over a client
    pub fn new(client: &'a dyn CompletionClient, config: SamplingConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            client,
            config,
            rng,
        }
    }

    /// Controller tunables
    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Issue the warmup probe; failure is logged and otherwise ignored
    pub async fn warmup(&mut self) {
        info!("Running warmup request");
        let mut best = BestObservations::new();
        match self.probe(WARMUP_PROBE, WARMUP_SUFFIX, &mut best).await {
            0 => info!("Warmup request completed successfully"),
            failed => warn!(failed, "Warmup request failed (continuing with benchmark)"),
        }
    }

    /// Sample one context class until the fit is trustworthy or the budget is spent
    pub async fn run(&mut self, context: ContextClass, configs: &[ProbeConfig]) -> SamplingOutcome {
        info!(context = %context, configs = configs.len(), "Running context benchmarks");

        let max_iterations = self.config.max_iterations.max(1);
        let mut best = BestObservations::new();
        let mut visited: HashSet<ProbeConfig> = HashSet::new();
        let mut failed_requests = 0;

        for iteration in 1..=max_iterations {
            info!(context = %context, iteration, max_iterations, "Starting benchmark iteration");

            for config in configs {
                if iteration > 1 && visited.contains(config) {
                    continue;
                }
                visited.insert(*config);

                let failed = self.probe(*config, PROBE_SUFFIX, &mut best).await;
                if failed > 0 {
                    error!(
                        context = %context,
                        prompt_length = config.prompt_length,
                        max_tokens = config.max_completion_tokens,
                        failed,
                        "Context benchmark probe failed"
                    );
                }
                failed_requests += failed;

                if best.len() >= self.config.min_intermediate_samples {
                    let current = regression::fit(&best.to_vec());
                    info!(
                        context = %context,
                        iteration,
                        r_squared = current.r_squared,
                        configs_run = visited.len(),
                        "Intermediate model fit"
                    );

                    if current.r_squared >= self.config.min_acceptable_r_squared {
                        info!(
                            context = %context,
                            iteration,
                            r_squared = current.r_squared,
                            "Achieved acceptable R-squared"
                        );
                        return SamplingOutcome {
                            context,
                            observations: best.to_vec(),
                            fit: Some(current),
                            iterations: iteration,
                            configs_run: visited.len(),
                            failed_requests,
                            early_stop: true,
                        };
                    }
                }
            }

            info!(
                context = %context,
                iteration,
                results = best.len(),
                "Completed iteration"
            );

            if iteration == max_iterations || best.len() < self.config.min_final_samples {
                return self.finish(context, &best, iteration, visited.len(), failed_requests);
            }

            info!(
                context = %context,
                iteration,
                min_acceptable = self.config.min_acceptable_r_squared,
                "R-squared not acceptable, running another iteration"
            );
        }

        self.finish(context, &best, max_iterations, visited.len(), failed_requests)
    }

    fn finish(
        &self,
        context: ContextClass,
        best: &BestObservations,
        iterations: u32,
        configs_run: usize,
        failed_requests: usize,
    ) -> SamplingOutcome {
        let observations = best.to_vec();
        let fit = if observations.len() >= self.config.min_final_samples {
            let fit = regression::fit(&observations);
            info!(context = %context, iterations, r_squared = fit.r_squared, "Final model fit");
            Some(fit)
        } else {
            warn!(
                context = %context,
                data_points = observations.len(),
                "Not enough data points for model fit"
            );
            None
        };

        SamplingOutcome {
            context,
            observations,
            fit,
            iterations,
            configs_run,
            failed_requests,
            early_stop: false,
        }
    }

    /// Execute a cold probe and its cache-reuse repeat; returns the number of failed requests
    async fn probe(
        &mut self,
        config: ProbeConfig,
        suffix: &str,
        best: &mut BestObservations,
    ) -> usize {
        info!(
            prompt_length = config.prompt_length,
            max_tokens = config.max_completion_tokens,
            "Running benchmark"
        );

        let content = generate_probe_content(
            &mut self.rng,
            config.prompt_length,
            self.config.random_prefix_length,
            suffix,
        );
        let params = CompletionParams {
            messages: vec![ChatMessage::user(content)],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: config.max_completion_tokens,
            seed: self.config.seed,
        };

        let cold = self.request(&params).await;
        let cold = match cold {
            Ok(completion) => Observation::cold(&completion),
            Err(e) => {
                error!(error = %e, prompt_length = config.prompt_length, "Benchmark failed");
                return 1;
            }
        };
        record(best, cold);

        // Same content again: the prompt should now be served from the KV cache
        match self.request(&params).await {
            Ok(completion) => {
                record(best, Observation::cache_reuse(&completion));
                0
            }
            Err(e) => {
                error!(error = %e, prompt_length = config.prompt_length, "Benchmark failed (cached)");
                1
            }
        }
    }

    async fn request(
        &self,
        params: &CompletionParams,
    ) -> Result<crate::probe::Completion, ProbeError> {
        let result = self.client.complete(params).await;
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
        result
    }
}

fn record(best: &mut BestObservations, observation: Observation) {
    if best.insert(observation) {
        info!(
            prompt_tokens = observation.prompt_tokens,
            cached_prompt_tokens = observation.cached_prompt_tokens,
            completion_tokens = observation.completion_tokens,
            response_time_ms = observation.response_time.as_millis() as u64,
            "New best result for token combination"
        );
    }
}
