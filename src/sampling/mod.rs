//! Adaptive sampling
//!
//! Probe configurations, context classes, tunables and the controller that
//! drives one context class to a trustworthy fit.

pub mod controller;

pub use controller::{BestObservations, SamplingController, SamplingOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::probe::DEFAULT_PREFIX_LENGTH;

/// Maximum adaptive iterations per context class
pub const MAX_ITERATIONS: u32 = 3;

/// R² at which sampling stops early
pub const MIN_ACCEPTABLE_R_SQUARED: f64 = 0.99;

/// Retained signatures needed before an intermediate fit is attempted
pub const MIN_INTERMEDIATE_SAMPLES: usize = 8;

/// Retained signatures needed for a final fit
pub const MIN_FINAL_SAMPLES: usize = 4;

/// Pause after every request
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Suffix appended to every scaling probe
pub const PROBE_SUFFIX: &str =
    "\nI need some filler content. Please generate as much lorem ipsum as you can.";

/// Suffix of the warmup probe
pub const WARMUP_SUFFIX: &str = "Just a warmup request.";

/// A single probe to execute: prompt filler length (characters) and completion cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub prompt_length: usize,
    pub max_completion_tokens: u32,
}

impl ProbeConfig {
    pub const fn new(prompt_length: usize, max_completion_tokens: u32) -> Self {
        Self {
            prompt_length,
            max_completion_tokens,
        }
    }
}

/// Warmup probe issued before the context runs
pub const WARMUP_PROBE: ProbeConfig = ProbeConfig::new(100, 100);

/// Prompt size class being sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextClass {
    Short,
    Long,
}

impl ContextClass {
    /// Default probe set for this class
    pub fn default_probes(&self) -> Vec<ProbeConfig> {
        let lengths: [usize; 2] = match self {
            ContextClass::Short => [100, 500],
            ContextClass::Long => [9_000, 10_000],
        };
        lengths
            .iter()
            .flat_map(|&len| [1, 100].map(|cap| ProbeConfig::new(len, cap)))
            .collect()
    }
}

impl fmt::Display for ContextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextClass::Short => write!(f, "short"),
            ContextClass::Long => write!(f, "long"),
        }
    }
}

/// Tunables for the sampling controller
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Iteration cap per context class
    pub max_iterations: u32,
    /// Early-stop threshold for intermediate fits
    pub min_acceptable_r_squared: f64,
    /// Signatures required before intermediate fits run
    pub min_intermediate_samples: usize,
    /// Signatures required for a final fit
    pub min_final_samples: usize,
    /// Pause after each request
    pub request_delay: Duration,
    /// Random characters in the cache-defeating prefix
    pub random_prefix_length: usize,
    /// Sampling temperature sent with every probe
    pub temperature: f64,
    /// Nucleus sampling parameter sent with every probe
    pub top_p: f64,
    /// Generation seed sent with every probe
    pub seed: Option<u64>,
    /// Seed for prefix generation; entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            min_acceptable_r_squared: MIN_ACCEPTABLE_R_SQUARED,
            min_intermediate_samples: MIN_INTERMEDIATE_SAMPLES,
            min_final_samples: MIN_FINAL_SAMPLES,
            request_delay: DEFAULT_REQUEST_DELAY,
            random_prefix_length: DEFAULT_PREFIX_LENGTH,
            temperature: 0.0,
            top_p: 1.0,
            seed: Some(42),
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_config_defaults() {
        let config = SamplingConfig::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.min_acceptable_r_squared, 0.99);
        assert_eq!(config.min_intermediate_samples, 8);
        assert_eq!(config.min_final_samples, 4);
        assert_eq!(config.request_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_default_probe_sets_are_disjoint() {
        let short = ContextClass::Short.default_probes();
        let long = ContextClass::Long.default_probes();

        assert_eq!(
            short,
            vec![
                ProbeConfig::new(100, 1),
                ProbeConfig::new(100, 100),
                ProbeConfig::new(500, 1),
                ProbeConfig::new(500, 100),
            ]
        );
        assert_eq!(long.len(), 4);
        assert!(long.iter().all(|p| p.prompt_length >= 9_000));
        assert!(short.iter().all(|p| !long.contains(p)));
    }

    #[test]
    fn test_context_class_display() {
        assert_eq!(ContextClass::Short.to_string(), "short");
        assert_eq!(
            serde_json::to_string(&ContextClass::Long).unwrap(),
            "\"long\""
        );
    }
}
